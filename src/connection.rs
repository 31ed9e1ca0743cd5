//! Daemon connection resolution.
//!
//! Decides once, at startup, how the daemon is reached: a local Unix socket
//! or a base URL. The search order is fixed and the outcome is exactly one
//! of the two, never both.

use std::fmt;
use std::path::{Path, PathBuf};

/// Fallback when nothing else resolves.
pub const DEFAULT_URL: &str = "http://127.0.0.1:7437";
/// Explicit socket override, highest priority.
pub const SOCKET_ENV: &str = "HECATE_SOCKET";
/// URL override, consulted after all socket candidates.
pub const URL_ENV: &str = "HECATE_URL";
/// Daemon-managed socket under the system run directory.
pub const SYSTEM_SOCKET: &str = "/run/hecate/hecate.sock";

/// How the daemon is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Socket(PathBuf),
    Url(String),
}

impl Transport {
    #[must_use]
    pub fn is_socket(&self) -> bool {
        matches!(self, Transport::Socket(_))
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Socket(path) => write!(f, "unix://{}", path.display()),
            Transport::Url(url) => f.write_str(url),
        }
    }
}

/// Outcome of the priority search. Warnings are returned rather than logged
/// so the caller decides where they surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub transport: Transport,
    pub warnings: Vec<String>,
}

/// Inputs to the search, split from the live environment so tests can drive
/// every branch.
#[derive(Debug, Clone, Default)]
pub struct ResolverInput {
    pub explicit_socket: Option<PathBuf>,
    pub explicit_url: Option<String>,
    pub env_socket: Option<String>,
    pub env_url: Option<String>,
    pub system_socket: PathBuf,
    pub home_socket: Option<PathBuf>,
    pub config_socket: Option<PathBuf>,
}

impl ResolverInput {
    /// Snapshot the real environment. CLI flags land in the `explicit_*`
    /// fields and trump the search entirely.
    pub fn from_environment(
        explicit_socket: Option<PathBuf>,
        explicit_url: Option<String>,
    ) -> Self {
        Self {
            explicit_socket,
            explicit_url,
            env_socket: std::env::var(SOCKET_ENV).ok().filter(|v| !v.trim().is_empty()),
            env_url: std::env::var(URL_ENV).ok().filter(|v| !v.trim().is_empty()),
            system_socket: PathBuf::from(SYSTEM_SOCKET),
            home_socket: dirs::home_dir().map(|home| home.join(".hecate").join("hecate.sock")),
            config_socket: dirs::config_dir().map(|dir| dir.join("hecate").join("hecate.sock")),
        }
    }
}

/// Run the priority search. `exists` is injected so tests never touch the
/// real filesystem.
///
/// Order: explicit flag, `HECATE_SOCKET` (warn and fall through when the
/// path is missing), system socket, home socket, config-dir socket,
/// `HECATE_URL`, hardcoded default URL.
pub fn resolve_with(input: &ResolverInput, exists: impl Fn(&Path) -> bool) -> Resolution {
    let mut warnings = Vec::new();

    if let Some(path) = &input.explicit_socket {
        return Resolution {
            transport: Transport::Socket(path.clone()),
            warnings,
        };
    }
    if let Some(url) = &input.explicit_url {
        return Resolution {
            transport: Transport::Url(url.clone()),
            warnings,
        };
    }

    if let Some(raw) = &input.env_socket {
        let path = PathBuf::from(raw);
        if exists(&path) {
            return Resolution {
                transport: Transport::Socket(path),
                warnings,
            };
        }
        warnings.push(format!(
            "{SOCKET_ENV}={raw} points at a missing socket; trying other candidates"
        ));
    }

    let candidates = [
        Some(&input.system_socket),
        input.home_socket.as_ref(),
        input.config_socket.as_ref(),
    ];
    for candidate in candidates.into_iter().flatten() {
        if exists(candidate) {
            return Resolution {
                transport: Transport::Socket(candidate.clone()),
                warnings,
            };
        }
    }

    if let Some(url) = &input.env_url {
        return Resolution {
            transport: Transport::Url(url.clone()),
            warnings,
        };
    }

    Resolution {
        transport: Transport::Url(DEFAULT_URL.to_string()),
        warnings,
    }
}

/// Resolve against the real environment, routing warnings to the log.
pub fn resolve(explicit_socket: Option<PathBuf>, explicit_url: Option<String>) -> Transport {
    let input = ResolverInput::from_environment(explicit_socket, explicit_url);
    let resolution = resolve_with(&input, |path| path.exists());
    for warning in &resolution.warnings {
        tracing::warn!("{warning}");
    }
    resolution.transport
}
