//! Tracing setup for the Hecate TUI.
//!
//! The terminal belongs to ratatui while the app runs, so log output goes to
//! a file under the platform state directory instead of stderr.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Where log lines end up. Falls back to the config directory on platforms
/// without a state directory.
pub fn log_file_path() -> Result<PathBuf> {
    let base = dirs::state_dir()
        .or_else(dirs::config_dir)
        .context("Failed to resolve a state or config directory for logs.")?;
    Ok(base.join("hecate").join("hecate.log"))
}

/// Install the global subscriber. `verbose` forces debug-level output;
/// otherwise `RUST_LOG` is honored with an info default.
pub fn init(verbose: bool) -> Result<PathBuf> {
    let path = log_file_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(path)
}
