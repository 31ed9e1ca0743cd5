//! Configuration and persistent preferences.
//!
//! Two layers with different lifecycles: `Config` is read once at startup
//! from `~/.config/hecate/config.toml` and stays immutable for the session;
//! `Settings` holds the preferences the UI itself mutates (theme, active
//! studio) and writes back to `~/.config/hecate/settings.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::palette;

/// Fallback model when the config names none.
pub const DEFAULT_MODEL: &str = "hecate-large";

/// Models the daemon serves out of the box. A config file may extend this.
pub const DEFAULT_MODELS: &[&str] = &["hecate-small", "hecate-large", "hecate-coder"];

// === Config ===

/// Session-immutable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model selected at startup. Must appear in `models`.
    pub model: String,
    /// Model names offered by completion and accepted by the model command.
    pub models: Vec<String>,
    /// Base system prompt sent with every chat request.
    pub system: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            models: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
            system: None,
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to resolve config directory: not found.")?
            .join("hecate");
        Ok(config_dir.join("config.toml"))
    }

    /// Load from an explicit path, or from the default location when none
    /// is given. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("HECATE_MODEL") {
            if !model.trim().is_empty() {
                self.model = model.trim().to_string();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            anyhow::bail!("Invalid config: the models list must not be empty.");
        }
        if !self.models.iter().any(|name| name == &self.model) {
            anyhow::bail!(
                "Invalid config: model '{}' is not in the models list ({}).",
                self.model,
                self.models.join(", ")
            );
        }
        Ok(())
    }

    /// Whether `name` is a selectable model.
    #[must_use]
    pub fn knows_model(&self, name: &str) -> bool {
        self.models.iter().any(|model| model == name)
    }
}

// === Settings ===

/// Preferences the UI mutates at runtime and persists across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Color theme name from the palette's theme table.
    pub theme: String,
    /// Index of the studio that was active when the session ended.
    pub active_studio: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: palette::THEME_NAMES[0].to_string(),
            active_studio: 0,
        }
    }
}

impl Settings {
    /// Settings file location.
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to resolve config directory: not found.")?
            .join("hecate");
        Ok(config_dir.join("settings.toml"))
    }

    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;
        if !palette::is_theme_name(&settings.theme) {
            settings.theme = palette::THEME_NAMES[0].to_string();
        }
        Ok(settings)
    }

    /// Save to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    /// Change the theme. Unknown names are rejected so the file never holds
    /// a value the palette cannot resolve.
    pub fn set_theme(&mut self, name: &str) -> Result<()> {
        if !palette::is_theme_name(name) {
            anyhow::bail!(
                "Failed to update setting: unknown theme '{name}'. Expected: {}.",
                palette::THEME_NAMES.join(", ")
            );
        }
        self.theme = name.to_string();
        Ok(())
    }

    pub fn set_active_studio(&mut self, index: usize) {
        self.active_studio = index;
    }
}
