use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use timeops_remote::{RemoteConfig, RemoteError};

/// Connection settings persisted between runs. Both fields must be present
/// before the remote half of the app can do anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

impl Settings {
    pub fn settings_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Cannot determine config directory")?
            .join("timeops")
            .join("settings.toml"))
    }

    /// Load settings from disk. Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::settings_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings at {}", path.display()))?;
        let settings: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse settings at {}", path.display()))?;
        Ok(settings)
    }

    /// Save settings to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(&path, raw)?;
        Ok(())
    }

    /// Delete the settings file (disconnect).
    pub fn clear() -> Result<()> {
        let path = Self::settings_path()?;
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    pub fn set_base_url(&mut self, base_url: &str) {
        let trimmed = base_url.trim().trim_end_matches('/');
        self.base_url = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn set_token(&mut self, token: &str) {
        let trimmed = token.trim();
        self.token = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    /// Builds the remote configuration, failing when either field is
    /// missing.
    pub fn remote_config(&self) -> Result<RemoteConfig, RemoteError> {
        RemoteConfig::new(self.base_url.clone(), self.token.clone())
    }
}
