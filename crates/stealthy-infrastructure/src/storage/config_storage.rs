//! Config file storage.
//!
//! Loads `config.toml` into the typed [`AppConfig`]. An absent file is
//! not an error; every field defaults.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use stealthy_core::config::AppConfig;

use crate::paths::StealthyPaths;

/// Read-only storage for the application config file.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates storage at the default platform location.
    pub fn new() -> Result<Self> {
        let path = StealthyPaths::config_file().context("Failed to resolve config file path")?;
        Ok(Self { path })
    }

    /// Creates storage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config, returning defaults when the file is absent.
    pub fn load(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path)
            .context(format!("Failed to read config file: {:?}", self.path))?;

        let config: AppConfig =
            toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
