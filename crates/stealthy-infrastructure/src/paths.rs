//! Unified path management for Stealthy data files.
//!
//! # Directory Structure
//!
//! ```text
//! <config dir>/stealthy/           # e.g. ~/.config/stealthy/
//! ├── config.toml                  # Application configuration
//! └── pairing_secret               # Per-install pairing secret (600)
//!
//! <data dir>/stealthy/             # e.g. ~/.local/share/stealthy/
//! ├── conversations.json           # Standalone conversations
//! └── projects.json                # Projects with nested conversations
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

const APP_DIR: &str = "stealthy";

/// Unified path management for Stealthy.
pub struct StealthyPaths;

impl StealthyPaths {
    /// Returns the Stealthy configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the Stealthy data directory, used for the document files.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the pairing secret file.
    ///
    /// # Security Note
    ///
    /// The secret storage keeps this file at mode 600 on Unix.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("pairing_secret"))
    }

    /// Returns the path to the standalone conversations file.
    pub fn conversations_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("conversations.json"))
    }

    /// Returns the path to the projects file.
    pub fn projects_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("projects.json"))
    }
}
