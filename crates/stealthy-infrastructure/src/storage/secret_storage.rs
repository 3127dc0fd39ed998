//! File-backed pairing secret storage.
//!
//! Holds the 32-byte per-install secret in a mode-600 file under the
//! config directory, created lazily on first use. Stands in for an OS
//! keychain; the contract is the same: get-or-create, and reset.

use anyhow::{Context, Result};
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};

use stealthy_core::StealthyError;
use stealthy_core::secret::{SECRET_LEN, SecretStore};

use super::atomic_json::FileLock;
use crate::paths::StealthyPaths;

/// Storage for the pairing secret file.
///
/// # Security Note
///
/// The secret is raw bytes at mode 600 on Unix. Error messages never
/// include the secret itself.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Creates storage at the default platform location.
    pub fn new() -> Result<Self> {
        let path = StealthyPaths::secret_file().context("Failed to resolve secret file path")?;
        Ok(Self { path })
    }

    /// Creates storage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_or_create(&self) -> Result<Vec<u8>> {
        // The lock serializes lazy creation against concurrent callers.
        let _lock = FileLock::acquire(&self.path)?;

        if self.path.exists() {
            let bytes = fs::read(&self.path).context("Failed to read secret file")?;
            if bytes.len() == SECRET_LEN {
                return Ok(bytes);
            }
            // Wrong length means a truncated or foreign file; regenerate.
        }

        let mut bytes = vec![0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create secret directory")?;
        }
        fs::write(&self.path, &bytes).context("Failed to write secret file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, permissions)
                .context("Failed to set secret file permissions")?;
        }

        Ok(bytes)
    }

    fn delete(&self) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;

        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to delete secret file")?;
        }
        Ok(())
    }
}

impl SecretStore for SecretStorage {
    fn get_or_create(&self) -> stealthy_core::Result<Vec<u8>> {
        self.read_or_create()
            .map_err(|error| StealthyError::security(error.to_string()))
    }

    fn reset(&self) -> stealthy_core::Result<()> {
        self.delete()
            .map_err(|error| StealthyError::security(error.to_string()))
    }
}
