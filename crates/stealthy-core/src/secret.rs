//! Pairing secret storage capability.
//!
//! Defines the interface for the persistent per-install secret that signs
//! pairing deep links.

use rand::RngCore;
use std::sync::Mutex;

use crate::error::{Result, StealthyError};

/// Length in bytes of the per-install pairing secret.
pub const SECRET_LEN: usize = 32;

/// Provider of the persistent per-install pairing secret.
///
/// The secret is created lazily on first use and retained by secure local
/// storage.
///
/// # Security Note
///
/// Implementations should ensure that:
/// - The secret is never logged or exposed in error messages
/// - Backing files have appropriate permissions (e.g., 600 on Unix)
pub trait SecretStore: Send + Sync {
    /// Returns the stored secret, creating it when missing.
    fn get_or_create(&self) -> Result<Vec<u8>>;

    /// Deletes the secret; the next `get_or_create` recreates it.
    fn reset(&self) -> Result<()>;
}

/// Generates a fresh random secret.
pub fn generate_secret() -> Vec<u8> {
    let mut bytes = vec![0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// In-memory secret store for tests and ephemeral setups.
#[derive(Default)]
pub struct MemorySecretStore {
    secret: Mutex<Option<Vec<u8>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get_or_create(&self) -> Result<Vec<u8>> {
        let mut guard = self
            .secret
            .lock()
            .map_err(|_| StealthyError::security("secret store lock poisoned"))?;

        if let Some(secret) = guard.as_ref() {
            return Ok(secret.clone());
        }

        let secret = generate_secret();
        *guard = Some(secret.clone());
        Ok(secret)
    }

    fn reset(&self) -> Result<()> {
        let mut guard = self
            .secret
            .lock()
            .map_err(|_| StealthyError::security("secret store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
