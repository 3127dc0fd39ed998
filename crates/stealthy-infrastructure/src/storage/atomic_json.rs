//! Atomic JSON file operations.
//!
//! Provides a thin layer for safe access to the JSON document files:
//! writes go through a temp file with an fsync and an atomic rename, so a
//! crash mid-write never corrupts the previous good file. Object keys are
//! sorted on save for deterministic diffs.

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A handle to a JSON file with atomic write semantics.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file and deserializes it.
    ///
    /// Returns `None` when the file doesn't exist or is empty.
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .context(format!("Failed to read file: {:?}", self.path))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = serde_json::from_str(&content)
            .context(format!("Failed to parse JSON file: {:?}", self.path))?;
        Ok(Some(data))
    }

    /// Saves data atomically with sorted object keys.
    pub fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create directory: {parent:?}"))?;
            }
        }

        // Round-trip through Value: the default serde_json map is a
        // BTreeMap, which sorts object keys.
        let value = serde_json::to_value(data).context("Failed to serialize data")?;
        let json = serde_json::to_string_pretty(&value).context("Failed to render JSON")?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)
            .context(format!("Failed to create temp file: {tmp_path:?}"))?;
        tmp_file.write_all(json.as_bytes())?;

        // Ensure data is on disk before the rename makes it visible.
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)
            .context(format!("Failed to move temp file into place: {:?}", self.path))?;

        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .context("Path has no parent directory")?;
        let file_name = self.path.file_name().context("Path has no file name")?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }
}

/// A file lock guard that releases the lock when dropped.
///
/// Serializes read-modify-write sequences on a file (the secret store's
/// lazy creation).
pub struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquires an exclusive lock guarding the given path.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .context(format!("Failed to open lock file: {lock_path:?}"))?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .context("Failed to acquire exclusive lock")?;
        }

        #[cfg(not(unix))]
        {
            // No file locking on non-Unix systems; acceptable for a
            // single-user desktop app.
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped.
        let _ = fs::remove_file(&self.lock_path);
    }
}
