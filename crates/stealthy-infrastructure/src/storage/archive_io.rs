//! Export/import file helpers.
//!
//! The chat store stages imports and wraps exports; these helpers do the
//! actual file IO for the surrounding UI collaborators. The export file
//! uses the exact schema of the conversations file.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use stealthy_core::conversation::ConversationsArchive;

use super::atomic_json::AtomicJsonFile;

/// Writes an archive to the chosen destination, atomically and with
/// sorted keys, matching the on-disk conversations format.
pub fn write_archive(path: &Path, archive: &ConversationsArchive) -> Result<()> {
    let file = AtomicJsonFile::<ConversationsArchive>::new(path.to_path_buf());
    file.save(archive)
        .context(format!("Failed to write archive: {path:?}"))
}

/// Reads an archive from a picked file, accepting the legacy bare-array
/// format.
pub fn read_archive(path: &Path) -> Result<ConversationsArchive> {
    let bytes = fs::read(path).context(format!("Failed to read archive: {path:?}"))?;
    let archive = ConversationsArchive::from_json_bytes(&bytes)
        .context(format!("Failed to decode archive: {path:?}"))?;
    Ok(archive)
}
