//! Persistence gateway for the standalone conversations file.
//!
//! On disk the conversations live inside the versioned archive envelope;
//! the legacy format was a bare array of conversations and still decodes.
//! Loading is best-effort: a missing file yields an empty list and a
//! corrupt one is logged and degraded to empty, never an error to the
//! caller.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use stealthy_core::conversation::{Conversation, ConversationsArchive};
use stealthy_core::repository::ConversationRepository;

use super::atomic_json::AtomicJsonFile;
use crate::paths::StealthyPaths;

/// Manages conversation persistence to the filesystem.
pub struct ConversationStorage {
    file: AtomicJsonFile<ConversationsArchive>,
}

impl ConversationStorage {
    /// Creates a storage handle for the given file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: AtomicJsonFile::new(path.as_ref().to_path_buf()),
        }
    }

    /// Creates a storage handle at the default platform location.
    pub fn default_location() -> Result<Self> {
        let path = StealthyPaths::conversations_file()
            .context("Failed to resolve conversations file path")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Loads conversations, degrading to an empty list on any failure.
    pub fn load(&self) -> Vec<Conversation> {
        match self.try_load() {
            Ok(conversations) => conversations,
            Err(error) => {
                tracing::error!("Failed to load conversations, starting empty: {error:#}");
                Vec::new()
            }
        }
    }

    /// Loads conversations, reporting failures to the caller.
    ///
    /// A missing file is not a failure; it yields an empty list.
    pub fn try_load(&self) -> Result<Vec<Conversation>> {
        let path = self.file.path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let bytes =
            fs::read(path).context(format!("Failed to read conversations file: {path:?}"))?;

        let archive = ConversationsArchive::from_json_bytes(&bytes)
            .context("Failed to decode conversations file")?;

        Ok(archive.conversations)
    }

    /// Saves conversations, logging and swallowing failures. The
    /// in-memory state stays authoritative until the next successful
    /// save.
    pub fn save(&self, conversations: &[Conversation]) {
        if let Err(error) = self.try_save(conversations) {
            tracing::error!("Failed to save conversations: {error:#}");
        }
    }

    /// Saves conversations as the versioned envelope, atomically.
    pub fn try_save(&self, conversations: &[Conversation]) -> Result<()> {
        let archive = ConversationsArchive::new(conversations.to_vec());
        self.file.save(&archive)
    }
}

impl ConversationRepository for ConversationStorage {
    fn load(&self) -> Vec<Conversation> {
        ConversationStorage::load(self)
    }

    fn save(&self, conversations: &[Conversation]) {
        ConversationStorage::save(self, conversations);
    }
}
