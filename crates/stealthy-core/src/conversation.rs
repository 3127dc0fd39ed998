//! Conversation domain model and the versioned archive envelope.
//!
//! Wire names stay camelCase to match existing data files, and every
//! field added after the first schema version decodes with a default so
//! old archives load into the current model without error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stealthy_types::{FlagColor, Message, Pin};
use uuid::Uuid;

use crate::error::Result;

/// Maximum number of characters of the first message used as the title.
pub const TITLE_MAX_CHARS: usize = 30;

/// Default title for conversations that haven't derived one yet.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Maximum number of tags kept on a conversation or project.
pub const MAX_TAGS: usize = 10;

/// Current archive schema version.
pub const ARCHIVE_VERSION: u32 = 1;

/// A single conversation with its ordered message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_color: Option<FlagColor>,
    #[serde(flatten)]
    pub pin: Pin,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<FlagColor>,
}

impl Conversation {
    /// Creates an empty conversation stamped with the current time.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            is_archived: false,
            flagged_at: None,
            flag_color: None,
            pin: Pin::Unpinned,
            tags: Vec::new(),
            icon_symbol: None,
            icon_color: None,
        }
    }

    /// Refreshes the modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged_at.is_some()
    }

    /// True until the user renamed the conversation or a title was
    /// derived from its first message. Only a default title may be
    /// replaced by derivation.
    pub fn has_default_title(&self) -> bool {
        self.title.is_empty() || self.title == DEFAULT_TITLE
    }
}

/// Derives a conversation title from the first user message.
///
/// Takes the first [`TITLE_MAX_CHARS`] characters of the trimmed text and
/// appends an ellipsis when truncated. Returns `None` for blank input.
pub fn title_from_first_message(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut title: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        title.push('…');
    }
    Some(title)
}

/// Trims tags, drops empty entries, and caps the list at [`MAX_TAGS`].
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .take(MAX_TAGS)
        .collect()
}

/// Versioned envelope around a list of conversations.
///
/// This is the on-disk and export schema; the version field enables
/// future migrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationsArchive {
    pub version: u32,
    pub conversations: Vec<Conversation>,
}

impl ConversationsArchive {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            version: ARCHIVE_VERSION,
            conversations,
        }
    }

    /// Decodes the versioned envelope, falling back to the legacy format
    /// of a bare conversation array.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        if let Ok(archive) = serde_json::from_slice::<ConversationsArchive>(bytes) {
            return Ok(archive);
        }

        let conversations = serde_json::from_slice::<Vec<Conversation>>(bytes)?;
        Ok(Self::new(conversations))
    }
}
