//! Project domain model.
//!
//! A project owns its conversations by composition: deleting the project
//! deletes every nested conversation with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stealthy_types::FlagColor;
use uuid::Uuid;

use crate::conversation::Conversation;

/// A named group of conversations with its own tags, flag, and icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_color: Option<FlagColor>,
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_icon_symbol")]
    pub icon_symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<FlagColor>,
}

fn default_icon_symbol() -> String {
    "folder".to_string()
}

impl Project {
    /// Creates an empty project stamped with the current time.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            updated_at: Utc::now(),
            flagged_at: None,
            flag_color: None,
            conversations: Vec::new(),
            tags: Vec::new(),
            icon_symbol: default_icon_symbol(),
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

    pub fn conversation(&self, id: Uuid) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn conversation_mut(&mut self, id: Uuid) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_defaults() {
        let project = Project::new("Notes", "");

        assert_eq!(project.icon_symbol, "folder");
        assert!(project.conversations.is_empty());
        assert!(project.tags.is_empty());
        assert!(!project.is_flagged());
    }

    #[test]
    fn test_decode_defaults_missing_fields() {
        // The older schema lacked tags and icon fields.
        let json = r#"{
            "id": "37cf1f8c-3e9b-4a8a-8f59-6f5d3bb2a90f",
            "title": "Legacy",
            "description": "from an old file",
            "updatedAt": "2024-01-01T00:00:00Z",
            "conversations": []
        }"#;

        let decoded: Project = serde_json::from_str(json).unwrap();

        assert!(decoded.tags.is_empty());
        assert_eq!(decoded.icon_symbol, "folder");
        assert!(decoded.icon_color.is_none());
    }

    #[test]
    fn test_round_trip() {
        let mut project = Project::new("Trip", "round");
        project.conversations.push(Conversation::new("Nested"));
        project.tags = vec!["work".to_string()];

        let json = serde_json::to_string(&project).unwrap();
        let decoded: Project = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, project);
    }
}
