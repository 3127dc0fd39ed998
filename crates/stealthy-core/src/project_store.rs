//! Project aggregate: the project list with nested conversations.
//!
//! Mirrors the chat store's conversation operations at
//! `(project_id, conversation_id)` scope. Every nested mutation bumps the
//! parent project's timestamp so sort-by-recency reflects nested
//! activity.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use stealthy_types::{FlagColor, Message, MessageRole};

use crate::conversation::{Conversation, normalize_tags, title_from_first_message};
use crate::project::Project;
use crate::repository::ProjectRepository;

struct ProjectState {
    projects: Vec<Project>,
}

/// Owns the project list and everything that mutates it.
pub struct ProjectStore {
    state: Arc<RwLock<ProjectState>>,
    repository: Arc<dyn ProjectRepository>,
}

impl ProjectStore {
    /// Creates a store, loading projects from the repository.
    pub fn new(repository: Arc<dyn ProjectRepository>) -> Self {
        let projects = repository.load();

        Self {
            state: Arc::new(RwLock::new(ProjectState { projects })),
            repository,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub async fn projects(&self) -> Vec<Project> {
        self.state.read().await.projects.clone()
    }

    pub async fn project(&self, id: Uuid) -> Option<Project> {
        let guard = self.state.read().await;
        guard.projects.iter().find(|p| p.id == id).cloned()
    }

    /// Pinned conversations across all projects, most recently pinned
    /// first. Aggregation only; the conversations stay owned by their
    /// projects.
    pub async fn pinned_conversations(&self) -> Vec<(Uuid, Conversation)> {
        let guard = self.state.read().await;
        let mut pinned: Vec<(Uuid, Conversation)> = guard
            .projects
            .iter()
            .flat_map(|project| {
                project
                    .conversations
                    .iter()
                    .filter(|c| c.pin.is_pinned())
                    .map(|c| (project.id, c.clone()))
            })
            .collect();

        pinned.sort_by(|(_, a), (_, b)| b.pin.pinned_at().cmp(&a.pin.pinned_at()));
        pinned
    }

    // ------------------------------------------------------------------
    // Project management
    // ------------------------------------------------------------------

    /// Creates a project at the head of the list.
    pub async fn create_project(
        &self,
        title: &str,
        description: &str,
        icon_symbol: Option<String>,
        icon_color: Option<FlagColor>,
    ) -> Uuid {
        let mut guard = self.state.write().await;

        let mut project = Project::new(title, description);
        if let Some(symbol) = icon_symbol {
            project.icon_symbol = symbol;
        }
        project.icon_color = icon_color;

        let id = project.id;
        guard.projects.insert(0, project);
        self.repository.save(&guard.projects);
        id
    }

    /// Updates a project's title, description, tags, and optionally its
    /// icon.
    pub async fn update_project(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
        tags: &[String],
        icon_symbol: Option<String>,
        icon_color: Option<FlagColor>,
    ) {
        let mut guard = self.state.write().await;
        let Some(project) = guard.projects.iter_mut().find(|p| p.id == id) else {
            return;
        };

        project.title = title.to_string();
        project.description = description.to_string();
        project.tags = normalize_tags(tags);
        if let Some(symbol) = icon_symbol {
            project.icon_symbol = symbol;
        }
        if icon_color.is_some() {
            project.icon_color = icon_color;
        }
        project.touch();

        self.repository.save(&guard.projects);
    }

    /// Deletes a project and, by composition, all of its conversations.
    pub async fn delete_project(&self, id: Uuid) {
        let mut guard = self.state.write().await;
        let before = guard.projects.len();
        guard.projects.retain(|p| p.id != id);

        if guard.projects.len() != before {
            self.repository.save(&guard.projects);
        }
    }

    /// Flags a project; timestamp and color are always set together.
    pub async fn flag_project(&self, id: Uuid, color: FlagColor) {
        let mut guard = self.state.write().await;
        let Some(project) = guard.projects.iter_mut().find(|p| p.id == id) else {
            return;
        };

        project.flagged_at = Some(Utc::now());
        project.flag_color = Some(color);
        project.touch();
        self.repository.save(&guard.projects);
    }

    pub async fn unflag_project(&self, id: Uuid) {
        let mut guard = self.state.write().await;
        let Some(project) = guard.projects.iter_mut().find(|p| p.id == id) else {
            return;
        };

        project.flagged_at = None;
        project.flag_color = None;
        project.touch();
        self.repository.save(&guard.projects);
    }

    // ------------------------------------------------------------------
    // Nested conversation management
    // ------------------------------------------------------------------

    /// Creates an empty conversation inside a project.
    pub async fn create_conversation(&self, project_id: Uuid, title: &str) -> Option<Uuid> {
        let mut guard = self.state.write().await;
        let project = guard.projects.iter_mut().find(|p| p.id == project_id)?;

        let conversation = Conversation::new(title);
        let id = conversation.id;
        project.conversations.push(conversation);
        project.touch();

        self.repository.save(&guard.projects);
        Some(id)
    }

    /// Appends a message to a nested conversation, deriving the title
    /// from the first message exactly as the chat store does.
    pub async fn add_message(
        &self,
        project_id: Uuid,
        conversation_id: Uuid,
        content: &str,
        role: MessageRole,
    ) {
        let content = content.to_string();
        self.with_conversation(project_id, conversation_id, move |conversation| {
            if conversation.messages.is_empty() && conversation.has_default_title() {
                if let Some(title) = title_from_first_message(&content) {
                    conversation.title = title;
                }
            }
            conversation.messages.push(Message::new(content, role));
        })
        .await;
    }

    pub async fn delete_conversation(&self, project_id: Uuid, conversation_id: Uuid) {
        let mut guard = self.state.write().await;
        let Some(project) = guard.projects.iter_mut().find(|p| p.id == project_id) else {
            return;
        };

        let before = project.conversations.len();
        project.conversations.retain(|c| c.id != conversation_id);
        if project.conversations.len() == before {
            return;
        }

        project.touch();
        self.repository.save(&guard.projects);
    }

    /// Renames a nested conversation. Blank titles are ignored.
    pub async fn rename_conversation(
        &self,
        project_id: Uuid,
        conversation_id: Uuid,
        new_title: &str,
    ) {
        let trimmed = new_title.trim().to_string();
        if trimmed.is_empty() {
            return;
        }

        self.with_conversation(project_id, conversation_id, move |conversation| {
            conversation.title = trimmed;
        })
        .await;
    }

    pub async fn archive_conversation(&self, project_id: Uuid, conversation_id: Uuid) {
        self.with_conversation(project_id, conversation_id, |conversation| {
            conversation.is_archived = true;
        })
        .await;
    }

    pub async fn unarchive_conversation(&self, project_id: Uuid, conversation_id: Uuid) {
        self.with_conversation(project_id, conversation_id, |conversation| {
            conversation.is_archived = false;
        })
        .await;
    }

    pub async fn flag_conversation(
        &self,
        project_id: Uuid,
        conversation_id: Uuid,
        color: FlagColor,
    ) {
        self.with_conversation(project_id, conversation_id, move |conversation| {
            conversation.flagged_at = Some(Utc::now());
            conversation.flag_color = Some(color);
        })
        .await;
    }

    pub async fn unflag_conversation(&self, project_id: Uuid, conversation_id: Uuid) {
        self.with_conversation(project_id, conversation_id, |conversation| {
            conversation.flagged_at = None;
            conversation.flag_color = None;
        })
        .await;
    }

    pub async fn toggle_conversation_pin(&self, project_id: Uuid, conversation_id: Uuid) {
        self.with_conversation(project_id, conversation_id, |conversation| {
            conversation.pin = conversation.pin.toggled();
        })
        .await;
    }

    /// Applies a mutation to one nested conversation, bumps both the
    /// conversation's and the parent project's timestamps, and persists.
    async fn with_conversation<F>(&self, project_id: Uuid, conversation_id: Uuid, apply: F)
    where
        F: FnOnce(&mut Conversation),
    {
        let mut guard = self.state.write().await;
        let Some(project) = guard.projects.iter_mut().find(|p| p.id == project_id) else {
            return;
        };
        let Some(conversation) = project.conversation_mut(conversation_id) else {
            return;
        };

        apply(conversation);
        conversation.touch();
        project.touch();

        self.repository.save(&guard.projects);
    }
}
