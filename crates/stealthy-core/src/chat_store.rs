//! Conversation aggregate: selection, drafts, messaging, mutation,
//! import/export staging, and the pairing session lifecycle.
//!
//! All state lives behind a single `RwLock`; every mutation takes the
//! write lock and persists through the repository before releasing it.
//! The simulated assistant reply runs as a spawned task that re-validates
//! its target ids before every append, so deleting a conversation
//! mid-stream terminates the stream without error.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use stealthy_types::{FlagColor, Message, MessageRole};

use crate::config::{AppConfig, TypingConfig};
use crate::conversation::{
    Conversation, ConversationsArchive, DEFAULT_TITLE, normalize_tags, title_from_first_message,
};
use crate::error::{Result, StealthyError};
use crate::pairing::{PairingService, PairingToken, unsigned_deep_link};
use crate::repository::ConversationRepository;

/// A user-visible alert with a title and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

/// An unpersisted conversation-in-progress.
///
/// Becomes a real conversation only once the first message is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub temp_id: Uuid,
    pub title: String,
}

impl Draft {
    fn new() -> Self {
        Self {
            temp_id: Uuid::new_v4(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Ephemeral state of an open pairing sheet.
#[derive(Debug, Clone)]
pub struct PairingSession {
    pub token: PairingToken,
    pub deep_link: Option<Url>,
    regenerate_disabled_until: Option<DateTime<Utc>>,
}

struct ChatState {
    conversations: Vec<Conversation>,
    selected_id: Option<Uuid>,
    draft: Option<Draft>,
    pending_import: Option<ConversationsArchive>,
    pairing: Option<PairingSession>,
    alert: Option<Alert>,
    replies: HashMap<Uuid, CancellationToken>,
}

/// Owns the standalone conversation list and everything that mutates it.
pub struct ChatStore {
    state: Arc<RwLock<ChatState>>,
    repository: Arc<dyn ConversationRepository>,
    pairing_service: Arc<dyn PairingService>,
    config: AppConfig,
}

impl ChatStore {
    /// Creates a store, loading conversations from the repository.
    ///
    /// Nothing is selected initially; the user picks a conversation or
    /// starts a draft.
    pub fn new(
        repository: Arc<dyn ConversationRepository>,
        pairing_service: Arc<dyn PairingService>,
        config: AppConfig,
    ) -> Self {
        let conversations = repository.load();

        Self {
            state: Arc::new(RwLock::new(ChatState {
                conversations,
                selected_id: None,
                draft: None,
                pending_import: None,
                pairing: None,
                alert: None,
                replies: HashMap::new(),
            })),
            repository,
            pairing_service,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.state.read().await.conversations.clone()
    }

    pub async fn conversation(&self, id: Uuid) -> Option<Conversation> {
        let guard = self.state.read().await;
        guard.conversations.iter().find(|c| c.id == id).cloned()
    }

    pub async fn selected_id(&self) -> Option<Uuid> {
        self.state.read().await.selected_id
    }

    pub async fn selected_conversation(&self) -> Option<Conversation> {
        let guard = self.state.read().await;
        let id = guard.selected_id?;
        guard.conversations.iter().find(|c| c.id == id).cloned()
    }

    /// Selects an existing conversation.
    pub async fn select(&self, id: Uuid) {
        let mut guard = self.state.write().await;
        if guard.conversations.iter().any(|c| c.id == id) {
            guard.selected_id = Some(id);
        }
    }

    /// Takes the pending user-visible alert, if any.
    pub async fn take_alert(&self) -> Option<Alert> {
        self.state.write().await.alert.take()
    }

    // ------------------------------------------------------------------
    // Draft lifecycle
    // ------------------------------------------------------------------

    /// Starts a new conversation as a draft; nothing is persisted until
    /// the first message is sent. Returns the draft's temporary id, which
    /// becomes the current selection so routing works.
    pub async fn start_draft(&self) -> Uuid {
        let mut guard = self.state.write().await;
        let draft = Draft::new();
        let temp_id = draft.temp_id;
        guard.draft = Some(draft);
        guard.selected_id = Some(temp_id);
        temp_id
    }

    /// Discards the current draft without persisting anything. The
    /// selection is left for the caller's navigation to update.
    pub async fn discard_draft(&self) {
        self.state.write().await.draft = None;
    }

    pub async fn is_drafting(&self) -> bool {
        let guard = self.state.read().await;
        match &guard.draft {
            Some(draft) => guard.selected_id == Some(draft.temp_id),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Messaging
    // ------------------------------------------------------------------

    /// Sends a user message to the current draft or selection.
    ///
    /// Blank input is a no-op. Committing a draft creates the real
    /// conversation titled from this first message and inserts it at the
    /// head of the list. Either way the assistant reply simulation is
    /// scheduled afterwards.
    pub async fn send(&self, text: &str) {
        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            return;
        }

        let scheduled = {
            let mut guard = self.state.write().await;

            let drafting = guard
                .draft
                .as_ref()
                .is_some_and(|draft| guard.selected_id == Some(draft.temp_id));

            let conversation_id = if drafting {
                let draft = match guard.draft.take() {
                    Some(draft) => draft,
                    None => return,
                };

                let title = title_from_first_message(&trimmed).unwrap_or(draft.title);
                let mut conversation = Conversation::new(title);
                conversation
                    .messages
                    .push(Message::new(trimmed.clone(), MessageRole::User));
                let id = conversation.id;

                guard.conversations.insert(0, conversation);
                guard.selected_id = Some(id);
                self.repository.save(&guard.conversations);
                id
            } else {
                let Some(id) = guard.selected_id else {
                    return;
                };
                let Some(conversation) = guard.conversations.iter_mut().find(|c| c.id == id)
                else {
                    return;
                };

                if conversation.messages.is_empty() && conversation.has_default_title() {
                    if let Some(title) = title_from_first_message(&trimmed) {
                        conversation.title = title;
                    }
                }

                conversation
                    .messages
                    .push(Message::new(trimmed.clone(), MessageRole::User));
                conversation.touch();
                self.repository.save(&guard.conversations);
                id
            };

            let cancel = CancellationToken::new();
            guard.replies.insert(conversation_id, cancel.clone());
            (conversation_id, cancel)
        };

        let (conversation_id, cancel) = scheduled;
        self.spawn_reply(conversation_id, trimmed, cancel);
    }

    fn spawn_reply(&self, conversation_id: Uuid, user_text: String, cancel: CancellationToken) {
        let state = Arc::clone(&self.state);
        let repository = Arc::clone(&self.repository);
        let typing = self.config.typing.clone();

        tokio::spawn(async move {
            run_reply(state, repository, typing, conversation_id, user_text, cancel).await;
        });
    }

    // ------------------------------------------------------------------
    // Conversation management
    // ------------------------------------------------------------------

    /// Creates and selects a new empty conversation immediately.
    pub async fn create_conversation(&self, title: &str) -> Uuid {
        let mut guard = self.state.write().await;
        let conversation = Conversation::new(title);
        let id = conversation.id;
        guard.conversations.insert(0, conversation);
        guard.selected_id = Some(id);
        self.repository.save(&guard.conversations);
        id
    }

    /// Deletes the given conversation only if it contains no messages.
    /// Used to discard abandoned empty conversations on navigation-away.
    pub async fn delete_if_empty(&self, id: Uuid) {
        let is_empty = {
            let guard = self.state.read().await;
            guard
                .conversations
                .iter()
                .find(|c| c.id == id)
                .is_some_and(|c| c.messages.is_empty())
        };

        if is_empty {
            self.delete(id).await;
        }
    }

    /// Deletes a conversation, cancelling any reply still streaming into
    /// it. A deleted selection moves to the first remaining non-archived
    /// conversation, or clears.
    pub async fn delete(&self, id: Uuid) {
        let mut guard = self.state.write().await;
        let Some(idx) = guard.conversations.iter().position(|c| c.id == id) else {
            return;
        };

        if let Some(cancel) = guard.replies.remove(&id) {
            cancel.cancel();
        }

        if guard.selected_id == Some(id) {
            let next = guard
                .conversations
                .iter()
                .find(|c| !c.is_archived && c.id != id)
                .map(|c| c.id);
            guard.selected_id = next;
        }

        guard.conversations.remove(idx);
        self.repository.save(&guard.conversations);
    }

    /// Renames a conversation. Blank titles are ignored.
    pub async fn rename(&self, id: Uuid, new_title: &str) {
        let trimmed = new_title.trim();
        if trimmed.is_empty() {
            return;
        }

        self.mutate(id, |conversation| {
            conversation.title = trimmed.to_string();
        })
        .await;
    }

    /// Hides a conversation from the active list without deleting it.
    /// Archiving the current selection clears it.
    pub async fn archive(&self, id: Uuid) {
        let mut guard = self.state.write().await;
        let Some(conversation) = guard.conversations.iter_mut().find(|c| c.id == id) else {
            return;
        };

        conversation.is_archived = true;
        conversation.touch();

        if guard.selected_id == Some(id) {
            guard.selected_id = None;
        }

        self.repository.save(&guard.conversations);
    }

    pub async fn unarchive(&self, id: Uuid) {
        self.mutate(id, |conversation| {
            conversation.is_archived = false;
        })
        .await;
    }

    /// Flags a conversation; the timestamp and color are always set
    /// together.
    pub async fn flag(&self, id: Uuid, color: FlagColor) {
        self.mutate(id, |conversation| {
            conversation.flagged_at = Some(Utc::now());
            conversation.flag_color = Some(color);
        })
        .await;
    }

    /// Clears the flag timestamp and color together.
    pub async fn unflag(&self, id: Uuid) {
        self.mutate(id, |conversation| {
            conversation.flagged_at = None;
            conversation.flag_color = None;
        })
        .await;
    }

    pub async fn toggle_pin(&self, id: Uuid) {
        self.mutate(id, |conversation| {
            conversation.pin = conversation.pin.toggled();
        })
        .await;
    }

    /// Replaces a conversation's tags, trimmed and capped.
    pub async fn set_tags(&self, id: Uuid, tags: &[String]) {
        let normalized = normalize_tags(tags);
        self.mutate(id, move |conversation| {
            conversation.tags = normalized;
        })
        .await;
    }

    pub async fn set_icon(&self, id: Uuid, symbol: Option<String>, color: Option<FlagColor>) {
        self.mutate(id, move |conversation| {
            conversation.icon_symbol = symbol;
            conversation.icon_color = color;
        })
        .await;
    }

    /// Applies a mutation to one conversation, bumps its timestamp, and
    /// persists.
    async fn mutate<F>(&self, id: Uuid, apply: F)
    where
        F: FnOnce(&mut Conversation),
    {
        let mut guard = self.state.write().await;
        let Some(conversation) = guard.conversations.iter_mut().find(|c| c.id == id) else {
            return;
        };

        apply(conversation);
        conversation.touch();
        self.repository.save(&guard.conversations);
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    /// Wraps all conversations in the versioned archive for the external
    /// file-write collaborator.
    pub async fn export_archive(&self) -> ConversationsArchive {
        let guard = self.state.read().await;
        ConversationsArchive::new(guard.conversations.clone())
    }

    /// Records the outcome of an export handed to the collaborator.
    pub async fn finish_export(&self, result: std::result::Result<String, StealthyError>) {
        let mut guard = self.state.write().await;
        let alert = match result {
            Ok(file_name) => Alert {
                title: "Export Successful".to_string(),
                message: format!(
                    "{} conversation(s) exported to {file_name}",
                    guard.conversations.len()
                ),
            },
            Err(error) => Alert {
                title: "Export Failed".to_string(),
                message: format!("Could not export conversations: {error}"),
            },
        };
        guard.alert = Some(alert);
    }

    /// Reads and decodes an archive from the picked file, staging it as
    /// pending. Nothing is replaced until [`Self::confirm_import`];
    /// decode failures abort before any state mutation.
    pub async fn begin_import(&self, path: &Path) -> Result<usize> {
        let outcome = std::fs::read(path)
            .map_err(StealthyError::from)
            .and_then(|bytes| ConversationsArchive::from_json_bytes(&bytes));

        match outcome {
            Ok(archive) => {
                let count = archive.conversations.len();
                let mut guard = self.state.write().await;
                guard.pending_import = Some(archive);
                Ok(count)
            }
            Err(error) => {
                let mut guard = self.state.write().await;
                guard.alert = Some(Alert {
                    title: "Import Failed".to_string(),
                    message: format!("Could not import conversations: {error}"),
                });
                Err(error)
            }
        }
    }

    /// Number of conversations in the staged import, if one is pending.
    pub async fn pending_import(&self) -> Option<usize> {
        let guard = self.state.read().await;
        guard
            .pending_import
            .as_ref()
            .map(|archive| archive.conversations.len())
    }

    /// Replaces the entire conversation list with the staged archive and
    /// persists. All-or-nothing: cannot fail once the archive is decoded.
    pub async fn confirm_import(&self) {
        let mut guard = self.state.write().await;
        let Some(archive) = guard.pending_import.take() else {
            return;
        };

        // In-flight replies target conversations that are being replaced.
        for (_, cancel) in guard.replies.drain() {
            cancel.cancel();
        }

        let count = archive.conversations.len();
        let version = archive.version;

        guard.conversations = archive.conversations;
        let first = guard.conversations.first().map(|c| c.id);
        guard.selected_id = first;
        self.repository.save(&guard.conversations);

        guard.alert = Some(Alert {
            title: "Import Successful".to_string(),
            message: format!("Imported {count} conversation(s) (version {version})"),
        });
    }

    /// Drops the staged archive, leaving the existing list untouched.
    pub async fn cancel_import(&self) {
        self.state.write().await.pending_import = None;
    }

    // ------------------------------------------------------------------
    // Pairing session
    // ------------------------------------------------------------------

    /// Opens a pairing session with a freshly generated token.
    pub async fn open_pairing(&self) -> PairingSession {
        let session = self.new_pairing_session();
        self.state.write().await.pairing = Some(session.clone());
        session
    }

    /// Regenerates the pairing token, throttled to at most once per
    /// cooldown interval. Calls inside the window are silently ignored
    /// and return the current session unchanged.
    pub async fn regenerate_pairing(&self) -> Option<PairingSession> {
        let now = Utc::now();
        let mut guard = self.state.write().await;
        let current = guard.pairing.as_ref()?;

        if let Some(disabled_until) = current.regenerate_disabled_until {
            if now < disabled_until {
                return guard.pairing.clone();
            }
        }

        let mut session = self.new_pairing_session();
        session.regenerate_disabled_until =
            Some(now + Duration::seconds(self.config.pairing.regenerate_cooldown_secs));
        guard.pairing = Some(session.clone());
        Some(session)
    }

    pub async fn pairing_session(&self) -> Option<PairingSession> {
        self.state.read().await.pairing.clone()
    }

    pub async fn close_pairing(&self) {
        self.state.write().await.pairing = None;
    }

    fn new_pairing_session(&self) -> PairingSession {
        let ttl = Duration::seconds(self.config.pairing.token_ttl_secs);
        let token = self.pairing_service.generate_token(ttl);

        let deep_link = match self.pairing_service.deep_link(&token) {
            Ok(url) => Some(url),
            Err(error) => {
                tracing::warn!("pairing link signing failed, using unsigned link: {error}");
                unsigned_deep_link(&token)
            }
        };

        PairingSession {
            token,
            deep_link,
            regenerate_disabled_until: None,
        }
    }
}

/// Streams the simulated assistant reply into its conversation.
///
/// Aborts silently when the token fires or the target conversation or
/// message disappears; persists once at completion.
async fn run_reply(
    state: Arc<RwLock<ChatState>>,
    repository: Arc<dyn ConversationRepository>,
    typing: TypingConfig,
    conversation_id: Uuid,
    user_text: String,
    cancel: CancellationToken,
) {
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(typing.initial_delay()) => {}
    }

    // Start with an empty assistant message.
    let message_id = {
        let mut guard = state.write().await;
        let Some(conversation) = guard
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        else {
            return;
        };

        let message = Message::new("", MessageRole::Assistant);
        let id = message.id;
        conversation.messages.push(message);
        id
    };

    let response = format!("You said: {user_text}");
    for ch in response.chars() {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(typing.char_interval()) => {}
        }

        let mut guard = state.write().await;
        let Some(conversation) = guard
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        else {
            return;
        };
        let Some(message) = conversation.messages.iter_mut().find(|m| m.id == message_id)
        else {
            return;
        };

        message.content.push(ch);
    }

    let mut guard = state.write().await;
    let Some(conversation) = guard
        .conversations
        .iter_mut()
        .find(|c| c.id == conversation_id)
    else {
        return;
    };

    conversation.touch();
    repository.save(&guard.conversations);
    guard.replies.remove(&conversation_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::HmacPairingService;
    use crate::secret::{MemorySecretStore, SecretStore};
    use std::sync::Mutex;
    use std::time::Duration as StdDuration;

    #[derive(Default)]
    struct MemoryRepository {
        saved: Mutex<Option<Vec<Conversation>>>,
    }

    impl MemoryRepository {
        fn last_saved(&self) -> Option<Vec<Conversation>> {
            self.saved.lock().unwrap().clone()
        }
    }

    impl ConversationRepository for MemoryRepository {
        fn load(&self) -> Vec<Conversation> {
            Vec::new()
        }

        fn save(&self, conversations: &[Conversation]) {
            *self.saved.lock().unwrap() = Some(conversations.to_vec());
        }
    }

    struct FailingSecretStore;

    impl SecretStore for FailingSecretStore {
        fn get_or_create(&self) -> crate::Result<Vec<u8>> {
            Err(StealthyError::security("keystore unavailable"))
        }

        fn reset(&self) -> crate::Result<()> {
            Ok(())
        }
    }

    fn fast_config() -> AppConfig {
        AppConfig {
            typing: TypingConfig {
                initial_delay_ms: 1,
                char_interval_ms: 1,
            },
            ..AppConfig::default()
        }
    }

    fn store_with(repository: Arc<MemoryRepository>) -> ChatStore {
        let secrets = Arc::new(MemorySecretStore::new());
        let pairing = Arc::new(HmacPairingService::new(secrets));
        ChatStore::new(repository, pairing, fast_config())
    }

    fn store() -> ChatStore {
        store_with(Arc::new(MemoryRepository::default()))
    }

    /// Polls until the selected conversation's last message matches the
    /// expected assistant reply.
    async fn wait_for_reply(store: &ChatStore, conversation_id: Uuid, expected: &str) {
        for _ in 0..500 {
            if let Some(conversation) = store.conversation(conversation_id).await {
                if conversation
                    .messages
                    .last()
                    .is_some_and(|m| m.role == MessageRole::Assistant && m.content == expected)
                {
                    return;
                }
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        panic!("assistant reply never completed");
    }

    #[tokio::test]
    async fn test_send_commits_draft() {
        let store = store();

        let temp_id = store.start_draft().await;
        assert!(store.is_drafting().await);
        assert_eq!(store.selected_id().await, Some(temp_id));

        store.send("Hello there").await;

        assert!(!store.is_drafting().await);
        let selected = store.selected_conversation().await.unwrap();
        assert_ne!(selected.id, temp_id);
        assert_eq!(selected.title, "Hello there");
        assert_eq!(selected.messages.len(), 1);
        assert_eq!(selected.messages[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_blank_send_is_ignored() {
        let store = store();
        store.start_draft().await;

        store.send("   \n  ").await;

        assert!(store.is_drafting().await);
        assert!(store.conversations().await.is_empty());
    }

    #[tokio::test]
    async fn test_title_derivation_caps_at_thirty_chars() {
        let store = store();
        store.start_draft().await;

        store.send(&"a".repeat(35)).await;

        let title = store.selected_conversation().await.unwrap().title;
        assert_eq!(title.chars().count(), 31);
        assert!(title.ends_with('…'));
    }

    #[tokio::test]
    async fn test_first_message_titles_existing_empty_conversation() {
        let store = store();
        let id = store.create_conversation("New Conversation").await;

        store.send("hi").await;

        assert_eq!(store.conversation(id).await.unwrap().title, "hi");
    }

    #[tokio::test]
    async fn test_first_message_preserves_renamed_title() {
        let store = store();
        let id = store.create_conversation("New Conversation").await;
        store.rename(id, "My notes").await;

        store.send("hello").await;

        assert_eq!(store.conversation(id).await.unwrap().title, "My notes");
    }

    #[tokio::test]
    async fn test_assistant_reply_streams_in() {
        let store = store();
        store.start_draft().await;

        store.send("ping").await;
        let id = store.selected_id().await.unwrap();

        wait_for_reply(&store, id, "You said: ping").await;

        let conversation = store.conversation(id).await.unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[0].role, MessageRole::User);
        assert_eq!(conversation.messages[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_deleting_mid_stream_aborts_reply() {
        let store = store();
        store.start_draft().await;

        store.send("disappearing").await;
        let id = store.selected_id().await.unwrap();

        store.delete(id).await;

        // Give the reply task time to observe the missing conversation.
        tokio::time::sleep(StdDuration::from_millis(100)).await;

        assert!(store.conversations().await.is_empty());
        assert_eq!(store.selected_id().await, None);
    }

    #[tokio::test]
    async fn test_delete_if_empty() {
        let store = store();
        let empty = store.create_conversation("empty").await;
        store.start_draft().await;
        store.send("not empty").await;
        let full = store.selected_id().await.unwrap();

        store.delete_if_empty(empty).await;
        store.delete_if_empty(full).await;

        let remaining = store.conversations().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, full);
    }

    #[tokio::test]
    async fn test_delete_selected_reassigns_to_non_archived() {
        let store = store();
        let first = store.create_conversation("first").await;
        let second = store.create_conversation("second").await;
        store.archive(first).await;

        let third = store.create_conversation("third").await;
        store.select(third).await;
        store.delete(third).await;

        // `first` is archived, so selection lands on `second`.
        assert_eq!(store.selected_id().await, Some(second));
    }

    #[tokio::test]
    async fn test_delete_only_conversation_clears_selection() {
        let store = store();
        let id = store.create_conversation("only").await;

        store.delete(id).await;

        assert_eq!(store.selected_id().await, None);
        assert!(store.conversations().await.is_empty());
    }

    #[tokio::test]
    async fn test_archiving_selected_clears_selection() {
        let store = store();
        let id = store.create_conversation("to archive").await;

        store.archive(id).await;

        assert_eq!(store.selected_id().await, None);
        assert!(store.conversation(id).await.unwrap().is_archived);

        store.unarchive(id).await;
        assert!(!store.conversation(id).await.unwrap().is_archived);
    }

    #[tokio::test]
    async fn test_flag_sets_timestamp_and_color_together() {
        let store = store();
        let id = store.create_conversation("flagged").await;

        store.flag(id, FlagColor::Teal).await;
        let conversation = store.conversation(id).await.unwrap();
        assert!(conversation.flagged_at.is_some());
        assert_eq!(conversation.flag_color, Some(FlagColor::Teal));

        store.unflag(id).await;
        let conversation = store.conversation(id).await.unwrap();
        assert!(conversation.flagged_at.is_none());
        assert!(conversation.flag_color.is_none());
    }

    #[tokio::test]
    async fn test_double_toggle_pin_is_idempotent() {
        let store = store();
        let id = store.create_conversation("pinned").await;

        store.toggle_pin(id).await;
        let pinned = store.conversation(id).await.unwrap().pin;
        assert!(pinned.is_pinned());

        store.toggle_pin(id).await;
        let unpinned = store.conversation(id).await.unwrap().pin;
        assert!(!unpinned.is_pinned());
        assert!(unpinned.pinned_at().is_none());
    }

    #[tokio::test]
    async fn test_set_tags_normalizes() {
        let store = store();
        let id = store.create_conversation("tagged").await;

        let tags: Vec<String> = vec![" rust ", "", "notes"].into_iter().map(String::from).collect();
        store.set_tags(id, &tags).await;

        assert_eq!(
            store.conversation(id).await.unwrap().tags,
            vec!["rust", "notes"]
        );
    }

    #[tokio::test]
    async fn test_rename_ignores_blank_titles() {
        let store = store();
        let id = store.create_conversation("original").await;

        store.rename(id, "   ").await;
        assert_eq!(store.conversation(id).await.unwrap().title, "original");

        store.rename(id, "  renamed  ").await;
        assert_eq!(store.conversation(id).await.unwrap().title, "renamed");
    }

    #[tokio::test]
    async fn test_mutations_persist() {
        let repository = Arc::new(MemoryRepository::default());
        let store = store_with(repository.clone());

        let id = store.create_conversation("persisted").await;
        store.flag(id, FlagColor::Red).await;

        let saved = repository.last_saved().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].flag_color, Some(FlagColor::Red));
    }

    #[tokio::test]
    async fn test_export_archive_wraps_everything() {
        let store = store();
        store.create_conversation("one").await;
        store.create_conversation("two").await;

        let archive = store.export_archive().await;

        assert_eq!(archive.version, 1);
        assert_eq!(archive.conversations.len(), 2);
    }

    #[tokio::test]
    async fn test_export_outcome_alerts() {
        let store = store();
        store.create_conversation("one").await;

        store.finish_export(Ok("backup.json".to_string())).await;
        let alert = store.take_alert().await.unwrap();
        assert_eq!(alert.title, "Export Successful");
        assert!(alert.message.contains("backup.json"));

        store
            .finish_export(Err(StealthyError::io("disk full")))
            .await;
        let alert = store.take_alert().await.unwrap();
        assert_eq!(alert.title, "Export Failed");
    }

    #[tokio::test]
    async fn test_import_confirm_replaces_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        let incoming = ConversationsArchive::new(vec![
            Conversation::new("imported one"),
            Conversation::new("imported two"),
        ]);
        std::fs::write(&path, serde_json::to_vec(&incoming).unwrap()).unwrap();

        let store = store();
        store.create_conversation("existing").await;

        let count = store.begin_import(&path).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.pending_import().await, Some(2));

        // Staging alone must not touch the list.
        assert_eq!(store.conversations().await.len(), 1);

        store.confirm_import().await;

        let conversations = store.conversations().await;
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].title, "imported one");
        assert_eq!(store.selected_id().await, Some(conversations[0].id));
        assert_eq!(store.take_alert().await.unwrap().title, "Import Successful");
    }

    #[tokio::test]
    async fn test_import_cancel_leaves_list_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        let incoming = ConversationsArchive::new(vec![Conversation::new("imported")]);
        std::fs::write(&path, serde_json::to_vec(&incoming).unwrap()).unwrap();

        let store = store();
        let existing = store.create_conversation("existing").await;

        store.begin_import(&path).await.unwrap();
        store.cancel_import().await;

        assert_eq!(store.pending_import().await, None);
        let conversations = store.conversations().await;
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id, existing);

        store.confirm_import().await;
        assert_eq!(store.conversations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_import_legacy_bare_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let legacy = vec![Conversation::new("old style")];
        std::fs::write(&path, serde_json::to_vec(&legacy).unwrap()).unwrap();

        let store = store();
        let count = store.begin_import(&path).await.unwrap();

        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_import_malformed_file_alerts_without_staging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not an archive").unwrap();

        let store = store();
        store.create_conversation("existing").await;

        assert!(store.begin_import(&path).await.is_err());
        assert_eq!(store.pending_import().await, None);
        assert_eq!(store.conversations().await.len(), 1);
        assert_eq!(store.take_alert().await.unwrap().title, "Import Failed");
    }

    #[tokio::test]
    async fn test_open_pairing_produces_signed_link() {
        let store = store();

        let session = store.open_pairing().await;

        assert!(!session.token.is_expired());
        let url = session.deep_link.unwrap();
        assert_eq!(url.scheme(), "stealthyai");
        assert!(url.query().unwrap().contains("sig="));
    }

    #[tokio::test]
    async fn test_pairing_falls_back_to_unsigned_link() {
        let repository = Arc::new(MemoryRepository::default());
        let pairing = Arc::new(HmacPairingService::new(Arc::new(FailingSecretStore)));
        let store = ChatStore::new(repository, pairing, fast_config());

        let session = store.open_pairing().await;

        let url = session.deep_link.unwrap();
        assert!(url.query().is_none());
        assert!(url.path().contains(&session.token.uuid.to_string()));
    }

    #[tokio::test]
    async fn test_regenerate_is_throttled() {
        let store = store();
        let opened = store.open_pairing().await;

        // The first regeneration is allowed and arms the cooldown.
        let first = store.regenerate_pairing().await.unwrap();
        assert_ne!(first.token.uuid, opened.token.uuid);

        // A second call inside the window is a silent no-op.
        let second = store.regenerate_pairing().await.unwrap();
        assert_eq!(second.token.uuid, first.token.uuid);
    }

    #[tokio::test]
    async fn test_close_pairing_clears_session() {
        let store = store();
        store.open_pairing().await;

        store.close_pairing().await;

        assert!(store.pairing_session().await.is_none());
        assert!(store.regenerate_pairing().await.is_none());
    }
}
