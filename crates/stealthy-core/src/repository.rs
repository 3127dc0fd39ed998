//! Persistence gateway traits.
//!
//! The stores persist through these traits; the infrastructure crate
//! provides the file-backed implementations.

use crate::conversation::Conversation;
use crate::project::Project;

/// Gateway to the conversations file.
///
/// Loads are best-effort: implementations degrade to an empty list when
/// the file is missing or cannot be decoded. Saves log and swallow
/// failures; the in-memory state remains the source of truth until the
/// next successful save.
pub trait ConversationRepository: Send + Sync {
    fn load(&self) -> Vec<Conversation>;
    fn save(&self, conversations: &[Conversation]);
}

/// Gateway to the projects file, with the same degradation contract as
/// [`ConversationRepository`].
pub trait ProjectRepository: Send + Sync {
    fn load(&self) -> Vec<Project>;
    fn save(&self, projects: &[Project]);
}
