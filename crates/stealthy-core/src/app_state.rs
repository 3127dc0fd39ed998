//! Application-level navigation state.
//!
//! The sidebar selection is a tagged union dispatched by exhaustive
//! matching, held by an explicit [`AppState`] value constructed once at
//! startup and passed to consumers.

use uuid::Uuid;

/// What the sidebar currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarSelection {
    /// The projects overview.
    Projects,
    /// A single project.
    Project(Uuid),
    /// A standalone conversation.
    Conversation(Uuid),
}

/// Navigation state shared by the UI collaborators.
#[derive(Debug, Clone)]
pub struct AppState {
    selection: SidebarSelection,
}

impl AppState {
    /// Starts at the projects overview.
    pub fn new() -> Self {
        Self {
            selection: SidebarSelection::Projects,
        }
    }

    pub fn selection(&self) -> SidebarSelection {
        self.selection
    }

    pub fn show_projects(&mut self) {
        self.selection = SidebarSelection::Projects;
    }

    pub fn select_project(&mut self, id: Uuid) {
        self.selection = SidebarSelection::Project(id);
    }

    pub fn select_conversation(&mut self, id: Uuid) {
        self.selection = SidebarSelection::Conversation(id);
    }

    /// Falls back to the projects overview when the selected project is
    /// deleted.
    pub fn clear_if_project(&mut self, id: Uuid) {
        match self.selection {
            SidebarSelection::Project(selected) if selected == id => {
                self.selection = SidebarSelection::Projects;
            }
            SidebarSelection::Projects
            | SidebarSelection::Project(_)
            | SidebarSelection::Conversation(_) => {}
        }
    }

    /// Falls back to the projects overview when the selected conversation
    /// is deleted.
    pub fn clear_if_conversation(&mut self, id: Uuid) {
        match self.selection {
            SidebarSelection::Conversation(selected) if selected == id => {
                self.selection = SidebarSelection::Projects;
            }
            SidebarSelection::Projects
            | SidebarSelection::Project(_)
            | SidebarSelection::Conversation(_) => {}
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
