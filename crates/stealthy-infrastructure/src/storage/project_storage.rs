//! Persistence gateway for the projects file.
//!
//! Projects are stored as a bare JSON array in their own file, with the
//! same best-effort load and atomic save discipline as the conversations
//! gateway.

use anyhow::{Context, Result};
use std::path::Path;

use stealthy_core::project::Project;
use stealthy_core::repository::ProjectRepository;

use super::atomic_json::AtomicJsonFile;
use crate::paths::StealthyPaths;

/// Manages project persistence to the filesystem.
pub struct ProjectStorage {
    file: AtomicJsonFile<Vec<Project>>,
}

impl ProjectStorage {
    /// Creates a storage handle for the given file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: AtomicJsonFile::new(path.as_ref().to_path_buf()),
        }
    }

    /// Creates a storage handle at the default platform location.
    pub fn default_location() -> Result<Self> {
        let path =
            StealthyPaths::projects_file().context("Failed to resolve projects file path")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Loads projects, degrading to an empty list on any failure.
    pub fn load(&self) -> Vec<Project> {
        match self.try_load() {
            Ok(projects) => projects,
            Err(error) => {
                tracing::error!("Failed to load projects, starting empty: {error:#}");
                Vec::new()
            }
        }
    }

    /// Loads projects, reporting failures to the caller. A missing file
    /// yields an empty list.
    pub fn try_load(&self) -> Result<Vec<Project>> {
        Ok(self.file.load()?.unwrap_or_default())
    }

    /// Saves projects, logging and swallowing failures.
    pub fn save(&self, projects: &[Project]) {
        if let Err(error) = self.try_save(projects) {
            tracing::error!("Failed to save projects: {error:#}");
        }
    }

    /// Saves projects atomically as a bare array.
    pub fn try_save(&self, projects: &[Project]) -> Result<()> {
        self.file.save(&projects.to_vec())
    }
}

impl ProjectRepository for ProjectStorage {
    fn load(&self) -> Vec<Project> {
        ProjectStorage::load(self)
    }

    fn save(&self, projects: &[Project]) {
        ProjectStorage::save(self, projects);
    }
}
