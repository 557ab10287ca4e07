//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use crate::application::services::{DocumentService, Session};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::NodeCollection;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    documents: DocumentService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let documents = DocumentService::new(fs.clone(), settings.limits);

        Self {
            settings,
            fs,
            documents,
        }
    }

    pub fn documents(&self) -> &DocumentService {
        &self.documents
    }

    /// Session over `nodes` configured from the settings.
    pub fn session(&self, nodes: NodeCollection) -> ApplicationResult<Session> {
        Session::from_settings(&self.settings, nodes)
    }

    /// Load the document at `path` into a fresh session.
    pub fn open(&self, path: &Path) -> ApplicationResult<Session> {
        let nodes = self.documents.load(path)?;
        self.session(nodes)
    }
}
