//! Service container for dependency injection
//!
//! Wires up all services with their dependencies. One container per
//! invocation: it is the request-scoped context every handler receives.

use std::sync::Arc;

use crate::application::services::{HierarchyService, InteractionService, ReviewService};
use crate::config::Settings;
use crate::domain::LayoutEngine;
use crate::infrastructure::store::JsonFileStore;
use crate::infrastructure::traits::{
    Confirmer, FileSystem, FlatStore, RealFileSystem, StdinConfirmer,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Flat relation store
    pub store: Arc<dyn FlatStore>,

    /// Confirmation gate for mutations
    pub confirmer: Arc<dyn Confirmer>,

    hierarchy: Arc<HierarchyService>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = Arc::new(JsonFileStore::new(fs.clone(), settings.store_path.clone()));
        Self::with_deps(settings, fs, store, Arc::new(StdinConfirmer))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn FlatStore>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let settings = Arc::new(settings);
        let hierarchy = Arc::new(HierarchyService::new(
            store.clone(),
            settings.unresolved_parent,
        ));

        Self {
            settings,
            fs,
            store,
            confirmer,
            hierarchy,
        }
    }

    /// Same container with a different confirmation gate.
    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn hierarchy(&self) -> Arc<HierarchyService> {
        self.hierarchy.clone()
    }

    pub fn layout_engine(&self) -> LayoutEngine {
        LayoutEngine::new(self.settings.layout.clone())
    }

    pub fn interaction(&self) -> InteractionService {
        InteractionService::new(
            self.hierarchy(),
            self.confirmer.clone(),
            self.layout_engine(),
            self.settings.canvas.bounds(),
            self.settings.variant,
        )
    }

    pub fn review(&self) -> ReviewService {
        ReviewService::new(self.hierarchy(), self.settings.review.months_without_raise)
    }
}
