//! Hierarchy fetch and reassignment service
//!
//! Every read rebuilds the forest from the flat store. Every write changes
//! exactly one row and is followed by a full rebuild.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::wire::{PersistRequest, PersistResponse};
use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{
    FlatRow, Forest, HierarchyBuilder, MutationEngine, MutationPlan, Reassignment,
    UnresolvedParentPolicy,
};
use crate::infrastructure::traits::FlatStore;

/// Service for fetching and re-parenting the employee hierarchy.
pub struct HierarchyService {
    store: Arc<dyn FlatStore>,
    builder: HierarchyBuilder,
}

impl HierarchyService {
    pub fn new(store: Arc<dyn FlatStore>, policy: UnresolvedParentPolicy) -> Self {
        Self {
            store,
            builder: HierarchyBuilder::new(policy),
        }
    }

    pub fn builder(&self) -> &HierarchyBuilder {
        &self.builder
    }

    /// Current rows of the flat relation.
    pub fn fetch_rows(&self) -> ApplicationResult<Vec<FlatRow>> {
        self.store.load().fetch_context("load flat relation")
    }

    /// Build the forest from the current store contents.
    pub fn fetch(&self) -> ApplicationResult<Forest> {
        let rows = self.fetch_rows()?;
        let forest = self.builder.build(&rows)?;
        debug!("fetch: {} employees", forest.len());
        Ok(forest)
    }

    /// Validate and persist `change`, then rebuild from the store.
    ///
    /// On any error the store is left untouched. A change that leaves the
    /// employee where it already is returns the current forest without a write.
    #[instrument(level = "debug", skip(self))]
    pub fn reassign(&self, change: &Reassignment) -> ApplicationResult<Forest> {
        let rows = self.fetch_rows()?;
        let forest = self.builder.build(&rows)?;
        let plan = MutationEngine::plan(&forest, &rows, change)?;

        let MutationPlan::Rewrite { after, .. } = &plan else {
            debug!("reassign: nothing to do for {}", change);
            return Ok(forest);
        };

        // The rewritten relation has to build before anything is written
        self.builder.build(&plan.apply_to(&rows))?;

        self.store
            .update_row(after)
            .persist_context(&format!("update row {}", after.id))?;
        info!("reassigned: {}", change);

        self.fetch()
    }

    /// Resolve a persist body against the current forest and apply it.
    pub fn apply(&self, request: &PersistRequest) -> ApplicationResult<Forest> {
        let forest = self.fetch()?;
        let change = request.to_reassignment(&forest)?;
        self.reassign(&change)
    }

    /// [`Self::apply`], reported in the endpoint's response shape.
    pub fn respond(&self, request: &PersistRequest) -> PersistResponse {
        match self.apply(request) {
            Ok(_) => PersistResponse::ok(),
            Err(e) => PersistResponse::failed(e.to_string()),
        }
    }
}
