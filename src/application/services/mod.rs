//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FlatStore, Confirmer)
//! but are themselves concrete structs, not traits.

mod hierarchy;
mod interaction;
mod review;

pub use hierarchy::HierarchyService;
pub use interaction::{DropResolution, InteractionService, RevertReason};
pub use review::ReviewService;
