//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod layout;
pub mod mutation;
pub mod review;

pub use arena::{Forest, NodeData, OrgNode, OutlineEntry};
pub use builder::{HierarchyBuilder, UnresolvedParentPolicy};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use geometry::{Bounds, Point, Rect};
pub use gesture::{DragController, DragOutcome, DragState, Gesture, Scene, Viewport};
pub use layout::{Layout, LayoutConfig, LayoutEngine, LayoutPolicy, PositionedNode};
pub use mutation::{MutationEngine, MutationPlan, Reassignment};
pub use review::{next_payroll_date, NoticeParty, ReviewNotice, ReviewPlanner};
