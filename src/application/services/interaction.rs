//! Drop resolution: turns a finished drag gesture into a committed
//! reassignment or a revert.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::services::HierarchyService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::HierarchyVariant;
use crate::domain::{
    Bounds, DomainError, DragController, DragOutcome, EmployeeId, Forest, Layout, LayoutEngine,
    ParentRef, Point, Reassignment, Scene, Viewport,
};
use crate::infrastructure::traits::Confirmer;

/// Why a gesture left the store untouched.
#[derive(Debug)]
pub enum RevertReason {
    Cancelled,
    NoTarget,
    Declined,
    Rejected(ApplicationError),
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevertReason::Cancelled => f.write_str("drag cancelled"),
            RevertReason::NoTarget => f.write_str("dropped outside any employee"),
            RevertReason::Declined => f.write_str("reassignment not confirmed"),
            RevertReason::Rejected(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug)]
pub enum DropResolution {
    /// Persisted; `forest` and `layout` are rebuilt from the store afterwards.
    Committed {
        change: Reassignment,
        forest: Forest,
        layout: Layout,
    },
    /// Nothing persisted; render the previous layout again.
    Reverted { reason: RevertReason },
}

impl DropResolution {
    pub fn is_committed(&self) -> bool {
        matches!(self, DropResolution::Committed { .. })
    }
}

/// Service gating drops behind confirmation and re-laying out after commit.
pub struct InteractionService {
    hierarchy: Arc<HierarchyService>,
    confirmer: Arc<dyn Confirmer>,
    engine: LayoutEngine,
    bounds: Bounds,
    variant: HierarchyVariant,
}

impl InteractionService {
    pub fn new(
        hierarchy: Arc<HierarchyService>,
        confirmer: Arc<dyn Confirmer>,
        engine: LayoutEngine,
        bounds: Bounds,
        variant: HierarchyVariant,
    ) -> Self {
        Self {
            hierarchy,
            confirmer,
            engine,
            bounds,
            variant,
        }
    }

    pub fn layout(&self, forest: &Forest) -> Layout {
        self.engine.layout(forest, self.bounds)
    }

    /// Drag controller over the current layout of `forest`.
    pub fn controller(&self, forest: &Forest, viewport: Viewport) -> DragController {
        DragController::new(Scene::from_layout(&self.layout(forest), viewport))
    }

    /// Reassignment a drop of `node` onto `target` stands for.
    pub fn reassignment_for(
        &self,
        forest: &Forest,
        node: EmployeeId,
        target: EmployeeId,
    ) -> Reassignment {
        let target_division = forest.get(target).and_then(|n| n.data.division);
        match (self.variant, target_division) {
            (HierarchyVariant::Division, Some(division)) => Reassignment::Division {
                employee: node,
                division,
                supervisor: Some(target.into()),
            },
            _ => Reassignment::Supervisor {
                employee: node,
                supervisor: target.into(),
            },
        }
    }

    /// Confirm and commit a finished gesture.
    ///
    /// The mutation runs only after explicit confirmation. Declining, a drop
    /// on empty space, a cancelled gesture and a rejected mutation all revert.
    #[instrument(level = "debug", skip(self, forest))]
    pub fn resolve_drop(&self, forest: &Forest, outcome: DragOutcome) -> DropResolution {
        let (node, target) = match outcome {
            DragOutcome::Cancelled { .. } => return revert(RevertReason::Cancelled),
            DragOutcome::DroppedOnEmpty { .. } => return revert(RevertReason::NoTarget),
            DragOutcome::DroppedOnTarget { node, target, .. } if node == target => {
                return revert(RevertReason::NoTarget)
            }
            DragOutcome::DroppedOnTarget { node, target, .. } => (node, target),
        };

        let change = self.reassignment_for(forest, node, target);
        if !self.confirmer.confirm(&prompt(forest, &change)) {
            return revert(RevertReason::Declined);
        }

        match self.hierarchy.reassign(&change) {
            Ok(forest) => {
                let layout = self.layout(&forest);
                DropResolution::Committed {
                    change,
                    forest,
                    layout,
                }
            }
            Err(e) => {
                warn!("reassignment rejected: {}", e);
                revert(RevertReason::Rejected(e))
            }
        }
    }

    /// Replay a whole gesture: grab `node` at its centre, move to `to`
    /// (screen coordinates), release, then resolve the drop.
    pub fn replay_drag(&self, node: EmployeeId, to: Point) -> ApplicationResult<DropResolution> {
        let forest = self.hierarchy.fetch()?;
        let viewport = Viewport::default();
        let mut controller = self.controller(&forest, viewport);

        let grab = controller
            .scene()
            .rect_of(node)
            .map(|r| viewport.to_screen(r.center()))
            .ok_or(DomainError::EmployeeNotFound(node))?;
        controller.begin(node, grab)?;
        controller.drag_to(to)?;
        let outcome = controller.end(to)?;
        debug!("replay_drag: {:?}", outcome);

        Ok(self.resolve_drop(&forest, outcome))
    }
}

fn prompt(forest: &Forest, change: &Reassignment) -> String {
    let name = |id: EmployeeId| {
        forest
            .get(id)
            .map(|n| n.data.to_string())
            .unwrap_or_else(|| id.to_string())
    };
    let target = match change.supervisor() {
        Some(ParentRef::Id(id)) => name(*id),
        Some(ParentRef::Name(n)) => n.to_string(),
        None => "nobody".to_string(),
    };
    match change {
        Reassignment::Division { division, .. } => format!(
            "Move {} to {} under {}?",
            name(change.employee()),
            division,
            target
        ),
        Reassignment::Supervisor { .. } => {
            format!("Reassign {} to report to {}?", name(change.employee()), target)
        }
    }
}

fn revert(reason: RevertReason) -> DropResolution {
    debug!("revert: {}", reason);
    DropResolution::Reverted { reason }
}
