//! Validation of single-node reassignments against the current forest.
//!
//! Planning is pure: it inspects the forest built from the store and yields
//! the one rewritten row to persist. Applying the row and rebuilding happens
//! in the application layer.

use std::fmt;

use tracing::{debug, instrument};

use crate::domain::arena::Forest;
use crate::domain::entities::{Division, EmployeeId, FlatRow, ParentRef};
use crate::domain::error::{DomainError, DomainResult};

/// A requested change to one employee's position in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassignment {
    /// Re-parent `employee` under `supervisor`.
    Supervisor {
        employee: EmployeeId,
        supervisor: ParentRef,
    },
    /// Move `employee` into `division`, optionally under a new supervisor.
    /// Without a supervisor the employee heads its own tree in the division.
    Division {
        employee: EmployeeId,
        division: Division,
        supervisor: Option<ParentRef>,
    },
}

impl Reassignment {
    pub fn employee(&self) -> EmployeeId {
        match self {
            Reassignment::Supervisor { employee, .. } | Reassignment::Division { employee, .. } => {
                *employee
            }
        }
    }

    pub fn supervisor(&self) -> Option<&ParentRef> {
        match self {
            Reassignment::Supervisor { supervisor, .. } => Some(supervisor),
            Reassignment::Division { supervisor, .. } => supervisor.as_ref(),
        }
    }
}

impl fmt::Display for Reassignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reassignment::Supervisor {
                employee,
                supervisor,
            } => write!(f, "{} reports to {}", employee, supervisor),
            Reassignment::Division {
                employee,
                division,
                supervisor: Some(supervisor),
            } => write!(f, "{} moves to {} under {}", employee, division, supervisor),
            Reassignment::Division {
                employee, division, ..
            } => write!(f, "{} heads {}", employee, division),
        }
    }
}

/// Result of planning a reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationPlan {
    /// Persist `after` in place of `before`.
    Rewrite { before: FlatRow, after: FlatRow },
    /// The employee already sits where requested.
    Unchanged(EmployeeId),
}

impl MutationPlan {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, MutationPlan::Unchanged(_))
    }

    /// The row set with this plan applied, order preserved.
    pub fn apply_to(&self, rows: &[FlatRow]) -> Vec<FlatRow> {
        match self {
            MutationPlan::Rewrite { after, .. } => rows
                .iter()
                .map(|row| {
                    if row.id == after.id {
                        after.clone()
                    } else {
                        row.clone()
                    }
                })
                .collect(),
            MutationPlan::Unchanged(_) => rows.to_vec(),
        }
    }
}

pub struct MutationEngine;

impl MutationEngine {
    /// Validate `change` against `forest` (built from `rows`) and produce the
    /// rewritten row.
    ///
    /// Errors: unknown employee or supervisor id, unknown or ambiguous
    /// supervisor name, and any supervisor that is the employee itself or one
    /// of its descendants.
    #[instrument(level = "debug", skip(forest, rows))]
    pub fn plan(
        forest: &Forest,
        rows: &[FlatRow],
        change: &Reassignment,
    ) -> DomainResult<MutationPlan> {
        let employee = change.employee();
        if !forest.contains(employee) {
            return Err(DomainError::EmployeeNotFound(employee));
        }

        let target = change
            .supervisor()
            .map(|parent| resolve_target(forest, parent))
            .transpose()?;

        if let Some(target) = target {
            if target == employee || forest.is_descendant(employee, target) {
                return Err(DomainError::CycleRejected { employee, target });
            }
        }

        let before = rows
            .iter()
            .find(|row| row.id == employee)
            .cloned()
            .ok_or(DomainError::EmployeeNotFound(employee))?;

        let division = match change {
            Reassignment::Division { division, .. } => Some(*division),
            Reassignment::Supervisor { .. } => before.division,
        };

        let current_parent = forest.supervisor_of(employee);
        if current_parent == target && before.division == division {
            debug!("plan: {} already in place", employee);
            return Ok(MutationPlan::Unchanged(employee));
        }

        let mut after = before.clone();
        after.division = division;
        let supervisor = target.and_then(|id| forest.get(id).map(|n| (id, &n.data.name)));
        after.set_supervisor(supervisor);

        debug!("plan: {} -> {:?}", employee, target);
        Ok(MutationPlan::Rewrite { before, after })
    }
}

fn resolve_target(forest: &Forest, parent: &ParentRef) -> DomainResult<EmployeeId> {
    match parent {
        ParentRef::Id(id) if forest.contains(*id) => Ok(*id),
        ParentRef::Id(id) => Err(DomainError::EmployeeNotFound(*id)),
        ParentRef::Name(name) => forest.resolve_name(name),
    }
}
