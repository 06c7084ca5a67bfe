//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::{EmployeeId, PersonName};

/// Domain errors represent hierarchy integrity and business rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("employee not found: {0}")]
    EmployeeNotFound(EmployeeId),

    #[error("no employee named: {0}")]
    NameNotFound(PersonName),

    #[error("cycle detected in hierarchy at employee {0}")]
    CycleDetected(EmployeeId),

    #[error("reassigning {employee} under {target} would create a cycle")]
    CycleRejected {
        employee: EmployeeId,
        target: EmployeeId,
    },

    #[error("ambiguous name {name}: matches employees {}", format_ids(.candidates))]
    AmbiguousTarget {
        name: PersonName,
        candidates: Vec<EmployeeId>,
    },

    #[error("duplicate employee id: {0}")]
    DuplicateIdentity(EmployeeId),

    #[error("employee {0} is listed as its own supervisor")]
    SelfReference(EmployeeId),

    #[error("supervisor {parent} of employee {employee} does not exist")]
    UnresolvedParent { employee: EmployeeId, parent: String },

    #[error("malformed row for employee {id}: {message}")]
    MalformedRow { id: EmployeeId, message: String },

    #[error("a drag gesture is already active for employee {0}")]
    GestureInProgress(EmployeeId),

    #[error("no drag gesture is active")]
    NoActiveGesture,

    #[error("unknown division: {0}")]
    UnknownDivision(String),
}

impl DomainError {
    /// True for errors caused by corrupt or contradictory hierarchy data
    /// (as opposed to a missing record).
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            DomainError::CycleDetected(_)
                | DomainError::CycleRejected { .. }
                | DomainError::AmbiguousTarget { .. }
                | DomainError::DuplicateIdentity(_)
                | DomainError::SelfReference(_)
                | DomainError::UnresolvedParent { .. }
                | DomainError::MalformedRow { .. }
        )
    }
}

fn format_ids(ids: &[EmployeeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
