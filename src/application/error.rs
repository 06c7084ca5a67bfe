//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("failed to fetch hierarchy: {context}")]
    Fetch {
        context: String,
        #[source]
        source: BoxedError,
    },

    #[error("failed to persist reassignment: {context}")]
    Persist {
        context: String,
        #[source]
        source: BoxedError,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: BoxedError,
    },
}

impl ApplicationError {
    pub fn fetch(context: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        ApplicationError::Fetch {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn persist(context: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        ApplicationError::Persist {
            context: context.into(),
            source: source.into(),
        }
    }

    /// The wrapped domain error, if this is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ApplicationError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
