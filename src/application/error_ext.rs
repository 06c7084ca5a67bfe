//! Error conversion helpers for common I/O operations
//!
//! Provides extension traits for cleaner error handling with path context.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.write(&path, &body)
    ///     .with_path_context("write config", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;

    /// Classify a failed store read as a fetch error.
    fn fetch_context(self, action: &str) -> ApplicationResult<T>;

    /// Classify a failed store write as a persist error.
    fn persist_context(self, action: &str) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }

    fn fetch_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::fetch(action, e))
    }

    fn persist_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::persist(action, e))
    }
}
