//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the row store gateways.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend rejected or failed the call; carries its detail.
    #[error("backend error: {0}")]
    Backend(String),

    /// A unique constraint rejected an insert.
    #[error("duplicate value for {table}.{column}")]
    Duplicate {
        /// Table holding the constraint.
        table: String,
        /// Constrained column.
        column: String,
    },

    /// A required symbolic status is absent from the status table.
    #[error("status '{0}' not found in status table")]
    StatusMissing(String),

    /// No conflict columns could be resolved for an upsert.
    #[error("no conflict columns configured for table '{0}'")]
    NoConflictColumns(String),
}

impl StoreError {
    /// Builds a backend error from any displayable detail.
    pub fn backend(detail: impl Into<String>) -> Self {
        StoreError::Backend(detail.into())
    }

    /// True when this error is a unique-constraint rejection.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}
