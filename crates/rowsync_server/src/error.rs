//! Error types for the sync server.

use rowsync_protocol::DecodeError;
use rowsync_store::StoreError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while serving a sync request.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The shared-secret header is missing or wrong.
    #[error("forbidden")]
    Forbidden,

    /// The request body or parameters are invalid.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The `op` field names an operation this server does not know.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// No conflict columns could be resolved for an upsert.
    #[error("conflict resolution failed: {0}")]
    ConflictResolution(String),

    /// The row store or status lookup failed during a read or mutation.
    /// The event is not recorded, so the client may safely retry.
    #[error("backend error: {0}")]
    Backend(StoreError),

    /// The event ledger failed. On the dedup check this aborts before
    /// any mutation; on the record step the mutation may have completed
    /// without being marked.
    #[error("ledger error: {0}")]
    Ledger(StoreError),
}

impl ServerError {
    /// The HTTP status this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::Forbidden => 403,
            ServerError::Validation(_)
            | ServerError::UnknownOperation(_)
            | ServerError::ConflictResolution(_)
            | ServerError::Backend(_) => 400,
            ServerError::Ledger(_) => 500,
        }
    }

    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::Forbidden => "forbidden",
            ServerError::Validation(_) => "invalid_request",
            ServerError::UnknownOperation(_) => "unknown_operation",
            ServerError::ConflictResolution(_) => "conflict_resolution",
            ServerError::Backend(_) => "backend_error",
            ServerError::Ledger(_) => "ledger_error",
        }
    }

    /// True if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// True if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<DecodeError> for ServerError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnknownOperation(op) => ServerError::UnknownOperation(op),
            other => ServerError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ServerError::Forbidden.status_code(), 403);
        assert_eq!(ServerError::Validation("bad".into()).status_code(), 400);
        assert_eq!(
            ServerError::UnknownOperation("archive".into()).status_code(),
            400
        );
        assert_eq!(
            ServerError::Backend(StoreError::backend("boom")).status_code(),
            400
        );
        assert_eq!(
            ServerError::Ledger(StoreError::backend("boom")).status_code(),
            500
        );
    }

    #[test]
    fn error_classification() {
        assert!(ServerError::Forbidden.is_client_error());
        assert!(ServerError::Ledger(StoreError::backend("boom")).is_server_error());
        assert!(!ServerError::Backend(StoreError::backend("boom")).is_server_error());
    }

    #[test]
    fn decode_errors_convert() {
        let err: ServerError = DecodeError::UnknownOperation("archive".into()).into();
        assert!(matches!(err, ServerError::UnknownOperation(op) if op == "archive"));

        let err: ServerError = DecodeError::MissingEventId.into();
        assert!(matches!(err, ServerError::Validation(_)));
    }
}
