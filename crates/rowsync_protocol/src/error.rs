//! Decode errors for inbound request bodies.

use thiserror::Error;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors produced while decoding an apply request body.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The body is not syntactically valid JSON.
    #[error("invalid JSON: {0}")]
    Malformed(String),

    /// The `event_id` field is missing, not a string, or empty.
    #[error("missing event_id")]
    MissingEventId,

    /// The `op` field names an operation this protocol does not know.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// The body is valid JSON but does not match the operation shape.
    #[error("invalid request: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            DecodeError::UnknownOperation("archive".into()).to_string(),
            "unknown operation: archive"
        );
        assert_eq!(DecodeError::MissingEventId.to_string(), "missing event_id");
    }
}
