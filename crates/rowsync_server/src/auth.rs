//! Shared-secret authentication.
//!
//! Every request, regardless of method, must present the configured
//! secret in the `x-sync-key` header. The check is an exact string match
//! and runs before any parsing, dedup check, or backend call.

use crate::error::{ServerError, ServerResult};

/// Header carrying the shared secret.
pub const SYNC_KEY_HEADER: &str = "x-sync-key";

/// Validates the shared-secret header value.
#[derive(Debug, Clone)]
pub struct SharedKeyValidator {
    secret: String,
}

impl SharedKeyValidator {
    /// Creates a validator for the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Checks a presented key against the configured secret.
    ///
    /// An empty configured secret rejects everything: a deployment that
    /// forgot to set the secret must fail closed, not open.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Forbidden`] on mismatch or absence.
    pub fn validate(&self, presented: Option<&str>) -> ServerResult<()> {
        match presented {
            Some(key) if !self.secret.is_empty() && key == self.secret => Ok(()),
            _ => Err(ServerError::Forbidden),
        }
    }
}
