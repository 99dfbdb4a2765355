//! Response bodies.

use crate::operation::Row;
use serde::{Deserialize, Serialize};

/// Response to a successful apply request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyResponse {
    /// Always true on the success path.
    pub ok: bool,
    /// True when the event id was already recorded and nothing was applied.
    pub deduped: bool,
}

impl ApplyResponse {
    /// The operation was applied for the first time.
    pub fn applied() -> Self {
        Self {
            ok: true,
            deduped: false,
        }
    }

    /// The event id was already recorded; no side effects occurred.
    pub fn deduped() -> Self {
        Self {
            ok: true,
            deduped: true,
        }
    }
}

/// Response to a single-item read. Absence of a match is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse {
    /// Always true on the success path.
    pub ok: bool,
    /// The matching row, if any.
    pub item: Option<Row>,
}

impl ItemResponse {
    /// Wraps an optional row.
    pub fn new(item: Option<Row>) -> Self {
        Self { ok: true, item }
    }
}

/// Response to a list read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    /// Always true on the success path.
    pub ok: bool,
    /// Matching rows, most recently updated first.
    pub items: Vec<Row>,
}

impl ListResponse {
    /// Wraps a row list.
    pub fn new(items: Vec<Row>) -> Self {
        Self { ok: true, items }
    }
}

/// Machine-readable error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false.
    pub ok: bool,
    /// Stable error code, e.g. `"forbidden"` or `"backend_error"`.
    pub code: String,
    /// Human-readable detail, carrying the backend error where available.
    pub message: String,
}

impl ErrorResponse {
    /// Builds an error body from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            message: message.into(),
        }
    }
}
