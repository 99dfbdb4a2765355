//! Read-path query parameters.

use serde::Deserialize;

/// Default number of rows returned by a list request.
pub const DEFAULT_LIST_LIMIT: usize = 50;
/// Smallest accepted list limit; lower requests clamp up to this.
pub const MIN_LIST_LIMIT: usize = 1;
/// Largest accepted list limit; higher requests clamp down to this.
pub const MAX_LIST_LIMIT: usize = 200;

/// Query parameters for the read path.
///
/// All fields arrive as optional strings so that a bad value degrades to
/// the documented default instead of a transport-level rejection: a
/// non-numeric `limit` means "use the default", not "400".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadQuery {
    /// Target table; server default when absent.
    #[serde(default)]
    pub table: Option<String>,
    /// Target schema; server default when absent.
    #[serde(default)]
    pub schema: Option<String>,
    /// Filter column for a single-item fetch.
    #[serde(default)]
    pub col: Option<String>,
    /// Filter value for a single-item fetch.
    #[serde(default)]
    pub val: Option<String>,
    /// When `"true"`, soft-deleted rows are included.
    #[serde(default)]
    pub include_deleted: Option<String>,
    /// Raw list limit; clamped by [`ReadQuery::effective_limit`].
    #[serde(default)]
    pub limit: Option<String>,
}

impl ReadQuery {
    /// Returns the single-item filter pair, present only when both `col`
    /// and `val` were supplied.
    pub fn filter(&self) -> Option<(&str, &str)> {
        match (self.col.as_deref(), self.val.as_deref()) {
            (Some(col), Some(val)) => Some((col, val)),
            _ => None,
        }
    }

    /// Whether soft-deleted rows should be visible.
    pub fn include_deleted(&self) -> bool {
        self.include_deleted.as_deref() == Some("true")
    }

    /// The effective list limit: absent or non-numeric input yields
    /// [`DEFAULT_LIST_LIMIT`]; numeric input clamps into
    /// [`MIN_LIST_LIMIT`]..=[`MAX_LIST_LIMIT`].
    pub fn effective_limit(&self) -> usize {
        match self.limit.as_deref() {
            None => DEFAULT_LIST_LIMIT,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) => (n.max(MIN_LIST_LIMIT as i64) as usize).min(MAX_LIST_LIMIT),
                Err(_) => DEFAULT_LIST_LIMIT,
            },
        }
    }
}
