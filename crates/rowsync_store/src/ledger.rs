//! Durable record of applied event ids.

use crate::backend::{RowBackend, SelectQuery, TableRef};
use crate::error::StoreResult;
use rowsync_protocol::Row;
use serde_json::json;
use std::sync::Arc;

/// Gateway to the ledger table recording which event ids have been
/// applied.
///
/// The ledger's event-id column carries a uniqueness constraint; when two
/// concurrent requests with the same event id both pass the existence
/// check, the second `record` fails with a duplicate error, which callers
/// treat as "already applied".
pub struct EventLedger {
    backend: Arc<dyn RowBackend>,
    target: TableRef,
    column: String,
}

impl EventLedger {
    /// Creates a ledger gateway over `target`, storing event ids in
    /// `column`.
    pub fn new(backend: Arc<dyn RowBackend>, target: TableRef, column: impl Into<String>) -> Self {
        Self {
            backend,
            target,
            column: column.into(),
        }
    }

    /// Whether `event_id` has already been recorded.
    ///
    /// # Errors
    ///
    /// Returns a ledger read error when the backend query fails; callers
    /// must not proceed with the mutation in that case.
    pub fn exists(&self, event_id: &str) -> StoreResult<bool> {
        let rows = self.backend.select(
            &self.target,
            &SelectQuery::new()
                .eq(self.column.as_str(), json!(event_id))
                .limit(1),
        )?;
        Ok(!rows.is_empty())
    }

    /// Records `event_id` as applied.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Duplicate`] when a concurrent request
    /// recorded the same id first, or a backend error otherwise.
    pub fn record(&self, event_id: &str) -> StoreResult<()> {
        let mut row = Row::new();
        row.insert(self.column.clone(), json!(event_id));
        self.backend.insert(&self.target, &row)
    }
}
