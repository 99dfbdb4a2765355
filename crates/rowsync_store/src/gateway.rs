//! Generic row store gateway: applies one operation against an arbitrary
//! (schema, table) pair.

use crate::backend::{Condition, RowBackend, TableRef};
use crate::error::{StoreError, StoreResult};
use crate::policy::{TableCatalog, TablePolicy};
use crate::status_cache::StatusCache;
use chrono::{SecondsFormat, Utc};
use rowsync_protocol::{Operation, Row};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Applies decoded operations to the row backend, resolving conflict
/// columns and delete policy per table.
///
/// Stateless per call; one instance is shared across concurrent requests.
/// Errors from the backend propagate unchanged — no internal retries.
pub struct RowStoreGateway {
    backend: Arc<dyn RowBackend>,
    catalog: Arc<TableCatalog>,
    status: Arc<StatusCache>,
}

/// Current time as an RFC 3339 UTC string with millisecond precision.
fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether a row is missing a column, treating explicit null as missing.
fn lacks(row: &Row, column: &str) -> bool {
    row.get(column).map_or(true, Value::is_null)
}

impl RowStoreGateway {
    /// Creates a gateway over the given backend, catalog, and status
    /// cache.
    pub fn new(
        backend: Arc<dyn RowBackend>,
        catalog: Arc<TableCatalog>,
        status: Arc<StatusCache>,
    ) -> Self {
        Self {
            backend,
            catalog,
            status,
        }
    }

    /// Applies one operation to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoConflictColumns`] when an upsert resolves
    /// to an empty conflict set, or the backend's error otherwise. The
    /// caller decides whether the event is recorded; a failed apply must
    /// leave the event unrecorded so the client can retry.
    pub fn apply(&self, target: &TableRef, operation: &Operation) -> StoreResult<()> {
        match operation {
            Operation::Upsert {
                row,
                conflict_columns,
            } => self.apply_upsert(target, row, conflict_columns.as_deref()),
            Operation::Delete { filter, deleted_at } => {
                self.apply_delete(target, filter, deleted_at.as_deref())
            }
        }
    }

    /// The read-path visibility predicate for `table`, shared with the
    /// delete logic through the catalog so the two cannot drift.
    ///
    /// `None` means every row is visible (hard-delete tables).
    ///
    /// # Errors
    ///
    /// Returns an error when the status lookup fails.
    pub fn visibility(&self, table: &str) -> StoreResult<Option<Condition>> {
        match self.catalog.policy(table) {
            TablePolicy::HardDelete => Ok(None),
            TablePolicy::SoftDeleteByTimestamp => Ok(Some(Condition::IsNull(
                self.catalog.deleted_at_column.clone(),
            ))),
            TablePolicy::SoftDeleteByStatus => {
                let ids = self.status.resolve()?;
                Ok(Some(Condition::Eq(
                    self.catalog.status_column.clone(),
                    json!(ids.active),
                )))
            }
        }
    }

    fn apply_upsert(
        &self,
        target: &TableRef,
        row: &Row,
        conflict_columns: Option<&[String]>,
    ) -> StoreResult<()> {
        let mut row = row.clone();

        if lacks(&row, &self.catalog.updated_at_column) {
            row.insert(self.catalog.updated_at_column.clone(), json!(now_rfc3339()));
        }

        match self.catalog.policy(&target.table) {
            TablePolicy::SoftDeleteByStatus => {
                // Stamping the active id revives a previously
                // soft-deleted row reached through the same conflict key.
                if lacks(&row, &self.catalog.status_column) {
                    let ids = self.status.resolve()?;
                    row.insert(self.catalog.status_column.clone(), json!(ids.active));
                }
            }
            TablePolicy::SoftDeleteByTimestamp => {
                if !row.contains_key(&self.catalog.deleted_at_column) {
                    row.insert(self.catalog.deleted_at_column.clone(), Value::Null);
                }
            }
            TablePolicy::HardDelete => {}
        }

        let columns: Vec<String> = match conflict_columns {
            Some(explicit) => explicit.to_vec(),
            None => self.catalog.conflict_columns(&target.table).to_vec(),
        };
        if columns.is_empty() {
            return Err(StoreError::NoConflictColumns(target.table.clone()));
        }

        debug!(table = %target, conflict = ?columns, "applying upsert");
        self.backend.upsert(target, &row, &columns)
    }

    fn apply_delete(
        &self,
        target: &TableRef,
        filter: &Row,
        deleted_at: Option<&str>,
    ) -> StoreResult<()> {
        match self.catalog.policy(&target.table) {
            TablePolicy::HardDelete => {
                debug!(table = %target, "applying hard delete");
                self.backend.delete(target, filter)?;
            }
            TablePolicy::SoftDeleteByTimestamp => {
                let stamp = deleted_at.map_or_else(now_rfc3339, str::to_string);
                let mut changes = Row::new();
                changes.insert(self.catalog.deleted_at_column.clone(), json!(stamp));
                changes.insert(self.catalog.updated_at_column.clone(), json!(stamp));
                debug!(table = %target, "applying timestamp soft delete");
                self.backend.update(target, filter, &changes)?;
            }
            TablePolicy::SoftDeleteByStatus => {
                let ids = self.status.resolve()?;
                let mut changes = Row::new();
                changes.insert(self.catalog.status_column.clone(), json!(ids.inactive));
                changes.insert(self.catalog.updated_at_column.clone(), json!(now_rfc3339()));
                debug!(table = %target, "applying status soft delete");
                self.backend.update(target, filter, &changes)?;
            }
        }
        Ok(())
    }
}
