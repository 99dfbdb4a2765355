//! In-memory row backend for tests and the reference server.

use crate::backend::{Condition, RowBackend, SelectQuery, TableRef};
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use rowsync_protocol::Row;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Per-operation failure injection, in the style of a mock transport.
#[derive(Debug, Default)]
struct FailureInjection {
    select: Option<String>,
    insert: Option<String>,
    upsert: Option<String>,
    update: Option<String>,
    delete: Option<String>,
}

/// An in-memory row backend.
///
/// Stores rows per (schema, table) pair and is suitable for unit tests,
/// integration tests, and the bundled reference server. Beyond the
/// [`RowBackend`] contract it offers test instrumentation: a total call
/// counter (to prove a code path made no backend calls) and per-operation
/// failure injection (to fail exactly the dedup check or exactly the
/// ledger record).
///
/// # Thread Safety
///
/// Thread-safe; one instance is shared across concurrent requests.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: RwLock<HashMap<TableRef, Vec<Row>>>,
    unique_indexes: RwLock<HashMap<TableRef, Vec<String>>>,
    failures: RwLock<FailureInjection>,
    calls: AtomicU64,
}

impl InMemoryBackend {
    /// Creates a new empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a unique constraint on `column` of `target`.
    ///
    /// Inserts violating the constraint fail with
    /// [`StoreError::Duplicate`].
    pub fn add_unique_index(&self, target: &TableRef, column: impl Into<String>) {
        self.unique_indexes
            .write()
            .entry(target.clone())
            .or_default()
            .push(column.into());
    }

    /// Seeds rows into a table without counting as backend calls.
    pub fn seed_rows(&self, target: &TableRef, rows: Vec<Row>) {
        self.tables
            .write()
            .entry(target.clone())
            .or_default()
            .extend(rows);
    }

    /// Returns a copy of all rows in a table.
    #[must_use]
    pub fn rows(&self, target: &TableRef) -> Vec<Row> {
        self.tables
            .read()
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of [`RowBackend`] calls made against this backend.
    #[must_use]
    pub fn call_count(&self) -> u64 {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Makes every `select` fail with the given message.
    pub fn fail_selects(&self, message: impl Into<String>) {
        self.failures.write().select = Some(message.into());
    }

    /// Makes every `insert` fail with the given message.
    pub fn fail_inserts(&self, message: impl Into<String>) {
        self.failures.write().insert = Some(message.into());
    }

    /// Makes every `upsert` fail with the given message.
    pub fn fail_upserts(&self, message: impl Into<String>) {
        self.failures.write().upsert = Some(message.into());
    }

    /// Makes every `update` fail with the given message.
    pub fn fail_updates(&self, message: impl Into<String>) {
        self.failures.write().update = Some(message.into());
    }

    /// Makes every `delete` fail with the given message.
    pub fn fail_deletes(&self, message: impl Into<String>) {
        self.failures.write().delete = Some(message.into());
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        *self.failures.write() = FailureInjection::default();
    }

    fn count_call(&self) {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

/// Whether a row satisfies one condition.
fn matches_condition(row: &Row, condition: &Condition) -> bool {
    match condition {
        Condition::Eq(column, value) => row.get(column) == Some(value),
        Condition::IsNull(column) => row.get(column).map_or(true, Value::is_null),
    }
}

/// Whether a row matches every entry of an equality filter.
fn matches_filter(row: &Row, filter: &Row) -> bool {
    filter.iter().all(|(column, value)| row.get(column) == Some(value))
}

/// Orders two JSON values for sorting. Same-type values compare
/// naturally; mixed types fall back to a stable type rank.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

impl RowBackend for InMemoryBackend {
    fn select(&self, target: &TableRef, query: &SelectQuery) -> StoreResult<Vec<Row>> {
        self.count_call();
        if let Some(ref message) = self.failures.read().select {
            return Err(StoreError::backend(message.clone()));
        }

        let tables = self.tables.read();
        let mut rows: Vec<Row> = tables
            .get(target)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .conditions
                            .iter()
                            .all(|condition| matches_condition(row, condition))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(ref column) = query.order_desc {
            rows.sort_by(|a, b| {
                let left = a.get(column).unwrap_or(&Value::Null);
                let right = b.get(column).unwrap_or(&Value::Null);
                compare_values(right, left)
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    fn insert(&self, target: &TableRef, row: &Row) -> StoreResult<()> {
        self.count_call();
        if let Some(ref message) = self.failures.read().insert {
            return Err(StoreError::backend(message.clone()));
        }

        let unique_columns = self
            .unique_indexes
            .read()
            .get(target)
            .cloned()
            .unwrap_or_default();

        let mut tables = self.tables.write();
        let rows = tables.entry(target.clone()).or_default();

        for column in &unique_columns {
            if let Some(value) = row.get(column) {
                if rows.iter().any(|existing| existing.get(column) == Some(value)) {
                    return Err(StoreError::Duplicate {
                        table: target.table.clone(),
                        column: column.clone(),
                    });
                }
            }
        }

        rows.push(row.clone());
        Ok(())
    }

    fn upsert(&self, target: &TableRef, row: &Row, conflict_columns: &[String]) -> StoreResult<()> {
        self.count_call();
        if let Some(ref message) = self.failures.read().upsert {
            return Err(StoreError::backend(message.clone()));
        }
        if conflict_columns.is_empty() {
            return Err(StoreError::backend("upsert requires conflict columns"));
        }

        let mut tables = self.tables.write();
        let rows = tables.entry(target.clone()).or_default();

        let existing = rows.iter_mut().find(|existing| {
            conflict_columns
                .iter()
                .all(|column| existing.get(column) == row.get(column))
        });

        match existing {
            Some(existing) => {
                for (column, value) in row {
                    existing.insert(column.clone(), value.clone());
                }
            }
            None => rows.push(row.clone()),
        }
        Ok(())
    }

    fn update(&self, target: &TableRef, filter: &Row, changes: &Row) -> StoreResult<u64> {
        self.count_call();
        if let Some(ref message) = self.failures.read().update {
            return Err(StoreError::backend(message.clone()));
        }

        let mut tables = self.tables.write();
        let rows = tables.entry(target.clone()).or_default();

        let mut affected = 0u64;
        for row in rows.iter_mut().filter(|row| matches_filter(row, filter)) {
            for (column, value) in changes {
                row.insert(column.clone(), value.clone());
            }
            affected += 1;
        }
        Ok(affected)
    }

    fn delete(&self, target: &TableRef, filter: &Row) -> StoreResult<u64> {
        self.count_call();
        if let Some(ref message) = self.failures.read().delete {
            return Err(StoreError::backend(message.clone()));
        }

        let mut tables = self.tables.write();
        let rows = tables.entry(target.clone()).or_default();

        let before = rows.len();
        rows.retain(|row| !matches_filter(row, filter));
        Ok((before - rows.len()) as u64)
    }
}
