//! Row backend trait definition.

use crate::error::StoreResult;
use rowsync_protocol::Row;
use serde_json::Value;
use std::fmt;

/// A fully qualified table reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Schema (namespace) name.
    pub schema: String,
    /// Table name.
    pub table: String,
}

impl TableRef {
    /// Creates a table reference.
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// One predicate of a select query.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Column equals the given value.
    Eq(String, Value),
    /// Column is null or absent.
    IsNull(String),
}

/// A filtered, ordered, limited read against one table.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    /// Conjunction of predicates; empty matches every row.
    pub conditions: Vec<Condition>,
    /// Column to order by, descending, when present.
    pub order_desc: Option<String>,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
}

impl SelectQuery {
    /// Creates an unfiltered query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality predicate.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: Value) -> Self {
        self.conditions.push(Condition::Eq(column.into(), value));
        self
    }

    /// Adds an is-null predicate.
    #[must_use]
    pub fn is_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::IsNull(column.into()));
        self
    }

    /// Adds an arbitrary predicate.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Orders results by `column`, descending.
    #[must_use]
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order_desc = Some(column.into());
        self
    }

    /// Limits the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The boundary to the external row store.
///
/// Backends are generic table stores: they understand rows as dynamic
/// column-to-value mappings and know nothing about sync events, policies,
/// or status semantics — those live in the gateways layered on top.
///
/// # Invariants
///
/// - `insert` fails with a duplicate error when a declared unique
///   constraint would be violated
/// - `upsert` updates the row matching the conflict columns when one
///   exists, inserts otherwise
/// - `update`/`delete` return the number of affected rows and succeed
///   with zero when nothing matches
/// - Backends must be `Send + Sync`; calls from concurrent requests share
///   one instance
pub trait RowBackend: Send + Sync {
    /// Reads rows matching the query.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend query fails.
    fn select(&self, target: &TableRef, query: &SelectQuery) -> StoreResult<Vec<Row>>;

    /// Inserts one row, honoring unique constraints.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Duplicate`] on a unique-constraint
    /// violation, or a backend error otherwise.
    fn insert(&self, target: &TableRef, row: &Row) -> StoreResult<()>;

    /// Inserts or updates one row, deciding by equality on
    /// `conflict_columns`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend write fails.
    fn upsert(&self, target: &TableRef, row: &Row, conflict_columns: &[String]) -> StoreResult<()>;

    /// Applies `changes` to every row matching `filter`; returns the
    /// affected-row count.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend write fails.
    fn update(&self, target: &TableRef, filter: &Row, changes: &Row) -> StoreResult<u64>;

    /// Removes every row matching `filter`; returns the removed-row count.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend write fails.
    fn delete(&self, target: &TableRef, filter: &Row) -> StoreResult<u64>;
}
