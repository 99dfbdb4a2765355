//! Per-table delete policy and conflict-column configuration.

use std::collections::HashMap;

/// How deletes behave for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePolicy {
    /// Rows are removed outright.
    HardDelete,
    /// Rows are retained; `deleted_at` is stamped.
    SoftDeleteByTimestamp,
    /// Rows are retained; the status column is flipped to the inactive id.
    SoftDeleteByStatus,
}

/// Static table configuration: delete policy and upsert conflict columns,
/// keyed by table name with explicit defaults for unrecognized tables.
///
/// Resolved once per request and used uniformly by the read filter and
/// the delete logic, so the two can never disagree about what "deleted"
/// means for a table.
#[derive(Debug, Clone)]
pub struct TableCatalog {
    policies: HashMap<String, TablePolicy>,
    default_policy: TablePolicy,
    conflict_columns: HashMap<String, Vec<String>>,
    default_conflict_columns: Vec<String>,
    /// Status lookup table name.
    pub status_table: String,
    /// Symbolic-name column of the status table.
    pub status_name_column: String,
    /// Identifier column of the status table.
    pub status_id_column: String,
    /// Status column on data tables.
    pub status_column: String,
    /// Last-updated timestamp column on data tables.
    pub updated_at_column: String,
    /// Deletion timestamp column for timestamp-based soft delete.
    pub deleted_at_column: String,
    /// Ledger table recording applied event ids.
    pub ledger_table: String,
    /// Event-id column of the ledger table (unique).
    pub ledger_column: String,
}

impl Default for TableCatalog {
    fn default() -> Self {
        let mut policies = HashMap::new();
        // The status lookup table is a plain reference table; stamping a
        // status column onto it would be circular.
        policies.insert("statuses".to_string(), TablePolicy::HardDelete);

        let mut conflict_columns = HashMap::new();
        conflict_columns.insert("items".to_string(), vec!["name".to_string()]);

        Self {
            policies,
            default_policy: TablePolicy::SoftDeleteByStatus,
            conflict_columns,
            default_conflict_columns: vec!["id".to_string()],
            status_table: "statuses".to_string(),
            status_name_column: "name".to_string(),
            status_id_column: "id".to_string(),
            status_column: "status_id".to_string(),
            updated_at_column: "updated_at".to_string(),
            deleted_at_column: "deleted_at".to_string(),
            ledger_table: "sync_events_applied".to_string(),
            ledger_column: "event_id".to_string(),
        }
    }
}

impl TableCatalog {
    /// Creates the default catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a delete policy for one table.
    #[must_use]
    pub fn with_policy(mut self, table: impl Into<String>, policy: TablePolicy) -> Self {
        self.policies.insert(table.into(), policy);
        self
    }

    /// Sets the policy applied to tables with no explicit entry.
    #[must_use]
    pub fn with_default_policy(mut self, policy: TablePolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Registers upsert conflict columns for one table.
    #[must_use]
    pub fn with_conflict_columns(
        mut self,
        table: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        self.conflict_columns.insert(table.into(), columns);
        self
    }

    /// Sets the conflict columns used for tables with no explicit entry.
    #[must_use]
    pub fn with_default_conflict_columns(mut self, columns: Vec<String>) -> Self {
        self.default_conflict_columns = columns;
        self
    }

    /// Sets the ledger table and its event-id column.
    #[must_use]
    pub fn with_ledger(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.ledger_table = table.into();
        self.ledger_column = column.into();
        self
    }

    /// The delete policy for `table`.
    #[must_use]
    pub fn policy(&self, table: &str) -> TablePolicy {
        self.policies
            .get(table)
            .copied()
            .unwrap_or(self.default_policy)
    }

    /// The default conflict columns for `table`.
    #[must_use]
    pub fn conflict_columns(&self, table: &str) -> &[String] {
        self.conflict_columns
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_conflict_columns)
    }

    /// Whether `table` carries the lifecycle status column.
    #[must_use]
    pub fn tracks_status(&self, table: &str) -> bool {
        self.policy(table) == TablePolicy::SoftDeleteByStatus
    }
}
