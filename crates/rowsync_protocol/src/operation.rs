//! Apply operations and the request envelope.

use crate::error::{DecodeError, DecodeResult};
use serde::Deserialize;
use serde_json::Value;

/// A dynamic row payload: column name to JSON value.
///
/// Rows are intentionally schema-less; the backend table decides which
/// columns exist. System columns (`updated_at`, the status column) are
/// stamped by the row store gateway when absent.
pub type Row = serde_json::Map<String, Value>;

/// A sync operation to apply against one backend table.
///
/// Exactly one variant is present per request, selected by the `op` field
/// of the JSON body. The row/filter mapping is guaranteed non-empty after
/// [`ApplyRequest::from_json`] succeeds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    /// Insert-or-update a single row.
    Upsert {
        /// The row to write.
        row: Row,
        /// Conflict-resolution columns; falls back to the table catalog
        /// default when absent.
        #[serde(default)]
        conflict_columns: Option<Vec<String>>,
    },
    /// Delete rows matching a filter, per the table's delete policy.
    Delete {
        /// Column-to-value equality filter selecting the rows to delete.
        filter: Row,
        /// Deletion timestamp for timestamp-based soft delete; defaults to
        /// the current time.
        #[serde(default)]
        deleted_at: Option<String>,
    },
}

impl Operation {
    /// Returns the operation name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Upsert { .. } => "upsert",
            Operation::Delete { .. } => "delete",
        }
    }
}

/// One decoded apply request.
///
/// `event_id` is the client-supplied idempotency key; `table` and `schema`
/// default server-side when absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApplyRequest {
    /// Idempotency key identifying this logical operation.
    pub event_id: String,
    /// Target table; server default when absent.
    #[serde(default)]
    pub table: Option<String>,
    /// Target schema; server default when absent.
    #[serde(default)]
    pub schema: Option<String>,
    /// The operation to apply.
    #[serde(flatten)]
    pub operation: Operation,
}

const KNOWN_OPS: &[&str] = &["upsert", "delete"];

impl ApplyRequest {
    /// Decodes an apply request from a JSON body.
    ///
    /// Validation is staged so each failure mode maps to one error:
    /// syntax first, then `event_id` presence, then the operation tag,
    /// then the operation shape, then non-emptiness of the row/filter.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] for invalid JSON,
    /// [`DecodeError::MissingEventId`] for an absent or empty event id,
    /// [`DecodeError::UnknownOperation`] for an unrecognized `op`, and
    /// [`DecodeError::Invalid`] for shape violations.
    pub fn from_json(body: &str) -> DecodeResult<Self> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        match value.get("event_id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => {}
            _ => return Err(DecodeError::MissingEventId),
        }

        let op = value
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::UnknownOperation("<missing>".into()))?;
        if !KNOWN_OPS.contains(&op) {
            return Err(DecodeError::UnknownOperation(op.to_string()));
        }

        let request: ApplyRequest =
            serde_json::from_value(value).map_err(|e| DecodeError::Invalid(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Checks the invariants that serde cannot express.
    fn validate(&self) -> DecodeResult<()> {
        match &self.operation {
            Operation::Upsert { row, .. } if row.is_empty() => {
                Err(DecodeError::Invalid("row must not be empty".into()))
            }
            Operation::Delete { filter, .. } if filter.is_empty() => {
                Err(DecodeError::Invalid("filter must not be empty".into()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_upsert() {
        let body = json!({
            "op": "upsert",
            "event_id": "e1",
            "table": "items",
            "row": {"name": "widget", "qty": 5},
            "conflict_columns": ["name"]
        })
        .to_string();

        let request = ApplyRequest::from_json(&body).unwrap();
        assert_eq!(request.event_id, "e1");
        assert_eq!(request.table.as_deref(), Some("items"));
        assert_eq!(request.schema, None);
        match request.operation {
            Operation::Upsert {
                row,
                conflict_columns,
            } => {
                assert_eq!(row.get("name"), Some(&json!("widget")));
                assert_eq!(conflict_columns, Some(vec!["name".to_string()]));
            }
            other => panic!("expected upsert, got {:?}", other),
        }
    }

    #[test]
    fn decode_delete_minimal() {
        let body = json!({
            "op": "delete",
            "event_id": "e2",
            "filter": {"name": "widget"}
        })
        .to_string();

        let request = ApplyRequest::from_json(&body).unwrap();
        match request.operation {
            Operation::Delete { filter, deleted_at } => {
                assert_eq!(filter.get("name"), Some(&json!("widget")));
                assert_eq!(deleted_at, None);
            }
            other => panic!("expected delete, got {:?}", other),
        }
    }

    #[test]
    fn decode_delete_with_timestamp() {
        let body = json!({
            "op": "delete",
            "event_id": "e3",
            "filter": {"id": 7},
            "deleted_at": "2025-01-01T00:00:00Z"
        })
        .to_string();

        let request = ApplyRequest::from_json(&body).unwrap();
        match request.operation {
            Operation::Delete { deleted_at, .. } => {
                assert_eq!(deleted_at.as_deref(), Some("2025-01-01T00:00:00Z"));
            }
            other => panic!("expected delete, got {:?}", other),
        }
    }

    #[test]
    fn malformed_json() {
        let result = ApplyRequest::from_json("{not json");
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn missing_event_id() {
        let body = json!({"op": "upsert", "row": {"name": "x"}}).to_string();
        assert!(matches!(
            ApplyRequest::from_json(&body),
            Err(DecodeError::MissingEventId)
        ));
    }

    #[test]
    fn empty_event_id() {
        let body = json!({"op": "upsert", "event_id": "", "row": {"name": "x"}}).to_string();
        assert!(matches!(
            ApplyRequest::from_json(&body),
            Err(DecodeError::MissingEventId)
        ));
    }

    #[test]
    fn non_string_event_id() {
        let body = json!({"op": "upsert", "event_id": 42, "row": {"name": "x"}}).to_string();
        assert!(matches!(
            ApplyRequest::from_json(&body),
            Err(DecodeError::MissingEventId)
        ));
    }

    #[test]
    fn unknown_operation() {
        let body = json!({"op": "archive", "event_id": "e4", "row": {}}).to_string();
        match ApplyRequest::from_json(&body) {
            Err(DecodeError::UnknownOperation(op)) => assert_eq!(op, "archive"),
            other => panic!("expected unknown operation, got {:?}", other),
        }
    }

    #[test]
    fn missing_op_field() {
        let body = json!({"event_id": "e5", "row": {"name": "x"}}).to_string();
        assert!(matches!(
            ApplyRequest::from_json(&body),
            Err(DecodeError::UnknownOperation(_))
        ));
    }

    #[test]
    fn upsert_without_row() {
        let body = json!({"op": "upsert", "event_id": "e6"}).to_string();
        assert!(matches!(
            ApplyRequest::from_json(&body),
            Err(DecodeError::Invalid(_))
        ));
    }

    #[test]
    fn empty_row_rejected() {
        let body = json!({"op": "upsert", "event_id": "e7", "row": {}}).to_string();
        assert!(matches!(
            ApplyRequest::from_json(&body),
            Err(DecodeError::Invalid(_))
        ));
    }

    #[test]
    fn empty_filter_rejected() {
        let body = json!({"op": "delete", "event_id": "e8", "filter": {}}).to_string();
        assert!(matches!(
            ApplyRequest::from_json(&body),
            Err(DecodeError::Invalid(_))
        ));
    }

    #[test]
    fn operation_names() {
        let upsert = Operation::Upsert {
            row: Row::new(),
            conflict_columns: None,
        };
        let delete = Operation::Delete {
            filter: Row::new(),
            deleted_at: None,
        };
        assert_eq!(upsert.name(), "upsert");
        assert_eq!(delete.name(), "delete");
    }
}
