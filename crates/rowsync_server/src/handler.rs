//! The orchestrating request handler.
//!
//! The only component with a state machine: every request moves
//! `Unauthenticated → Authenticated → {ReadDispatch | WriteDispatch}`.
//! The handler is transport-agnostic; the HTTP layer feeds it the
//! presented secret plus the raw body or parsed query and maps the typed
//! outcome back to a response.

use crate::auth::SharedKeyValidator;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use rowsync_protocol::{ApplyRequest, ReadQuery, Row};
use rowsync_store::{
    CachePolicy, EventLedger, RowBackend, RowStoreGateway, SelectQuery, StatusCache, StoreError,
    TableCatalog, TableRef,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The operation was applied and the event recorded.
    Applied,
    /// The event id was already recorded; nothing was applied.
    Deduped,
}

/// Result of the read path.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// Single-item fetch: the matching row, if any.
    Item(Option<Row>),
    /// List fetch: matching rows, most recently updated first.
    List(Vec<Row>),
}

/// Handler for sync requests.
///
/// Owns one request's lifecycle end to end; the gateways it dispatches to
/// are shared, stateless-per-call collaborators.
pub struct SyncHandler {
    config: ServerConfig,
    validator: SharedKeyValidator,
    backend: Arc<dyn RowBackend>,
    catalog: Arc<TableCatalog>,
    gateway: RowStoreGateway,
    ledger: EventLedger,
}

impl SyncHandler {
    /// Creates a handler over the given backend and catalog.
    ///
    /// The status cache and event ledger live in the configured default
    /// schema, per the catalog's table names.
    pub fn new(
        config: ServerConfig,
        backend: Arc<dyn RowBackend>,
        catalog: Arc<TableCatalog>,
        cache_policy: CachePolicy,
    ) -> Self {
        let status = Arc::new(StatusCache::new(
            Arc::clone(&backend),
            TableRef::new(&config.default_schema, &catalog.status_table),
            catalog.status_name_column.clone(),
            catalog.status_id_column.clone(),
            cache_policy,
        ));
        let gateway = RowStoreGateway::new(
            Arc::clone(&backend),
            Arc::clone(&catalog),
            Arc::clone(&status),
        );
        let ledger = EventLedger::new(
            Arc::clone(&backend),
            TableRef::new(&config.default_schema, &catalog.ledger_table),
            catalog.ledger_column.clone(),
        );
        let validator = SharedKeyValidator::new(config.sync_key.clone());

        Self {
            config,
            validator,
            backend,
            catalog,
            gateway,
            ledger,
        }
    }

    /// Handles the write path: parse, validate, dedup, apply, record.
    ///
    /// # Errors
    ///
    /// See [`ServerError`] for the taxonomy. A [`ServerError::Backend`]
    /// leaves the event unrecorded, so the client can retry safely; a
    /// [`ServerError::Ledger`] on the record step leaves a documented
    /// window where the mutation completed without being marked.
    pub fn handle_apply(
        &self,
        presented_key: Option<&str>,
        body: &str,
    ) -> ServerResult<ApplyOutcome> {
        self.validator.validate(presented_key)?;

        let request = ApplyRequest::from_json(body)?;
        let event_id = request.event_id.as_str();

        if self.ledger.exists(event_id).map_err(ServerError::Ledger)? {
            debug!(event_id, "event already applied, deduping");
            return Ok(ApplyOutcome::Deduped);
        }

        let target = self.resolve_target(request.table.as_deref(), request.schema.as_deref());
        self.gateway
            .apply(&target, &request.operation)
            .map_err(|err| match err {
                StoreError::NoConflictColumns(table) => ServerError::ConflictResolution(format!(
                    "no conflict columns configured for table '{table}'"
                )),
                other => ServerError::Backend(other),
            })?;

        match self.ledger.record(event_id) {
            Ok(()) => {
                info!(event_id, table = %target, op = request.operation.name(), "applied sync event");
                Ok(ApplyOutcome::Applied)
            }
            Err(err) if err.is_duplicate() => {
                // A concurrent request with the same event id won the
                // race; the storage-level upsert made the double
                // application harmless.
                debug!(event_id, "event recorded concurrently, deduping");
                Ok(ApplyOutcome::Deduped)
            }
            Err(err) => {
                warn!(event_id, table = %target, error = %err, "event applied but not recorded");
                Err(ServerError::Ledger(err))
            }
        }
    }

    /// Handles the read path: single-item fetch or list.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Forbidden`] before any backend call on a
    /// bad secret, [`ServerError::Backend`] on any query failure.
    pub fn handle_read(
        &self,
        presented_key: Option<&str>,
        query: &ReadQuery,
    ) -> ServerResult<ReadOutcome> {
        self.validator.validate(presented_key)?;

        let target = self.resolve_target(query.table.as_deref(), query.schema.as_deref());

        // The status table is exempt: its rows are the vocabulary the
        // visibility predicate is built from.
        let visibility = if query.include_deleted() || target.table == self.catalog.status_table {
            None
        } else {
            self.gateway
                .visibility(&target.table)
                .map_err(ServerError::Backend)?
        };

        if let Some((col, val)) = query.filter() {
            let mut select = SelectQuery::new().eq(col, json!(val)).limit(1);
            if let Some(condition) = visibility {
                select = select.condition(condition);
            }
            let rows = self
                .backend
                .select(&target, &select)
                .map_err(ServerError::Backend)?;
            Ok(ReadOutcome::Item(rows.into_iter().next()))
        } else {
            let mut select = SelectQuery::new()
                .order_desc(self.catalog.updated_at_column.clone())
                .limit(query.effective_limit());
            if let Some(condition) = visibility {
                select = select.condition(condition);
            }
            let rows = self
                .backend
                .select(&target, &select)
                .map_err(ServerError::Backend)?;
            Ok(ReadOutcome::List(rows))
        }
    }

    /// The configured bind address.
    pub fn bind_addr(&self) -> std::net::SocketAddr {
        self.config.bind_addr
    }

    fn resolve_target(&self, table: Option<&str>, schema: Option<&str>) -> TableRef {
        TableRef::new(
            schema.unwrap_or(&self.config.default_schema),
            table.unwrap_or(&self.config.default_table),
        )
    }
}
