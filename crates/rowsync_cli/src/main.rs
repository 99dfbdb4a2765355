//! Rowsync reference server.
//!
//! Runs the sync-apply endpoint over the in-memory backend. Production
//! deployments implement `RowBackend` against their own row store and
//! wire the handler themselves; this binary exists for development,
//! demos, and end-to-end testing of sync clients.

use clap::Parser;
use rowsync_protocol::Row;
use rowsync_server::{serve, ServerConfig, SyncHandler};
use rowsync_store::{CachePolicy, InMemoryBackend, TableCatalog, TableRef};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Idempotent sync-apply endpoint (reference server).
#[derive(Parser)]
#[command(name = "rowsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind; overrides ROWSYNC_BIND
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Shared secret; overrides SYNC_KEY
    #[arg(long)]
    sync_key: Option<String>,

    /// Default table; overrides ROWSYNC_TABLE
    #[arg(long)]
    table: Option<String>,

    /// Default schema; overrides ROWSYNC_SCHEMA
    #[arg(long)]
    schema: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn status_row(id: i64, name: &str) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), json!(id));
    row.insert("name".to_string(), json!(name));
    row
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let sync_key = cli
        .sync_key
        .or_else(|| std::env::var("SYNC_KEY").ok())
        .filter(|key| !key.is_empty())
        .ok_or("shared secret required: set SYNC_KEY or pass --sync-key")?;

    let mut config = ServerConfig::new(sync_key);
    match cli.bind {
        Some(bind) => config = config.with_bind_addr(bind),
        None => {
            if let Ok(bind) = std::env::var("ROWSYNC_BIND") {
                config = config.with_bind_addr(bind.parse()?);
            }
        }
    }
    if let Some(table) = cli.table.or_else(|| std::env::var("ROWSYNC_TABLE").ok()) {
        config = config.with_default_table(table);
    }
    if let Some(schema) = cli.schema.or_else(|| std::env::var("ROWSYNC_SCHEMA").ok()) {
        config = config.with_default_schema(schema);
    }

    let catalog = Arc::new(TableCatalog::default());
    let backend = Arc::new(InMemoryBackend::new());

    // The in-memory store starts empty; give it the two status rows the
    // cache resolves against and the ledger's unique constraint.
    backend.seed_rows(
        &TableRef::new(&config.default_schema, &catalog.status_table),
        vec![status_row(1, "active"), status_row(2, "inactive")],
    );
    backend.add_unique_index(
        &TableRef::new(&config.default_schema, &catalog.ledger_table),
        catalog.ledger_column.clone(),
    );

    let handler = Arc::new(SyncHandler::new(
        config,
        backend,
        catalog,
        CachePolicy::never_expires(),
    ));

    serve(handler).await?;
    Ok(())
}
