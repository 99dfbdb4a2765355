//! # Rowsync Store
//!
//! Storage-facing gateways for the rowsync apply protocol.
//!
//! This crate provides:
//! - [`RowBackend`] — the trait boundary to the external row store
//! - [`InMemoryBackend`] — reference implementation for tests and the
//!   bundled server
//! - [`TableCatalog`] / [`TablePolicy`] — per-table delete policy and
//!   conflict-column configuration
//! - [`StatusCache`] — cached symbolic-status-to-id lookup
//! - [`EventLedger`] — durable record of applied event ids
//! - [`RowStoreGateway`] — applies one decoded operation against an
//!   arbitrary (schema, table) pair
//!
//! The gateways are shared, stateless-per-call collaborators: the status
//! cache is the only long-lived mutable state, and it is
//! write-once-then-read-many per process.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod backend;
mod error;
mod gateway;
mod ledger;
mod memory;
mod policy;
mod status_cache;

pub use backend::{Condition, RowBackend, SelectQuery, TableRef};
pub use error::{StoreError, StoreResult};
pub use gateway::RowStoreGateway;
pub use ledger::EventLedger;
pub use memory::InMemoryBackend;
pub use policy::{TableCatalog, TablePolicy};
pub use status_cache::{CachePolicy, StatusCache, StatusIds};
