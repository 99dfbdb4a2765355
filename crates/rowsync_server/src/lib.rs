//! # Rowsync Server
//!
//! The idempotent sync-apply HTTP endpoint.
//!
//! This crate provides:
//! - [`SyncHandler`] — the orchestrating request state machine
//!   (authenticate → dispatch → dedup → apply → record)
//! - [`SharedKeyValidator`] — exact-match shared-secret auth
//! - [`ServerConfig`] — builder-style configuration with environment
//!   loading
//! - [`ServerError`] — the error taxonomy with HTTP status mapping
//! - [`router`] / [`serve`] — the axum surface over the handler
//!
//! # Architecture
//!
//! The handler is framework-free: it takes the presented secret, the raw
//! body or the parsed query, and returns a typed outcome or a
//! [`ServerError`]. The HTTP layer is a thin adapter that extracts the
//! `x-sync-key` header and maps outcomes to `{ok: ...}` JSON bodies. All
//! storage goes through the gateways in `rowsync_store`; every backend
//! failure surfaces to the caller, whose retry is made safe by the event
//! ledger.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod http;
mod server;

pub use auth::{SharedKeyValidator, SYNC_KEY_HEADER};
pub use config::{ConfigError, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::{ApplyOutcome, ReadOutcome, SyncHandler};
pub use http::router;
pub use server::serve;
