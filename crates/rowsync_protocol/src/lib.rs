//! # Rowsync Protocol
//!
//! Wire types for the rowsync apply protocol.
//!
//! This crate provides:
//! - `Operation` and the `ApplyRequest` envelope for the write path
//! - `ReadQuery` parameters for the read path (with limit clamping)
//! - Response bodies (`ApplyResponse`, `ItemResponse`, `ListResponse`,
//!   `ErrorResponse`)
//! - The staged decode pipeline with explicit error variants
//!
//! This is a pure protocol crate with no I/O operations. Rows are dynamic
//! column-to-value mappings; required system fields (`event_id`, non-empty
//! row/filter) are validated here at the boundary, before any payload
//! reaches a storage gateway.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod operation;
mod query;
mod response;

pub use error::{DecodeError, DecodeResult};
pub use operation::{ApplyRequest, Operation, Row};
pub use query::{ReadQuery, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, MIN_LIST_LIMIT};
pub use response::{ApplyResponse, ErrorResponse, ItemResponse, ListResponse};
