//! The axum surface over the sync handler.
//!
//! One route serves the whole protocol: GET is the read path, POST the
//! write path, and every other method gets the router's 405. The adapter
//! only extracts the secret header and maps typed outcomes to `{ok: ...}`
//! JSON bodies; all semantics live in [`SyncHandler`].

use crate::error::ServerError;
use crate::handler::{ApplyOutcome, ReadOutcome, SyncHandler};
use crate::SYNC_KEY_HEADER;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rowsync_protocol::{ApplyResponse, ErrorResponse, ItemResponse, ListResponse, ReadQuery};
use std::sync::Arc;

/// Builds the router serving the sync endpoint at `/`.
pub fn router(handler: Arc<SyncHandler>) -> Router {
    Router::new()
        .route("/", get(handle_get).post(handle_post))
        .with_state(handler)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::new(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(SYNC_KEY_HEADER).and_then(|value| value.to_str().ok())
}

async fn handle_get(
    State(handler): State<Arc<SyncHandler>>,
    headers: HeaderMap,
    Query(query): Query<ReadQuery>,
) -> Response {
    match handler.handle_read(presented_key(&headers), &query) {
        Ok(ReadOutcome::Item(item)) => Json(ItemResponse::new(item)).into_response(),
        Ok(ReadOutcome::List(items)) => Json(ListResponse::new(items)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn handle_post(
    State(handler): State<Arc<SyncHandler>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    match handler.handle_apply(presented_key(&headers), &body) {
        Ok(ApplyOutcome::Applied) => Json(ApplyResponse::applied()).into_response(),
        Ok(ApplyOutcome::Deduped) => Json(ApplyResponse::deduped()).into_response(),
        Err(err) => err.into_response(),
    }
}
