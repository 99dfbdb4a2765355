//! End-to-end tests driving the HTTP surface.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rowsync_protocol::Row;
use rowsync_server::{router, ServerConfig, SyncHandler, SYNC_KEY_HEADER};
use rowsync_store::{CachePolicy, InMemoryBackend, TableCatalog, TableRef};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const KEY: &str = "integration-sync-key";

fn status_row(id: i64, name: &str) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), json!(id));
    row.insert("name".to_string(), json!(name));
    row
}

fn app() -> (Arc<InMemoryBackend>, Router) {
    let backend = Arc::new(InMemoryBackend::new());
    backend.seed_rows(
        &TableRef::new("public", "statuses"),
        vec![status_row(1, "active"), status_row(2, "inactive")],
    );
    backend.add_unique_index(&TableRef::new("public", "sync_events_applied"), "event_id");

    let handler = Arc::new(SyncHandler::new(
        ServerConfig::new(KEY),
        Arc::clone(&backend) as Arc<dyn rowsync_store::RowBackend>,
        Arc::new(TableCatalog::default()),
        CachePolicy::never_expires(),
    ));
    (backend, router(handler))
}

fn get(uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(key) = key {
        builder = builder.header(SYNC_KEY_HEADER, key);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(body: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/");
    if let Some(key) = key {
        builder = builder.header(SYNC_KEY_HEADER, key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn upsert_body(event_id: &str, name: &str, qty: i64) -> String {
    json!({
        "op": "upsert",
        "event_id": event_id,
        "table": "items",
        "row": {"name": name, "qty": qty}
    })
    .to_string()
}

#[tokio::test]
async fn missing_key_is_forbidden_before_any_backend_call() {
    let (backend, app) = app();

    let response = app
        .clone()
        .oneshot(post(&upsert_body("e1", "widget", 5), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.oneshot(get("/", Some("wrong-key"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn other_methods_are_rejected() {
    let (_backend, app) = app();

    let request = Request::builder()
        .method("DELETE")
        .uri("/")
        .header(SYNC_KEY_HEADER, KEY)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn apply_then_dedup() {
    let (_backend, app) = app();
    let body = upsert_body("e1", "widget", 5);

    let response = app.clone().oneshot(post(&body, Some(KEY))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"ok": true, "deduped": false})
    );

    let response = app.oneshot(post(&body, Some(KEY))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"ok": true, "deduped": true})
    );
}

#[tokio::test]
async fn validation_failures_are_400() {
    let (_backend, app) = app();

    let response = app
        .clone()
        .oneshot(post("{not json", Some(KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "invalid_request");

    let missing_event = json!({"op": "upsert", "row": {"name": "x"}}).to_string();
    let response = app
        .clone()
        .oneshot(post(&missing_event, Some(KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown_op =
        json!({"op": "archive", "event_id": "e9", "row": {"name": "x"}}).to_string();
    let response = app
        .clone()
        .oneshot(post(&unknown_op, Some(KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "unknown_operation");

    let empty_filter =
        json!({"op": "delete", "event_id": "e9", "filter": {}}).to_string();
    let response = app.oneshot(post(&empty_filter, Some(KEY))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn soft_delete_then_read() {
    let (_backend, app) = app();

    let response = app
        .clone()
        .oneshot(post(&upsert_body("e1", "widget", 5), Some(KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delete = json!({
        "op": "delete",
        "event_id": "e2",
        "table": "items",
        "filter": {"name": "widget"}
    })
    .to_string();
    let response = app.clone().oneshot(post(&delete, Some(KEY))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Hidden without include_deleted.
    let response = app
        .clone()
        .oneshot(get("/?table=items&col=name&val=widget", Some(KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true, "item": null}));

    // Visible with include_deleted, carrying the inactive status.
    let response = app
        .oneshot(get(
            "/?table=items&col=name&val=widget&include_deleted=true",
            Some(KEY),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["item"]["status_id"], json!(2));
}

#[tokio::test]
async fn list_applies_limit_clamping() {
    let (backend, app) = app();
    let items = TableRef::new("public", "items");
    for i in 0..5 {
        let mut row = Row::new();
        row.insert("name".to_string(), json!(format!("item-{i}")));
        row.insert("status_id".to_string(), json!(1));
        row.insert(
            "updated_at".to_string(),
            json!(format!("2025-01-0{}T00:00:00Z", i + 1)),
        );
        backend.seed_rows(&items, vec![row]);
    }

    // limit=0 clamps to 1.
    let response = app
        .clone()
        .oneshot(get("/?limit=0", Some(KEY)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["name"], json!("item-4"));

    // Non-numeric limit falls back to the default, returning everything
    // seeded here.
    let response = app
        .clone()
        .oneshot(get("/?limit=abc", Some(KEY)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 5);

    // Oversized limit clamps to 200 and succeeds.
    let response = app.oneshot(get("/?limit=9999", Some(KEY))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn ledger_failures_are_500() {
    let (backend, app) = app();

    backend.fail_selects("ledger unavailable");
    let response = app
        .clone()
        .oneshot(post(&upsert_body("e1", "widget", 5), Some(KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["code"], "ledger_error");
    backend.clear_failures();

    backend.fail_inserts("ledger unavailable");
    let response = app
        .oneshot(post(&upsert_body("e2", "widget", 5), Some(KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn backend_failures_are_400_with_detail() {
    let (backend, app) = app();
    backend.fail_upserts("relation \"public.items\" does not exist");

    let response = app
        .clone()
        .oneshot(post(&upsert_body("e1", "widget", 5), Some(KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "backend_error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("does not exist"));
    backend.clear_failures();

    backend.fail_selects("query failed");
    let response = app
        .oneshot(get("/?include_deleted=true", Some(KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
