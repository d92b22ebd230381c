//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chronicle_core::bus::{EventBus, NoopEventBus};
use chronicle_core::repository::EventStore;
use chronicle_event_store::InMemoryEventStore;
use chronicle_test_support::FixedClock;
use http_body_util::BodyExt;
use tower::ServiceExt;

use chronicle_api::state::AppState;

/// Build the full app router over `store` and `bus` with a fixed clock. Uses
/// the same route structure as `main.rs`.
pub fn build_test_app_with_bus(store: Arc<dyn EventStore>, bus: Arc<dyn EventBus>) -> Router {
    let app_state =
        AppState::new(Arc::new(FixedClock::at_fixed_time()), store, bus, "memory").unwrap();
    chronicle_api::app(app_state)
}

/// Build the full app router over `store` with a no-op bus.
pub fn build_test_app_with(store: Arc<dyn EventStore>) -> Router {
    build_test_app_with_bus(store, Arc::new(NoopEventBus))
}

/// Build the full app router over a fresh in-memory store.
pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(InMemoryEventStore::new()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-actor-id", "alice")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a bodiless POST request and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a DELETE request and return the response.
pub async fn delete(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Create a to-do and return its id.
pub async fn create_todo(app: Router, text: &str) -> String {
    let (status, json) =
        post_json(app, "/api/v1/todos", &serde_json::json!({ "text": text })).await;
    assert_eq!(status, StatusCode::CREATED);
    json["aggregate_id"].as_str().unwrap().to_owned()
}
