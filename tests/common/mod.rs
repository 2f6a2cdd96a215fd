// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use serde_json::Value;
use std::sync::Arc;
use trail_tracker::config::Config;
use trail_tracker::db::{BackendClient, MemoryStore, StaticAuth};
use trail_tracker::middleware::auth::create_jwt;
use trail_tracker::routes::create_router;
use trail_tracker::AppState;

/// Start of the test clock, in epoch milliseconds.
#[allow(dead_code)]
pub const T0: i64 = 1_700_000_000_000;

/// Create a test app backed by an in-memory store.
/// Returns the router, the shared state and the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryStore) {
    let config = Config::test_default();
    let store = MemoryStore::new();
    let backend = BackendClient::new(
        Arc::new(store.clone()),
        Arc::new(StaticAuth::signed_out()),
    );

    let state = Arc::new(AppState::new(config, backend));
    (create_router(state.clone()), state, store)
}

/// Signed token for `user_id` using the test config secret.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, email: Option<&str>) -> String {
    create_jwt(user_id, email, &Config::test_default().jwt_secret).unwrap()
}

/// Authorized request with an optional JSON body.
#[allow(dead_code)]
pub fn authed_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
