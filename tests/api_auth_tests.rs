// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Protected routes accept bearer and cookie tokens
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use trail_tracker::db::{tables, TableStore};
use trail_tracker::middleware::auth::TOKEN_COOKIE;
use tower::ServiceExt;

mod common;

use common::{authed_request, body_json, create_test_app, create_test_jwt};

#[tokio::test]
async fn test_health_is_public() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _, _) = create_test_app();

    for uri in ["/api/me", "/api/stats", "/api/tracking", "/api/sessions", "/api/posts"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(authed_request("GET", "/api/me", "not.a.jwt", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let (app, _, _) = create_test_app();
    let token = trail_tracker::middleware::auth::create_jwt(
        "user-1",
        None,
        b"a_completely_different_secret_key",
    )
    .unwrap();

    let response = app
        .oneshot(authed_request("GET", "/api/me", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_uses_token_email_without_profile() {
    let (app, _, _) = create_test_app();
    let token = create_test_jwt("user-1", Some("rider@example.com"));

    let response = app
        .oneshot(authed_request("GET", "/api/me", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user_id"], "user-1");
    assert_eq!(body["email"], "rider@example.com");
}

#[tokio::test]
async fn test_me_prefers_profile_email() {
    let (app, _, store) = create_test_app();
    store
        .insert(
            tables::USER_PROFILES,
            json!({"id": "user-1", "email": "profile@example.com"}),
        )
        .await
        .unwrap();
    let token = create_test_jwt("user-1", Some("token@example.com"));

    let response = app
        .oneshot(authed_request("GET", "/api/me", &token, None))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["email"], "profile@example.com");
}

#[tokio::test]
async fn test_cookie_token_accepted() {
    let (app, _, _) = create_test_app();
    let token = create_test_jwt("user-2", None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::COOKIE, format!("{}={}", TOKEN_COOKIE, token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user_id"], "user-2");
    assert!(body["email"].is_null());
}

#[tokio::test]
async fn test_security_headers_on_rejected_request() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/api/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
    assert_eq!(response.headers().get("X-Frame-Options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_cors_preflight_from_frontend() {
    let (app, state, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/sessions")
                .header(header::ORIGIN, state.config.frontend_url.as_str())
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        state.config.frontend_url.as_str()
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/sessions")
                .header(header::ORIGIN, "https://evil.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
