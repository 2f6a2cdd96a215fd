// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session history, route and stats API tests.

use axum::http::StatusCode;
use serde_json::{json, Value};
use trail_tracker::db::{tables, MemoryStore, TableStore};
use tower::ServiceExt;

mod common;

use common::{authed_request, body_json, create_test_app, create_test_jwt};

/// Store a session row the way the recorder writes it; returns its id.
async fn seed_session(store: &MemoryStore, user_id: &str, start: &str, end: &str, distance: f64) -> String {
    let row = store
        .insert(
            tables::SESSIONS,
            json!({
                "user_id": user_id,
                "start_time": start,
                "end_time": end,
                "distance": distance,
                "coords": [
                    { "latitude": 38.5, "longitude": -120.2, "timestamp": 0 },
                    { "latitude": 40.7, "longitude": -120.95, "timestamp": 1000 },
                    { "latitude": 43.252, "longitude": -126.453, "timestamp": 2000 },
                ],
            }),
        )
        .await
        .unwrap();
    row["id"].as_str().unwrap().to_string()
}

async fn get(app: &axum::Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(authed_request("GET", uri, token, None))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_list_only_own_sessions_newest_first() {
    let (app, _, store) = create_test_app();
    seed_session(&store, "alice", "2026-01-01T08:00:00.000Z", "2026-01-01T09:00:00.000Z", 5000.0).await;
    seed_session(&store, "alice", "2026-01-03T08:00:00.000Z", "2026-01-03T09:00:00.000Z", 7000.0).await;
    seed_session(&store, "bob", "2026-01-02T08:00:00.000Z", "2026-01-02T09:00:00.000Z", 1000.0).await;

    let token = create_test_jwt("alice", None);
    let (status, body) = get(&app, "/api/sessions", &token).await;

    assert_eq!(status, StatusCode::OK);
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["distance"], 7000.0);
    assert_eq!(sessions[1]["distance"], 5000.0);
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 50);
}

#[tokio::test]
async fn test_list_pagination() {
    let (app, _, store) = create_test_app();
    for day in 1..=5 {
        let start = format!("2026-01-0{}T08:00:00.000Z", day);
        let end = format!("2026-01-0{}T09:00:00.000Z", day);
        seed_session(&store, "alice", &start, &end, day as f64 * 1000.0).await;
    }

    let token = create_test_jwt("alice", None);
    let (_, body) = get(&app, "/api/sessions?page=2&per_page=2", &token).await;

    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["distance"], 3000.0);
    assert_eq!(sessions[1]["distance"], 2000.0);
    assert_eq!(body["page"], 2);
}

#[tokio::test]
async fn test_session_detail_has_polyline() {
    let (app, _, store) = create_test_app();
    let id = seed_session(&store, "alice", "2026-01-01T08:00:00.000Z", "2026-01-01T09:00:00.000Z", 9000.0).await;

    let token = create_test_jwt("alice", None);
    let (status, body) = get(&app, &format!("/api/sessions/{}", id), &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["polyline"], "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    assert_eq!(body["coords"].as_array().unwrap().len(), 3);
    assert_eq!(body["duration_seconds"], 3600.0);
    assert!((body["avg_speed_kmh"].as_f64().unwrap() - 9.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_other_users_session_is_not_found() {
    let (app, _, store) = create_test_app();
    let id = seed_session(&store, "alice", "2026-01-01T08:00:00.000Z", "2026-01-01T09:00:00.000Z", 9000.0).await;

    let token = create_test_jwt("bob", None);
    let (status, body) = get(&app, &format!("/api/sessions/{}", id), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let response = app
        .clone()
        .oneshot(authed_request("DELETE", &format!("/api/sessions/{}", id), &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(store.rows(tables::SESSIONS).len(), 1);
}

#[tokio::test]
async fn test_session_route_geojson() {
    let (app, _, store) = create_test_app();
    let id = seed_session(&store, "alice", "2026-01-01T08:00:00.000Z", "2026-01-01T09:00:00.000Z", 9000.0).await;

    let token = create_test_jwt("alice", None);
    let (status, body) = get(&app, &format!("/api/sessions/{}/route", id), &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Feature");
    assert_eq!(body["geometry"]["type"], "LineString");
    assert_eq!(body["geometry"]["coordinates"][0], json!([-120.2, 38.5]));
    assert_eq!(body["properties"]["start_time"], "2026-01-01T08:00:00.000Z");
}

#[tokio::test]
async fn test_delete_session() {
    let (app, _, store) = create_test_app();
    let id = seed_session(&store, "alice", "2026-01-01T08:00:00.000Z", "2026-01-01T09:00:00.000Z", 9000.0).await;
    let token = create_test_jwt("alice", None);

    let response = app
        .clone()
        .oneshot(authed_request("DELETE", &format!("/api/sessions/{}", id), &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    assert!(store.rows(tables::SESSIONS).is_empty());
    let (status, _) = get(&app, &format!("/api/sessions/{}", id), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_sum_own_sessions() {
    let (app, _, store) = create_test_app();
    seed_session(&store, "alice", "2026-01-01T08:00:00.000Z", "2026-01-01T09:00:00.000Z", 10000.0).await;
    seed_session(&store, "alice", "2026-01-02T08:00:00.000Z", "2026-01-02T09:00:00.000Z", 8000.0).await;
    // End before start: counted, but adds no time
    seed_session(&store, "alice", "2026-01-03T09:00:00.000Z", "2026-01-03T08:00:00.000Z", 2000.0).await;
    seed_session(&store, "bob", "2026-01-01T08:00:00.000Z", "2026-01-01T09:00:00.000Z", 99000.0).await;

    let token = create_test_jwt("alice", None);
    let (status, body) = get(&app, "/api/stats", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_count"], 3);
    assert_eq!(body["total_distance_meters"], 20000.0);
    assert_eq!(body["total_duration_seconds"], 7200.0);
    assert!((body["avg_speed_kmh"].as_f64().unwrap() - 10.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_stats_empty() {
    let (app, _, _) = create_test_app();
    let token = create_test_jwt("nobody", None);

    let (status, body) = get(&app, "/api/stats", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_count"], 0);
    assert_eq!(body["avg_speed_kmh"], 0.0);
}

#[tokio::test]
async fn test_recorded_session_appears_in_history() {
    let (app, _, _) = create_test_app();
    let token = create_test_jwt("alice", None);

    for (uri, body) in [
        ("/api/tracking/start", Some(json!({ "permission": "granted" }))),
        (
            "/api/tracking/fixes",
            Some(json!({ "fixes": [
                { "latitude": 0.0, "longitude": 0.0, "timestamp": common::T0 },
                { "latitude": 0.001, "longitude": 0.0, "timestamp": common::T0 + 60_000 },
            ]})),
        ),
        ("/api/tracking/stop", None),
    ] {
        let response = app
            .clone()
            .oneshot(authed_request("POST", uri, &token, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    let (_, body) = get(&app, "/api/sessions", &token).await;
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert!((sessions[0]["distance"].as_f64().unwrap() - 111.0).abs() < 1e-6);

    let id = sessions[0]["id"].as_str().unwrap();
    let (_, detail) = get(&app, &format!("/api/sessions/{}", id), &token).await;
    assert_eq!(detail["duration_seconds"], 60.0);
}

#[tokio::test]
async fn test_rows_with_null_fields_do_not_break_history() {
    let (app, _, store) = create_test_app();
    seed_session(&store, "alice", "2026-01-01T08:00:00.000Z", "2026-01-01T09:00:00.000Z", 9000.0).await;
    let row = store
        .insert(
            tables::SESSIONS,
            json!({
                "user_id": "alice",
                "start_time": null,
                "end_time": null,
                "distance": null,
                "coords": [],
            }),
        )
        .await
        .unwrap();
    let unknown_id = row["id"].as_str().unwrap().to_string();
    let token = create_test_jwt("alice", None);

    let (status, body) = get(&app, "/api/sessions", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 2);

    let (status, body) = get(&app, "/api/stats", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_count"], 2);
    assert_eq!(body["total_distance_meters"], 9000.0);
    assert_eq!(body["total_duration_seconds"], 3600.0);

    let (status, body) = get(&app, &format!("/api/sessions/{}", unknown_id), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["distance"].is_null());
    assert!(body["duration_seconds"].is_null());
    assert!(body["avg_speed_kmh"].is_null());
}
