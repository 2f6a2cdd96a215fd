// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session history routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CoordinateSample, SessionRecord};
use crate::routes::Pagination;
use crate::services::route::{encode_route, route_feature};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions", get(list_sessions))
        .route(
            "/api/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/{id}/route", get(get_session_route))
}

/// Session row in the history list.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionListItem {
    pub id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub start_time: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub end_time: Option<DateTime<Utc>>,
    pub distance: Option<f64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionListItem>,
    pub page: u32,
    pub per_page: u32,
}

/// Full session for the detail view.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionDetailResponse {
    pub id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub start_time: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub end_time: Option<DateTime<Utc>>,
    pub distance: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub avg_speed_kmh: Option<f64>,
    /// Encoded polyline (precision 5)
    pub polyline: String,
    pub coords: Vec<CoordinateSample>,
}

#[derive(Serialize)]
pub struct DeleteSessionResponse {
    pub success: bool,
}

/// List the caller's sessions, newest first.
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<Pagination>,
) -> Result<Json<SessionListResponse>> {
    let (limit, offset) = params.limit_offset();
    let sessions = state
        .backend
        .sessions_for_user(&user.user_id, limit, offset)
        .await?;

    Ok(Json(SessionListResponse {
        sessions: sessions
            .into_iter()
            .map(|s| SessionListItem {
                id: s.id,
                start_time: s.start_time,
                end_time: s.end_time,
                distance: s.distance,
            })
            .collect(),
        page: params.page(),
        per_page: params.per_page(),
    }))
}

async fn load_owned_session(
    state: &AppState,
    user: &AuthUser,
    session_id: &str,
) -> Result<SessionRecord> {
    state
        .backend
        .get_session_for_user(session_id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDetailResponse>> {
    let session = load_owned_session(&state, &user, &session_id).await?;

    let polyline = encode_route(&session.coords)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    Ok(Json(SessionDetailResponse {
        duration_seconds: session.duration_seconds(),
        avg_speed_kmh: session.avg_speed_kmh(),
        id: session.id,
        start_time: session.start_time,
        end_time: session.end_time,
        distance: session.distance,
        polyline,
        coords: session.coords,
    }))
}

/// Route as a GeoJSON feature for map rendering.
async fn get_session_route(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<geojson::Feature>> {
    let session = load_owned_session(&state, &user, &session_id).await?;
    if session.coords.is_empty() {
        return Err(AppError::NotFound(format!(
            "Session {} has no recorded route",
            session_id
        )));
    }
    Ok(Json(route_feature(&session)))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteSessionResponse>> {
    // Ownership check before deleting by id
    let session = load_owned_session(&state, &user, &session_id).await?;
    state.backend.delete_session(&session.id).await?;

    tracing::info!(user_id = %user.user_id, session_id = %session.id, "Session deleted");
    Ok(Json(DeleteSessionResponse { success: true }))
}
