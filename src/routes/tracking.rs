// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live tracking routes.
//!
//! The device drives a session with:
//! 1. `POST /api/tracking/start` with the OS location permission
//! 2. `POST /api/tracking/fixes` as fixes arrive
//! 3. `POST /api/tracking/stop` to finalize and save

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::CoordinateSample;
use crate::services::location::AccessStatus;
use crate::services::recorder::FinishedSession;
use crate::services::tracking::{LiveStatus, PushSummary};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Upper bound on fixes per push request.
const MAX_FIXES_PER_PUSH: usize = 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tracking", get(get_status))
        .route("/api/tracking/start", post(start_tracking))
        .route("/api/tracking/fixes", post(push_fixes))
        .route("/api/tracking/stop", post(stop_tracking))
}

#[derive(Deserialize)]
struct StartRequest {
    /// Location permission as reported by the device OS
    permission: AccessStatus,
}

async fn start_tracking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<StartRequest>,
) -> Result<Json<LiveStatus>> {
    let status = state.tracking.start(&user, req.permission).await?;
    Ok(Json(status))
}

#[derive(Deserialize)]
struct FixesRequest {
    fixes: Vec<CoordinateSample>,
}

async fn push_fixes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<FixesRequest>,
) -> Result<Json<PushSummary>> {
    if req.fixes.len() > MAX_FIXES_PER_PUSH {
        return Err(crate::error::AppError::BadRequest(format!(
            "At most {} fixes per request",
            MAX_FIXES_PER_PUSH
        )));
    }

    let summary = state.tracking.push_fixes(&user.user_id, &req.fixes).await;
    Ok(Json(summary))
}

async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<LiveStatus> {
    Json(state.tracking.status(&user.user_id).await)
}

async fn stop_tracking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FinishedSession>> {
    let finished = state.tracking.stop(&user.user_id).await?;
    Ok(Json(finished))
}
