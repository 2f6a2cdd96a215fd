// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the current user: profile and dashboard stats.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::SessionStats;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/stats", get(get_stats))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub email: Option<String>,
}

/// Get current user profile.
///
/// Falls back to the token's email when the profile row is missing.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state.backend.get_profile(&user.user_id).await?;
    let email = profile.and_then(|p| p.email).or(user.email);

    Ok(Json(UserResponse {
        user_id: user.user_id,
        email,
    }))
}

// ─── Stats ───────────────────────────────────────────────────

/// Dashboard totals over all of the caller's sessions.
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionStats>> {
    let sessions = state.backend.all_sessions_for_user(&user.user_id).await?;
    let stats = SessionStats::from_sessions(&sessions);

    tracing::debug!(
        user_id = %user.user_id,
        sessions = stats.session_count,
        "Computed session stats"
    );
    Ok(Json(stats))
}
