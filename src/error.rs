// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::db::StoreError;
use crate::services::TrackingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    /// Backend message, shown to the caller verbatim.
    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err.message())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Tracking(err) => tracking_parts(err),
            AppError::Store(msg) => {
                tracing::error!(error = %msg, "Store error");
                (StatusCode::BAD_GATEWAY, "store_error", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        }
    }
}

fn tracking_parts(err: &TrackingError) -> (StatusCode, &'static str, Option<String>) {
    let details = Some(err.to_string());
    match err {
        TrackingError::PermissionDenied => (StatusCode::FORBIDDEN, "permission_denied", details),
        TrackingError::InsufficientSamples { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_samples", details)
        }
        TrackingError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated", None),
        TrackingError::Store(msg) => {
            tracing::error!(error = %msg, "Failed to persist session");
            (StatusCode::BAD_GATEWAY, "store_error", Some(msg.clone()))
        }
        TrackingError::AlreadyRecording => (StatusCode::CONFLICT, "already_recording", details),
        TrackingError::NotRecording => (StatusCode::CONFLICT, "not_recording", details),
        TrackingError::InvalidTimestamp(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_timestamp", details)
        }
        TrackingError::Location(e) => {
            tracing::error!(error = %e, "Location capability failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "location_error", None)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
