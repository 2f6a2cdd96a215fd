// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Trail-Tracker: record GPS-tracked outdoor sessions and share them
//!
//! This crate provides the backend API for live session recording,
//! session history, and the social feed of published sessions.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::BackendClient;
use services::TrackingService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Backend client without a caller identity; handlers scope by user id
    pub backend: BackendClient,
    pub tracking: TrackingService,
}

impl AppState {
    pub fn new(config: Config, backend: BackendClient) -> Self {
        let tracking = TrackingService::new(backend.clone());
        Self {
            config,
            backend,
            tracking,
        }
    }
}
