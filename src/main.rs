// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trail-Tracker API Server
//!
//! Records GPS-tracked sessions pushed by the mobile client and serves
//! session history, stats, posts and comments.

use std::sync::Arc;
use trail_tracker::{
    config::Config,
    db::{BackendClient, MemoryStore, RestStore, StaticAuth, TableStore},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Trail-Tracker API");

    // Table store: hosted backend if configured, otherwise in-memory
    let store: Arc<dyn TableStore> = match (&config.backend_url, &config.backend_api_key) {
        (Some(url), Some(key)) => {
            tracing::info!(url = %url, "Using hosted table backend");
            Arc::new(RestStore::new(url, key.clone()))
        }
        _ => {
            tracing::warn!("BACKEND_URL not set; using in-memory store (data is not persisted)");
            Arc::new(MemoryStore::new())
        }
    };
    let backend = BackendClient::new(store, Arc::new(StaticAuth::signed_out()));

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), backend));

    // Build router
    let app = trail_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trail_tracker=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
