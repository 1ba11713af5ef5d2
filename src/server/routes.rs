//! Router configuration for the API server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Address resolution
        .route("/api/v1/lookup", get(handlers::lookup))
        .route("/api/v1/bulk-lookup", post(handlers::bulk_lookup))
        // Reference data
        .route("/api/v1/districts", get(handlers::list_districts))
        .route("/api/v1/officials/:official_id", get(handlers::official_detail))
        // Sync status
        .route("/api/v1/sync/status", get(handlers::sync_status))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
