//! API routes for bridge-server

pub mod counters;
pub mod health;
pub mod submit;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/vouchers/submit", post(submit::submit_batch))
        .route("/api/counters", get(counters::list_counters))
        .route("/api/ledger/{idempotency_key}", get(counters::lookup_ledger))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
