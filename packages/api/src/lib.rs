// ABOUTME: HTTP API layer for Adapt providing component endpoints and routing
// ABOUTME: Integration layer over the pipeline's orchestrator and collaborators

use axum::{
    routing::{get, post},
    Router,
};

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Creates the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/generate-component", post(handlers::generate_component))
        .route("/api/validate-component", post(handlers::validate_component))
        .route("/api/debug-component", post(handlers::debug_component))
        .route("/api/compose", post(handlers::compose))
        .with_state(state)
}
