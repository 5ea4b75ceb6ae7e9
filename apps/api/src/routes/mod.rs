pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/analyses", post(handlers::handle_analyze))
        .route("/api/v1/analyses/csv", post(handlers::handle_analyze_csv))
        // Export API
        .route("/api/v1/exports/csv", post(handlers::handle_export_csv))
        .with_state(state)
}
