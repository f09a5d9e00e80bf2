//! HTTP API route definitions.

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/mttq",
            get(handlers::search).post(handlers::index_documents),
        )
        .route("/health", get(handlers::health))
        // Uploads are unbounded
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
