//! Chronicle API: the HTTP composition root for the to-do sample.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full router over `state`. `main` and the integration tests
/// share this route structure.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/todos", routes::todo::router())
        .layer(TraceLayer::new_for_http())
        // TODO: Replace CorsLayer::permissive() with restricted origins for production.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
