//! Orders API — axum HTTP service for order management.
//!
//! Sits behind the platform gateway, which authenticates requests and
//! forwards the caller's identity in trusted headers. Order mutations
//! publish domain events through the in-process event pipeline after
//! their database change commits.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
pub mod state;

use state::AppState;

/// Builds the full application router. Shared by `main` and the
/// integration tests.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/v1/orders", routes::orders::router())
        .nest("/v1/events", routes::events::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
