//! API module
//!
//! HTTP API endpoints, middleware and application wiring.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::service::QueryService;

pub use routes::create_router;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
}

impl AppState {
    pub fn new(service: QueryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // ServiceBuilder runs top to bottom: logging -> principal -> handler
    let api_routes = create_router().layer(
        ServiceBuilder::new()
            .layer(axum_middleware::from_fn(middleware::logging_middleware))
            .layer(axum_middleware::from_fn(middleware::principal_middleware)),
    );

    Router::new()
        // Health check (no principal)
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
