//! HTTP layer for aliveim
//!
//! Provides:
//! - `POST /` alive reports (reset-or-create)
//! - `GET /devices/:device_id` status of a live device
//! - `DELETE /devices/:device_id` explicit deregistration
//! - `GET /health`

mod error;
mod routes;

pub use error::*;
pub use routes::*;

use aliveim_core::TimerRegistry;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: TimerRegistry,
}

impl AppState {
    pub fn new(registry: TimerRegistry) -> Self {
        Self { registry }
    }
}

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(routes::report_alive))
        .route("/health", get(routes::health_check))
        .route(
            "/devices/:device_id",
            get(routes::device_status).delete(routes::deregister_device),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
