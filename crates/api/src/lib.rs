//! HTTP service for the friend-alerting backend.
//!
//! Each engine operation is exposed as one JSON endpoint. Callers are
//! identified by the `X-User-Id` header set by the fronting proxy.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod sweeper;

use axum::Router;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use state::AppState;

/// Build the application with state attached.
pub fn app(state: AppState) -> Router {
    routes::router().with_state(state)
}
