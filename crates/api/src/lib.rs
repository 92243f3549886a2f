//! HTTP API for Vitals.
//!
//! Every `/api` route acts as the caller named in the `x-user-id` header.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

pub use crate::config::{Config, ConfigError};
pub use crate::error::ApiError;
pub use crate::state::AppState;

/// Build the application with its state attached.
pub fn app(state: AppState) -> Router {
    routes::router().with_state(state)
}
