//! Warden REST API
//!
//! This crate provides the Axum-based HTTP API for Warden: the login
//! endpoint, token-protected probe endpoints, health checks and metrics.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
