//! TripLoom API crate: axum HTTP server, auth middleware, route handlers.
//!
//! Exposes the assistant endpoints under `/v1` and a public health check.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AuthMode, UserId};
pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
