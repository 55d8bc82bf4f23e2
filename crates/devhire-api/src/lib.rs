//! Axum HTTP API server.
//!
//! This crate provides:
//! - REST endpoints for registration, login, job browsing, and applications
//! - JWT access/refresh token issuing and verification
//! - Role- and ownership-based authorization
//! - Security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod password;
pub mod response;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
