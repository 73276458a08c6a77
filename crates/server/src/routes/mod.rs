//! API route handlers
//!
//! This module contains all HTTP endpoint implementations for the evaluation
//! hub. Routes are organized by resource:
//!
//! - `health`: Liveness, service status and the Prometheus scrape endpoint
//! - `evaluations`: Evaluation jobs and the benchmark catalogue
//! - `collections`: Benchmark collections
//! - `providers`: Benchmark providers and system metrics
//! - `docs`: OpenAPI document and the documentation viewer

pub mod collections;
pub mod docs;
pub mod evaluations;
pub mod health;
pub mod providers;

use crate::error::ServerError;
use axum::http::StatusCode;

/// 405 handler shared by every registered path.
///
/// Plain text, without the JSON error envelope.
pub async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
