//! Eval Hub Server - HTTP REST API for the evaluation hub
//!
//! This crate exposes the evaluation hub over HTTP. It supports:
//!
//! - **Evaluation Jobs**: Submit, list, inspect, summarise and cancel jobs
//! - **Benchmarks**: Browse the benchmark catalogue, providers and collections
//! - **Health & Metrics**: Liveness/status probes and Prometheus-compatible metrics
//! - **Documentation**: OpenAPI document and an interactive viewer
//!
//! # Features
//!
//! - **Execution Context**: Per-request correlation id, tracing span and defaults
//! - **Middleware**: Request metrics, panic recovery, structured logging, timeouts
//! - **Configuration**: Layered YAML files, secret files and environment variables
//! - **Error Handling**: JSON error envelopes that never leak internal detail
//! - **Graceful Shutdown**: Bounded drain on SIGTERM / Ctrl+C
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use eval_hub::ConfigLoader;
//! use server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     Server::new(config)?.run_until_signal().await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /api/v1/health` - Liveness probe
//! - `GET /api/v1/status` - Service identity, version and uptime
//! - `POST|GET /api/v1/evaluations/jobs` - Submit or list evaluation jobs
//! - `GET|DELETE /api/v1/evaluations/jobs/{id}` - Get or cancel a job
//! - `GET /api/v1/evaluations/jobs/{id}/summary` - Job summary
//! - `GET /api/v1/evaluations/benchmarks` - Benchmark catalogue
//! - `GET|POST /api/v1/evaluations/collections` - List or create collections
//! - `GET|PUT|PATCH|DELETE /api/v1/evaluations/collections/{id}` - Manage a collection
//! - `GET /api/v1/evaluations/providers` - List providers
//! - `GET /api/v1/evaluations/providers/{id}` - Get a provider
//! - `GET /api/v1/metrics/system` - System metrics
//! - `GET /metrics` - Prometheus metrics
//! - `GET /openapi.yaml` - OpenAPI document (JSON with `Accept: application/json`)
//! - `GET /docs` - API documentation viewer

pub mod context;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_support;

pub use context::ExecutionContext;
pub use error::{ServerError, ServerResult};
pub use metrics::HttpMetrics;
pub use server::{build_router, init_tracing, Server, ServerPhase};
pub use state::ServerState;
