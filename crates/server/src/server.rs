//! Server initialization, routing and lifecycle
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (tracing, metrics, panic recovery, logging, timeouts)
//! - The `Created -> Running -> ShuttingDown -> Stopped` lifecycle
//! - Graceful shutdown on SIGTERM / Ctrl+C

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use eval_hub::Config;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::error::{ServerError, ServerResult};
use crate::metrics::track_metrics;
use crate::middleware::log_requests;
use crate::routes::{collections, docs, evaluations, health, providers};
use crate::routes::{method_not_allowed, not_found};
use crate::state::ServerState;

pub const READ_TIMEOUT: Duration = Duration::from_secs(15);
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(15);
/// Keep-alive idle budget. hyper's connection builder owns idle handling,
/// so this is advertised for deployments rather than enforced per request.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Lifecycle phase of a [`Server`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    Created,
    Running,
    ShuttingDown,
    Stopped,
}

/// Build the Axum router with all routes and middleware
///
/// Every registered path answers unsupported methods with a plain-text 405;
/// unknown paths get the JSON 404 envelope.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let routes = Router::new()
        // Health and status
        .route(
            "/api/v1/health",
            get(health::health_check).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/status",
            get(health::service_status).fallback(method_not_allowed),
        )
        // Evaluation jobs
        .route(
            "/api/v1/evaluations/jobs",
            post(evaluations::create_job)
                .get(evaluations::list_jobs)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/v1/evaluations/jobs/{id}",
            get(evaluations::get_job)
                .delete(evaluations::cancel_job)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/v1/evaluations/jobs/{id}/summary",
            get(evaluations::job_summary).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/evaluations/benchmarks",
            get(evaluations::list_benchmarks).fallback(method_not_allowed),
        )
        // Collections
        .route(
            "/api/v1/evaluations/collections",
            get(collections::list_collections)
                .post(collections::create_collection)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/v1/evaluations/collections/{id}",
            get(collections::get_collection)
                .put(collections::update_collection)
                .patch(collections::patch_collection)
                .delete(collections::delete_collection)
                .fallback(method_not_allowed),
        )
        // Providers
        .route(
            "/api/v1/evaluations/providers",
            get(providers::list_providers).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/evaluations/providers/{id}",
            get(providers::get_provider).fallback(method_not_allowed),
        )
        // Metrics
        .route(
            "/api/v1/metrics/system",
            get(providers::system_metrics).fallback(method_not_allowed),
        )
        .route(
            "/metrics",
            get(health::metrics).fallback(method_not_allowed),
        )
        // Documentation
        .route(
            "/openapi.yaml",
            get(docs::openapi_spec).fallback(method_not_allowed),
        )
        .route("/docs", get(docs::docs_page).fallback(method_not_allowed))
        .fallback(not_found);

    with_middleware(routes, state)
}

/// Middleware stack (applied in reverse order):
/// 1. Request tracing span
/// 2. Metrics (outermost of ours, so it sees the final status)
/// 3. Request logging
/// 4. Panic recovery into a 500
/// 5. Timeout handling
fn with_middleware(router: Router<Arc<ServerState>>, state: Arc<ServerState>) -> Router {
    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            READ_TIMEOUT.max(WRITE_TIMEOUT),
        ))
        .layer(CatchPanicLayer::new())
        .layer(from_fn(log_requests))
        .layer(from_fn_with_state(Arc::clone(&state), track_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

struct Running {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

/// The evaluation hub HTTP server.
pub struct Server {
    state: Arc<ServerState>,
    host: String,
    port: u16,
    phase: ServerPhase,
    running: Option<Running>,
}

impl Server {
    /// Create a server from configuration. The `service` section is required.
    pub fn new(config: Config) -> ServerResult<Self> {
        Self::from_state(ServerState::new(config)?)
    }

    /// Create a server around prepared state, e.g. one carrying a tracker.
    pub fn from_state(state: ServerState) -> ServerResult<Self> {
        let service = state
            .config
            .service
            .clone()
            .ok_or(ServerError::MissingServiceConfig)?;

        Ok(Self {
            state: Arc::new(state),
            host: service.host,
            port: service.port,
            phase: ServerPhase::Created,
            running: None,
        })
    }

    /// The routed application, identical to the one [`Server::start`] serves.
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    pub fn phase(&self) -> ServerPhase {
        self.phase
    }

    /// Bound address while running. Resolves port `0` to the real port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Bind the listener and start serving in the background.
    pub async fn start(&mut self) -> ServerResult<SocketAddr> {
        let app = self.router();
        self.serve(app).await
    }

    async fn serve(&mut self, app: Router) -> ServerResult<SocketAddr> {
        if self.phase != ServerPhase::Created {
            return Err(ServerError::AlreadyStarted);
        }

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let app = app.into_make_service_with_connect_info::<SocketAddr>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!(
            addr = %local_addr,
            read_timeout_secs = READ_TIMEOUT.as_secs(),
            write_timeout_secs = WRITE_TIMEOUT.as_secs(),
            idle_timeout_secs = IDLE_TIMEOUT.as_secs(),
            "Starting evaluation hub server"
        );

        self.phase = ServerPhase::Running;
        self.running = Some(Running {
            local_addr,
            shutdown_tx,
            task,
        });
        Ok(local_addr)
    }

    /// Stop accepting connections and wait up to `grace` for in-flight
    /// requests. A server that was never started shuts down trivially.
    pub async fn shutdown(&mut self, grace: Duration) -> ServerResult<()> {
        let Some(Running {
            shutdown_tx,
            mut task,
            ..
        }) = self.running.take()
        else {
            tracing::debug!(phase = ?self.phase, "shutdown requested on idle server");
            return Ok(());
        };

        self.phase = ServerPhase::ShuttingDown;
        tracing::info!(grace_secs = grace.as_secs(), "Shutting down server");
        let _ = shutdown_tx.send(());

        let result = match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(err))) => Err(ServerError::Internal(format!("server failed: {err}"))),
            Ok(Err(err)) => Err(ServerError::Internal(format!("server task failed: {err}"))),
            Err(_) => {
                task.abort();
                Err(ServerError::ShutdownTimeout(grace))
            }
        };

        self.phase = ServerPhase::Stopped;
        match &result {
            Ok(()) => tracing::info!("Server shutdown complete"),
            Err(err) => tracing::error!(error = %err, "Server shutdown failed"),
        }
        result
    }

    /// Serve until SIGTERM or Ctrl+C, then shut down within
    /// [`SHUTDOWN_GRACE_PERIOD`].
    pub async fn run_until_signal(mut self) -> ServerResult<()> {
        self.start().await?;
        shutdown_signal().await;
        self.shutdown(SHUTDOWN_GRACE_PERIOD).await
    }
}

/// Install the JSON tracing subscriber. `RUST_LOG` wins over `default_level`.
///
/// Calling this more than once is harmless; later calls keep the first subscriber.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .try_init();
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
