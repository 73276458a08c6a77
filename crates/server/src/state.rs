use std::sync::Arc;
use std::time::{Duration, Instant};

use eval_hub::{Config, ExperimentTracker};

use crate::error::ServerResult;
use crate::metrics::HttpMetrics;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Service configuration
    pub config: Arc<Config>,

    /// Request metrics registry, rendered by `/metrics`
    pub metrics: HttpMetrics,

    /// Optional experiment tracker handed to every execution context
    pub tracker: Option<Arc<dyn ExperimentTracker>>,

    started_at: Instant,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: Config) -> ServerResult<Self> {
        Ok(Self {
            config: Arc::new(config),
            metrics: HttpMetrics::new()?,
            tracker: None,
            started_at: Instant::now(),
        })
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn ExperimentTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
