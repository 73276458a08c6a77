//! HTTP request instrumentation.
//!
//! [`HttpMetrics`] owns a Prometheus recorder that is private to one
//! application instance instead of being installed as the process-global
//! `metrics` recorder, so every router built in a test gets its own registry.
//! [`track_metrics`] is the middleware that feeds it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{Gauge, Key, Label, Level, Metadata, Recorder, Unit};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

use crate::state::ServerState;

pub const REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const REQUESTS_IN_FLIGHT: &str = "http_requests_in_flight";
pub const REQUESTS_TOTAL: &str = "http_requests_total";

const DURATION_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// Request duration, in-flight and total counters for one application.
#[derive(Clone)]
pub struct HttpMetrics {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
}

impl HttpMetrics {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION.to_string()),
                &DURATION_BUCKETS,
            )?
            .build_recorder();

        recorder.describe_histogram(
            REQUEST_DURATION.into(),
            Some(Unit::Seconds),
            "Duration of HTTP requests in seconds".into(),
        );
        recorder.describe_gauge(
            REQUESTS_IN_FLIGHT.into(),
            None,
            "Number of HTTP requests currently being served".into(),
        );
        recorder.describe_counter(
            REQUESTS_TOTAL.into(),
            None,
            "Total number of HTTP requests".into(),
        );

        let handle = recorder.handle();
        Ok(Self {
            recorder: Arc::new(recorder),
            handle,
        })
    }

    /// Mark a request as in flight until the returned guard is dropped.
    pub fn in_flight(&self) -> InFlightGuard {
        let gauge = self
            .recorder
            .register_gauge(&Key::from_name(REQUESTS_IN_FLIGHT), &METADATA);
        gauge.increment(1.0);
        InFlightGuard { gauge }
    }

    /// Record a completed request.
    pub fn record(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let labels = vec![
            Label::new("method", method.to_string()),
            Label::new("path", path.to_string()),
            Label::new("status", status.to_string()),
        ];

        self.recorder
            .register_histogram(
                &Key::from_parts(REQUEST_DURATION, labels.clone()),
                &METADATA,
            )
            .record(elapsed.as_secs_f64());
        self.recorder
            .register_counter(&Key::from_parts(REQUESTS_TOTAL, labels), &METADATA)
            .increment(1);
    }

    /// Prometheus text exposition of every metric recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Decrements the in-flight gauge on drop, including during unwinding.
pub struct InFlightGuard {
    gauge: Gauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.decrement(1.0);
    }
}

/// Metrics middleware: in-flight tracking plus duration and total per
/// method, path and final status.
pub async fn track_metrics(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let _in_flight = state.metrics.in_flight();
    let response = next.run(request).await;

    state.metrics.record(
        method.as_str(),
        &path,
        response.status().as_u16(),
        start.elapsed(),
    );
    response
}

/// Find the sample value of `name` whose labels include every `(key, value)` pair
/// in a rendered exposition. Test helper shared with the integration tests.
#[doc(hidden)]
pub fn sample(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .find(|line| {
            labels
                .iter()
                .all(|(k, v)| line.contains(&format!("{k}=\"{v}\"")))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}
