//! Request-scoped execution context.
//!
//! Every routed request gets a fresh [`ExecutionContext`] through axum's
//! extractor machinery. It carries the correlation id, the request fields
//! used for log correlation, a `tracing` span scoped with those fields and
//! the default operational budget for evaluation work.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::{REFERER, USER_AGENT};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method};
use chrono::{DateTime, Utc};
use eval_hub::{Config, ExperimentTracker};
use tracing::field::Empty;
use tracing::Span;
use uuid::Uuid;

use crate::state::ServerState;

/// Inbound header carrying the caller's correlation id.
pub const TRANSACTION_ID_HEADER: &str = "x-global-transaction-id";

/// Fallback header naming the authenticated user, set by fronting proxies.
pub const REMOTE_USER_HEADER: &str = "remote-user";

pub const DEFAULT_TIMEOUT_MINUTES: u32 = 60;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Correlation id of one request, stored in the request extensions.
///
/// Resolved once by [`crate::middleware::log_requests`] so request logs and
/// the [`ExecutionContext`] span carry the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// The inbound [`TRANSACTION_ID_HEADER`] value, or a fresh UUID v4.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        header_value(headers, TRANSACTION_ID_HEADER)
            .map(Self)
            .unwrap_or_else(|| Self(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-request correlation data and operational defaults.
///
/// Built once per request and never shared between requests.
pub struct ExecutionContext {
    request_id: String,
    method: Method,
    uri: String,
    user_agent: Option<String>,
    remote_addr: Option<SocketAddr>,
    remote_user: Option<String>,
    referer: Option<String>,
    span: Span,
    config: Arc<Config>,
    tracker: Option<Arc<dyn ExperimentTracker>>,
    timeout_minutes: u32,
    retry_attempts: u32,
    experiment_name: Option<String>,
    started_at: Option<DateTime<Utc>>,
    metadata: HashMap<String, serde_json::Value>,
}

impl ExecutionContext {
    pub fn from_parts(parts: &Parts, state: &ServerState) -> Self {
        let headers = &parts.headers;

        let request_id = parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId::from_headers(headers))
            .0;
        let uri = parts.uri.path().to_string();
        let user_agent = header_value(headers, USER_AGENT.as_str());
        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let remote_user = parts
            .uri
            .authority()
            .and_then(|authority| userinfo_name(authority.as_str()))
            .or_else(|| header_value(headers, REMOTE_USER_HEADER));
        let referer = header_value(headers, REFERER.as_str());

        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %parts.method,
            uri = %uri,
            user_agent = Empty,
            remote_addr = Empty,
            remote_user = Empty,
            referer = Empty,
        );
        if let Some(user_agent) = &user_agent {
            span.record("user_agent", user_agent.as_str());
        }
        if let Some(addr) = &remote_addr {
            span.record("remote_addr", tracing::field::display(addr));
        }
        if let Some(user) = &remote_user {
            span.record("remote_user", user.as_str());
        }
        if let Some(referer) = &referer {
            span.record("referer", referer.as_str());
        }

        Self {
            request_id,
            method: parts.method.clone(),
            uri,
            user_agent,
            remote_addr,
            remote_user,
            referer,
            span,
            config: Arc::clone(&state.config),
            tracker: state.tracker.clone(),
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            experiment_name: None,
            started_at: None,
            metadata: HashMap::new(),
        }
    }

    /// Correlation id: the [`RequestId`] extension, else [`TRANSACTION_ID_HEADER`],
    /// else freshly generated.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn remote_user(&self) -> Option<&str> {
        self.remote_user.as_deref()
    }

    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    /// Span carrying the correlation fields; use it as the parent of request logs.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tracker(&self) -> Option<&dyn ExperimentTracker> {
        self.tracker.as_deref()
    }

    pub fn timeout_minutes(&self) -> u32 {
        self.timeout_minutes
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    pub fn experiment_name(&self) -> Option<&str> {
        self.experiment_name.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }
}

impl FromRequestParts<Arc<ServerState>> for ExecutionContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServerState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts, state))
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// User name from an authority of the form `user[:password]@host`.
fn userinfo_name(authority: &str) -> Option<String> {
    let (userinfo, _host) = authority.rsplit_once('@')?;
    let name = userinfo.split(':').next().unwrap_or_default();
    (!name.is_empty()).then(|| name.to_string())
}
