use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use eval_hub::StorageError;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("Service configuration is required")]
    MissingServiceConfig,

    #[error("Configuration error: {0}")]
    Config(#[from] eval_hub::ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server already started")]
    AlreadyStarted,

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Graceful shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Storage(err) => match err {
                StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
                StorageError::Validation(_) => StatusCode::BAD_REQUEST,
                StorageError::Conflict { .. } => StatusCode::CONFLICT,
                StorageError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::MissingServiceConfig
            | ServerError::Config(_)
            | ServerError::Bind { .. }
            | ServerError::AlreadyStarted
            | ServerError::Metrics(_)
            | ServerError::ShutdownTimeout(_)
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Storage(err) => match err {
                StorageError::NotFound { .. } => "NOT_FOUND",
                StorageError::Validation(_) => "VALIDATION_ERROR",
                StorageError::Conflict { .. } => "CONFLICT",
                StorageError::Backend(_) => "INTERNAL_ERROR",
            },
            ServerError::MissingServiceConfig | ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::Bind { .. }
            | ServerError::AlreadyStarted
            | ServerError::Metrics(_)
            | ServerError::ShutdownTimeout(_)
            | ServerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().to_string();

        // Server-side failures are logged in full but never echoed to clients.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eval_hub::ResourceKind;
    use http_body_util::BodyExt;

    async fn body_of(err: ServerError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_storage_errors_map_to_client_statuses() {
        let cases = [
            (
                StorageError::NotFound {
                    kind: ResourceKind::Collection,
                    id: "c1".into(),
                },
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                StorageError::Validation("limit must be between 1 and 500".into()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                StorageError::Conflict {
                    kind: ResourceKind::EvaluationJob,
                    id: "j1".into(),
                },
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
        ];

        for (err, status, code) in cases {
            let expected_message = err.to_string();
            let (got_status, body) = body_of(ServerError::from(err)).await;
            assert_eq!(got_status, status);
            assert_eq!(body.error.code, code);
            assert_eq!(body.error.message, expected_message);
        }
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak_detail() {
        let (status, body) =
            body_of(StorageError::backend("connection refused to 10.0.0.7:5432").into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "Internal server error");

        let (status, body) = body_of(ServerError::Internal("secret path /etc/x".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.error.message.contains("/etc/x"));
    }

    #[test]
    fn test_shutdown_timeout_message() {
        let err = ServerError::ShutdownTimeout(Duration::from_secs(30));
        assert!(err.to_string().contains("30s"));
    }
}
