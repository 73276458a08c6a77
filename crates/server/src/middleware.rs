use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::context::RequestId;

/// Logging middleware
///
/// Assigns the request's [`RequestId`] and logs under it, so these events
/// correlate with the handler's execution context.
pub async fn log_requests(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let request_id = RequestId::from_headers(request.headers());
    request.extensions_mut().insert(request_id.clone());

    tracing::debug!(
        method = %method,
        uri = %uri,
        request_id = %request_id.as_str(),
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        request_id = %request_id.as_str(),
        "Request completed"
    );

    response
}
