use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Logs every request once it completes, at a level derived from the response status.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(method = %method, uri = %uri, status = %status, duration_ms, "Request completed");
    } else if status.is_client_error() {
        tracing::warn!(method = %method, uri = %uri, status = %status, duration_ms, "Request completed");
    } else {
        tracing::info!(method = %method, uri = %uri, status = %status, duration_ms, "Request completed");
    }

    response
}
