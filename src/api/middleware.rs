//! API Middleware
//!
//! One access log line per API request: method, path, status, response
//! size and latency.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

/// Header carrying the per-request id set by `SetRequestIdLayer`
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Access log middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = header_str(request.headers(), REQUEST_ID_HEADER).map(str::to_string);
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let content_length = header_str(response.headers(), header::CONTENT_LENGTH.as_str()).unwrap_or("-");

    tracing::info!(
        request_id = request_id.as_deref().unwrap_or("-"),
        "{} {} {} {} - {} ms",
        method,
        uri,
        response.status().as_u16(),
        content_length,
        start.elapsed().as_millis(),
    );

    response
}
