//! Request spans.
//!
//! Every inbound request gets one span carrying its method, path and
//! request id, so logs emitted by the forwarders correlate without passing
//! the id around.

use axum::body::Body;
use axum::http::Request;
use tracing::Span;

use crate::http::request::X_REQUEST_ID;

/// Span factory for `TraceLayer::make_span_with`.
///
/// Runs after the request id has been assigned.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}
