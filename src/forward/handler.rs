//! Catch-all forwarder for `/api/{*path}`.

use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;
use crate::forward::report_failure;
use crate::forward::upstream::ForwardRequest;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::headers::strip_request_headers;

const ROUTE: &str = "forward";

/// Methods whose inbound body is streamed to the upstream.
fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Axum entry point, mounted for GET, POST, PUT, PATCH and DELETE.
pub async fn forward(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    let response = forward_request(&state, request)
        .await
        .unwrap_or_else(IntoResponse::into_response);

    metrics::record_request(method.as_str(), response.status().as_u16(), ROUTE, start);
    response
}

/// Forward one request and relay the upstream response.
pub async fn forward_request(state: &AppState, request: Request<Body>) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let method = parts.method;

    let target = state
        .settings
        .forward_target(&parts.uri)
        .inspect_err(|err| report_failure(ROUTE, &method, parts.uri.path(), err))?;

    let mut headers = parts.headers;
    strip_request_headers(&mut headers);
    state.settings.apply_api_key(&mut headers);

    let body = carries_body(&method).then_some(body);

    tracing::debug!(
        method = %method,
        url = %target,
        streaming_body = body.is_some(),
        "Forwarding request"
    );

    let target_str = target.to_string();
    let upstream = state
        .dispatch(ForwardRequest {
            method: method.clone(),
            target,
            headers,
            body,
        })
        .await
        .map_err(ProxyError::from)
        .inspect_err(|err| report_failure(ROUTE, &method, &target_str, err))?;

    tracing::debug!(status = %upstream.status, url = %target_str, "Upstream responded");

    Ok(upstream.into_relayed())
}
