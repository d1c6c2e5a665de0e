//! Narrow relays for single binary resources.
//!
//! Images and submitted audio are fetched with a GET against a fixed upstream
//! collection. Unlike the catch-all forwarder, only an allowlist of headers
//! crosses the proxy in each direction, and upstream error bodies are turned
//! into JSON.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;
use crate::forward::report_failure;
use crate::forward::upstream::ForwardRequest;
use crate::http::response::relay_error_body;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::headers::copy_listed;

/// Description of one resource relay.
#[derive(Debug, Clone, Copy)]
pub struct ResourceRelay {
    /// Route label for logs and metrics.
    pub route: &'static str,
    /// Upstream collection path the resource id is appended to.
    pub collection: &'static str,
    /// Inbound headers forwarded to the upstream.
    pub request_headers: &'static [&'static str],
    /// Upstream headers relayed back (besides `content-type`).
    pub response_headers: &'static [&'static str],
    /// `content-type` used when the upstream sends none.
    pub default_content_type: &'static str,
    /// Error message used when an upstream error body is not JSON.
    pub failure_message: &'static str,
}

/// `GET /api/storage/images/{id}`.
pub const IMAGE_RELAY: ResourceRelay = ResourceRelay {
    route: "image",
    collection: "/storage/images",
    request_headers: &["if-none-match", "if-modified-since", "cache-control"],
    response_headers: &["content-length", "etag", "last-modified", "cache-control"],
    default_content_type: "image/jpeg",
    failure_message: "Failed to fetch image",
};

/// `GET /api/submissions/{filename}`, seekable through byte ranges.
pub const SUBMISSION_AUDIO_RELAY: ResourceRelay = ResourceRelay {
    route: "submission_audio",
    collection: "/storage/submissions/stream",
    request_headers: &["range"],
    response_headers: &[
        "content-length",
        "content-range",
        "accept-ranges",
        "etag",
        "cache-control",
    ],
    default_content_type: "audio/mpeg",
    failure_message: "Failed to fetch submission audio",
};

/// Relay an uploaded image.
pub async fn relay_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    relay(&state, &IMAGE_RELAY, &id, &headers).await
}

/// Relay submitted audio, forwarding `Range` for seeking.
pub async fn relay_submission_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Response {
    relay(&state, &SUBMISSION_AUDIO_RELAY, &filename, &headers).await
}

async fn relay(state: &AppState, relay: &ResourceRelay, id: &str, inbound: &HeaderMap) -> Response {
    let start = Instant::now();

    let response = relay_resource(state, relay, id, inbound)
        .await
        .unwrap_or_else(IntoResponse::into_response);

    metrics::record_request(
        Method::GET.as_str(),
        response.status().as_u16(),
        relay.route,
        start,
    );
    response
}

/// Fetch one resource and relay it.
pub async fn relay_resource(
    state: &AppState,
    relay: &ResourceRelay,
    id: &str,
    inbound: &HeaderMap,
) -> Result<Response, ProxyError> {
    let method = Method::GET;
    let target = state
        .settings
        .resource_target(relay.collection, id)
        .inspect_err(|err| report_failure(relay.route, &method, id, err))?;

    let mut headers = HeaderMap::new();
    copy_listed(inbound, relay.request_headers, &mut headers);
    state.settings.apply_api_key(&mut headers);

    let target_str = target.to_string();
    let upstream = state
        .dispatch(ForwardRequest {
            method: method.clone(),
            target,
            headers,
            body: None,
        })
        .await
        .map_err(ProxyError::from)
        .inspect_err(|err| report_failure(relay.route, &method, &target_str, err))?;

    if upstream.status.is_client_error() || upstream.status.is_server_error() {
        tracing::warn!(
            route = relay.route,
            url = %target_str,
            status = %upstream.status,
            "Upstream returned an error status"
        );
        return Ok(relay_error_body(upstream.status, upstream.body, relay.failure_message).await);
    }

    let content_type = upstream
        .headers
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(relay.default_content_type));

    let mut response = Response::new(upstream.body);
    *response.status_mut() = upstream.status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    copy_listed(&upstream.headers, relay.response_headers, headers);

    Ok(response)
}
