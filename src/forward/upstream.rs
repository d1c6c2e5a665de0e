//! The upstream call.
//!
//! # Responsibilities
//! - Define the per-request exchange types (`ForwardRequest`, `ForwardResponse`)
//! - Abstract the upstream behind the `Upstream` trait
//! - Implement it over a pooled `reqwest` client with streaming bodies
//!
//! # Design Decisions
//! - Bodies are streams in both directions; nothing is buffered here
//! - Redirects are never followed, the 3xx is handed back to the caller
//! - Dropping the returned future or the response body aborts the upstream
//!   exchange, so a client that disconnects cancels its upstream call
//! - A streamed body without `content-length` is only checked against the
//!   size limit as it flows; overrunning it aborts the upstream call and is
//!   reported as `BodyTooLarge` (413), not as a transport failure

use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use futures_util::TryStreamExt;
use http_body_util::LengthLimitError;
use url::Url;

use crate::config::TimeoutConfig;
use crate::error::UpstreamError;
use crate::security::headers::strip_response_headers;

/// One outbound request, built from one inbound request.
#[derive(Debug)]
pub struct ForwardRequest {
    pub method: Method,
    pub target: Url,
    pub headers: HeaderMap,
    /// `None` for methods that carry no body.
    pub body: Option<Body>,
}

/// The upstream's answer, with its body still streaming.
#[derive(Debug)]
pub struct ForwardResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl ForwardResponse {
    /// Relay status, headers and body unchanged, minus `content-encoding`.
    pub fn into_relayed(mut self) -> Response {
        strip_response_headers(&mut self.headers);
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Something that can carry a `ForwardRequest` to the upstream.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: ForwardRequest) -> Result<ForwardResponse, UpstreamError>;
}

/// HTTP(S) upstream backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Build the shared client from timeout settings.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .no_proxy()
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: ForwardRequest) -> Result<ForwardResponse, UpstreamError> {
        let mut builder = self
            .client
            .request(request.method, request.target)
            .headers(request.headers);

        let limit_hit = Arc::new(AtomicBool::new(false));
        if let Some(body) = request.body {
            let flag = limit_hit.clone();
            let stream = body.into_data_stream().inspect_err(move |e| {
                if exceeds_body_limit(e) {
                    flag.store(true, Ordering::Relaxed);
                }
            });
            builder = builder.body(reqwest::Body::wrap_stream(stream));
        }

        let mut response = builder.send().await.map_err(|e| {
            if limit_hit.load(Ordering::Relaxed) {
                UpstreamError::BodyTooLarge
            } else {
                UpstreamError::Transport(e.into())
            }
        })?;

        let status = response.status();
        let headers = std::mem::take(response.headers_mut());

        Ok(ForwardResponse {
            status,
            headers,
            body: Body::from_stream(response.bytes_stream()),
        })
    }
}

/// Whether `err` or any of its sources is the body limit being exceeded.
fn exceeds_body_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}
