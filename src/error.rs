//! Error types for the request path.
//!
//! Every variant maps to a status code and a fixed public message; the
//! detailed cause only goes to the logs.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::BoxError;
use thiserror::Error;

use crate::http::response::error_response;

/// Returned when no upstream base URL is configured.
pub const MSG_NOT_CONFIGURED: &str = "API base URL not configured";
/// Returned when a streamed request body overruns the size limit.
pub const MSG_TOO_LARGE: &str = "Request body too large";
/// Returned for every network-level failure (transport or timeout) and
/// other local errors.
pub const MSG_INTERNAL: &str = "Internal proxy error";

/// Failure of a single upstream call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("no response head within {0:?}")]
    Timeout(Duration),

    /// The inbound body hit the size limit while it was being streamed.
    #[error("request body exceeds the configured limit")]
    BodyTooLarge,

    #[error("transport failure: {0}")]
    Transport(#[source] BoxError),
}

/// Failure while handling a proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("API base URL not configured")]
    NotConfigured,

    #[error("invalid upstream target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    /// Status code reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(UpstreamError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(UpstreamError::BodyTooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `{"error": ...}` body.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::NotConfigured => MSG_NOT_CONFIGURED,
            ProxyError::Upstream(UpstreamError::BodyTooLarge) => MSG_TOO_LARGE,
            ProxyError::InvalidTarget { .. }
            | ProxyError::Upstream(UpstreamError::Timeout(_))
            | ProxyError::Upstream(UpstreamError::Transport(_)) => MSG_INTERNAL,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::NotConfigured => "config",
            ProxyError::InvalidTarget { .. } => "target",
            ProxyError::Upstream(UpstreamError::Timeout(_)) => "timeout",
            ProxyError::Upstream(UpstreamError::BodyTooLarge) => "body_limit",
            ProxyError::Upstream(UpstreamError::Transport(_)) => "transport",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.public_message())
    }
}
