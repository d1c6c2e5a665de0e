//! Response handling and transformation.
//!
//! # Responsibilities
//! - Shape the `{"error": "..."}` bodies returned for local failures
//! - Relay upstream error bodies as JSON when they parse as JSON
//!
//! # Design Decisions
//! - Error bodies from upstream are small; they are the only bodies buffered
//! - Successful upstream bodies are never buffered (see `forward`)

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Upper bound on an upstream error body we are willing to buffer and parse.
pub const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// JSON error body returned to the caller.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

/// Build a JSON error response.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

/// Relay an upstream error status.
///
/// The upstream body is passed through as JSON when it parses as JSON;
/// otherwise a generic body carrying `fallback` is synthesized. The status is
/// kept either way.
pub async fn relay_error_body(status: StatusCode, body: Body, fallback: &str) -> Response {
    let parsed = match axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => serde_json::from_slice::<serde_json::Value>(&bytes).ok(),
        Err(e) => {
            tracing::debug!(error = %e, "Could not read upstream error body");
            None
        }
    };

    match parsed {
        Some(value) => (status, Json(value)).into_response(),
        None => error_response(status, fallback),
    }
}
