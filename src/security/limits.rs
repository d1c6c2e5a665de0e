//! Request limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//!
//! # Design Decisions
//! - Declared `content-length` over the limit is rejected up front with 413
//! - Streamed bodies are counted as they pass; overrunning the limit aborts
//!   the upload mid-stream instead of buffering it, and the forwarder answers
//!   413 `{"error":"Request body too large"}`

use tower_http::limit::RequestBodyLimitLayer;

use crate::config::SecurityConfig;

/// Layer enforcing `security.max_body_size` on inbound bodies.
pub fn body_limit_layer(config: &SecurityConfig) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(config.max_body_size)
}
