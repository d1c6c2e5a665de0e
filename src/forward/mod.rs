//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! /api/{*path}  (GET/POST/PUT/PATCH/DELETE)
//!     → handler.rs (target URL, header filtering, streaming body)
//!     → upstream.rs (one upstream call, bounded by resilience::timeouts)
//!     → relay status + headers + streaming body
//!
//! /api/storage/images/{id}, /api/submissions/{filename}  (GET)
//!     → resource.rs (allowlisted headers both ways, JSON error relay)
//!     → upstream.rs
//! ```
//!
//! # Design Decisions
//! - No state survives a request; the only shared pieces are the immutable
//!   settings and the upstream connection pool
//! - Every local failure is logged before its response is built

use axum::http::Method;

use crate::error::ProxyError;
use crate::observability::metrics;

pub mod handler;
pub mod resource;
pub mod target;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

pub use handler::forward;
pub use resource::{relay_image, relay_submission_audio, ResourceRelay};
pub use target::{UpstreamSettings, API_PREFIX};
pub use upstream::{ForwardRequest, ForwardResponse, HttpUpstream, Upstream};

/// Log and count a failure that ends a proxied request.
pub(crate) fn report_failure(route: &'static str, method: &Method, target: &str, error: &ProxyError) {
    metrics::record_upstream_error(route, error.kind());
    tracing::error!(
        route,
        method = %method,
        url = target,
        error = %error,
        "Proxy request failed"
    );
}
