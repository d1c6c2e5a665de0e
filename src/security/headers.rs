//! Header manipulation at the proxy boundary.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers from requests before they leave for the upstream
//! - Strip `content-encoding` from relayed responses
//! - Copy allowlisted headers for the narrower relays
//!
//! # Design Decisions
//! - One denylist constant shared by every handler, no inline name checks
//! - `accept-encoding` is owned by the upstream client: it negotiates
//!   compression and decodes the body, which is what makes dropping
//!   `content-encoding` on the way back correct

use axum::http::{HeaderMap, HeaderName};

/// Connection-management headers never copied onto an outbound request.
pub const HOP_BY_HOP_REQUEST_HEADERS: &[&str] = &["host", "connection", "content-length"];

/// Headers the upstream client sets itself.
pub const CLIENT_NEGOTIATED_HEADERS: &[&str] = &["accept-encoding"];

/// Headers never relayed back from the upstream.
pub const STRIPPED_RESPONSE_HEADERS: &[&str] = &["content-encoding"];

/// Remove hop-by-hop and client-negotiated headers from an inbound header set.
pub fn strip_request_headers(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_REQUEST_HEADERS
        .iter()
        .chain(CLIENT_NEGOTIATED_HEADERS)
    {
        headers.remove(*name);
    }
}

/// Remove headers that must not be relayed from an upstream response.
pub fn strip_response_headers(headers: &mut HeaderMap) {
    for name in STRIPPED_RESPONSE_HEADERS {
        headers.remove(*name);
    }
}

/// Copy every value of the listed headers from `from` into `to`.
pub fn copy_listed(from: &HeaderMap, names: &[&'static str], to: &mut HeaderMap) {
    for name in names {
        for value in from.get_all(*name) {
            to.append(HeaderName::from_static(*name), value.clone());
        }
    }
}
