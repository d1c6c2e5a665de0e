//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound the wait for an upstream response head
//! - Cancel the upstream call cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the timed-out future is dropped, which
//!   tears down its connection
//! - Timeout errors are distinct from transport errors (504 vs 500)
//! - Streaming a body that has already started is not bounded here

use std::future::Future;
use std::time::Duration;

use crate::error::UpstreamError;

/// Await `call`, failing with `UpstreamError::Timeout` after `deadline`.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(UpstreamError::Timeout(deadline)),
    }
}
