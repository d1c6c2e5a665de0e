//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (bound time to response head)
//!     → on timeout: 504, upstream call dropped
//! ```
//!
//! # Design Decisions
//! - Every upstream call has a deadline
//! - No retries: one inbound request maps to exactly one upstream call, and
//!   uploads are streamed so they could not be replayed anyway

pub mod timeouts;
