//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives
//!     → tracing.rs (span with method, path, request id)
//!     → forwarders log inside the span (logging.rs sets the output format)
//!     → metrics.rs (request count, latency, local failures)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log lines via the request span
//! - Metrics are opt-in; recording without an exporter is free

pub mod logging;
pub mod metrics;
pub mod tracing;
