//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → limits.rs (body size cap)
//!     → forward handler
//!         → headers.rs (strip hop-by-hop, inject API key)
//!     → upstream
//!     → headers.rs (strip content-encoding)
//!     → client
//! ```

pub mod headers;
pub mod limits;
