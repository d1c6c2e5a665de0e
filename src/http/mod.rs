//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware stack, graceful shutdown)
//!     → request.rs (request id assigned before the span opens)
//!     → forward::* or health.rs
//!     → response.rs (JSON error bodies)
//!     → Send to client
//! ```

pub mod health;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
