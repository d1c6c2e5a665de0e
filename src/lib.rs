//! Streaming reverse proxy in front of the label's backend API.

pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
