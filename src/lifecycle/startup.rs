//! Startup orchestration.
//!
//! # Order
//! config (already loaded by the caller) → metrics exporter → upstream
//! client → listener bind → serve
//!
//! Any startup error is fatal. A missing upstream base URL is not a startup
//! error; the proxy starts and answers each proxied request with 500.

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, ProxyConfig};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start every subsystem and serve until SIGINT/SIGTERM or `shutdown` fires.
pub async fn run(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_configured = config.upstream.base_url.is_some(),
        api_key_configured = config.upstream.api_key.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address syntax is checked by validation.
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        metrics::init_metrics(addr)?;
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let stop = shutdown.wait();
    server
        .run(listener, async move {
            tokio::select! {
                _ = shutdown_signal() => {},
                _ = stop => {},
            }
        })
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
