//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level when set. Output is either
//! human-readable (`pretty`) or one JSON object per line (`json`).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Error raised when a global subscriber is already installed.
pub type InitError = tracing_subscriber::util::TryInitError;

/// Build the filter: `RUST_LOG` if present, else the configured level
/// applied to this crate and `tower_http`.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "label_proxy={level},tower_http={level}",
            level = config.log_level
        ))
    })
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), InitError> {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
}
