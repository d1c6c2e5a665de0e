//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Upstream base URL override.
pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
/// Upstream API key override.
pub const ENV_API_KEY: &str = "API_KEY";
/// Listener bind address override.
pub const ENV_BIND_ADDRESS: &str = "PROXY_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML document into a configuration. No validation.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` is `std::env::var(..).ok()` in production; empty values count as unset.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(base_url) = non_empty(ENV_API_BASE_URL) {
        config.upstream.base_url = Some(base_url);
    }
    if let Some(api_key) = non_empty(ENV_API_KEY) {
        config.upstream.api_key = Some(api_key);
    }
    if let Some(bind_address) = non_empty(ENV_BIND_ADDRESS) {
        config.listener.bind_address = bind_address;
    }
}

/// Normalize values that are accepted loosely on input.
fn normalize(config: &mut ProxyConfig) {
    let upstream = &mut config.upstream;
    upstream.base_url = upstream
        .base_url
        .take()
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty());
    upstream.api_key = upstream.api_key.take().filter(|key| !key.is_empty());
}

/// Build the process configuration: defaults, then the optional file, then
/// the environment. Validated once, at the end.
pub fn load<F>(path: Option<&Path>, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, lookup);
    normalize(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
