//! Upstream target construction.
//!
//! Holds the process-wide upstream settings (read once at startup) and turns
//! inbound request paths into absolute upstream URLs.

use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Uri};
use url::Url;

use crate::config::{ConfigError, TimeoutConfig, UpstreamConfig};
use crate::config::validation::ValidationError;
use crate::error::ProxyError;

/// Inbound prefix under which everything is proxied.
pub const API_PREFIX: &str = "/api";

/// Immutable upstream settings shared by all handlers.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    base_url: Option<String>,
    api_key: Option<(HeaderName, HeaderValue)>,
    response_timeout: Duration,
}

impl UpstreamSettings {
    /// Build settings from validated configuration.
    pub fn from_config(
        upstream: &UpstreamConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, ConfigError> {
        let header = HeaderName::try_from(upstream.api_key_header.as_str()).map_err(|_| {
            ConfigError::Validation(vec![ValidationError::InvalidApiKeyHeader(
                upstream.api_key_header.clone(),
            )])
        })?;

        let api_key = match &upstream.api_key {
            Some(key) => {
                let mut value = HeaderValue::from_str(key)
                    .map_err(|_| ConfigError::Validation(vec![ValidationError::InvalidApiKey]))?;
                value.set_sensitive(true);
                Some((header, value))
            }
            None => None,
        };

        let base_url = upstream
            .base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Ok(Self {
            base_url,
            api_key,
            response_timeout: Duration::from_secs(timeouts.request_secs),
        })
    }

    /// Replace the response-head timeout.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// The configured base URL, or the error every handler reports without one.
    pub fn base_url(&self) -> Result<&str, ProxyError> {
        self.base_url.as_deref().ok_or(ProxyError::NotConfigured)
    }

    /// Whether an API key will be injected.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Set the API key header, replacing any value the caller sent.
    pub fn apply_api_key(&self, headers: &mut HeaderMap) {
        if let Some((name, value)) = &self.api_key {
            headers.insert(name.clone(), value.clone());
        }
    }

    /// How long to wait for the upstream response head.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Target for the catch-all forwarder: `<base><path without /api>[?query]`.
    pub fn forward_target(&self, inbound: &Uri) -> Result<Url, ProxyError> {
        let base = self.base_url()?;
        let path = inbound.path();
        let trailing = path.strip_prefix(API_PREFIX).unwrap_or(path);
        join_target(base, trailing, inbound.query())
    }

    /// Target for a single named resource: `<base><collection>/<encoded id>`.
    pub fn resource_target(&self, collection: &str, id: &str) -> Result<Url, ProxyError> {
        let base = self.base_url()?;
        let path = format!("{}/{}", collection, urlencoding::encode(id));
        join_target(base, &path, None)
    }
}

/// Concatenate base and path, appending the query verbatim when present.
pub fn join_target(base: &str, path: &str, query: Option<&str>) -> Result<Url, ProxyError> {
    let mut target = String::with_capacity(base.len() + path.len() + 1);
    target.push_str(base);
    if !path.is_empty() && !path.starts_with('/') {
        target.push('/');
    }
    target.push_str(path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }

    Url::parse(&target).map_err(|source| ProxyError::InvalidTarget { target, source })
}
