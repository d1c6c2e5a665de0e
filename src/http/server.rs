//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the health, relay and forwarding handlers
//! - Wire up middleware (request ID, tracing, body limit)
//! - Hold the per-process state shared by handlers
//! - Serve on a listener until shutdown is requested

use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::UpstreamError;
use crate::forward::{
    forward, relay_image, relay_submission_audio, ForwardRequest, ForwardResponse, HttpUpstream,
    Upstream, UpstreamSettings,
};
use crate::http::health::health;
use crate::http::request::{request_id_header, MakeRequestUuidV4};
use crate::http::response::error_response;
use crate::lifecycle::startup::StartupError;
use crate::observability::tracing::make_request_span;
use crate::resilience::timeouts::with_deadline;
use crate::security::limits::body_limit_layer;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<UpstreamSettings>,
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(settings: UpstreamSettings, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            settings: Arc::new(settings),
            upstream,
        }
    }

    /// Send one request upstream, bounded by the response-head timeout.
    pub async fn dispatch(&self, request: ForwardRequest) -> Result<ForwardResponse, UpstreamError> {
        with_deadline(self.settings.response_timeout(), self.upstream.send(request)).await
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that talks to the configured upstream over HTTP(S).
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let upstream = Arc::new(HttpUpstream::new(&config.timeouts)?);
        Self::with_upstream(config, upstream)
    }

    /// Create a server around an arbitrary upstream implementation.
    pub fn with_upstream(
        config: ProxyConfig,
        upstream: Arc<dyn Upstream>,
    ) -> Result<Self, StartupError> {
        let settings = UpstreamSettings::from_config(&config.upstream, &config.timeouts)?;
        if settings.base_url().is_err() {
            tracing::warn!("No upstream base URL configured; proxied requests will fail");
        }

        let state = AppState::new(settings, upstream);
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run top to bottom on the way in: the request id is assigned
    /// before the span opens so every log line carries it.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/health", get(health))
            .route("/api/storage/images/{id}", get(relay_image))
            .route("/api/submissions/{filename}", get(relay_submission_audio))
            .route(
                "/api/{*path}",
                get(forward)
                    .post(forward)
                    .put(forward)
                    .patch(forward)
                    .delete(forward),
            )
            .fallback(not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                    .layer(PropagateRequestIdLayer::new(request_id_header()))
                    .layer(body_limit_layer(&config.security)),
            )
    }

    /// The router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<S>(self, listener: TcpListener, shutdown: S) -> Result<(), std::io::Error>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
