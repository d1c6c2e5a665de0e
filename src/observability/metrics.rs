//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, route
//! - `proxy_request_duration_seconds` (histogram): latency by method, route
//! - `proxy_upstream_errors_total` (counter): local failures by route, kind
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! recorder, so handlers call these helpers unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("proxy_requests_total", "Total number of proxied requests");
    describe_histogram!(
        "proxy_request_duration_seconds",
        "Time from request arrival to response head, in seconds"
    );
    describe_counter!(
        "proxy_upstream_errors_total",
        "Requests that ended in a locally generated error"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, route: &'static str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route
    )
    .increment(1);
    histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a request that failed before an upstream response could be relayed.
pub fn record_upstream_error(route: &'static str, kind: &'static str) {
    counter!("proxy_upstream_errors_total", "route" => route, "kind" => kind).increment(1);
}
