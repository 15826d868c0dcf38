//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, fetch failures, rewrites)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by kind (html, passthrough, error) and status
//! - `proxy_request_duration_seconds` (histogram): latency distribution by kind
//! - `proxy_fetch_failures_total` (counter): outbound failures by reason
//! - `proxy_rewritten_documents_total` (counter): HTML documents rewritten
//! - `proxy_rewritten_bytes` (histogram): size of rewritten documents
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are static strings except the status code

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one finished proxy request.
pub fn record_request(kind: &'static str, status: u16, start_time: Instant) {
    metrics::counter!("proxy_requests_total", "kind" => kind, "status" => status.to_string())
        .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "kind" => kind)
        .record(start_time.elapsed().as_secs_f64());
}

/// Record an outbound fetch failure.
pub fn record_fetch_failure(reason: &'static str) {
    metrics::counter!("proxy_fetch_failures_total", "reason" => reason).increment(1);
}

/// Record a rewritten HTML document.
pub fn record_rewrite(bytes_out: usize) {
    metrics::counter!("proxy_rewritten_documents_total").increment(1);
    metrics::histogram!("proxy_rewritten_bytes").record(bytes_out as f64);
}
