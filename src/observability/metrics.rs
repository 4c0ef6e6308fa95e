//! Metrics collection and exposition.
//!
//! # Metrics
//! - `site_requests_total` (counter): proxied requests by method, status
//! - `site_request_duration_seconds` (histogram): upstream round trip
//! - `site_rewrites_total` (counter): documents changed, by transform
//! - `site_rewrite_skipped_total` (counter): responses passed through, by reason

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "site_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("site_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rewrite(transform: &'static str) {
    metrics::counter!("site_rewrites_total", "transform" => transform).increment(1);
}

pub fn record_rewrite_skipped(reason: &'static str) {
    metrics::counter!("site_rewrite_skipped_total", "reason" => reason).increment(1);
}
