//! Metrics collection and exposition.
//!
//! # Metrics
//! - `linkstore_requests_total` (counter): API requests by method, status
//! - `linkstore_request_duration_seconds` (histogram): API latency
//! - `linkstore_ids_allocated_total` (counter): ids by allocation strategy
//! - `linkstore_id_ceiling_commits_total` (counter): durable counter writes
//! - `linkstore_store_errors_total` (counter): store failures by kind
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Prometheus exporter only when enabled in config

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "linkstore_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("linkstore_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_id_allocated(strategy: &'static str) {
    ::metrics::counter!("linkstore_ids_allocated_total", "strategy" => strategy).increment(1);
}

pub fn record_ceiling_commit() {
    ::metrics::counter!("linkstore_id_ceiling_commits_total").increment(1);
}

pub fn record_store_error(kind: &'static str) {
    ::metrics::counter!("linkstore_store_errors_total", "kind" => kind).increment(1);
}
