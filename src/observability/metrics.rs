//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nem_bridge_requests_total` (counter): requests by method, outcome
//! - `nem_bridge_request_duration_seconds` (histogram): facade latency by method
//! - `nem_bridge_frame_errors_total` (counter): rejected frames by kind
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - The Prometheus exporter is optional and bound to its own address

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, outcome: &str, start: Instant) {
    counter!(
        "nem_bridge_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("nem_bridge_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a frame rejected before reaching a handler.
pub fn record_frame_error(kind: &'static str) {
    counter!("nem_bridge_frame_errors_total", "kind" => kind).increment(1);
}
