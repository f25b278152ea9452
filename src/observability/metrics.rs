//! Metrics collection and exposition.
//!
//! # Metrics
//! - `snippit_requests_total` (counter): handled requests by method, status
//! - `snippit_request_duration_seconds` (histogram): handler latency
//! - `snippit_log_writes_total` (counter): request log writes by outcome
//! - `snippit_notifications_total` (counter): job notifications by outcome
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    metrics::counter!(
        "snippit_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("snippit_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record the outcome of a request log write ("ok", "failed", "unconfigured").
pub fn record_log_write(outcome: &'static str) {
    metrics::counter!("snippit_log_writes_total", "outcome" => outcome).increment(1);
}

/// Record the outcome of a notification delivery ("sent", "failed", "skipped").
pub fn record_notification(outcome: &'static str) {
    metrics::counter!("snippit_notifications_total", "outcome" => outcome).increment(1);
}
