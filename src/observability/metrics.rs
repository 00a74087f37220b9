//! Metrics collection and exposition.
//!
//! # Metrics
//! - `form_relay_http_requests_total` (counter): requests by method, status
//! - `form_relay_submissions_forwarded_total` (counter): datagrams sent
//! - `form_relay_forward_failures_total` (counter): datagram sends that failed
//! - `form_relay_datagrams_received_total` (counter)
//! - `form_relay_entries_persisted_total` (counter)
//! - `form_relay_collector_errors_total` (counter): by kind
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "form_relay_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_forwarded() {
    metrics::counter!("form_relay_submissions_forwarded_total").increment(1);
}

pub fn record_forward_failure() {
    metrics::counter!("form_relay_forward_failures_total").increment(1);
}

pub fn record_datagram() {
    metrics::counter!("form_relay_datagrams_received_total").increment(1);
}

pub fn record_persisted() {
    metrics::counter!("form_relay_entries_persisted_total").increment(1);
}

pub fn record_collector_error(kind: &'static str) {
    metrics::counter!("form_relay_collector_errors_total", "kind" => kind).increment(1);
}
