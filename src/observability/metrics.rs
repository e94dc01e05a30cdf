//! Metrics collection and exposition.
//!
//! # Metrics
//! - `media_proxy_requests_total` (counter): requests by route, status
//! - `media_proxy_request_duration_seconds` (histogram): time to response head
//! - `media_proxy_bytes_relayed_total` (counter): body bytes streamed, by route
//! - `media_proxy_scratch_files_purged_total` (counter): scratch files deleted

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request head.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    counter!(
        "media_proxy_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("media_proxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record bytes relayed to a client.
pub fn record_bytes(route: &'static str, bytes: u64) {
    counter!("media_proxy_bytes_relayed_total", "route" => route).increment(bytes);
}

/// Record scratch files removed by a purge.
pub fn record_purge(removed: usize) {
    if removed > 0 {
        counter!("media_proxy_scratch_files_purged_total").increment(removed as u64);
    }
}
