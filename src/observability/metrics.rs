//! Metrics collection and exposition.
//!
//! # Metrics
//! - `redirector_redirects_total` (counter): redirect requests by outcome
//! - `redirector_redirect_duration_seconds` (histogram): resolution latency
//! - `redirector_allowlist_updates_total` (counter): admin writes by result
//! - `redirector_cache_lookups_total` (counter): cache hits/misses by cache

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_redirect(outcome: &'static str, start: Instant) {
    counter!("redirector_redirects_total", "outcome" => outcome).increment(1);
    histogram!("redirector_redirect_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_allowlist_update(result: &'static str) {
    counter!("redirector_allowlist_updates_total", "result" => result).increment(1);
}

pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("redirector_cache_lookups_total", "cache" => cache, "result" => result).increment(1);
}
