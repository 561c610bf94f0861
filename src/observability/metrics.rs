//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, cache, upstream errors, connections)
//! - Expose a Prometheus-compatible endpoint when enabled
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by outcome
//! - `proxy_cache_lookups_total` (counter): cache lookups by result
//! - `proxy_upstream_errors_total` (counter): upstream failures by error kind
//! - `proxy_active_connections` (gauge): current connection count
//! - `proxy_request_duration_seconds` (histogram): accept-to-close latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// How a connection's exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Forwarded,
    Blocked,
    CacheHit,
    Error,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Forwarded => "forwarded",
            Outcome::Blocked => "blocked",
            Outcome::CacheHit => "cache_hit",
            Outcome::Error => "error",
        }
    }
}

/// Install the Prometheus exporter on `addr`. Failure is logged, not fatal.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: Outcome, started: Instant) {
    metrics::counter!("proxy_requests_total", "outcome" => outcome.as_str()).increment(1);
    metrics::histogram!("proxy_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("proxy_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    metrics::counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn connection_opened() {
    metrics::gauge!("proxy_active_connections").increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!("proxy_active_connections").decrement(1.0);
}
