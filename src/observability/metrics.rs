//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_requests_total` (counter): requests served, by method and status
//! - `guard_request_duration_seconds` (histogram): server-side latency
//! - `guard_client_attempts_total` (counter): client attempts, by service and outcome
//! - `guard_client_attempt_duration_seconds` (histogram): per-attempt latency
//! - `guard_rate_limited_total` (counter): requests rejected with 429
//! - `guard_csrf_rejections_total` (counter): failed CSRF checks, by reason and enforcement
//! - `guard_csrf_tokens_issued_total` (counter)
//! - `guard_csrf_tokens_active` (gauge): pairs currently held by the store
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing unless [`init_metrics`] ran.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Install the Prometheus recorder and start its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics recorder"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("guard_requests_total", &labels).increment(1);
    histogram!("guard_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_client_attempt(service: &str, outcome: &str, elapsed: Duration) {
    counter!(
        "guard_client_attempts_total",
        "service" => service.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("guard_client_attempt_duration_seconds", "service" => service.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_rate_limited(reason: &'static str) {
    counter!("guard_rate_limited_total", "reason" => reason).increment(1);
}

pub fn record_csrf_rejection(reason: &'static str, enforcement: &'static str) {
    counter!(
        "guard_csrf_rejections_total",
        "reason" => reason,
        "enforcement" => enforcement
    )
    .increment(1);
}

/// A pair was issued; `active` is the store size afterwards.
pub fn record_csrf_issued(active: usize) {
    counter!("guard_csrf_tokens_issued_total").increment(1);
    gauge!("guard_csrf_tokens_active").set(active as f64);
}

pub fn record_csrf_active(active: usize) {
    gauge!("guard_csrf_tokens_active").set(active as f64);
}
