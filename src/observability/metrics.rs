//! Metrics collection and exposition.
//!
//! # Metrics
//! - `security_requests_total` (counter): requests by response status
//! - `security_request_duration_seconds` (histogram): handler latency
//! - `security_reports_total` (counter): reports by format and outcome
//! - `envelopes_forwarded_total` (counter): upstream deliveries by result
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need none
//! - Prometheus exposition runs on its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(status: u16, start: Instant) {
    counter!("security_requests_total", "status" => status.to_string()).increment(1);
    histogram!("security_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// `outcome` is one of `accepted`, `filtered`, or an error kind.
pub fn record_report(format: &'static str, outcome: &'static str) {
    counter!("security_reports_total", "format" => format, "outcome" => outcome).increment(1);
}

pub fn record_forward(result: &'static str) {
    counter!("envelopes_forwarded_total", "result" => result).increment(1);
}
