//! Metrics collection and exposition.
//!
//! # Metrics
//! - `payment_requests_total` (counter): requests by route and status
//! - `payment_request_duration_seconds` (histogram): latency distribution
//! - `payment_outcomes_total` (counter): chaos decisions by outcome and scenario
//! - `telemetry_records_dropped_total` (counter): records a sink refused
//!
//! # Design Decisions
//! - Every metric is recorded twice: through the `metrics` facade for the
//!   Prometheus scrape endpoint, and through the global OpenTelemetry meter
//!   for OTLP push
//! - Without an installed recorder or meter provider every call is a no-op,
//!   which is what tests rely on
//! - Prometheus exposition is optional

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::{global, KeyValue};

use crate::telemetry::INSTRUMENTATION_SCOPE;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

struct OtelInstruments {
    requests: Counter<u64>,
    duration: Histogram<f64>,
    outcomes: Counter<u64>,
    dropped: Counter<u64>,
}

// Bound to whichever meter provider is global on first use; the bootstrap
// installs it before the listener accepts traffic.
fn otel() -> &'static OtelInstruments {
    static INSTRUMENTS: OnceLock<OtelInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter(INSTRUMENTATION_SCOPE);
        OtelInstruments {
            requests: meter
                .u64_counter("payment_requests_total")
                .with_description("HTTP requests by route and status")
                .build(),
            duration: meter
                .f64_histogram("payment_request_duration_seconds")
                .with_unit("s")
                .build(),
            outcomes: meter
                .u64_counter("payment_outcomes_total")
                .with_description("Chaos decisions by outcome and scenario")
                .build(),
            dropped: meter
                .u64_counter("telemetry_records_dropped_total")
                .build(),
        }
    })
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    counter!(
        "payment_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("payment_request_duration_seconds", "route" => route.to_string()).record(elapsed);

    let otel = otel();
    otel.requests.add(
        1,
        &[
            KeyValue::new("route", route.to_string()),
            KeyValue::new("status", i64::from(status)),
        ],
    );
    otel.duration
        .record(elapsed, &[KeyValue::new("route", route.to_string())]);
}

pub fn record_outcome(outcome: &'static str, scenario: &str) {
    counter!(
        "payment_outcomes_total",
        "outcome" => outcome,
        "scenario" => scenario.to_string()
    )
    .increment(1);
    otel().outcomes.add(
        1,
        &[
            KeyValue::new("outcome", outcome),
            KeyValue::new("scenario", scenario.to_string()),
        ],
    );
}

pub fn record_telemetry_drop(reason: &'static str) {
    counter!("telemetry_records_dropped_total", "reason" => reason).increment(1);
    otel().dropped.add(1, &[KeyValue::new("reason", reason)]);
}
