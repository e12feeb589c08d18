//! Process observability.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured process logs via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (JSON or pretty)
//!     → Metrics endpoint (Prometheus scrape)
//!     → OTLP collector (global OpenTelemetry meter)
//! ```
//!
//! Request-correlated payment logs and server spans are produced by the
//! `telemetry` module and exported over OTLP. With OTLP disabled the logs
//! fall back to this subscriber under the `telemetry` target.

pub mod logging;
pub mod metrics;
