//! Correlated telemetry subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP middleware → context.rs (extract traceparent, start server span)
//!     → SpanContext passed explicitly to the payment pipeline
//!     → emitter.rs (stamp trace_id/span_id, timestamp)
//!     → sink.rs (OtelSink → BatchLogProcessor → OTLP collector)
//!
//! Server spans → SdkTracerProvider → batch span processor → OTLP collector
//! Metrics      → SdkMeterProvider → periodic reader → OTLP collector
//! ```
//!
//! # Design Decisions
//! - No process-wide logger or tracer: the `Telemetry` client is built at
//!   startup and its emitter and tracer are injected
//! - Sink failures never reach the request path
//! - With OTLP disabled spans are still created (ids stay real) and logs go
//!   to the process log subscriber

pub mod context;
pub mod emitter;
pub mod provider;
pub mod record;
pub mod sink;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry::logs::LoggerProvider as _;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};

pub use context::TRACEPARENT;
pub use emitter::Emitter;
pub use provider::TelemetryError;
pub use record::{AttributeValue, KeyValue, LogRecord, Severity};
pub use sink::{LogSink, MemorySink, OtelSink, SinkError, TracingSink};

use crate::config::TelemetryConfig;

/// Instrumentation scope reported with every span, log and metric.
pub const INSTRUMENTATION_SCOPE: &str = env!("CARGO_PKG_NAME");

/// Telemetry client owned by the process bootstrap.
pub struct Telemetry {
    emitter: Emitter,
    tracer_provider: SdkTracerProvider,
    logger_provider: Option<SdkLoggerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl Telemetry {
    /// Build the providers described by `config`.
    ///
    /// Must be called from within a Tokio runtime when OTLP export is enabled.
    pub fn init(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let resource = provider::resource(config);

        if !config.otlp_enabled {
            tracing::info!(
                service_name = %config.service_name,
                "OTLP export disabled, correlated logs go to the process log"
            );
            return Ok(Self {
                emitter: Emitter::new(Arc::new(TracingSink::new(
                    config.service_name.clone(),
                    config.service_version.clone(),
                ))),
                tracer_provider: provider::local_tracer_provider(resource),
                logger_provider: None,
                meter_provider: None,
            });
        }

        let tracer_provider = provider::otlp_tracer_provider(config, resource.clone())?;
        let logger_provider = provider::otlp_logger_provider(config, resource.clone())?;
        let meter_provider = provider::otlp_meter_provider(config, resource)?;
        global::set_meter_provider(meter_provider.clone());

        let sink = OtelSink::new(logger_provider.logger(INSTRUMENTATION_SCOPE));

        tracing::info!(
            service_name = %config.service_name,
            endpoint = %config.otlp_endpoint,
            buffer_capacity = config.buffer_capacity,
            batch_size = config.batch_size,
            "OTLP telemetry export started"
        );

        Ok(Self {
            emitter: Emitter::new(Arc::new(sink)),
            tracer_provider,
            logger_provider: Some(logger_provider),
            meter_provider: Some(meter_provider),
        })
    }

    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }

    /// Tracer used for server spans.
    pub fn tracer(&self) -> SdkTracer {
        self.tracer_provider.tracer(INSTRUMENTATION_SCOPE)
    }

    /// Flush and shut down every provider.
    ///
    /// Provider shutdown blocks while exporters drain, so it runs on the
    /// blocking pool.
    pub async fn shutdown(self) {
        if let Err(e) = tokio::task::spawn_blocking(move || self.shutdown_providers()).await {
            tracing::error!(error = %e, "Telemetry shutdown task failed");
        }
    }

    fn shutdown_providers(self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            tracing::warn!(error = %e, "Tracer provider shutdown failed");
        }
        if let Some(provider) = self.logger_provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Logger provider shutdown failed");
            }
        }
        if let Some(provider) = self.meter_provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Meter provider shutdown failed");
            }
        }
        tracing::debug!("Telemetry providers shut down");
    }
}
