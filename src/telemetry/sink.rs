//! Telemetry sinks.
//!
//! A sink receives finished [`LogRecord`]s. It may buffer, batch or export
//! them; whatever it does, its failures are reported through [`SinkError`]
//! and absorbed by the emitter.
//!
//! - [`OtelSink`]: OpenTelemetry logs bridge (batched OTLP export)
//! - [`TracingSink`]: process log subscriber, used when OTLP export is off
//! - [`MemorySink`]: in-memory capture

use std::borrow::Cow;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use opentelemetry::logs::{AnyValue, LogRecord as _, Logger};
use opentelemetry::Key;
use opentelemetry_sdk::logs::SdkLogger;
use thiserror::Error;

use crate::telemetry::record::{KeyValue, LogRecord, Severity};

/// Why a sink refused a record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("telemetry buffer is full")]
    Full,

    #[error("telemetry pipeline is closed")]
    Closed,

    #[error("export failed: {0}")]
    Export(String),
}

impl SinkError {
    /// Short label used for drop metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            SinkError::Full => "full",
            SinkError::Closed => "closed",
            SinkError::Export(_) => "export",
        }
    }
}

/// Destination for emitted records.
pub trait LogSink: Send + Sync {
    fn emit_record(&self, record: LogRecord) -> Result<(), SinkError>;
}

/// Hands records to an OpenTelemetry logger. Batching, queue limits and OTLP
/// export belong to the logger provider's processor.
pub struct OtelSink {
    logger: SdkLogger,
}

impl OtelSink {
    pub fn new(logger: SdkLogger) -> Self {
        Self { logger }
    }
}

impl LogSink for OtelSink {
    fn emit_record(&self, record: LogRecord) -> Result<(), SinkError> {
        let mut otel = self.logger.create_log_record();
        otel.set_timestamp(record.timestamp);
        otel.set_observed_timestamp(SystemTime::now());
        otel.set_severity_number(record.severity.to_otel());
        otel.set_severity_text(record.severity.as_str());
        otel.set_body(AnyValue::from(record.body));

        let span_context = &record.span_context;
        if span_context.is_valid() {
            otel.set_trace_context(
                span_context.trace_id(),
                span_context.span_id(),
                Some(span_context.trace_flags()),
            );
        }

        for kv in record.attributes {
            let key = match kv.key {
                Cow::Borrowed(key) => Key::from_static_str(key),
                Cow::Owned(key) => Key::from(key),
            };
            otel.add_attribute(key, AnyValue::from(kv.value));
        }

        self.logger.emit(otel);
        Ok(())
    }
}

/// Exporter that writes every record as a structured `tracing` event under
/// the `telemetry` target, tagged with the service resource attributes.
pub struct TracingSink {
    service_name: String,
    service_version: String,
}

impl TracingSink {
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
        }
    }
}

macro_rules! telemetry_event {
    ($level:expr, $name:ident, $version:ident, $record:ident, $attrs:ident, $ts:ident) => {
        tracing::event!(
            target: "telemetry",
            $level,
            service.name = %$name,
            service.version = %$version,
            severity = $record.severity.as_str(),
            severity_number = $record.severity.number(),
            observed_unix_nanos = $ts,
            trace_id = $record.trace_id().unwrap_or_default(),
            span_id = $record.span_id().unwrap_or_default(),
            attributes = %$attrs,
            "{}",
            $record.body
        )
    };
}

impl LogSink for TracingSink {
    fn emit_record(&self, record: LogRecord) -> Result<(), SinkError> {
        let attrs = render_attributes(&record.attributes)?;
        let ts = record
            .timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        let name = &self.service_name;
        let version = &self.service_version;

        match record.severity {
            Severity::Debug => telemetry_event!(tracing::Level::DEBUG, name, version, record, attrs, ts),
            Severity::Info => telemetry_event!(tracing::Level::INFO, name, version, record, attrs, ts),
            Severity::Warn => telemetry_event!(tracing::Level::WARN, name, version, record, attrs, ts),
            Severity::Error | Severity::Fatal => {
                telemetry_event!(tracing::Level::ERROR, name, version, record, attrs, ts)
            }
        }
        Ok(())
    }
}

/// Sink that keeps records in memory for later inspection.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn emit_record(&self, record: LogRecord) -> Result<(), SinkError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| SinkError::Export("memory sink poisoned".into()))?;
        records.push(record);
        Ok(())
    }
}

fn render_attributes(attributes: &[KeyValue]) -> Result<String, SinkError> {
    let map: serde_json::Map<String, serde_json::Value> = attributes
        .iter()
        .map(|kv| serde_json::to_value(&kv.value).map(|v| (kv.key.to_string(), v)))
        .collect::<Result<_, _>>()
        .map_err(|e| SinkError::Export(e.to_string()))?;
    Ok(serde_json::Value::Object(map).to_string())
}
