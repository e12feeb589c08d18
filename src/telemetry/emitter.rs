//! Trace-correlated log emission.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::SystemTime;

use opentelemetry::trace::SpanContext;

use crate::observability::metrics;
use crate::telemetry::record::{KeyValue, LogRecord, Severity, SPAN_ID_KEY, TRACE_ID_KEY};
use crate::telemetry::sink::LogSink;

/// Emits log records stamped with the identifiers of the supplied span.
///
/// Emission is fire-and-forget: a failing or panicking sink is counted and
/// swallowed, so callers never observe telemetry problems.
#[derive(Clone)]
pub struct Emitter {
    sink: Arc<dyn LogSink>,
}

impl Emitter {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Build a record for `ctx` and hand it to the sink.
    ///
    /// Caller attributes come first, followed by the reserved `trace_id` and
    /// `span_id` keys. Without an active span (`SpanContext::empty_context()`)
    /// the ids are the all-zero sentinels.
    pub fn emit<I>(&self, ctx: &SpanContext, severity: Severity, message: impl Into<String>, attributes: I)
    where
        I: IntoIterator<Item = KeyValue>,
    {
        let mut attributes: Vec<KeyValue> = attributes
            .into_iter()
            .filter(|kv| kv.key != TRACE_ID_KEY && kv.key != SPAN_ID_KEY)
            .collect();
        attributes.push(KeyValue::new(TRACE_ID_KEY, ctx.trace_id().to_string()));
        attributes.push(KeyValue::new(SPAN_ID_KEY, ctx.span_id().to_string()));

        let record = LogRecord {
            timestamp: SystemTime::now(),
            severity,
            body: message.into(),
            attributes,
            span_context: ctx.clone(),
        };

        match panic::catch_unwind(AssertUnwindSafe(|| self.sink.emit_record(record))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                metrics::record_telemetry_drop(e.reason());
                tracing::debug!(error = %e, "Dropped telemetry record");
            }
            Err(_) => {
                metrics::record_telemetry_drop("panic");
                tracing::debug!("Telemetry sink panicked; record dropped");
            }
        }
    }

    pub fn info<I>(&self, ctx: &SpanContext, message: impl Into<String>, attributes: I)
    where
        I: IntoIterator<Item = KeyValue>,
    {
        self.emit(ctx, Severity::Info, message, attributes)
    }

    pub fn warn<I>(&self, ctx: &SpanContext, message: impl Into<String>, attributes: I)
    where
        I: IntoIterator<Item = KeyValue>,
    {
        self.emit(ctx, Severity::Warn, message, attributes)
    }

    pub fn error<I>(&self, ctx: &SpanContext, message: impl Into<String>, attributes: I)
    where
        I: IntoIterator<Item = KeyValue>,
    {
        self.emit(ctx, Severity::Error, message, attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{SpanId, TraceFlags, TraceId, TraceState};
    use crate::telemetry::record::AttributeValue;
    use crate::telemetry::sink::{MemorySink, SinkError};

    struct FailingSink;

    impl LogSink for FailingSink {
        fn emit_record(&self, _record: LogRecord) -> Result<(), SinkError> {
            Err(SinkError::Export("collector unreachable".into()))
        }
    }

    struct PanickingSink;

    impl LogSink for PanickingSink {
        fn emit_record(&self, _record: LogRecord) -> Result<(), SinkError> {
            panic!("exporter exploded");
        }
    }

    fn span_context() -> SpanContext {
        SpanContext::new(
            TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").unwrap(),
            SpanId::from_hex("b7ad6b7169203331").unwrap(),
            TraceFlags::SAMPLED,
            false,
            TraceState::default(),
        )
    }

    #[test]
    fn test_record_carries_trace_and_span() {
        let sink = MemorySink::new();
        let emitter = Emitter::new(Arc::new(sink.clone()));
        let ctx = span_context();

        emitter.info(&ctx, "Processing payment", [KeyValue::new("order.id", 9i64)]);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.body, "Processing payment");
        assert_eq!(record.attribute("order.id"), Some(&AttributeValue::Int(9)));
        assert_eq!(record.trace_id(), Some("0af7651916cd43dd8448eb211c80319c"));
        assert_eq!(record.span_id(), Some("b7ad6b7169203331"));
        assert_eq!(record.span_context, ctx);
    }

    #[test]
    fn test_no_active_trace_uses_sentinels() {
        let sink = MemorySink::new();
        let emitter = Emitter::new(Arc::new(sink.clone()));

        emitter.emit(&SpanContext::empty_context(), Severity::Debug, "orphan", Vec::new());

        let record = &sink.records()[0];
        assert_eq!(record.trace_id(), Some("0".repeat(32).as_str()));
        assert_eq!(record.span_id(), Some("0".repeat(16).as_str()));
    }

    #[test]
    fn test_caller_cannot_override_reserved_keys() {
        let sink = MemorySink::new();
        let emitter = Emitter::new(Arc::new(sink.clone()));
        let ctx = span_context();

        emitter.warn(&ctx, "spoof", [KeyValue::new(TRACE_ID_KEY, "forged")]);

        let record = &sink.records()[0];
        let trace_ids = record
            .attributes
            .iter()
            .filter(|kv| kv.key == TRACE_ID_KEY)
            .count();
        assert_eq!(trace_ids, 1);
        assert_eq!(record.trace_id(), Some("0af7651916cd43dd8448eb211c80319c"));
    }

    #[test]
    fn test_sink_failures_are_absorbed() {
        let ctx = span_context();
        Emitter::new(Arc::new(FailingSink)).error(&ctx, "lost", Vec::new());
        Emitter::new(Arc::new(PanickingSink)).error(&ctx, "lost", Vec::new());
    }
}
