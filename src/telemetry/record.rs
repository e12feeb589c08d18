//! Log record data model.

use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;

use opentelemetry::logs::{AnyValue, Severity as OtelSeverity};
use opentelemetry::trace::SpanContext;
use serde::Serialize;

/// Attribute key reserved for the active trace id.
pub const TRACE_ID_KEY: &str = "trace_id";
/// Attribute key reserved for the active span id.
pub const SPAN_ID_KEY: &str = "span_id";

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// OpenTelemetry severity number for the base level of each range.
    pub fn number(&self) -> u8 {
        match self {
            Severity::Debug => 5,
            Severity::Info => 9,
            Severity::Warn => 13,
            Severity::Error => 17,
            Severity::Fatal => 21,
        }
    }

    pub fn to_otel(self) -> OtelSeverity {
        match self {
            Severity::Debug => OtelSeverity::Debug,
            Severity::Info => OtelSeverity::Info,
            Severity::Warn => OtelSeverity::Warn,
            Severity::Error => OtelSeverity::Error,
            Severity::Fatal => OtelSeverity::Fatal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<AttributeValue> for AnyValue {
    fn from(v: AttributeValue) -> Self {
        match v {
            AttributeValue::String(s) => AnyValue::from(s),
            AttributeValue::Int(i) => AnyValue::from(i),
            AttributeValue::Float(x) => AnyValue::from(x),
            AttributeValue::Bool(b) => AnyValue::from(b),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => f.write_str(s),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(x) => write!(f, "{x}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A single key/value attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyValue {
    pub key: Cow<'static, str>,
    pub value: AttributeValue,
}

impl KeyValue {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<AttributeValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A structured log record handed to a sink.
///
/// `span_context` is the span the record was emitted under; exporters that
/// understand trace context attach it natively, the rest rely on the
/// `trace_id`/`span_id` attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: SystemTime,
    pub severity: Severity,
    pub body: String,
    pub attributes: Vec<KeyValue>,
    pub span_context: SpanContext,
}

impl LogRecord {
    /// First attribute with the given key.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| &kv.value)
    }

    /// The correlated trace id, if the record carries one.
    pub fn trace_id(&self) -> Option<&str> {
        match self.attribute(TRACE_ID_KEY) {
            Some(AttributeValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The correlated span id, if the record carries one.
    pub fn span_id(&self) -> Option<&str> {
        match self.attribute(SPAN_ID_KEY) {
            Some(AttributeValue::String(s)) => Some(s),
            _ => None,
        }
    }
}
