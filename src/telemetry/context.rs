//! W3C trace context propagation over HTTP headers.
//!
//! # Responsibilities
//! - Extract the caller's `traceparent`/`tracestate` into an OpenTelemetry [`Context`]
//! - Start the server span for an inbound request under that context
//! - Inject the server span's context into response headers
//!
//! # Design Decisions
//! - Identifiers, sampling flags and the all-zero sentinels are OpenTelemetry's
//!   (`TraceId`, `SpanId`, `SpanContext`); this module only adapts axum's `HeaderMap`
//! - A missing or malformed header yields an empty context, so the server span
//!   becomes the root of a new trace

use std::borrow::Cow;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;

/// W3C trace context header name.
pub const TRACEPARENT: &str = "traceparent";

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        let name = HeaderName::from_bytes(key.as_bytes());
        let value = HeaderValue::from_str(&value);
        if let (Ok(name), Ok(value)) = (name, value) {
            self.0.insert(name, value);
        }
    }
}

/// Remote parent context carried by the request headers, if any.
pub fn extract(headers: &HeaderMap) -> Context {
    TraceContextPropagator::new().extract(&HeaderExtractor(headers))
}

/// Write `cx`'s span as `traceparent` (and `tracestate`) headers.
pub fn inject(cx: &Context, headers: &mut HeaderMap) {
    TraceContextPropagator::new().inject_context(cx, &mut HeaderInjector(headers));
}

/// Start a server-kind span as a child of `parent` and return the context
/// holding it. The caller owns ending the span.
pub fn start_server_span<T>(
    tracer: &T,
    parent: &Context,
    name: impl Into<Cow<'static, str>>,
    attributes: Vec<KeyValue>,
) -> Context
where
    T: Tracer,
    T::Span: Send + Sync + 'static,
{
    let span = tracer
        .span_builder(name)
        .with_kind(SpanKind::Server)
        .with_attributes(attributes)
        .start_with_context(tracer, parent);
    parent.with_span(span)
}
