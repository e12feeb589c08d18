//! Request middleware.
//!
//! # Responsibilities
//! - Continue the caller's W3C trace (or start one) with a server span
//! - Expose the span's `SpanContext` to handlers through request extensions
//! - Echo `traceparent` on the response and end the span with the status
//! - Record request count and latency
//!
//! # Design Decisions
//! - The server span is opened as early as possible, before any handler logs
//! - The request ID (`x-request-id`) is set by tower-http and only read here

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::{Status, TraceContextExt};
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::SdkTracer;
use tracing::Instrument;

use crate::observability::metrics;
use crate::telemetry::context;

/// Request ID header.
pub const X_REQUEST_ID: &str = "x-request-id";

fn matched_route(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Run the request inside an OpenTelemetry server span and a matching
/// tracing span carrying the trace identifiers.
pub async fn trace_context(
    State(tracer): State<SdkTracer>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let parent = context::extract(request.headers());
    let route = matched_route(&request);
    let method = request.method().to_string();

    let cx = context::start_server_span(
        &tracer,
        &parent,
        format!("{method} {route}"),
        vec![
            KeyValue::new("http.request.method", method.clone()),
            KeyValue::new("http.route", route.clone()),
            KeyValue::new("url.path", request.uri().path().to_string()),
        ],
    );
    let span_context = cx.span().span_context().clone();

    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        trace_id = %span_context.trace_id(),
        span_id = %span_context.span_id(),
        method = %method,
        path = %request.uri().path(),
    );

    request.extensions_mut().insert(span_context);
    let mut response = next.run(request).instrument(span).await;

    let status = response.status();
    let server_span = cx.span();
    server_span.set_attribute(KeyValue::new(
        "http.response.status_code",
        i64::from(status.as_u16()),
    ));
    if status.is_server_error() {
        server_span.set_status(Status::error(status.to_string()));
    }
    server_span.end();

    context::inject(&cx, response.headers_mut());
    response
}

/// Count requests and observe latency per matched route.
pub async fn record_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = matched_route(&request);

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}
