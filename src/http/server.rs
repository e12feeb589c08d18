//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, HTTP tracing, server span, metrics, body limit)
//! - Bind server to listener
//! - Stop accepting on shutdown and let in-flight requests finish

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use opentelemetry_sdk::trace::SdkTracer;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::request;
use crate::payments::PaymentPipeline;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PaymentPipeline>,
}

/// HTTP server for the payment service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server. `tracer` opens the server span of every request.
    pub fn new(config: ServiceConfig, pipeline: Arc<PaymentPipeline>, tracer: SdkTracer) -> Self {
        let state = AppState { pipeline };
        let router = Self::build_router(&config, state, tracer);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState, tracer: SdkTracer) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/payment/process", post(handlers::process_payment))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(middleware::from_fn(request::record_metrics))
            .layer(middleware::from_fn_with_state(tracer, request::trace_context))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, e.g. for driving it without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            timeout_probability = self.config.chaos.timeout_probability,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::{ChaosEngine, FixedRandom};
    use crate::payments::{Clock, SystemClock};
    use crate::telemetry::{Emitter, MemorySink, Severity, TRACEPARENT};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use opentelemetry::trace::{SpanKind, Status, TracerProvider as _};
    use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
    use tower::ServiceExt;

    const INBOUND: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    struct Harness {
        server: HttpServer,
        spans: InMemorySpanExporter,
        _provider: SdkTracerProvider,
    }

    fn harness(sample: f64, sink: MemorySink) -> Harness {
        let spans = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(spans.clone())
            .build();
        let pipeline = PaymentPipeline::new(
            ChaosEngine::default(),
            Arc::new(FixedRandom(sample)),
            Arc::new(SystemClock) as Arc<dyn Clock>,
            Emitter::new(Arc::new(sink)),
        );
        let server = HttpServer::new(
            ServiceConfig::default(),
            Arc::new(pipeline),
            provider.tracer("test"),
        );
        Harness {
            server,
            spans,
            _provider: provider,
        }
    }

    fn server(sample: f64, sink: MemorySink) -> HttpServer {
        harness(sample, sink).server
    }

    fn payment(body: &str) -> Request<Body> {
        Request::post("/payment/process")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = server(0.5, MemorySink::new())
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_declined_card() {
        let response = server(0.5, MemorySink::new())
            .router()
            .oneshot(payment(
                r#"{"order_id":1,"amount":10.0,"card_number":"4111111111111100"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(json_body(response).await["error"], "Payment declined by issuer");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_scenario_header() {
        let mut request = payment(r#"{"order_id":2,"amount":5,"card_number":"4111111111111111"}"#);
        request
            .headers_mut()
            .insert("X-Chaos-Scenario", "black-friday".parse().unwrap());

        let response = server(0.0, MemorySink::new())
            .router()
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(json_body(response).await["error"], "Payment gateway timed out");
    }

    #[tokio::test]
    async fn test_malformed_body_logged_with_trace() {
        let sink = MemorySink::new();
        let response = server(0.5, sink.clone())
            .router()
            .oneshot(payment("this is not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key(TRACEPARENT));
        assert!(json_body(response).await["error"].is_string());

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Error);
        assert_ne!(records[0].trace_id(), Some("0".repeat(32).as_str()));
    }

    #[tokio::test]
    async fn test_json_body_decoded_whatever_the_content_type() {
        let body = r#"{"order_id":1,"amount":10.0,"card_number":"4111111111111100"}"#;
        let untyped = Request::post("/payment/process")
            .body(Body::from(body))
            .unwrap();
        let text_plain = Request::post("/payment/process")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(body))
            .unwrap();

        for request in [untyped, text_plain] {
            let response = server(0.5, MemorySink::new())
                .router()
                .oneshot(request)
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_null_body_is_an_empty_request() {
        let sink = MemorySink::new();
        let response = server(0.5, sink.clone())
            .router()
            .oneshot(payment("null"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["transaction_id"].as_str().unwrap().starts_with("txn_0_"));
        assert_eq!(sink.records()[0].body, "Processing payment for Order 0");
    }

    #[tokio::test]
    async fn test_oversized_body_is_bad_request() {
        let padding = "x".repeat(ServiceConfig::default().security.max_body_size + 1);
        let body = format!(r#"{{"order_id":1,"card_number":"{padding}"}}"#);
        let response = server(0.5, MemorySink::new())
            .router()
            .oneshot(payment(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_inbound_traceparent_is_continued() {
        let sink = MemorySink::new();
        let mut request = payment(r#"{"order_id":3,"amount":1,"card_number":"00"}"#);
        request
            .headers_mut()
            .insert(TRACEPARENT, INBOUND.parse().unwrap());

        let response = server(0.5, sink.clone()).router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let echoed = response.headers()[TRACEPARENT].to_str().unwrap().to_string();
        assert!(echoed.starts_with("00-4bf92f3577b34da6a3ce929d0e0e4736-"));
        assert!(!echoed.contains("00f067aa0ba902b7"));
        assert!(response.headers().contains_key("x-request-id"));

        for record in sink.records() {
            assert_eq!(record.trace_id(), Some("4bf92f3577b34da6a3ce929d0e0e4736"));
        }
    }

    #[tokio::test]
    async fn test_server_span_exported_for_logged_request() {
        let sink = MemorySink::new();
        let harness = harness(0.5, sink.clone());
        let mut request = payment(r#"{"order_id":3,"amount":1,"card_number":"00"}"#);
        request
            .headers_mut()
            .insert(TRACEPARENT, INBOUND.parse().unwrap());

        let response = harness.server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let spans = harness.spans.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.name, "POST /payment/process");
        assert_eq!(span.span_kind, SpanKind::Server);
        assert_eq!(span.parent_span_id.to_string(), "00f067aa0ba902b7");
        assert_eq!(span.status, Status::Unset);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.span_context, span.span_context);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gateway_timeout_marks_span_as_error() {
        let harness = harness(0.0, MemorySink::new());
        let mut request = payment(r#"{"order_id":2,"amount":5,"card_number":"4111111111111111"}"#);
        request
            .headers_mut()
            .insert("X-Chaos-Scenario", "payment-timeout".parse().unwrap());

        let response = harness.server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let spans = harness.spans.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert!(matches!(spans[0].status, Status::Error { .. }));
    }
}
