//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use payment_chaos::chaos::{ChaosEngine, RandomSource};
use payment_chaos::config::{ChaosConfig, ServiceConfig};
use payment_chaos::http::HttpServer;
use payment_chaos::lifecycle::Shutdown;
use payment_chaos::payments::{PaymentPipeline, SystemClock};
use payment_chaos::telemetry::{Emitter, LogSink};

/// A running service bound to an ephemeral port.
pub struct TestService {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Chaos settings with short delays so tests stay fast.
pub fn fast_chaos() -> ChaosConfig {
    ChaosConfig {
        timeout_delay_ms: 50,
        processing_delay_min_ms: 1,
        processing_delay_max_ms: 5,
        ..ChaosConfig::default()
    }
}

/// Start the HTTP server with the given chaos config, random source and sink.
pub async fn start_service(
    chaos: ChaosConfig,
    rng: Arc<dyn RandomSource>,
    sink: Arc<dyn LogSink>,
) -> TestService {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.chaos = chaos;

    let pipeline = PaymentPipeline::new(
        ChaosEngine::new(&config.chaos),
        rng,
        Arc::new(SystemClock),
        Emitter::new(sink),
    );

    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let tracer = SdkTracerProvider::builder().build().tracer("payment-chaos-tests");
    let server = HttpServer::new(config, Arc::new(pipeline), tracer);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    TestService { addr, shutdown }
}

/// HTTP client that never reuses connections or goes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
