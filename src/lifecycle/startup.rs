//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize metrics and the telemetry providers from validated config
//! - Build the payment pipeline and HTTP server
//! - Bind the listener last, then serve until a shutdown signal
//! - Flush and shut down the telemetry providers within the drain deadline
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Process logging is installed by the binary before this runs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::wait_for_signal;
use crate::observability::metrics;
use crate::payments::PaymentPipeline;
use crate::telemetry::{Telemetry, TelemetryError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("telemetry setup failed: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the service until SIGINT/SIGTERM.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    if config.metrics.enabled {
        match config.metrics.address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.metrics.address,
                "Failed to parse metrics address"
            ),
        }
    }

    let telemetry = Telemetry::init(&config.telemetry)?;
    let pipeline = Arc::new(PaymentPipeline::from_config(&config.chaos, telemetry.emitter()));

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(source) => {
            telemetry.shutdown().await;
            return Err(StartupError::Bind {
                address: config.listener.bind_address.clone(),
                source,
            });
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let drain = Duration::from_secs(config.shutdown.drain_timeout_secs);
    let served = HttpServer::new(config, pipeline, telemetry.tracer())
        .run(listener, server_shutdown)
        .await;

    if tokio::time::timeout(drain, telemetry.shutdown()).await.is_err() {
        tracing::warn!(timeout_secs = drain.as_secs(), "Telemetry shutdown timed out");
    }

    served.map_err(StartupError::from)
}
