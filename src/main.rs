//! Synthetic payment service with chaos injection.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                  PAYMENT SERVICE                     │
//!                     │                                                      │
//!  POST /payment/     │  ┌──────────┐   ┌────────────┐   ┌───────────────┐   │
//!  process ───────────┼─▶│   http   │──▶│  payments  │──▶│     chaos     │   │
//!  X-Chaos-Scenario   │  │ + trace  │   │  pipeline  │   │    engine     │   │
//!  traceparent        │  │ context  │   └─────┬──────┘   └───────────────┘   │
//!                     │  └──────────┘         │                              │
//!                     │                       ▼                              │
//!                     │               ┌──────────────┐    ┌──────────────┐   │
//!                     │               │  telemetry   │───▶│  OTel batch  │───┼─▶ OTLP collector
//!                     │               │   emitter    │    │  processors  │   │   (spans, logs,
//!                     │               └──────────────┘    └──────────────┘   │    metrics)
//!                     │                                                      │
//!                     │  config · observability · lifecycle                  │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use payment_chaos::config::{load_config, ServiceConfig};
use payment_chaos::lifecycle;
use payment_chaos::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "payment-chaos")]
#[command(about = "Synthetic payment endpoint with chaos injection", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.telemetry)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        timeout_probability = config.chaos.timeout_probability,
        seed = ?config.chaos.seed,
        "payment-chaos starting"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
