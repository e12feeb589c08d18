//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the payment
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the payment service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Chaos injection tuning.
    pub chaos: ChaosConfig,

    /// Correlated log pipeline and process logging.
    pub telemetry: TelemetryConfig,

    /// Prometheus exposition.
    pub metrics: MetricsConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Graceful shutdown.
    pub shutdown: ShutdownConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8082").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8082".to_string(),
        }
    }
}

/// Chaos injection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChaosConfig {
    /// Probability that a timeout-eligible request times out.
    pub timeout_probability: f64,

    /// How long a simulated gateway timeout holds the request, in milliseconds.
    pub timeout_delay_ms: u64,

    /// Lower bound (inclusive) of simulated processing latency in milliseconds.
    pub processing_delay_min_ms: u64,

    /// Upper bound (exclusive) of simulated processing latency in milliseconds.
    pub processing_delay_max_ms: u64,

    /// Scenario tags that arm the timeout rule.
    pub timeout_scenarios: Vec<String>,

    /// Card number suffix that the issuer declines.
    pub decline_suffix: String,

    /// Seed for a reproducible random source. Unseeded runs use thread-local RNGs.
    pub seed: Option<u64>,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            timeout_probability: 0.3,
            timeout_delay_ms: 5_000,
            processing_delay_min_ms: 100,
            processing_delay_max_ms: 600,
            timeout_scenarios: vec!["payment-timeout".to_string(), "black-friday".to_string()],
            decline_suffix: "00".to_string(),
            seed: None,
        }
    }
}

/// Output format for process logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Reported as the `service.name` resource attribute.
    pub service_name: String,

    /// Reported as the `service.version` resource attribute.
    pub service_version: String,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Export traces, logs and metrics to an OTLP collector. When disabled,
    /// correlated logs are written through the process log subscriber and
    /// spans are created but not exported.
    pub otlp_enabled: bool,

    /// OTLP/gRPC collector endpoint.
    pub otlp_endpoint: String,

    /// Log records queued in front of the batch exporter.
    pub buffer_capacity: usize,

    /// Maximum records per export batch.
    pub batch_size: usize,

    /// Interval at which partial batches are exported, in milliseconds.
    pub flush_interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "payment-service".to_string(),
            service_version: "1.0.0".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            otlp_enabled: true,
            otlp_endpoint: "http://otel-collector:4317".to_string(),
            buffer_capacity: 2048,
            batch_size: 512,
            flush_interval_ms: 1_000,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the Prometheus endpoint.
    pub enabled: bool,

    /// Metrics endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Deadline for flushing and shutting down telemetry providers after the
    /// listener stops.
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 5,
        }
    }
}
