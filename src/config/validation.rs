//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (probabilities, delay bounds, batch sizes)
//! - Validate addresses are parseable before anything binds or exports
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("chaos.timeout_probability must be within [0, 1], got {0}")]
    ProbabilityOutOfRange(f64),

    #[error("chaos processing delay range is empty ({min}..{max} ms)")]
    EmptyDelayRange { min: u64, max: u64 },

    #[error("chaos.decline_suffix must not be empty")]
    EmptyDeclineSuffix,

    #[error("telemetry.service_name must not be empty")]
    EmptyServiceName,

    #[error("telemetry.batch_size must be between 1 and buffer_capacity ({capacity}), got {batch}")]
    InvalidBatchSize { batch: usize, capacity: usize },

    #[error("telemetry.flush_interval_ms must be greater than zero")]
    ZeroFlushInterval,

    #[error("telemetry.otlp_endpoint must be an http:// or https:// URL, got '{0}'")]
    InvalidOtlpEndpoint(String),
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "metrics.address",
            value: config.metrics.address.clone(),
        });
    }

    let chaos = &config.chaos;
    if !(0.0..=1.0).contains(&chaos.timeout_probability) {
        errors.push(ValidationError::ProbabilityOutOfRange(chaos.timeout_probability));
    }
    if chaos.processing_delay_min_ms >= chaos.processing_delay_max_ms {
        errors.push(ValidationError::EmptyDelayRange {
            min: chaos.processing_delay_min_ms,
            max: chaos.processing_delay_max_ms,
        });
    }
    if chaos.decline_suffix.is_empty() {
        errors.push(ValidationError::EmptyDeclineSuffix);
    }

    let telemetry = &config.telemetry;
    if telemetry.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }
    if telemetry.batch_size == 0 || telemetry.batch_size > telemetry.buffer_capacity {
        errors.push(ValidationError::InvalidBatchSize {
            batch: telemetry.batch_size,
            capacity: telemetry.buffer_capacity,
        });
    }
    if telemetry.flush_interval_ms == 0 {
        errors.push(ValidationError::ZeroFlushInterval);
    }
    if telemetry.otlp_enabled && !is_http_url(&telemetry.otlp_endpoint) {
        errors.push(ValidationError::InvalidOtlpEndpoint(
            telemetry.otlp_endpoint.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(value: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| value.len() > scheme.len() && value.starts_with(scheme))
}
