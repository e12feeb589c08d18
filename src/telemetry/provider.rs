//! OpenTelemetry providers.
//!
//! # Responsibilities
//! - Describe the service as a resource (`service.name`, `service.version`)
//! - Build tracer, logger and meter providers exporting over OTLP/gRPC
//!
//! # Design Decisions
//! - Log records go through a `BatchLogProcessor`; a full queue drops records
//!   inside the SDK instead of blocking the request
//! - Exporter channels connect lazily, so startup does not wait for the collector

use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry_otlp::{LogExporter, MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::logs::{BatchConfigBuilder, BatchLogProcessor, SdkLoggerProvider};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use thiserror::Error;

use crate::config::TelemetryConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build OTLP {signal} exporter for {endpoint}: {message}")]
    Exporter {
        signal: &'static str,
        endpoint: String,
        message: String,
    },
}

impl TelemetryError {
    fn exporter(signal: &'static str, config: &TelemetryConfig, err: impl std::fmt::Display) -> Self {
        TelemetryError::Exporter {
            signal,
            endpoint: config.otlp_endpoint.clone(),
            message: err.to_string(),
        }
    }
}

pub fn resource(config: &TelemetryConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new("service.version", config.service_version.clone()))
        .build()
}

/// Tracer provider with a batch span processor in front of the OTLP exporter.
pub fn otlp_tracer_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkTracerProvider, TelemetryError> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|e| TelemetryError::exporter("trace", config, e))?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}

/// Tracer provider that creates spans without exporting them.
pub fn local_tracer_provider(resource: Resource) -> SdkTracerProvider {
    SdkTracerProvider::builder().with_resource(resource).build()
}

/// Logger provider batching records to the OTLP exporter, sized from config.
pub fn otlp_logger_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkLoggerProvider, TelemetryError> {
    let exporter = LogExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|e| TelemetryError::exporter("logs", config, e))?;

    let batch = BatchConfigBuilder::default()
        .with_max_queue_size(config.buffer_capacity)
        .with_max_export_batch_size(config.batch_size)
        .with_scheduled_delay(Duration::from_millis(config.flush_interval_ms))
        .build();
    let processor = BatchLogProcessor::builder(exporter)
        .with_batch_config(batch)
        .build();

    Ok(SdkLoggerProvider::builder()
        .with_resource(resource)
        .with_log_processor(processor)
        .build())
}

/// Meter provider pushing to the OTLP exporter on a periodic reader.
pub fn otlp_meter_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkMeterProvider, TelemetryError> {
    let exporter = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|e| TelemetryError::exporter("metrics", config, e))?;

    Ok(SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(PeriodicReader::builder(exporter).build())
        .build())
}
