//! ADMS Telemetry
//!
//! Structured logging setup and in-process metric primitives for the workers.

mod config;
mod metrics;
mod tracing_setup;

pub use config::{LogFormat, TelemetryConfig, DEFAULT_LOG_FILTER};
pub use metrics::{Counter, Histogram, HistogramSummary};
pub use tracing_setup::init_tracing;

/// Initialize logging for a service from the environment
pub fn init(service_name: &str) -> Result<(), TelemetryError> {
    let config = TelemetryConfig::from_env(service_name);
    init_tracing(&config)
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Invalid log filter {0}")]
    InvalidFilter(String),

    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),
}
