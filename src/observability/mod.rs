//! # Observability Infrastructure
//!
//! Structured logging, metrics and health checking for the certificate store.

pub mod health;
pub mod logging;
pub mod metrics;

pub use health::{DatabaseHealthProvider, HealthCheck, HealthChecker, HealthProvider, HealthStatus};
pub use logging::{init_logging, log_config_info};
pub use metrics::{MetricsRecorder, Outcome};

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use ::tracing::info;

/// Initialize logging and register metric descriptions
pub fn init_observability(config: &ObservabilityConfig) -> Result<MetricsRecorder> {
    init_logging(config)?;

    let recorder = MetricsRecorder::new();
    if config.enable_metrics {
        recorder.register_certificate_metrics();
    }

    info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        metrics_enabled = config.enable_metrics,
        "Observability initialized"
    );

    Ok(recorder)
}
