//! # Structured Logging
//!
//! Installs the global `tracing` subscriber. Plain text by default, JSON when
//! `json_logging` is set. `RUST_LOG` takes precedence over the configured level.

use crate::config::ObservabilityConfig;
use crate::errors::{CertplaneError, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the log filter from `RUST_LOG`, falling back to the configured level.
pub fn build_env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            CertplaneError::config(format!("Invalid log level '{}': {}", config.log_level, e))
        }),
    }
}

/// Initialize the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = build_env_filter(config)?;

    let registry = tracing_subscriber::registry().with(filter);

    // stdout is reserved for command output
    let result = if config.json_logging {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true).with_writer(std::io::stderr)).try_init()
    };

    result.map_err(|e| {
        CertplaneError::config_with_source("Failed to install tracing subscriber", Box::new(e))
    })
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        database_in_memory = config.database.is_in_memory(),
        auto_migrate = config.database.auto_migrate,
        max_connections = config.database.max_connections,
        metrics_enabled = config.observability.enable_metrics,
        json_logging = config.observability.json_logging,
        "certplane configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_env_filter_rejects_garbage() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }

        let config = ObservabilityConfig {
            log_level: "certplane=notalevel".to_string(),
            ..Default::default()
        };
        assert!(build_env_filter(&config).is_err());

        let config = ObservabilityConfig {
            log_level: "info,certplane::storage=debug".to_string(),
            ..Default::default()
        };
        assert!(build_env_filter(&config).is_ok());
    }

    #[test]
    fn test_log_config_info() {
        let config = crate::config::AppConfig::default();

        // This should not panic
        log_config_info(&config);
    }
}
