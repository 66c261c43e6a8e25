//! # Configuration Management
//!
//! Layered configuration for the certificate store: built-in defaults, an
//! optional TOML file, then `CERTPLANE__*` environment overrides.

pub mod settings;

pub use settings::{AppConfig, DatabaseConfig, ObservabilityConfig, ENV_PREFIX};
