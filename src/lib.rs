//! # Certplane
//!
//! Certificate record store and status tracker for a CDN control plane.
//!
//! Certplane persists one certificate record per domain name, keeps a secondary
//! index from certificate status to domains, and exposes the lifecycle
//! operations the control plane's API and background workers call.
//!
//! ## Architecture
//!
//! ```text
//! CertificateService → CertificateRepository  → certificate_info
//!        ↓          → CertStatusRepository   → cert_status
//!  Status Resolver
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use certplane::domain::{CertDetails, CertType, NewCertificate};
//! use certplane::storage::create_pool;
//! use certplane::{AppConfig, CertificateService, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None)?;
//!     let service = CertificateService::from_pool(create_pool(&config.database).await?);
//!
//!     let cert = NewCertificate::new("www.example.com", CertType::San, "cdn", CertDetails::new());
//!     service.create("project-1", cert).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod services;
pub mod storage;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{CertplaneError, Result};
pub use services::{CertificateFilter, CertificateService};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
