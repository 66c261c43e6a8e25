//! Business logic services
//!
//! Service layer components that encapsulate certificate business logic,
//! separated from storage and transport concerns.

pub mod certificate_service;

pub use certificate_service::{CertificateFilter, CertificateService};
