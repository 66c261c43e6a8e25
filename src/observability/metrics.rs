//! # Metrics Collection
//!
//! Certificate store metrics emitted through the `metrics` facade. Without an
//! installed recorder every call is a no-op.

use metrics::{counter, describe_counter, Unit};

pub const CERTIFICATE_OPERATIONS_TOTAL: &str = "certplane_certificate_operations_total";
pub const STATUS_FALLBACK_TOTAL: &str = "certplane_status_fallback_total";
pub const STATUS_REPAIRS_TOTAL: &str = "certplane_status_repairs_total";

/// Outcome label for certificate operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Duplicate,
    NotFound,
    Conflict,
    Inconsistent,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Duplicate => "duplicate",
            Outcome::NotFound => "not_found",
            Outcome::Conflict => "conflict",
            Outcome::Inconsistent => "inconsistent",
            Outcome::Error => "error",
        }
    }

    /// Classify an operation result by its error kind
    pub fn of<T>(result: &crate::errors::Result<T>) -> Self {
        use crate::errors::CertplaneError;

        match result {
            Ok(_) => Outcome::Success,
            Err(CertplaneError::DuplicateCertificate { .. }) => Outcome::Duplicate,
            Err(CertplaneError::CertificateNotFound { .. }) => Outcome::NotFound,
            Err(CertplaneError::CertificateConflict { .. }) => Outcome::Conflict,
            Err(CertplaneError::InconsistentState { .. }) => Outcome::Inconsistent,
            Err(_) => Outcome::Error,
        }
    }
}

/// Metrics recorder that tracks certificate store activity
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Record a controller operation (create, update, delete, ...) and its outcome
    pub fn record_certificate_operation(&self, operation: &'static str, outcome: Outcome) {
        counter!(
            CERTIFICATE_OPERATIONS_TOTAL,
            "operation" => operation,
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    /// Record removal of a status entry whose certificate record is gone
    pub fn record_status_repair(&self) {
        counter!(STATUS_REPAIRS_TOTAL).increment(1);
    }

    /// Register metric descriptions with the installed recorder
    pub fn register_certificate_metrics(&self) {
        describe_counter!(
            CERTIFICATE_OPERATIONS_TOTAL,
            Unit::Count,
            "Certificate store operations by operation and outcome"
        );
        describe_counter!(
            STATUS_FALLBACK_TOTAL,
            Unit::Count,
            "Certificate statuses that fell back to create_in_progress"
        );
        describe_counter!(
            STATUS_REPAIRS_TOTAL,
            Unit::Count,
            "Dangling certificate status entries removed"
        );
    }
}
