//! # Error Types
//!
//! Error taxonomy for the certificate store using `thiserror`.
//!
//! The certificate kinds (`DuplicateCertificate`, `CertificateNotFound`,
//! `CertificateConflict`, `InconsistentState`) are what callers branch on.
//! `Database` is the store-layer failure and is propagated unchanged.

/// Custom result type for certplane operations
pub type Result<T> = std::result::Result<T, CertplaneError>;

/// Main error type for the certificate store
#[derive(thiserror::Error, Debug)]
pub enum CertplaneError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failures surfaced by the underlying store (connectivity, timeouts, constraint violations)
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// A certificate already occupies the domain
    #[error("Certificate already exists for {domain_name}")]
    DuplicateCertificate { domain_name: String },

    /// No certificate, or one that fails an ownership/type filter
    #[error("No matching certificate found for the domain {domain_name}")]
    CertificateNotFound { domain_name: String },

    /// Conditional update expectations did not match the stored record
    #[error("Certificate for {domain_name} does not match expected type '{expected_cert_type}' and flavor '{expected_flavor_id}'")]
    CertificateConflict {
        domain_name: String,
        expected_cert_type: String,
        expected_flavor_id: String,
    },

    /// Persisted certificate data is not in the shape it must have; needs operator attention
    #[error("Certificate for {domain_name} is in an inconsistent state: {message}")]
    InconsistentState { domain_name: String, message: String },
}

impl CertplaneError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Wrap a store failure with context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    pub fn duplicate<D: Into<String>>(domain_name: D) -> Self {
        Self::DuplicateCertificate { domain_name: domain_name.into() }
    }

    pub fn not_found<D: Into<String>>(domain_name: D) -> Self {
        Self::CertificateNotFound { domain_name: domain_name.into() }
    }

    pub fn conflict<D: Into<String>, T: Into<String>, F: Into<String>>(
        domain_name: D,
        expected_cert_type: T,
        expected_flavor_id: F,
    ) -> Self {
        Self::CertificateConflict {
            domain_name: domain_name.into(),
            expected_cert_type: expected_cert_type.into(),
            expected_flavor_id: expected_flavor_id.into(),
        }
    }

    pub fn inconsistent<D: Into<String>, M: Into<String>>(domain_name: D, message: M) -> Self {
        Self::InconsistentState { domain_name: domain_name.into(), message: message.into() }
    }

    /// True for the "no such certificate" kind
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CertificateNotFound { .. })
    }

    /// Get the HTTP status code the API layer should return for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CertplaneError::Config { .. } => 500,
            CertplaneError::Database { .. } => 503,
            CertplaneError::Io { .. } => 500,
            CertplaneError::Serialization { .. } => 400,
            CertplaneError::Validation { .. } => 400,
            CertplaneError::DuplicateCertificate { .. } => 409,
            CertplaneError::CertificateNotFound { .. } => 404,
            CertplaneError::CertificateConflict { .. } => 409,
            CertplaneError::InconsistentState { .. } => 500,
        }
    }

    /// Check if this error is worth retrying by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(self, CertplaneError::Database { .. } | CertplaneError::Io { .. })
    }
}

impl From<sqlx::Error> for CertplaneError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<std::io::Error> for CertplaneError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for CertplaneError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<config::ConfigError> for CertplaneError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for CertplaneError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
