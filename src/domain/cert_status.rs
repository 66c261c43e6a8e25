//! Certificate lifecycle status and its derivation from provider payloads.
//!
//! Providers report progress inside their payload as
//! `{"extra_info": {"status": "<status>"}}`. Anything else is a parse failure;
//! the create path tolerates it by falling back to [`DEFAULT_STATUS`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::certificate::CertDetails;

/// Status recorded when none can be derived from the provider payload
pub const DEFAULT_STATUS: &str = "create_in_progress";

/// Row of the `cert_status` index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertStatusEntry {
    pub domain_name: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// Status sub-schema providers populate. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderStatusPayload {
    pub extra_info: ExtraInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtraInfo {
    pub status: String,
}

/// Why a status could not be derived
#[derive(thiserror::Error, Debug)]
pub enum StatusParseError {
    #[error("certificate details contain no provider payload")]
    NoProviderPayload,

    #[error("payload from provider '{provider}' does not match the status schema: {source}")]
    Malformed {
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("payload from provider '{provider}' has an empty status")]
    EmptyStatus { provider: String },
}

/// Derive the status from the first provider payload.
pub fn resolve_status(cert_details: &CertDetails) -> Result<String, StatusParseError> {
    let (provider, payload) =
        cert_details.iter().next().ok_or(StatusParseError::NoProviderPayload)?;

    let parsed: ProviderStatusPayload = serde_json::from_str(payload)
        .map_err(|source| StatusParseError::Malformed { provider: provider.clone(), source })?;

    let status = parsed.extra_info.status.trim();
    if status.is_empty() {
        return Err(StatusParseError::EmptyStatus { provider: provider.clone() });
    }

    Ok(status.to_string())
}

/// Like [`resolve_status`], but degrades to [`DEFAULT_STATUS`] with a warning.
pub fn resolve_status_or_default(domain_name: &str, cert_details: &CertDetails) -> String {
    match resolve_status(cert_details) {
        Ok(status) => status,
        Err(e) => {
            warn!(
                domain_name = %domain_name,
                error = %e,
                fallback_status = DEFAULT_STATUS,
                "Certificate details missing extra_info status, using default"
            );
            metrics::counter!(crate::observability::metrics::STATUS_FALLBACK_TOTAL).increment(1);
            DEFAULT_STATUS.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn details(entries: &[(&str, &str)]) -> CertDetails {
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_resolves_nested_status() {
        let d = details(&[("providerA", r#"{"extra_info": {"status": "deployed"}}"#)]);
        assert_eq!(resolve_status(&d).unwrap(), "deployed");
    }

    #[test]
    fn test_ignores_unknown_fields() {
        let d = details(&[(
            "akamai",
            r#"{"cert_domain": "secure.example.net", "extra_info": {"status": "create_in_progress", "sps_id": 42}}"#,
        )]);
        assert_eq!(resolve_status(&d).unwrap(), "create_in_progress");
    }

    #[test]
    fn test_first_provider_wins() {
        let d = details(&[
            ("b_provider", r#"{"extra_info": {"status": "failed"}}"#),
            ("a_provider", r#"{"extra_info": {"status": "deployed"}}"#),
        ]);
        assert_eq!(resolve_status(&d).unwrap(), "deployed");
    }

    #[test]
    fn test_failure_kinds() {
        assert!(matches!(
            resolve_status(&CertDetails::new()),
            Err(StatusParseError::NoProviderPayload)
        ));
        assert!(matches!(
            resolve_status(&details(&[("p", "{}")])),
            Err(StatusParseError::Malformed { .. })
        ));
        assert!(matches!(
            resolve_status(&details(&[("p", r#"{"extra_info": {}}"#)])),
            Err(StatusParseError::Malformed { .. })
        ));
        assert!(matches!(
            resolve_status(&details(&[("p", "not json")])),
            Err(StatusParseError::Malformed { .. })
        ));
        assert!(matches!(
            resolve_status(&details(&[("p", r#"{"extra_info": {"status": " "}}"#)])),
            Err(StatusParseError::EmptyStatus { .. })
        ));
    }

    #[traced_test]
    #[test]
    fn test_fallback_emits_warning() {
        let status = resolve_status_or_default("example.com", &details(&[("providerA", "{}")]));
        assert_eq!(status, DEFAULT_STATUS);
        assert!(logs_contain("using default"));
    }

    #[traced_test]
    #[test]
    fn test_no_warning_on_success() {
        let d = details(&[("providerA", r#"{"extra_info": {"status": "deployed"}}"#)]);
        assert_eq!(resolve_status_or_default("example.com", &d), "deployed");
        assert!(!logs_contain("using default"));
    }
}
