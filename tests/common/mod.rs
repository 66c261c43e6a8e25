//! Common test utilities for all integration tests.
//!
//! Provides shared test database setup and certificate fixtures.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

pub mod test_db;

use certplane::domain::{CertDetails, CertType, NewCertificate};

/// Provider payload reporting `status` in the shape providers populate.
pub fn provider_payload(status: &str) -> String {
    serde_json::json!({ "extra_info": { "status": status } }).to_string()
}

/// Details with a single provider entry.
pub fn details(provider: &str, payload: &str) -> CertDetails {
    let mut details = CertDetails::new();
    details.insert(provider.to_string(), payload.to_string());
    details
}

/// SAN certificate for `domain` on flavor `f1` whose provider reports `deployed`.
pub fn deployed_san(domain: &str) -> NewCertificate {
    NewCertificate::new(
        domain,
        CertType::San,
        "f1",
        details("prov1", &provider_payload("deployed")),
    )
}
