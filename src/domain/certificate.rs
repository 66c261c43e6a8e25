//! Certificate records and their read model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::CertplaneError;

/// Provider id -> serialized provider payload.
///
/// Ordered so that "the first provider" is stable across reads.
pub type CertDetails = BTreeMap<String, String>;

/// Kind of certificate backing a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertType {
    San,
    Sni,
    Custom,
    Dedicated,
}

impl CertType {
    pub const ALL: [CertType; 4] =
        [CertType::San, CertType::Sni, CertType::Custom, CertType::Dedicated];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertType::San => "san",
            CertType::Sni => "sni",
            CertType::Custom => "custom",
            CertType::Dedicated => "dedicated",
        }
    }
}

impl fmt::Display for CertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertType {
    type Err = CertplaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "san" => Ok(CertType::San),
            "sni" => Ok(CertType::Sni),
            "custom" => Ok(CertType::Custom),
            "dedicated" => Ok(CertType::Dedicated),
            other => Err(CertplaneError::validation_field(
                format!("Unknown certificate type '{}'", other),
                "cert_type",
            )),
        }
    }
}

/// Lower-cases a domain name; every keyed read and write goes through this.
pub fn normalize_domain(domain_name: &str) -> String {
    domain_name.trim().to_ascii_lowercase()
}

/// Certificate input supplied by the provisioning workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCertificate {
    pub domain_name: String,
    pub cert_type: CertType,
    pub flavor_id: String,
    #[serde(default)]
    pub cert_details: CertDetails,
}

impl NewCertificate {
    pub fn new<D: Into<String>, F: Into<String>>(
        domain_name: D,
        cert_type: CertType,
        flavor_id: F,
        cert_details: CertDetails,
    ) -> Self {
        Self {
            domain_name: domain_name.into(),
            cert_type,
            flavor_id: flavor_id.into(),
            cert_details,
        }
    }

    /// Reject records the store could never look up again.
    pub fn validate(&self) -> Result<(), CertplaneError> {
        if normalize_domain(&self.domain_name).is_empty() {
            return Err(CertplaneError::validation_field(
                "Domain name cannot be empty",
                "domain_name",
            ));
        }
        if self.flavor_id.trim().is_empty() {
            return Err(CertplaneError::validation_field("Flavor id cannot be empty", "flavor_id"));
        }
        Ok(())
    }
}

/// Certificate metadata as persisted in `certificate_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub project_id: String,
    pub flavor_id: String,
    pub cert_type: CertType,
    pub domain_name: String,
    pub cert_details: CertDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CertificateRecord {
    pub fn from_new(project_id: &str, cert: NewCertificate) -> Self {
        let now = Utc::now();
        Self {
            project_id: project_id.to_string(),
            flavor_id: cert.flavor_id,
            cert_type: cert.cert_type,
            domain_name: normalize_domain(&cert.domain_name),
            cert_details: cert.cert_details,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Certificate as returned to callers, with provider payloads decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SslCertificate {
    pub project_id: String,
    pub flavor_id: String,
    pub cert_type: CertType,
    pub domain_name: String,
    pub cert_details: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CertificateRecord> for SslCertificate {
    fn from(record: CertificateRecord) -> Self {
        // Payloads are produced by providers; one that is not JSON is kept as a string.
        let cert_details = record
            .cert_details
            .into_iter()
            .map(|(provider, payload)| {
                let value = serde_json::from_str(&payload)
                    .unwrap_or(serde_json::Value::String(payload));
                (provider, value)
            })
            .collect();

        Self {
            project_id: record.project_id,
            flavor_id: record.flavor_id,
            cert_type: record.cert_type,
            domain_name: record.domain_name,
            cert_details,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cert_type_parse_and_display() {
        for cert_type in CertType::ALL {
            assert_eq!(cert_type.as_str().parse::<CertType>().unwrap(), cert_type);
        }
        assert_eq!("SAN".parse::<CertType>().unwrap(), CertType::San);
        assert!("wildcard".parse::<CertType>().is_err());
        assert_eq!(serde_json::to_string(&CertType::Dedicated).unwrap(), "\"dedicated\"");
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain(" WWW.Example.COM "), "www.example.com");
    }

    #[test]
    fn test_new_certificate_validation() {
        let cert = NewCertificate::new("  ", CertType::San, "f1", CertDetails::new());
        assert!(cert.validate().is_err());

        let cert = NewCertificate::new("example.com", CertType::San, "", CertDetails::new());
        assert!(cert.validate().is_err());

        let cert = NewCertificate::new("example.com", CertType::San, "f1", CertDetails::new());
        assert!(cert.validate().is_ok());
    }

    #[test]
    fn test_record_from_new_normalizes_domain() {
        let cert = NewCertificate::new("Example.COM", CertType::Sni, "f1", CertDetails::new());
        let record = CertificateRecord::from_new("p1", cert);
        assert_eq!(record.domain_name, "example.com");
        assert_eq!(record.project_id, "p1");
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_ssl_certificate_decodes_payloads() {
        let mut details = CertDetails::new();
        details
            .insert("akamai".to_string(), r#"{"extra_info": {"status": "deployed"}}"#.to_string());
        details.insert("fastly".to_string(), "not json".to_string());

        let record = CertificateRecord::from_new(
            "p1",
            NewCertificate::new("example.com", CertType::San, "f1", details),
        );
        let cert = SslCertificate::from(record);

        assert_eq!(cert.cert_details["akamai"]["extra_info"]["status"], "deployed");
        assert_eq!(cert.cert_details["fastly"], serde_json::Value::String("not json".into()));
    }
}
