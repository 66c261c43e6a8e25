//! Domain types for certificate metadata and status tracking.

pub mod cert_status;
pub mod certificate;

pub use cert_status::{
    resolve_status, resolve_status_or_default, CertStatusEntry, StatusParseError, DEFAULT_STATUS,
};
pub use certificate::{
    normalize_domain, CertDetails, CertType, CertificateRecord, NewCertificate, SslCertificate,
};
