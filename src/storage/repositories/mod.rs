//! Repository modules for data access
//!
//! One repository per persisted table. The certificate record and its status
//! entry are separate rows maintained by separate repositories.

pub mod cert_status;
pub mod certificate;

pub use cert_status::{CertStatusRepository, SqlxCertStatusRepository};
pub use certificate::{CertificateRepository, SqlxCertificateRepository};
