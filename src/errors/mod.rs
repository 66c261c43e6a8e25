//! # Error Handling
//!
//! Error types shared by the storage layer and the certificate service.

pub mod types;

pub use types::{CertplaneError, Result};
