//! Certificate record repository.
//!
//! Primitive persistence for `certificate_info`, keyed by domain name. The
//! uniqueness guarantee lives here: [`CertificateRepository::insert`] is a
//! single insert-if-absent statement, and [`CertificateRepository::conditional_update`]
//! is a single compare-and-swap statement.

use crate::domain::{CertDetails, CertType, CertificateRecord};
use crate::errors::{CertplaneError, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

// ============================================================================
// Database Row Type
// ============================================================================

#[derive(Debug, Clone, FromRow)]
struct CertificateRow {
    domain_name: String,
    project_id: String,
    flavor_id: String,
    cert_type: String,
    cert_details: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CertificateRow> for CertificateRecord {
    type Error = CertplaneError;

    fn try_from(row: CertificateRow) -> Result<Self> {
        let cert_type: CertType = row.cert_type.parse().map_err(|_| {
            CertplaneError::inconsistent(
                &row.domain_name,
                format!("stored cert_type '{}' is not a known certificate type", row.cert_type),
            )
        })?;

        let cert_details: CertDetails = serde_json::from_str(&row.cert_details).map_err(|e| {
            CertplaneError::inconsistent(
                &row.domain_name,
                format!("stored cert_details are not a provider map: {}", e),
            )
        })?;

        Ok(CertificateRecord {
            project_id: row.project_id,
            flavor_id: row.flavor_id,
            cert_type,
            domain_name: row.domain_name,
            cert_details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn encode_details(domain_name: &str, cert_details: &CertDetails) -> Result<String> {
    serde_json::to_string(cert_details).map_err(|e| CertplaneError::Serialization {
        source: e,
        context: format!("Failed to encode certificate details for {}", domain_name),
    })
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Insert a record unless one already exists for its domain.
    ///
    /// Returns `false` when the domain is taken; nothing is written in that case.
    async fn insert(&self, record: &CertificateRecord) -> Result<bool>;

    /// Fetch the record for a domain. More than one match is a consistency error.
    async fn find_by_domain(&self, domain_name: &str) -> Result<Option<CertificateRecord>>;

    /// Replace `cert_details` only if the stored type and flavor equal the expected values.
    async fn conditional_update(
        &self,
        domain_name: &str,
        cert_details: &CertDetails,
        expected_cert_type: CertType,
        expected_flavor_id: &str,
    ) -> Result<bool>;

    /// Remove the record for a domain. Returns whether a row was removed.
    async fn delete(&self, domain_name: &str) -> Result<bool>;

    /// Whether any record exists for the domain.
    async fn domain_exists(&self, domain_name: &str) -> Result<bool>;
}

// ============================================================================
// SQLx Implementation
// ============================================================================

#[derive(Debug, Clone)]
pub struct SqlxCertificateRepository {
    pool: DbPool,
}

impl SqlxCertificateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CertificateRepository for SqlxCertificateRepository {
    #[instrument(
        skip(self, record),
        fields(domain_name = %record.domain_name, project_id = %record.project_id),
        name = "db_insert_certificate"
    )]
    async fn insert(&self, record: &CertificateRecord) -> Result<bool> {
        let cert_details = encode_details(&record.domain_name, &record.cert_details)?;

        let result = sqlx::query(
            r#"
            INSERT INTO certificate_info (
                domain_name, project_id, flavor_id, cert_type, cert_details,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(domain_name) DO NOTHING
            "#,
        )
        .bind(&record.domain_name)
        .bind(&record.project_id)
        .bind(&record.flavor_id)
        .bind(record.cert_type.as_str())
        .bind(cert_details)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CertplaneError::Database {
            source: e,
            context: format!("Failed to insert certificate for {}", record.domain_name),
        })?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), name = "db_find_certificate_by_domain")]
    async fn find_by_domain(&self, domain_name: &str) -> Result<Option<CertificateRecord>> {
        let mut rows = sqlx::query_as::<_, CertificateRow>(
            r#"
            SELECT domain_name, project_id, flavor_id, cert_type, cert_details,
                   created_at, updated_at
            FROM certificate_info
            WHERE domain_name = $1
            "#,
        )
        .bind(domain_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CertplaneError::Database {
            source: e,
            context: format!("Failed to fetch certificate for domain: {}", domain_name),
        })?;

        if rows.len() > 1 {
            return Err(CertplaneError::inconsistent(
                domain_name,
                format!("{} certificate records share one domain name", rows.len()),
            ));
        }

        rows.pop().map(CertificateRecord::try_from).transpose()
    }

    #[instrument(skip(self, cert_details), name = "db_conditional_update_certificate")]
    async fn conditional_update(
        &self,
        domain_name: &str,
        cert_details: &CertDetails,
        expected_cert_type: CertType,
        expected_flavor_id: &str,
    ) -> Result<bool> {
        let encoded = encode_details(domain_name, cert_details)?;

        let result = sqlx::query(
            r#"
            UPDATE certificate_info
            SET cert_details = $1, updated_at = $2
            WHERE domain_name = $3 AND cert_type = $4 AND flavor_id = $5
            "#,
        )
        .bind(encoded)
        .bind(Utc::now())
        .bind(domain_name)
        .bind(expected_cert_type.as_str())
        .bind(expected_flavor_id)
        .execute(&self.pool)
        .await
        .map_err(|e| CertplaneError::Database {
            source: e,
            context: format!("Failed to update certificate details for {}", domain_name),
        })?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), name = "db_delete_certificate")]
    async fn delete(&self, domain_name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM certificate_info WHERE domain_name = $1")
            .bind(domain_name)
            .execute(&self.pool)
            .await
            .map_err(|e| CertplaneError::Database {
                source: e,
                context: format!("Failed to delete certificate for {}", domain_name),
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), name = "db_certificate_domain_exists")]
    async fn domain_exists(&self, domain_name: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM certificate_info WHERE domain_name = $1)",
        )
        .bind(domain_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CertplaneError::Database {
            source: e,
            context: format!("Failed to check certificate existence for {}", domain_name),
        })
    }
}
