//! Certificate status index repository.
//!
//! `cert_status` maps a domain to its current lifecycle status and is queried
//! by status to find domains whose provisioning should be polled. It is written
//! separately from `certificate_info`, so an entry can briefly outlive its record.

use crate::domain::CertStatusEntry;
use crate::errors::{CertplaneError, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct CertStatusRow {
    domain_name: String,
    status: String,
    updated_at: DateTime<Utc>,
}

impl From<CertStatusRow> for CertStatusEntry {
    fn from(row: CertStatusRow) -> Self {
        Self { domain_name: row.domain_name, status: row.status, updated_at: row.updated_at }
    }
}

#[async_trait]
pub trait CertStatusRepository: Send + Sync {
    /// Set or overwrite the status entry for a domain.
    async fn upsert(&self, domain_name: &str, status: &str) -> Result<()>;

    /// Remove the status entry for a domain. Returns whether one existed.
    async fn remove(&self, domain_name: &str) -> Result<bool>;

    /// Remove the status entry only while no certificate record holds the
    /// domain. Check and removal are one statement.
    async fn remove_if_orphaned(&self, domain_name: &str) -> Result<bool>;

    /// Domains currently recorded under `status`, ordered by name.
    async fn list_domains_by_status(&self, status: &str) -> Result<Vec<String>>;

    /// Fetch the status entry for a domain.
    async fn get(&self, domain_name: &str) -> Result<Option<CertStatusEntry>>;
}

#[derive(Debug, Clone)]
pub struct SqlxCertStatusRepository {
    pool: DbPool,
}

impl SqlxCertStatusRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CertStatusRepository for SqlxCertStatusRepository {
    #[instrument(skip(self), name = "db_upsert_cert_status")]
    async fn upsert(&self, domain_name: &str, status: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cert_status (domain_name, status, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(domain_name) DO UPDATE
            SET status = excluded.status, updated_at = excluded.updated_at
            "#,
        )
        .bind(domain_name)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| CertplaneError::Database {
            source: e,
            context: format!("Failed to record certificate status for {}", domain_name),
        })?;

        Ok(())
    }

    #[instrument(skip(self), name = "db_remove_cert_status")]
    async fn remove(&self, domain_name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cert_status WHERE domain_name = $1")
            .bind(domain_name)
            .execute(&self.pool)
            .await
            .map_err(|e| CertplaneError::Database {
                source: e,
                context: format!("Failed to remove certificate status for {}", domain_name),
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), name = "db_remove_orphaned_cert_status")]
    async fn remove_if_orphaned(&self, domain_name: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM cert_status
            WHERE domain_name = $1
              AND NOT EXISTS (SELECT 1 FROM certificate_info WHERE domain_name = $1)
            "#,
        )
        .bind(domain_name)
        .execute(&self.pool)
        .await
        .map_err(|e| CertplaneError::Database {
            source: e,
            context: format!("Failed to remove orphaned certificate status for {}", domain_name),
        })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), name = "db_list_domains_by_cert_status")]
    async fn list_domains_by_status(&self, status: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT domain_name FROM cert_status WHERE status = $1 ORDER BY domain_name",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CertplaneError::Database {
            source: e,
            context: format!("Failed to list domains with certificate status: {}", status),
        })
    }

    #[instrument(skip(self), name = "db_get_cert_status")]
    async fn get(&self, domain_name: &str) -> Result<Option<CertStatusEntry>> {
        let row = sqlx::query_as::<_, CertStatusRow>(
            "SELECT domain_name, status, updated_at FROM cert_status WHERE domain_name = $1",
        )
        .bind(domain_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CertplaneError::Database {
            source: e,
            context: format!("Failed to fetch certificate status for {}", domain_name),
        })?;

        Ok(row.map(CertStatusEntry::from))
    }
}
