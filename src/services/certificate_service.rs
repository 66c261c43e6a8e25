//! Certificate business logic service
//!
//! Orchestrates the certificate record repository and the status index:
//! uniqueness on create, compare-and-swap on update, ownership-scoped delete
//! and lookups that never reveal certificates outside the caller's filters.
//!
//! The record and its status entry are separate rows. The record is
//! authoritative; a status entry left behind by a partial failure is removed
//! by [`CertificateService::list_by_status`] and a missing one is recomputed
//! by [`CertificateService::refresh_status`].

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    domain::{
        normalize_domain, resolve_status, resolve_status_or_default, CertDetails, CertType,
        CertificateRecord, NewCertificate, SslCertificate,
    },
    errors::{CertplaneError, Result},
    observability::{MetricsRecorder, Outcome},
    storage::{
        CertStatusRepository, CertificateRepository, DbPool, SqlxCertStatusRepository,
        SqlxCertificateRepository,
    },
};

/// Optional ownership filters for lookups. Empty strings count as not supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CertificateFilter {
    pub project_id: Option<String>,
    pub flavor_id: Option<String>,
    pub cert_type: Option<CertType>,
}

impl CertificateFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_id<S: Into<String>>(mut self, project_id: S) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn flavor_id<S: Into<String>>(mut self, flavor_id: S) -> Self {
        self.flavor_id = Some(flavor_id.into());
        self
    }

    pub fn cert_type(mut self, cert_type: CertType) -> Self {
        self.cert_type = Some(cert_type);
        self
    }

    /// Whether every supplied filter equals the record's field
    pub fn matches(&self, record: &CertificateRecord) -> bool {
        fn supplied(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }

        supplied(&self.project_id).map_or(true, |p| p == record.project_id)
            && supplied(&self.flavor_id).map_or(true, |f| f == record.flavor_id)
            && self.cert_type.map_or(true, |t| t == record.cert_type)
    }
}

/// Service for managing certificate records and their status index
#[derive(Clone)]
pub struct CertificateService {
    certificates: Arc<dyn CertificateRepository>,
    statuses: Arc<dyn CertStatusRepository>,
    metrics: MetricsRecorder,
}

impl CertificateService {
    pub fn new(
        certificates: Arc<dyn CertificateRepository>,
        statuses: Arc<dyn CertStatusRepository>,
    ) -> Self {
        Self { certificates, statuses, metrics: MetricsRecorder::new() }
    }

    /// Service backed by the SQL repositories on one pool
    pub fn from_pool(pool: DbPool) -> Self {
        Self::new(
            Arc::new(SqlxCertificateRepository::new(pool.clone())),
            Arc::new(SqlxCertStatusRepository::new(pool)),
        )
    }

    /// Create the certificate for a domain and record its initial status.
    ///
    /// Fails with `DuplicateCertificate` when any record already holds the
    /// domain; nothing is written in that case. A payload without a derivable
    /// status is accepted and recorded as `create_in_progress`.
    #[instrument(
        skip(self, cert),
        fields(domain_name = %cert.domain_name, cert_type = %cert.cert_type)
    )]
    pub async fn create(
        &self,
        project_id: &str,
        cert: NewCertificate,
    ) -> Result<CertificateRecord> {
        let result = self.create_inner(project_id, cert).await;
        self.metrics.record_certificate_operation("create", Outcome::of(&result));
        result
    }

    async fn create_inner(
        &self,
        project_id: &str,
        cert: NewCertificate,
    ) -> Result<CertificateRecord> {
        if project_id.trim().is_empty() {
            return Err(CertplaneError::validation_field(
                "Project id cannot be empty",
                "project_id",
            ));
        }
        cert.validate()?;

        let record = CertificateRecord::from_new(project_id, cert);

        if !self.certificates.insert(&record).await? {
            info!(domain_name = %record.domain_name, "Certificate already exists for domain");
            return Err(CertplaneError::duplicate(&record.domain_name));
        }

        let status = resolve_status_or_default(&record.domain_name, &record.cert_details);
        self.statuses.upsert(&record.domain_name, &status).await.inspect_err(|e| {
            error!(
                domain_name = %record.domain_name,
                error = %e,
                "Certificate created but its status entry was not written"
            );
        })?;

        info!(
            domain_name = %record.domain_name,
            project_id = %record.project_id,
            flavor_id = %record.flavor_id,
            cert_type = %record.cert_type,
            status = %status,
            "Certificate created"
        );

        Ok(record)
    }

    /// Delete a certificate owned by `project_id` with the given type.
    ///
    /// A certificate of another project or type is reported exactly like a
    /// missing one.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        project_id: &str,
        domain_name: &str,
        cert_type: CertType,
    ) -> Result<()> {
        let result = self.delete_inner(project_id, domain_name, cert_type).await;
        self.metrics.record_certificate_operation("delete", Outcome::of(&result));
        result
    }

    async fn delete_inner(
        &self,
        project_id: &str,
        domain_name: &str,
        cert_type: CertType,
    ) -> Result<()> {
        let domain_name = normalize_domain(domain_name);

        let record = self
            .certificates
            .find_by_domain(&domain_name)
            .await?
            .ok_or_else(|| CertplaneError::not_found(&domain_name))?;

        if record.project_id != project_id || record.cert_type != cert_type {
            return Err(CertplaneError::not_found(&domain_name));
        }

        if !self.certificates.delete(&domain_name).await? {
            return Err(CertplaneError::not_found(&domain_name));
        }

        // The record is gone; a leftover status entry is repaired on a later read.
        if let Err(e) = self.statuses.remove(&domain_name).await {
            warn!(
                domain_name = %domain_name,
                error = %e,
                "Certificate deleted but its status entry could not be removed"
            );
        }

        info!(domain_name = %domain_name, project_id = %project_id, "Certificate deleted");
        Ok(())
    }

    /// Replace the provider details of a certificate whose stored type and
    /// flavor equal the caller's, then record the status they report.
    ///
    /// Returns the recorded status.
    #[instrument(skip(self, cert_details))]
    pub async fn update(
        &self,
        domain_name: &str,
        cert_type: CertType,
        flavor_id: &str,
        cert_details: CertDetails,
    ) -> Result<String> {
        let result = self.update_inner(domain_name, cert_type, flavor_id, cert_details).await;
        self.metrics.record_certificate_operation("update", Outcome::of(&result));
        result
    }

    async fn update_inner(
        &self,
        domain_name: &str,
        cert_type: CertType,
        flavor_id: &str,
        cert_details: CertDetails,
    ) -> Result<String> {
        let domain_name = normalize_domain(domain_name);

        let applied = self
            .certificates
            .conditional_update(&domain_name, &cert_details, cert_type, flavor_id)
            .await?;

        if !applied {
            warn!(
                domain_name = %domain_name,
                expected_cert_type = %cert_type,
                expected_flavor_id = %flavor_id,
                "Certificate update rejected, stored type or flavor differs"
            );
            return Err(CertplaneError::conflict(&domain_name, cert_type.as_str(), flavor_id));
        }

        // Records that were created once must carry a readable status.
        let status = resolve_status(&cert_details).map_err(|e| {
            error!(
                domain_name = %domain_name,
                error = %e,
                "Unable to update certificate status, certificate details are inconsistent"
            );
            CertplaneError::inconsistent(&domain_name, e.to_string())
        })?;

        self.statuses.upsert(&domain_name, &status).await?;

        info!(domain_name = %domain_name, status = %status, "Certificate updated");
        Ok(status)
    }

    /// Fetch the certificate for a domain, asserting any supplied filters.
    #[instrument(skip(self))]
    pub async fn get_by_domain(
        &self,
        domain_name: &str,
        filter: &CertificateFilter,
    ) -> Result<SslCertificate> {
        let domain_name = normalize_domain(domain_name);
        info!(domain_name = %domain_name, "Checking if certificate exists");

        let record = self
            .certificates
            .find_by_domain(&domain_name)
            .await?
            .ok_or_else(|| CertplaneError::not_found(&domain_name))?;

        if !filter.matches(&record) {
            return Err(CertplaneError::not_found(&domain_name));
        }

        Ok(SslCertificate::from(record))
    }

    /// Whether a certificate with exactly these attributes exists.
    pub async fn exists(
        &self,
        domain_name: &str,
        cert_type: CertType,
        flavor_id: &str,
        project_id: &str,
    ) -> Result<bool> {
        let filter = CertificateFilter::new()
            .project_id(project_id)
            .flavor_id(flavor_id)
            .cert_type(cert_type);

        match self.get_by_domain(domain_name, &filter).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether any certificate holds the domain, regardless of owner.
    pub async fn domain_exists(&self, domain_name: &str) -> Result<bool> {
        self.certificates.domain_exists(&normalize_domain(domain_name)).await
    }

    /// Domains whose certificate is currently in `status`.
    ///
    /// Index entries whose certificate record no longer exists are removed and
    /// left out of the result.
    #[instrument(skip(self))]
    pub async fn list_by_status(&self, status: &str) -> Result<Vec<String>> {
        info!(status = %status, "Getting domains which have certificate in status");

        let domains = self.statuses.list_domains_by_status(status).await?;

        let mut live = Vec::with_capacity(domains.len());
        for domain_name in domains {
            if self.certificates.domain_exists(&domain_name).await? {
                live.push(domain_name);
                continue;
            }

            // A create may have claimed the domain since the check; its entry stays.
            if self.statuses.remove_if_orphaned(&domain_name).await? {
                warn!(
                    domain_name = %domain_name,
                    status = %status,
                    "Removed dangling certificate status entry"
                );
                self.metrics.record_status_repair();
            } else {
                debug!(domain_name = %domain_name, "Status entry regained its certificate record");
            }
        }

        Ok(live)
    }

    /// Recompute and store the status of an existing certificate from its
    /// stored provider details.
    #[instrument(skip(self))]
    pub async fn refresh_status(&self, domain_name: &str) -> Result<String> {
        let domain_name = normalize_domain(domain_name);

        let record = self
            .certificates
            .find_by_domain(&domain_name)
            .await?
            .ok_or_else(|| CertplaneError::not_found(&domain_name))?;

        let status = resolve_status_or_default(&record.domain_name, &record.cert_details);
        self.statuses.upsert(&record.domain_name, &status).await?;

        info!(domain_name = %domain_name, status = %status, "Certificate status refreshed");
        Ok(status)
    }
}
