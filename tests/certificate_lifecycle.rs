//! End-to-end certificate lifecycle tests against a real SQLite store.

mod common;

use certplane::domain::{CertDetails, CertType, NewCertificate, DEFAULT_STATUS};
use certplane::storage::{CertStatusRepository, SqlxCertStatusRepository};
use certplane::{CertificateFilter, CertplaneError};
use common::test_db::{memory_service, TestDatabase};
use common::{deployed_san, details, provider_payload};
use tracing_test::traced_test;

#[tokio::test]
async fn create_records_status_reported_by_provider() {
    let (service, _pool) = memory_service().await;

    service.create("p1", deployed_san("example.com")).await.unwrap();

    let domains = service.list_by_status("deployed").await.unwrap();
    assert!(domains.contains(&"example.com".to_string()));
}

#[tokio::test]
#[traced_test]
async fn create_without_provider_status_uses_default_and_warns() {
    let (service, _pool) = memory_service().await;

    let cert = NewCertificate::new("example.com", CertType::San, "f1", details("prov1", "{}"));
    service.create("p1", cert).await.unwrap();

    let domains = service.list_by_status(DEFAULT_STATUS).await.unwrap();
    assert!(domains.contains(&"example.com".to_string()));
    assert!(logs_contain("Certificate details missing extra_info status, using default"));

    let stored = service.get_by_domain("example.com", &CertificateFilter::new()).await.unwrap();
    assert_eq!(stored.cert_details["prov1"], serde_json::json!({}));
}

#[tokio::test]
async fn repeated_create_is_rejected_and_leaves_store_unchanged() {
    let (service, _pool) = memory_service().await;
    service.create("p1", deployed_san("example.com")).await.unwrap();
    let before = service.get_by_domain("example.com", &CertificateFilter::new()).await.unwrap();

    let err = service.create("p1", deployed_san("example.com")).await.unwrap_err();
    assert!(matches!(
        err,
        CertplaneError::DuplicateCertificate { ref domain_name } if domain_name == "example.com"
    ));

    let after = service.get_by_domain("example.com", &CertificateFilter::new()).await.unwrap();
    assert_eq!(before, after);
    assert_eq!(service.list_by_status("deployed").await.unwrap(), vec!["example.com"]);
}

#[tokio::test]
async fn update_with_wrong_type_conflicts_and_keeps_details() {
    let (service, _pool) = memory_service().await;
    service.create("p1", deployed_san("example.com")).await.unwrap();

    let err = service
        .update("example.com", CertType::Sni, "f1", details("prov1", &provider_payload("failed")))
        .await
        .unwrap_err();
    assert!(matches!(err, CertplaneError::CertificateConflict { .. }));

    let stored = service.get_by_domain("example.com", &CertificateFilter::new()).await.unwrap();
    assert_eq!(stored.cert_details["prov1"]["extra_info"]["status"], "deployed");
    assert!(service.list_by_status("failed").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_with_matching_type_and_flavor_moves_status() {
    let (service, _pool) = memory_service().await;
    service.create("p1", deployed_san("example.com")).await.unwrap();

    let status = service
        .update("Example.com", CertType::San, "f1", details("prov1", &provider_payload("failed")))
        .await
        .unwrap();
    assert_eq!(status, "failed");

    assert!(service.list_by_status("deployed").await.unwrap().is_empty());
    assert_eq!(service.list_by_status("failed").await.unwrap(), vec!["example.com"]);

    let err = service
        .update("example.com", CertType::San, "f2", details("prov1", &provider_payload("deployed")))
        .await
        .unwrap_err();
    assert!(matches!(err, CertplaneError::CertificateConflict { .. }));
}

#[tokio::test]
async fn update_of_missing_domain_conflicts() {
    let (service, _pool) = memory_service().await;

    let err = service
        .update("missing.com", CertType::San, "f1", details("prov1", &provider_payload("deployed")))
        .await
        .unwrap_err();
    assert!(matches!(err, CertplaneError::CertificateConflict { .. }));
}

#[tokio::test]
async fn delete_by_other_project_is_not_found_and_keeps_record() {
    let (service, _pool) = memory_service().await;
    service.create("p1", deployed_san("example.com")).await.unwrap();

    let err = service.delete("p2", "example.com", CertType::San).await.unwrap_err();
    assert!(err.is_not_found());

    let err = service.delete("p1", "example.com", CertType::Sni).await.unwrap_err();
    assert!(err.is_not_found());

    let stored = service.get_by_domain("example.com", &CertificateFilter::new()).await.unwrap();
    assert_eq!(stored.project_id, "p1");
    assert_eq!(service.list_by_status("deployed").await.unwrap(), vec!["example.com"]);
}

#[tokio::test]
async fn delete_removes_record_and_status_entry() {
    let (service, pool) = memory_service().await;
    service.create("p1", deployed_san("example.com")).await.unwrap();

    service.delete("p1", "EXAMPLE.COM", CertType::San).await.unwrap();

    assert!(!service.domain_exists("example.com").await.unwrap());
    let statuses = SqlxCertStatusRepository::new(pool);
    assert!(statuses.get("example.com").await.unwrap().is_none());

    let err = service.delete("p1", "example.com", CertType::San).await.unwrap_err();
    assert!(err.is_not_found());

    // The domain is free again
    service.create("p2", deployed_san("example.com")).await.unwrap();
}

#[tokio::test]
async fn get_with_non_matching_type_is_not_found() {
    let (service, _pool) = memory_service().await;
    service.create("p1", deployed_san("example.com")).await.unwrap();

    let filter = CertificateFilter::new().cert_type(CertType::Sni);
    let err = service.get_by_domain("example.com", &filter).await.unwrap_err();
    assert!(matches!(err, CertplaneError::CertificateNotFound { .. }));

    let filter = CertificateFilter::new().project_id("p2");
    assert!(service.get_by_domain("example.com", &filter).await.unwrap_err().is_not_found());

    let filter =
        CertificateFilter::new().project_id("p1").flavor_id("f1").cert_type(CertType::San);
    let cert = service.get_by_domain("example.com", &filter).await.unwrap();
    assert_eq!(cert.domain_name, "example.com");
    assert_eq!(cert.flavor_id, "f1");
}

#[tokio::test]
async fn exists_reports_exact_match_only() {
    let (service, _pool) = memory_service().await;
    service.create("p1", deployed_san("example.com")).await.unwrap();

    assert!(service.exists("example.com", CertType::San, "f1", "p1").await.unwrap());
    assert!(!service.exists("example.com", CertType::San, "f1", "p2").await.unwrap());
    assert!(!service.exists("example.com", CertType::Custom, "f1", "p1").await.unwrap());
    assert!(!service.exists("other.com", CertType::San, "f1", "p1").await.unwrap());

    assert!(service.domain_exists("example.com").await.unwrap());
    assert!(!service.domain_exists("other.com").await.unwrap());
}

#[tokio::test]
async fn payload_that_is_not_json_is_returned_as_string() {
    let (service, _pool) = memory_service().await;

    let cert = NewCertificate::new(
        "example.com",
        CertType::Dedicated,
        "f1",
        details("prov1", "pending-verification"),
    );
    service.create("p1", cert).await.unwrap();

    let stored = service.get_by_domain("example.com", &CertificateFilter::new()).await.unwrap();
    assert_eq!(stored.cert_details["prov1"], serde_json::json!("pending-verification"));
    assert_eq!(service.list_by_status(DEFAULT_STATUS).await.unwrap(), vec!["example.com"]);
}

#[tokio::test]
async fn status_index_survives_reopening_file_store() {
    let db = TestDatabase::new().await;
    let service = db.service();

    service.create("p1", deployed_san("a.example.com")).await.unwrap();
    service.create("p1", deployed_san("b.example.com")).await.unwrap();
    service
        .create("p2", NewCertificate::new("c.example.com", CertType::Sni, "f2", CertDetails::new()))
        .await
        .unwrap();

    let reopened = db.service();
    assert_eq!(
        reopened.list_by_status("deployed").await.unwrap(),
        vec!["a.example.com", "b.example.com"]
    );
    assert_eq!(reopened.list_by_status(DEFAULT_STATUS).await.unwrap(), vec!["c.example.com"]);
}
