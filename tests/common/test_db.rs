//! Test database utilities for integration tests.
//!
//! Provides file-based SQLite databases in a temporary directory so tests can
//! use a pool with several connections. The directory is removed on drop.

#![allow(clippy::duplicate_mod)]

use certplane::config::DatabaseConfig;
use certplane::storage::{create_pool, DbPool};
use certplane::CertificateService;
use tempfile::TempDir;

/// A test database that is deleted when dropped.
pub struct TestDatabase {
    pub pool: DbPool,
    _dir: TempDir,
}

impl TestDatabase {
    /// Create a new test database with migrations applied.
    pub async fn new() -> Self {
        Self::with_connections(5).await
    }

    /// Create a new test database with a pool of `max_connections`.
    pub async fn with_connections(max_connections: u32) -> Self {
        let dir = tempfile::tempdir().expect("create test database directory");
        let path = dir.path().join("certplane.db");

        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections,
            auto_migrate: true,
            ..Default::default()
        };

        let pool = create_pool(&config).await.expect("create test database pool");

        Self { pool, _dir: dir }
    }

    /// Certificate service over this database.
    pub fn service(&self) -> CertificateService {
        CertificateService::from_pool(self.pool.clone())
    }
}

/// Certificate service over a private in-memory database.
pub async fn memory_service() -> (CertificateService, DbPool) {
    let config = DatabaseConfig { url: "sqlite::memory:".to_string(), ..Default::default() };
    let pool = create_pool(&config).await.expect("create in-memory test database");
    (CertificateService::from_pool(pool.clone()), pool)
}
