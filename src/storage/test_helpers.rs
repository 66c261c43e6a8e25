//! Test database utilities for in-library tests.
//!
//! Each helper returns a fresh private in-memory SQLite database.
//!
//! This module is only available in test builds (`#[cfg(test)]`).

use crate::config::DatabaseConfig;
use crate::storage::{create_pool, DbPool};

fn memory_config(auto_migrate: bool) -> DatabaseConfig {
    DatabaseConfig { url: "sqlite::memory:".to_string(), auto_migrate, ..Default::default() }
}

/// In-memory database with all migrations applied.
pub async fn memory_pool() -> DbPool {
    create_pool(&memory_config(true)).await.expect("create in-memory test database")
}

/// In-memory database with an empty schema.
pub async fn memory_pool_without_migrations() -> DbPool {
    create_pool(&memory_config(false)).await.expect("create in-memory test database")
}
