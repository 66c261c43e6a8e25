//! # Health Checking
//!
//! Liveness of the certificate store's dependencies. The store reports alive
//! when its database answers a trivial query.

use crate::errors::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status for a component
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded { message: String },
    Unhealthy { message: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Healthy or degraded
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded { message } | HealthStatus::Unhealthy { message } => {
                Some(message)
            }
        }
    }
}

/// Health check result for a component
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub last_check: chrono::DateTime<chrono::Utc>,
    pub metadata: BTreeMap<String, String>,
}

impl HealthCheck {
    pub fn new<S: Into<String>>(component: S, status: HealthStatus) -> Self {
        Self {
            component: component.into(),
            status,
            last_check: chrono::Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn healthy<S: Into<String>>(component: S) -> Self {
        Self::new(component, HealthStatus::Healthy)
    }

    pub fn unhealthy<S: Into<String>, M: Into<String>>(component: S, message: M) -> Self {
        Self::new(component, HealthStatus::Unhealthy { message: message.into() })
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Component that can report its own health
#[async_trait]
pub trait HealthProvider: Send + Sync {
    async fn health_check(&self) -> Result<HealthCheck>;
}

/// Aggregates registered health providers
#[derive(Clone, Default)]
pub struct HealthChecker {
    providers: Arc<RwLock<BTreeMap<String, Arc<dyn HealthProvider>>>>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_provider<S: Into<String>>(
        &self,
        name: S,
        provider: Arc<dyn HealthProvider>,
    ) {
        self.providers.write().await.insert(name.into(), provider);
    }

    /// Run every registered check. A provider error counts as unhealthy.
    pub async fn check_all(&self) -> BTreeMap<String, HealthCheck> {
        let providers = self.providers.read().await;
        let mut results = BTreeMap::new();

        for (name, provider) in providers.iter() {
            let check = match provider.health_check().await {
                Ok(check) => check,
                Err(e) => {
                    HealthCheck::unhealthy(name.clone(), format!("Health check failed: {}", e))
                }
            };
            results.insert(name.clone(), check);
        }

        results
    }

    /// Alive only if at least one provider is registered and none is unhealthy
    pub async fn is_alive(&self) -> bool {
        let checks = self.check_all().await;
        !checks.is_empty() && checks.values().all(|check| check.status.is_operational())
    }
}

/// Storage liveness check
pub struct DatabaseHealthProvider {
    db_pool: crate::storage::DbPool,
}

impl DatabaseHealthProvider {
    pub fn new(db_pool: crate::storage::DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl HealthProvider for DatabaseHealthProvider {
    async fn health_check(&self) -> Result<HealthCheck> {
        let start = std::time::Instant::now();

        match crate::storage::check_connection(&self.db_pool).await {
            Ok(()) => Ok(HealthCheck::healthy("storage")
                .with_metadata("storage_name", "sqlite")
                .with_metadata("response_time_ms", start.elapsed().as_millis().to_string())
                .with_metadata("connections", self.db_pool.size().to_string())),
            Err(e) => Ok(HealthCheck::unhealthy("storage", e.to_string())),
        }
    }
}
