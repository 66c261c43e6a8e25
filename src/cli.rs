//! # Command Line Interface
//!
//! Operator commands for the certificate store: schema management, lookups,
//! status index inspection and repair, and a storage health check. Command
//! output is JSON on stdout; logs go to stderr.

use crate::config::AppConfig;
use crate::domain::{normalize_domain, CertType};
use crate::observability::{
    init_observability, log_config_info, DatabaseHealthProvider, HealthChecker,
};
use crate::services::{CertificateFilter, CertificateService};
use crate::storage::{
    create_pool, get_migration_version, list_applied_migrations, run_migrations, DbPool,
    MigrationInfo,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "certplane")]
#[command(about = "Certificate record store and status tracker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL override
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply pending schema migrations
    Migrate {
        /// List applied migrations instead of applying
        #[arg(long)]
        list: bool,
    },

    /// Show the certificate stored for a domain
    Get {
        /// Domain name
        domain: String,

        /// Only match a certificate owned by this project
        #[arg(long)]
        project_id: Option<String>,

        /// Only match a certificate with this flavor
        #[arg(long)]
        flavor_id: Option<String>,

        /// Only match a certificate of this type (san, sni, custom, dedicated)
        #[arg(long)]
        cert_type: Option<String>,
    },

    /// List domains whose certificate is in a status
    ListByStatus {
        /// Status value, e.g. create_in_progress
        status: String,
    },

    /// Recompute a certificate's status from its stored provider details
    RefreshStatus {
        /// Domain name
        domain: String,
    },

    /// Check storage connectivity
    Health,
}

/// Run CLI commands
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }

    init_observability(&config.observability)?;
    log_config_info(&config);

    // Migrations are applied explicitly by the migrate command
    if matches!(cli.command, Commands::Migrate { .. }) {
        config.database.auto_migrate = false;
    }

    let pool = create_pool(&config.database).await.context("Failed to open the certificate store")?;

    match cli.command {
        Commands::Migrate { list } => handle_migrate(&pool, list).await?,
        Commands::Get { domain, project_id, flavor_id, cert_type } => {
            let mut filter = CertificateFilter { project_id, flavor_id, cert_type: None };
            if let Some(cert_type) = cert_type {
                filter.cert_type = Some(cert_type.parse::<CertType>()?);
            }

            let service = CertificateService::from_pool(pool.clone());
            let certificate = service.get_by_domain(&domain, &filter).await?;
            print_json(&certificate)?;
        }
        Commands::ListByStatus { status } => {
            let service = CertificateService::from_pool(pool.clone());
            let domains = service.list_by_status(&status).await?;
            print_json(&json!({ "status": status, "domains": domains }))?;
        }
        Commands::RefreshStatus { domain } => {
            let service = CertificateService::from_pool(pool.clone());
            let status = service.refresh_status(&domain).await?;
            print_json(&json!({ "domain_name": normalize_domain(&domain), "status": status }))?;
        }
        Commands::Health => handle_health(&pool).await?,
    }

    pool.close().await;
    Ok(())
}

async fn handle_migrate(pool: &DbPool, list: bool) -> Result<()> {
    if !list {
        run_migrations(pool).await.context("Failed to apply migrations")?;
    }

    let migrations = list_applied_migrations(pool).await?;
    let version = get_migration_version(pool).await?;

    print_json(&json!({
        "version": version,
        "applied": migrations.iter().map(migration_summary).collect::<Vec<_>>(),
    }))
}

fn migration_summary(migration: &MigrationInfo) -> serde_json::Value {
    json!({
        "version": migration.version,
        "description": migration.description,
        "installed_on": migration.installed_on,
        "execution_time_ms": migration.execution_time,
    })
}

async fn handle_health(pool: &DbPool) -> Result<()> {
    let checker = HealthChecker::new();
    checker.register_provider("storage", Arc::new(DatabaseHealthProvider::new(pool.clone()))).await;

    let checks = checker.check_all().await;
    let alive = !checks.is_empty() && checks.values().all(|check| check.status.is_operational());

    print_json(&json!({ "alive": alive, "checks": checks }))?;

    if !alive {
        anyhow::bail!("Certificate store is not healthy");
    }
    Ok(())
}

/// Print data as pretty JSON
fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}
