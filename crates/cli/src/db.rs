//! Database connection, initialization and status

use anyhow::{Context, Result};
use kodbank_business::{ServiceContext, SessionConfig};
use kodbank_persistence::{AccountRepo, Database, LedgerRepo, SessionRepo, StoreConfig};
use std::path::PathBuf;
use std::time::Duration;

use crate::Cli;

/// Store settings from the command line
pub fn store_config(cli: &Cli) -> StoreConfig {
    StoreConfig::new(&cli.database_url)
        .with_max_connections(cli.max_connections)
        .with_lock_timeout(Duration::from_secs(cli.lock_timeout))
}

/// File behind a `sqlite:` URL, if it names one
fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Open the pool, creating the data directory and applying migrations
pub async fn connect(cli: &Cli) -> Result<Database> {
    if let Some(parent) = sqlite_file_path(&cli.database_url).and_then(|p| p.parent().map(PathBuf::from)) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(&parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }
    }

    let db = Database::connect(&store_config(cli))
        .await
        .context("Failed to connect to database")?;
    Ok(db)
}

/// Connect and build the services; needs the signing secret
pub async fn services(cli: &Cli) -> Result<ServiceContext> {
    let secret = cli
        .jwt_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .context("A signing secret is required: pass --jwt-secret or set KODBANK_JWT_SECRET")?;

    let db = connect(cli).await?;
    let config = SessionConfig::new(secret).with_default_ttl(cli.session_ttl);
    let ctx = ServiceContext::new(db, &config).context("Invalid session configuration")?;
    Ok(ctx)
}

/// Create the database with schema
pub async fn init_database(cli: &Cli) -> Result<()> {
    println!("📦 Applying migrations...");
    let db = connect(cli).await?;
    db.health_check().await.context("Database health check failed")?;
    db.close().await;

    println!("✅ Database initialized at {}", cli.database_url);
    Ok(())
}

/// Show database status
pub async fn show_status(cli: &Cli) -> Result<()> {
    if let Some(path) = sqlite_file_path(&cli.database_url) {
        if !path.exists() {
            println!("❌ Database not found at {:?}", path);
            println!("   Run 'kodbank init' to create the database");
            return Ok(());
        }
    }

    let db = connect(cli).await?;
    let pool = db.pool();

    let accounts = AccountRepo::count(pool).await?;
    let entries = LedgerRepo::count(pool).await?;
    let sessions = SessionRepo::count(pool).await?;

    println!("📊 Database Status");
    println!("   URL: {}", cli.database_url);
    println!();
    println!("   Accounts:       {}", accounts);
    println!("   Ledger entries: {}", entries);
    println!("   Sessions:       {}", sessions);

    db.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(sqlite_file_path("sqlite:data/kodbank.db"), Some(PathBuf::from("data/kodbank.db")));
        assert_eq!(
            sqlite_file_path("sqlite://data/kodbank.db?mode=rwc"),
            Some(PathBuf::from("data/kodbank.db"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
    }
}
