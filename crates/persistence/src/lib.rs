//! # Kodbank Persistence
//!
//! Persistence layer for Kodbank - SQLite account, ledger and session stores.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Database                            │
//! │  ┌──────────────┐   ┌─────────────────┐   ┌───────────────┐  │
//! │  │   accounts   │   │ ledger_entries  │   │   sessions    │  │
//! │  │ (AccountRepo)│   │  (LedgerRepo)   │   │ (SessionRepo) │  │
//! │  └──────────────┘   └─────────────────┘   └───────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kodbank_persistence::{Database, StoreConfig};
//!
//! let db = Database::connect(&StoreConfig::new("sqlite:data/kodbank.db")).await?;
//! db.health_check().await?;
//!
//! let balance = AccountRepo::balance(db.pool(), &account_id).await?;
//!
//! db.close().await;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::schema::{AccountRow, LedgerEntryRow, SessionRow};
pub use sqlite::{create_pool, init_database, run_migrations, AccountRepo, LedgerRepo, SessionRepo};

use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite URL, e.g. `sqlite:data/kodbank.db`
    pub database_url: String,
    pub max_connections: u32,
    /// How long a statement waits on a held write lock before failing
    pub lock_timeout: Duration,
    /// How long a caller waits for a free pooled connection
    pub acquire_timeout: Duration,
}

impl StoreConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Config for a database file at `path`
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        Self::new(format!("sqlite:{}", path.as_ref().display()))
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }
}

/// Database facade - the process-wide connection pool.
///
/// Acquired once at startup with [`Database::connect`], checked with
/// [`Database::health_check`], released with [`Database::close`]. Cloning is
/// cheap (the pool is reference counted), so the same handle is passed into
/// every service that needs the store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the pool and apply migrations
    pub async fn connect(config: &StoreConfig) -> PersistenceResult<Self> {
        let pool = init_database(config).await?;
        info!(
            url = %config.database_url,
            max_connections = config.max_connections,
            "database connected"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool (migrations are the caller's business)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial query through the pool
    pub async fn health_check(&self) -> PersistenceResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        debug!("database health check passed");
        Ok(())
    }

    /// Close every pooled connection; further use fails
    pub async fn close(&self) {
        self.pool.close().await;
        info!("database closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
