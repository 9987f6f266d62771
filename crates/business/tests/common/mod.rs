//! Shared fixtures for the business integration tests
#![allow(dead_code)]

use chrono::Utc;
use kodbank_business::{ServiceContext, SessionConfig};
use kodbank_core::{Account, Identity, Money, Role};
use kodbank_persistence::{AccountRepo, Database, StoreConfig};
use std::time::Duration;
use tempfile::TempDir;

pub const SECRET: &[u8] = b"integration-test-secret";

/// Fresh database in a temp dir; keep the `TempDir` alive for the test
pub async fn test_context() -> (TempDir, ServiceContext) {
    test_context_with_lock_timeout(Duration::from_secs(30)).await
}

/// Same as [`test_context`], with a custom wait for the write lock
pub async fn test_context_with_lock_timeout(lock_timeout: Duration) -> (TempDir, ServiceContext) {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::for_path(dir.path().join("kodbank.db"))
        .with_max_connections(16)
        .with_lock_timeout(lock_timeout);
    let db = Database::connect(&config).await.unwrap();
    let ctx = ServiceContext::new(db, &SessionConfig::new(SECRET)).unwrap();
    (dir, ctx)
}

/// Insert an account directly, skipping password hashing
pub async fn seed_account(db: &Database, username: &str, balance: Money) -> Identity {
    let account = Account {
        id: Account::generate_id(),
        username: username.to_string(),
        email: format!("{}@example.com", username.to_lowercase()),
        phone: "5550001".to_string(),
        credential_hash: "unused".to_string(),
        balance,
        role: Role::Customer,
        created_at: Utc::now(),
    };
    AccountRepo::insert(db.pool(), &account).await.unwrap();

    Identity {
        account_id: account.id,
        username: account.username,
        role: account.role,
    }
}

pub fn money(units: i64) -> Money {
    Money::from_cents(units * 100)
}
