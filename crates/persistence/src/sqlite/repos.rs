//! Repository implementations for SQLite
//!
//! Query helpers for the accounts, ledger_entries and sessions tables.
//! Functions that must run inside a transaction take any sqlx executor, so
//! callers pass `&mut *tx` from an open `sqlx::Transaction` or a plain pool.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use crate::StoreConfig;
use chrono::{DateTime, Utc};
use kodbank_core::{Account, LedgerEntry, Money, PageRequest, Session};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::str::FromStr;

// ============================================================================
// Account Repository
// ============================================================================

/// Repository for the accounts table
pub struct AccountRepo;

impl AccountRepo {
    /// Insert a new account
    pub async fn insert<'e, E>(executor: E, account: &Account) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = AccountRow::from(account);
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, credential_hash, phone, balance_cents, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.username)
        .bind(&row.email)
        .bind(&row.credential_hash)
        .bind(&row.phone)
        .bind(row.balance_cents)
        .bind(&row.role)
        .bind(row.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Get account by ID
    pub async fn get_by_id<'e, E>(executor: E, id: &str) -> PersistenceResult<Option<Account>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    /// Get account by username (case-insensitive)
    pub async fn get_by_username<'e, E>(
        executor: E,
        username: &str,
    ) -> PersistenceResult<Option<Account>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE username = ? LIMIT 1")
            .bind(username)
            .fetch_optional(executor)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    /// Whether a username or email is already registered
    pub async fn exists_username_or_email<'e, E>(
        executor: E,
        username: &str,
        email: &str,
    ) -> PersistenceResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM accounts WHERE username = ? OR email = ? LIMIT 1",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(executor)
        .await?;
        Ok(found.is_some())
    }

    /// Current balance, read without locking
    pub async fn balance<'e, E>(executor: E, id: &str) -> PersistenceResult<Option<Money>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let cents = sqlx::query_scalar::<_, i64>("SELECT balance_cents FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(cents.map(Money::from_cents))
    }

    /// Take the write lock on an account row and read its balance under it.
    ///
    /// SQLite has no `SELECT ... FOR UPDATE`; a no-op UPDATE is the first
    /// write of the transaction, which acquires the store's write lock before
    /// the balance is returned. Concurrent callers wait here (bounded by the
    /// connection busy timeout) until the holder commits or rolls back.
    ///
    /// Must be the first statement of the enclosing transaction.
    pub async fn lock_balance<'e, E>(executor: E, id: &str) -> PersistenceResult<Option<Money>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let cents = sqlx::query_scalar::<_, i64>(
            "UPDATE accounts SET balance_cents = balance_cents WHERE id = ? RETURNING balance_cents",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(cents.map(Money::from_cents))
    }

    /// Atomic `balance = balance - amount`
    pub async fn debit<'e, E>(executor: E, id: &str, amount: Money) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE accounts SET balance_cents = balance_cents - ? WHERE id = ?")
            .bind(amount.cents())
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Account", id));
        }
        Ok(())
    }

    /// Atomic `balance = balance + amount`
    pub async fn credit<'e, E>(executor: E, id: &str, amount: Money) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE accounts SET balance_cents = balance_cents + ? WHERE id = ?")
            .bind(amount.cents())
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Account", id));
        }
        Ok(())
    }

    /// Count accounts
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Ledger Repository
// ============================================================================

/// Repository for the ledger_entries table (append-only)
pub struct LedgerRepo;

impl LedgerRepo {
    /// Append a ledger entry
    pub async fn insert<'e, E>(executor: E, entry: &LedgerEntry) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = LedgerEntryRow::from(entry);
        sqlx::query(
            r#"
            INSERT INTO ledger_entries
                (id, transfer_id, account_id, kind, amount_cents, description, counterparty_username, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.transfer_id)
        .bind(&row.account_id)
        .bind(&row.kind)
        .bind(row.amount_cents)
        .bind(&row.description)
        .bind(&row.counterparty_username)
        .bind(&row.status)
        .bind(row.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// One page of an account's entries, newest first
    pub async fn list_by_account(
        pool: &SqlitePool,
        account_id: &str,
        page: PageRequest,
    ) -> PersistenceResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            SELECT * FROM ledger_entries
            WHERE account_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(account_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    /// Count an account's entries
    pub async fn count_by_account(pool: &SqlitePool, account_id: &str) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ledger_entries WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Both legs of one transfer
    pub async fn get_by_transfer(
        pool: &SqlitePool,
        transfer_id: &str,
    ) -> PersistenceResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            "SELECT * FROM ledger_entries WHERE transfer_id = ? ORDER BY kind DESC",
        )
        .bind(transfer_id)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    /// Count all entries
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ledger_entries")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Session Repository
// ============================================================================

/// Repository for the sessions table
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a session row
    pub async fn insert<'e, E>(executor: E, session: &Session) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = SessionRow::from(session);
        sqlx::query(
            "INSERT INTO sessions (id, account_id, token, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.account_id)
        .bind(&row.token)
        .bind(row.expires_at)
        .bind(row.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Delete every session of an account, returns rows removed
    pub async fn delete_for_account<'e, E>(executor: E, account_id: &str) -> PersistenceResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM sessions WHERE account_id = ?")
            .bind(account_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete one session by account and exact token
    pub async fn delete_one<'e, E>(executor: E, account_id: &str, token: &str) -> PersistenceResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM sessions WHERE account_id = ? AND token = ?")
            .bind(account_id)
            .bind(token)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Find the session matching account and exact token, not expired at `now`
    pub async fn find_live(
        pool: &SqlitePool,
        account_id: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> PersistenceResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT * FROM sessions
            WHERE account_id = ? AND token = ? AND expires_at > ?
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .bind(token)
        .bind(now)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(Session::from))
    }

    /// Delete every session that expired at or before `cutoff`
    pub async fn delete_expired(pool: &SqlitePool, cutoff: DateTime<Utc>) -> PersistenceResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count the session rows of an account, expired or not
    pub async fn count_for_account(pool: &SqlitePool, account_id: &str) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Count all session rows
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Database initialization
// ============================================================================

/// Create the connection pool.
///
/// WAL journal, foreign keys on, and the busy timeout set to the configured
/// lock timeout so that a transfer waiting on another transfer's lock fails
/// with SQLITE_BUSY instead of waiting forever.
pub async fn create_pool(config: &StoreConfig) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(config.lock_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Run migrations
pub async fn run_migrations(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Create pool and bring the schema up to date
pub async fn init_database(config: &StoreConfig) -> PersistenceResult<SqlitePool> {
    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
