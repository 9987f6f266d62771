//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables.
//! The schema itself lives in `migrations/20261018000000_init.sql`.

use crate::error::{PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use kodbank_core::{Account, EntryKind, EntryStatus, LedgerEntry, Money, Role, Session};

/// Row type for the `accounts` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub credential_hash: String,
    pub phone: String,
    pub balance_cents: i64,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `ledger_entries` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerEntryRow {
    pub id: String,
    pub transfer_id: String,
    pub account_id: String,
    pub kind: String,
    pub amount_cents: i64,
    pub description: String,
    pub counterparty_username: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `sessions` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub id: String,
    pub account_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// === Conversion implementations ===

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            credential_hash: account.credential_hash.clone(),
            phone: account.phone.clone(),
            balance_cents: account.balance.cents(),
            role: account.role.as_str().to_string(),
            created_at: account.created_at,
        }
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = PersistenceError;

    fn try_from(row: AccountRow) -> PersistenceResult<Self> {
        let role = Role::from_str(&row.role)
            .ok_or_else(|| PersistenceError::invalid_enum("accounts.role", &row.role))?;
        Ok(Self {
            id: row.id,
            username: row.username,
            email: row.email,
            phone: row.phone,
            credential_hash: row.credential_hash,
            balance: Money::from_cents(row.balance_cents),
            role,
            created_at: row.created_at,
        })
    }
}

impl From<&LedgerEntry> for LedgerEntryRow {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.clone(),
            transfer_id: entry.transfer_id.clone(),
            account_id: entry.account_id.clone(),
            kind: entry.kind.as_str().to_string(),
            amount_cents: entry.amount.cents(),
            description: entry.description.clone(),
            counterparty_username: entry.counterparty_username.clone(),
            status: entry.status.as_str().to_string(),
            created_at: entry.created_at,
        }
    }
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = PersistenceError;

    fn try_from(row: LedgerEntryRow) -> PersistenceResult<Self> {
        let kind = EntryKind::from_str(&row.kind)
            .ok_or_else(|| PersistenceError::invalid_enum("ledger_entries.kind", &row.kind))?;
        let status = EntryStatus::from_str(&row.status)
            .ok_or_else(|| PersistenceError::invalid_enum("ledger_entries.status", &row.status))?;
        Ok(Self {
            id: row.id,
            transfer_id: row.transfer_id,
            account_id: row.account_id,
            kind,
            amount: Money::from_cents(row.amount_cents),
            description: row.description,
            counterparty_username: row.counterparty_username,
            status,
            created_at: row.created_at,
        })
    }
}

impl From<&Session> for SessionRow {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            account_id: session.account_id.clone(),
            token: session.token.clone(),
            expires_at: session.expires_at,
            created_at: session.created_at,
        }
    }
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            account_id: row.account_id,
            token: row.token,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}
