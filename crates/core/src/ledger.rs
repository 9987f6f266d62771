//! # Ledger Module
//!
//! Ledger entries (one per debit/credit leg), the validated transfer request,
//! and the paging window used by history queries.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Description used when the caller supplies none
pub const DEFAULT_DESCRIPTION: &str = "Transfer";

/// Longest description accepted on a transfer
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Direction of a ledger entry relative to its account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Credit,
    Debit,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Credit => "credit",
            EntryKind::Debit => "debit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "credit" => Some(EntryKind::Credit),
            "debit" => Some(EntryKind::Debit),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement status of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Completed,
    Pending,
    Failed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Completed => "completed",
            EntryStatus::Pending => "pending",
            EntryStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "completed" => Some(EntryStatus::Completed),
            "pending" => Some(EntryStatus::Pending),
            "failed" => Some(EntryStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One leg of a money movement.
///
/// Entries are written only by the ledger engine and never change after
/// insertion. The two legs of one transfer share a `transfer_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub transfer_id: String,
    pub account_id: String,
    pub kind: EntryKind,
    pub amount: Money,
    pub description: String,
    pub counterparty_username: Option<String>,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Debit leg for the sender of a transfer
    pub fn debit(
        transfer_id: &str,
        account_id: &str,
        amount: Money,
        description: &str,
        recipient_username: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            transfer_id: transfer_id.to_string(),
            account_id: account_id.to_string(),
            kind: EntryKind::Debit,
            amount,
            description: description.to_string(),
            counterparty_username: Some(recipient_username.to_string()),
            status: EntryStatus::Completed,
            created_at,
        }
    }

    /// Credit leg for the recipient of a transfer
    pub fn credit(
        transfer_id: &str,
        account_id: &str,
        amount: Money,
        sender_username: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            transfer_id: transfer_id.to_string(),
            account_id: account_id.to_string(),
            kind: EntryKind::Credit,
            amount,
            description: format!("Received from {}", sender_username),
            counterparty_username: Some(sender_username.to_string()),
            status: EntryStatus::Completed,
            created_at,
        }
    }
}

/// A transfer request that has passed every check not needing the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub recipient_username: String,
    pub amount: Money,
    pub description: String,
}

impl TransferRequest {
    /// Validate raw transfer input.
    ///
    /// - `amount` must be within `[1, 1_000_000]` with at most two decimals
    /// - `description` is trimmed, at most 255 characters, and defaults to
    ///   `"Transfer"` when empty or absent
    pub fn new(recipient_username: &str, amount: Decimal, description: Option<&str>) -> CoreResult<Self> {
        let recipient_username = recipient_username.trim();
        if recipient_username.is_empty() {
            return Err(CoreError::MissingRecipient);
        }

        let amount = Money::from_decimal(amount)?.ensure_transfer_range()?;

        let description = description.map(str::trim).unwrap_or_default();
        let len = description.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            return Err(CoreError::DescriptionTooLong {
                len,
                max: MAX_DESCRIPTION_LEN,
            });
        }
        let description = if description.is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            description
        };

        Ok(Self {
            recipient_username: recipient_username.to_string(),
            amount,
            description: description.to_string(),
        })
    }

    /// Reject a transfer addressed to the sender's own username.
    pub fn ensure_not_self(&self, sender_username: &str) -> CoreResult<()> {
        if self.recipient_username.eq_ignore_ascii_case(sender_username) {
            return Err(CoreError::SelfTransfer);
        }
        Ok(())
    }
}

/// Outcome of a committed transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_id: String,
    pub amount: Money,
    pub recipient_username: String,
    /// Sender balance after commit
    pub new_balance: Money,
}

/// Paging window for transaction history, always within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Clamp caller input: a missing or non-positive limit becomes the
    /// default, anything above 100 becomes 100, a negative offset becomes 0.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(l) if l > 0 => l.min(Self::MAX_LIMIT),
            _ => Self::DEFAULT_LIMIT,
        };
        let offset = offset.unwrap_or(0).max(0);
        Self { limit, offset }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of an account's history, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub entries: Vec<LedgerEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
