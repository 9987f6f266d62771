//! Ledger Engine - transfer, balance and history.
//!
//! Transfers run inside one store transaction:
//!
//! 1. lock the sender row and read its balance under the lock
//! 2. reject if the sender is missing or short of funds
//! 3. resolve the recipient username
//! 4. debit sender / credit recipient as atomic column updates
//! 5. append the debit and credit entries
//! 6. commit
//!
//! Any failure in between rolls the whole transaction back. Only the sender
//! is locked; the recipient is credited with `balance = balance + ?`, so two
//! reciprocal transfers never wait on each other's recipient row.

use crate::error::{LedgerError, LedgerResult};
use chrono::Utc;
use kodbank_core::{
    CoreError, Identity, LedgerEntry, Money, PageRequest, TransactionPage, TransferReceipt,
    TransferRequest,
};
use kodbank_persistence::{AccountRepo, Database, LedgerRepo};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Ledger Engine - the only writer of account balances
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    db: Database,
}

impl LedgerEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Move `amount` from the authenticated sender to `recipient_username`.
    ///
    /// Input is validated before the store is touched: amount in
    /// `[1, 1_000_000]`, description at most 255 characters (default
    /// `"Transfer"`), and the recipient must not be the sender.
    ///
    /// Returns the sender's balance after commit.
    pub async fn transfer(
        &self,
        sender: &Identity,
        recipient_username: &str,
        amount: Decimal,
        description: Option<&str>,
    ) -> LedgerResult<TransferReceipt> {
        let request = TransferRequest::new(recipient_username, amount, description)?;
        request.ensure_not_self(&sender.username)?;
        self.execute_transfer(&sender.account_id, &request).await
    }

    /// Run an already validated transfer request.
    pub async fn execute_transfer(
        &self,
        sender_id: &str,
        request: &TransferRequest,
    ) -> LedgerResult<TransferReceipt> {
        let mut tx = self.db.pool().begin().await?;

        match apply_transfer(&mut *tx, sender_id, request).await {
            Ok(receipt) => {
                tx.commit().await?;
                info!(
                    transfer_id = %receipt.transfer_id,
                    sender = %sender_id,
                    recipient = %request.recipient_username,
                    amount = %request.amount,
                    "transfer committed"
                );
                Ok(receipt)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(sender = %sender_id, error = %rollback_err, "transfer rollback failed");
                }
                warn!(
                    sender = %sender_id,
                    recipient = %request.recipient_username,
                    amount = %request.amount,
                    kind = %err.kind(),
                    "transfer rejected: {}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Current balance, read without locking
    pub async fn get_balance(&self, account_id: &str) -> LedgerResult<Money> {
        AccountRepo::balance(self.db.pool(), account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    /// Entries for an account, newest first, plus the total count.
    ///
    /// `limit` is clamped to `1..=100` (default 20), `offset` to `>= 0`.
    pub async fn list_transactions(
        &self,
        account_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> LedgerResult<TransactionPage> {
        let page = PageRequest::new(limit, offset);
        let entries = LedgerRepo::list_by_account(self.db.pool(), account_id, page).await?;
        let total = LedgerRepo::count_by_account(self.db.pool(), account_id).await?;

        Ok(TransactionPage {
            entries,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }
}

/// Steps 1-6 of the transfer protocol, on an open transaction.
async fn apply_transfer(
    conn: &mut SqliteConnection,
    sender_id: &str,
    request: &TransferRequest,
) -> LedgerResult<TransferReceipt> {
    let amount = request.amount;

    let available = AccountRepo::lock_balance(&mut *conn, sender_id)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(sender_id.to_string()))?;
    debug!(sender = %sender_id, balance = %available, "sender row locked");

    if available < amount {
        return Err(LedgerError::InsufficientFunds {
            requested: amount,
            available,
        });
    }

    let sender = AccountRepo::get_by_id(&mut *conn, sender_id)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(sender_id.to_string()))?;

    let recipient = AccountRepo::get_by_username(&mut *conn, &request.recipient_username)
        .await?
        .ok_or_else(|| LedgerError::RecipientNotFound(request.recipient_username.clone()))?;

    // Same account under a differently-cased username
    if recipient.id == sender_id {
        return Err(CoreError::SelfTransfer.into());
    }

    AccountRepo::debit(&mut *conn, sender_id, amount).await?;
    AccountRepo::credit(&mut *conn, &recipient.id, amount).await?;

    let transfer_id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let debit = LedgerEntry::debit(
        &transfer_id,
        sender_id,
        amount,
        &request.description,
        &recipient.username,
        now,
    );
    let credit = LedgerEntry::credit(&transfer_id, &recipient.id, amount, &sender.username, now);
    LedgerRepo::insert(&mut *conn, &debit).await?;
    LedgerRepo::insert(&mut *conn, &credit).await?;

    let new_balance = AccountRepo::balance(&mut *conn, sender_id)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(sender_id.to_string()))?;

    Ok(TransferReceipt {
        transfer_id,
        amount,
        recipient_username: recipient.username,
        new_balance,
    })
}
