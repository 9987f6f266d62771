//! Ledger commands - balance, transfer, history

use anyhow::{Context, Result};
use kodbank_business::{ErrorKind, LedgerError};
use kodbank_core::{EntryKind, LedgerEntry};
use rust_decimal::Decimal;

use crate::commands::session::current_identity;
use crate::db;
use crate::Cli;

pub async fn balance(cli: &Cli) -> Result<()> {
    let ctx = db::services(cli).await?;
    let identity = current_identity(&ctx, &cli.token_file).await?;
    let balance = ctx
        .ledger()
        .get_balance(&identity.account_id)
        .await
        .context("Failed to read balance")?;

    println!("💰 Balance for {}: {}", identity.username, balance);

    ctx.db().close().await;
    Ok(())
}

pub async fn transfer(
    cli: &Cli,
    recipient: &str,
    amount: Decimal,
    description: Option<&str>,
) -> Result<()> {
    let ctx = db::services(cli).await?;
    let identity = current_identity(&ctx, &cli.token_file).await?;

    let result = ctx
        .ledger()
        .transfer(&identity, recipient, amount, description)
        .await;
    ctx.db().close().await;

    let receipt = result.map_err(describe_transfer_error)?;
    println!("✅ Sent {} to {}", receipt.amount, receipt.recipient_username);
    println!("   Transfer ID: {}", receipt.transfer_id);
    println!("   New balance: {}", receipt.new_balance);
    Ok(())
}

/// Attach a user-facing hint to a failed transfer
fn describe_transfer_error(err: LedgerError) -> anyhow::Error {
    let hint = match err.kind() {
        ErrorKind::InsufficientFunds => "Not enough money for this transfer",
        ErrorKind::RecipientNotFound => "No account with that username",
        ErrorKind::LockTimeout => "The account is busy, try again",
        ErrorKind::Validation => "Transfer details are invalid",
        _ => "Transfer failed",
    };
    anyhow::Error::new(err).context(hint)
}

pub async fn history(cli: &Cli, limit: Option<i64>, offset: Option<i64>, json: bool) -> Result<()> {
    let ctx = db::services(cli).await?;
    let identity = current_identity(&ctx, &cli.token_file).await?;
    let page = ctx
        .ledger()
        .list_transactions(&identity.account_id, limit, offset)
        .await
        .context("Failed to load transactions")?;
    ctx.db().close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    println!(
        "📜 Transactions for {} ({}-{} of {})",
        identity.username,
        (page.offset + 1).min(page.total),
        page.offset + page.entries.len() as i64,
        page.total
    );
    if page.entries.is_empty() {
        println!("   (none)");
    }
    for entry in &page.entries {
        println!("   {}", format_entry(entry));
    }
    Ok(())
}

fn format_entry(entry: &LedgerEntry) -> String {
    let (sign, arrow) = match entry.kind {
        EntryKind::Debit => ("-", "→"),
        EntryKind::Credit => ("+", "←"),
    };
    format!(
        "{}  {}{:>12}  {} {:<16} {}",
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        sign,
        entry.amount.to_string(),
        arrow,
        entry.counterparty_username.as_deref().unwrap_or("-"),
        entry.description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kodbank_core::Money;

    #[test]
    fn test_format_entry() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let debit = LedgerEntry::debit("T1", "acc-1", Money::from_cents(250_000), "rent", "bob", at);
        let line = format_entry(&debit);
        assert!(line.starts_with("2026-03-01 09:30:00"));
        assert!(line.contains("-     2500.00"));
        assert!(line.contains("→ bob"));
        assert!(line.ends_with("rent"));

        let credit = LedgerEntry::credit("T1", "acc-2", Money::from_cents(250_000), "alice", at);
        assert!(format_entry(&credit).contains("← alice"));
    }

    #[test]
    fn test_transfer_error_hint() {
        let err = describe_transfer_error(LedgerError::RecipientNotFound("ghost".to_string()));
        assert_eq!(err.to_string(), "No account with that username");
        assert!(format!("{:#}", err).contains("ghost"));
    }
}
