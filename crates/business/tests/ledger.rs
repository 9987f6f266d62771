//! Integration tests for the Ledger Engine
//!
//! Transfers against a real SQLite file: conservation of money, paired
//! entries, rejection paths that must leave no trace, and concurrent
//! transfers racing on one sender.

mod common;

use common::{money, seed_account, test_context, test_context_with_lock_timeout};
use kodbank_business::{ErrorKind, LedgerError};
use kodbank_core::{CoreError, EntryKind, Money};
use kodbank_persistence::{AccountRepo, LedgerRepo};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

/// Test: rent payment moves 2500 from alice to bob
#[tokio::test]
async fn test_transfer_rent() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(10_000)).await;
    let bob = seed_account(ctx.db(), "bob", money(10_000)).await;
    let ledger = ctx.ledger();

    let receipt = ledger
        .transfer(&alice, "bob", dec!(2500), Some("rent"))
        .await
        .unwrap();
    assert_eq!(receipt.new_balance, money(7_500));
    assert_eq!(receipt.amount, money(2_500));
    assert_eq!(receipt.recipient_username, "bob");

    assert_eq!(ledger.get_balance(&alice.account_id).await.unwrap(), money(7_500));
    assert_eq!(ledger.get_balance(&bob.account_id).await.unwrap(), money(12_500));

    // Both legs share one transfer id
    let legs = LedgerRepo::get_by_transfer(ctx.db().pool(), &receipt.transfer_id)
        .await
        .unwrap();
    assert_eq!(legs.len(), 2);
    assert!(legs.iter().all(|e| e.amount == money(2_500)));
    assert_eq!(legs[0].created_at, legs[1].created_at);

    let alice_history = ledger.list_transactions(&alice.account_id, None, None).await.unwrap();
    assert_eq!(alice_history.total, 1);
    let debit = &alice_history.entries[0];
    assert_eq!(debit.kind, EntryKind::Debit);
    assert_eq!(debit.description, "rent");
    assert_eq!(debit.counterparty_username.as_deref(), Some("bob"));

    let bob_history = ledger.list_transactions(&bob.account_id, None, None).await.unwrap();
    let credit = &bob_history.entries[0];
    assert_eq!(credit.kind, EntryKind::Credit);
    assert_eq!(credit.description, "Received from alice");
    assert_eq!(credit.counterparty_username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_default_description() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(100)).await;
    seed_account(ctx.db(), "bob", money(0)).await;

    ctx.ledger().transfer(&alice, "bob", dec!(1), None).await.unwrap();
    ctx.ledger().transfer(&alice, "bob", dec!(1), Some("   ")).await.unwrap();

    let page = ctx.ledger().list_transactions(&alice.account_id, None, None).await.unwrap();
    assert!(page.entries.iter().all(|e| e.description == "Transfer"));
}

#[tokio::test]
async fn test_cent_amounts_are_exact() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(11)).await;
    let bob = seed_account(ctx.db(), "bob", money(0)).await;

    for _ in 0..10 {
        ctx.ledger().transfer(&alice, "bob", dec!(1.10), None).await.unwrap();
    }
    assert_eq!(ctx.ledger().get_balance(&alice.account_id).await.unwrap(), Money::ZERO);
    assert_eq!(ctx.ledger().get_balance(&bob.account_id).await.unwrap(), money(11));
}

/// Test: out-of-range amounts are rejected before any write
#[tokio::test]
async fn test_amount_out_of_range_writes_nothing() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(10_000)).await;
    seed_account(ctx.db(), "bob", money(10_000)).await;

    for amount in [dec!(999999999), dec!(0), dec!(-5), dec!(0.5), dec!(1000000.01), dec!(10.001)] {
        let err = ctx.ledger().transfer(&alice, "bob", amount, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "amount {amount}");
    }

    // Bounds are inclusive
    ctx.ledger().transfer(&alice, "bob", dec!(1), None).await.unwrap();

    assert_eq!(LedgerRepo::count(ctx.db().pool()).await.unwrap(), 2);
    assert_eq!(
        ctx.ledger().get_balance(&alice.account_id).await.unwrap(),
        money(9_999)
    );
}

#[tokio::test]
async fn test_description_too_long() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(100)).await;
    seed_account(ctx.db(), "bob", money(0)).await;

    let long = "x".repeat(256);
    let err = ctx
        .ledger()
        .transfer(&alice, "bob", dec!(1), Some(&long))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(CoreError::DescriptionTooLong { len: 256, max: 255 })
    ));

    let exact = "x".repeat(255);
    ctx.ledger().transfer(&alice, "bob", dec!(1), Some(&exact)).await.unwrap();
}

#[tokio::test]
async fn test_self_transfer_rejected() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(100)).await;

    for name in ["alice", "ALICE", " Alice "] {
        let err = ctx.ledger().transfer(&alice, name, dec!(10), None).await.unwrap_err();
        assert!(
            matches!(err, LedgerError::Validation(CoreError::SelfTransfer)),
            "{name}: {err:?}"
        );
    }

    assert_eq!(LedgerRepo::count(ctx.db().pool()).await.unwrap(), 0);
    assert_eq!(ctx.ledger().get_balance(&alice.account_id).await.unwrap(), money(100));
}

#[tokio::test]
async fn test_insufficient_funds() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(100)).await;
    let bob = seed_account(ctx.db(), "bob", money(0)).await;

    let err = ctx.ledger().transfer(&alice, "bob", dec!(100.01), None).await.unwrap_err();
    match err {
        LedgerError::InsufficientFunds { requested, available } => {
            assert_eq!(requested, Money::from_cents(10_001));
            assert_eq!(available, money(100));
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }

    assert_eq!(LedgerRepo::count(ctx.db().pool()).await.unwrap(), 0);
    assert_eq!(ctx.ledger().get_balance(&bob.account_id).await.unwrap(), Money::ZERO);

    // Exactly the whole balance is allowed and leaves zero
    ctx.ledger().transfer(&alice, "bob", dec!(100), None).await.unwrap();
    assert_eq!(ctx.ledger().get_balance(&alice.account_id).await.unwrap(), Money::ZERO);
}

#[tokio::test]
async fn test_recipient_not_found() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(100)).await;

    let err = ctx.ledger().transfer(&alice, "ghost", dec!(10), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecipientNotFound);
    assert!(matches!(err, LedgerError::RecipientNotFound(ref name) if name == "ghost"));

    assert_eq!(LedgerRepo::count(ctx.db().pool()).await.unwrap(), 0);
    assert_eq!(ctx.ledger().get_balance(&alice.account_id).await.unwrap(), money(100));
}

#[tokio::test]
async fn test_recipient_lookup_ignores_case() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(100)).await;
    let bob = seed_account(ctx.db(), "Bob", money(0)).await;

    let receipt = ctx.ledger().transfer(&alice, "bOB", dec!(10), None).await.unwrap();
    assert_eq!(receipt.recipient_username, "Bob");
    assert_eq!(ctx.ledger().get_balance(&bob.account_id).await.unwrap(), money(10));

    let page = ctx.ledger().list_transactions(&alice.account_id, None, None).await.unwrap();
    assert_eq!(page.entries[0].counterparty_username.as_deref(), Some("Bob"));
}

#[tokio::test]
async fn test_unknown_sender() {
    let (_dir, ctx) = test_context().await;
    seed_account(ctx.db(), "bob", money(0)).await;
    let mut ghost = seed_account(ctx.db(), "ghost", money(0)).await;
    ghost.account_id = "no-such-account".to_string();

    let err = ctx.ledger().transfer(&ghost, "bob", dec!(1), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccountNotFound);

    let err = ctx.ledger().get_balance("no-such-account").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccountNotFound);
}

/// Test: a sender locked past the store timeout fails cleanly and can retry
#[tokio::test]
async fn test_lock_timeout_rolls_back_and_is_retryable() {
    let (_dir, ctx) = test_context_with_lock_timeout(Duration::from_millis(300)).await;
    let alice = seed_account(ctx.db(), "alice", money(100)).await;
    let bob = seed_account(ctx.db(), "bob", money(0)).await;

    // Another writer holds alice's row
    let mut holder = ctx.db().pool().begin().await.unwrap();
    let held = AccountRepo::lock_balance(&mut *holder, &alice.account_id).await.unwrap();
    assert_eq!(held, Some(money(100)));

    let err = ctx.ledger().transfer(&alice, "bob", dec!(10), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockTimeout);
    assert!(err.is_retryable());

    holder.rollback().await.unwrap();

    assert_eq!(LedgerRepo::count(ctx.db().pool()).await.unwrap(), 0);
    assert_eq!(ctx.ledger().get_balance(&alice.account_id).await.unwrap(), money(100));
    assert_eq!(ctx.ledger().get_balance(&bob.account_id).await.unwrap(), Money::ZERO);

    // Once the lock is released the same transfer goes through
    ctx.ledger().transfer(&alice, "bob", dec!(10), None).await.unwrap();
    assert_eq!(ctx.ledger().get_balance(&alice.account_id).await.unwrap(), money(90));
    assert_eq!(LedgerRepo::count(ctx.db().pool()).await.unwrap(), 2);
}

/// Test: ten concurrent 2000 transfers from a 10000 balance
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_never_overdraw() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(10_000)).await;
    let bob = seed_account(ctx.db(), "bob", money(0)).await;
    let alice = Arc::new(alice);

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let ledger = ctx.ledger().clone();
        let alice = Arc::clone(&alice);
        tasks.push(tokio::spawn(async move {
            ledger.transfer(&alice, "bob", dec!(2000), None).await
        }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::InsufficientFunds, "{err:?}");
                insufficient += 1;
            }
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(insufficient, 5);
    assert_eq!(ctx.ledger().get_balance(&alice.account_id).await.unwrap(), Money::ZERO);
    assert_eq!(ctx.ledger().get_balance(&bob.account_id).await.unwrap(), money(10_000));
    assert_eq!(LedgerRepo::count(ctx.db().pool()).await.unwrap(), 10);
}

/// Test: reciprocal transfers in both directions conserve the total
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reciprocal_transfers_conserve_total() {
    let (_dir, ctx) = test_context().await;
    let alice = Arc::new(seed_account(ctx.db(), "alice", money(1_000)).await);
    let bob = Arc::new(seed_account(ctx.db(), "bob", money(1_000)).await);
    let carol = Arc::new(seed_account(ctx.db(), "carol", money(1_000)).await);

    let mut tasks = Vec::new();
    for i in 0..30 {
        let ledger = ctx.ledger().clone();
        let (from, to) = match i % 3 {
            0 => (Arc::clone(&alice), "bob"),
            1 => (Arc::clone(&bob), "carol"),
            _ => (Arc::clone(&carol), "alice"),
        };
        let amount = Decimal::new(1_000 + i * 137, 2);
        tasks.push(tokio::spawn(async move {
            ledger.transfer(&from, to, amount, None).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut total = Money::ZERO;
    for id in [&alice.account_id, &bob.account_id, &carol.account_id] {
        let balance = ctx.ledger().get_balance(id).await.unwrap();
        assert!(!balance.is_negative());
        total = total.checked_add(balance).unwrap();
    }
    assert_eq!(total, money(3_000));
    assert_eq!(LedgerRepo::count(ctx.db().pool()).await.unwrap(), 60);
}

#[tokio::test]
async fn test_history_paging() {
    let (_dir, ctx) = test_context().await;
    let alice = seed_account(ctx.db(), "alice", money(1_000)).await;
    seed_account(ctx.db(), "bob", money(0)).await;

    for i in 1..=25 {
        ctx.ledger()
            .transfer(&alice, "bob", Decimal::from(i), Some(&format!("payment {i}")))
            .await
            .unwrap();
    }

    let ledger = ctx.ledger();
    let first = ledger.list_transactions(&alice.account_id, None, None).await.unwrap();
    assert_eq!(first.total, 25);
    assert_eq!(first.limit, 20);
    assert_eq!(first.entries.len(), 20);
    // Newest first
    assert_eq!(first.entries[0].description, "payment 25");
    assert_eq!(first.entries[19].description, "payment 6");

    let rest = ledger.list_transactions(&alice.account_id, Some(20), Some(20)).await.unwrap();
    assert_eq!(rest.entries.len(), 5);
    assert_eq!(rest.entries[4].description, "payment 1");

    let clamped = ledger.list_transactions(&alice.account_id, Some(500), Some(-3)).await.unwrap();
    assert_eq!(clamped.limit, 100);
    assert_eq!(clamped.offset, 0);
    assert_eq!(clamped.entries.len(), 25);

    let past_end = ledger.list_transactions(&alice.account_id, Some(10), Some(100)).await.unwrap();
    assert!(past_end.entries.is_empty());
    assert_eq!(past_end.total, 25);

    let none = ledger.list_transactions("nobody", None, None).await.unwrap();
    assert_eq!(none.total, 0);
}
