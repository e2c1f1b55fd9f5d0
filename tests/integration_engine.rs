//! Mutation engine integration tests
//!
//! Exercise the handlers directly against a real database: balance
//! arithmetic, check ordering, transfer atomicity and concurrent commits.

use serde_json::json;

use cubank::domain::DomainError;
use cubank::handlers::{MutateCommand, MutationHandler, RegisterCommand, RegisterHandler};
use cubank::store::AccountStore;
use cubank::{AppError, EntryKind};

mod common;

async fn register(db: &common::TestDb, name: &str, account_id: &str) -> uuid::Uuid {
    let handler = RegisterHandler::new(db.pool.clone(), &db.config);
    let result = handler
        .handle(RegisterCommand::new(
            name.to_string(),
            account_id.to_string(),
            "1234".to_string(),
        ))
        .await
        .expect("registration failed");
    result.account.id
}

#[tokio::test]
async fn test_deposit_appends_entry_and_updates_balance() {
    let db = common::setup_test_db().await;
    let id = register(&db, "Alice", "1000000001").await;
    let engine = MutationHandler::new(db.pool.clone());

    let result = engine
        .handle(id, MutateCommand::new("deposit", json!(500)))
        .await
        .unwrap();

    assert_eq!(result.account.balance, 500);
    assert_eq!(result.ledger.len(), 1);
    assert_eq!(result.ledger[0].kind, EntryKind::Deposit);
    assert_eq!(result.ledger[0].amount, 500);
    assert_eq!(result.ledger[0].resulting_balance, 500);
}

#[tokio::test]
async fn test_withdraw_and_bill_payment_debit_balance() {
    let db = common::setup_test_db().await;
    let id = register(&db, "Alice", "1000000001").await;
    let engine = MutationHandler::new(db.pool.clone());

    engine
        .handle(id, MutateCommand::new("deposit", json!(1000)))
        .await
        .unwrap();
    let after_withdraw = engine
        .handle(id, MutateCommand::new("withdraw", json!(300)))
        .await
        .unwrap();
    assert_eq!(after_withdraw.account.balance, 700);

    let after_bill = engine
        .handle(
            id,
            MutateCommand::new("billpayment", json!(200)).with_target("electric co"),
        )
        .await
        .unwrap();
    assert_eq!(after_bill.account.balance, 500);

    let kinds: Vec<EntryKind> = after_bill.ledger.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EntryKind::Deposit, EntryKind::Withdraw, EntryKind::BillPayment]
    );
    assert_eq!(after_bill.ledger[2].counterparty, "electric co");
}

#[tokio::test]
async fn test_insufficient_withdrawal_leaves_state_untouched() {
    let db = common::setup_test_db().await;
    let id = register(&db, "Alice", "1000000001").await;
    let engine = MutationHandler::new(db.pool.clone());

    engine
        .handle(id, MutateCommand::new("deposit", json!(100)))
        .await
        .unwrap();

    let err = engine
        .handle(id, MutateCommand::new("withdraw", json!(101)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::InsufficientFunds(_))
    ));

    let store = AccountStore::new(db.pool.clone());
    let account = store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(account.balance, 100);
    assert_eq!(store.ledger(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_transfer_moves_funds_and_writes_both_ledgers() {
    let db = common::setup_test_db().await;
    let alice = register(&db, "Alice", "1000000001").await;
    let bob = register(&db, "Bob", "2000000002").await;
    let engine = MutationHandler::new(db.pool.clone());

    engine
        .handle(alice, MutateCommand::new("deposit", json!(1000)))
        .await
        .unwrap();

    let result = engine
        .handle(
            alice,
            MutateCommand::new("transfer", json!(300)).with_target("2000000002"),
        )
        .await
        .unwrap();
    assert_eq!(result.account.balance, 700);

    let out = &result.ledger[1];
    assert_eq!(out.kind, EntryKind::TransferOut);
    assert_eq!(out.counterparty, "2000000002");
    assert_eq!(out.resulting_balance, 700);

    let store = AccountStore::new(db.pool.clone());
    let bob_account = store.find_by_id(bob).await.unwrap().unwrap();
    assert_eq!(bob_account.balance, 300);

    let bob_ledger = store.ledger(bob).await.unwrap();
    assert_eq!(bob_ledger.len(), 1);
    assert_eq!(bob_ledger[0].kind, EntryKind::TransferIn);
    assert_eq!(bob_ledger[0].counterparty, "1000000001");
    assert_eq!(bob_ledger[0].resulting_balance, 300);
}

#[tokio::test]
async fn test_transfer_check_order_funds_then_target_then_self() {
    let db = common::setup_test_db().await;
    let alice = register(&db, "Alice", "1000000001").await;
    let engine = MutationHandler::new(db.pool.clone());

    // Insufficient funds wins even when the target is also missing.
    let err = engine
        .handle(
            alice,
            MutateCommand::new("transfer", json!(50)).with_target("9999999999"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::InsufficientFunds(_))
    ));

    engine
        .handle(alice, MutateCommand::new("deposit", json!(100)))
        .await
        .unwrap();

    // With funds available the missing target is reported.
    let err = engine
        .handle(
            alice,
            MutateCommand::new("transfer", json!(50)).with_target("9999999999"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::TargetNotFound(_))
    ));

    // Self-transfer is checked last.
    let err = engine
        .handle(
            alice,
            MutateCommand::new("transfer", json!(50)).with_target("1000000001"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(DomainError::SelfTransfer)));

    // None of the rejections mutated anything.
    let store = AccountStore::new(db.pool.clone());
    let account = store.find_by_id(alice).await.unwrap().unwrap();
    assert_eq!(account.balance, 100);
    assert_eq!(store.ledger(alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_amount_checked_before_action_parsed() {
    let db = common::setup_test_db().await;
    let id = register(&db, "Alice", "1000000001").await;
    let engine = MutationHandler::new(db.pool.clone());

    // Both the amount and the action are invalid; the amount error wins.
    let err = engine
        .handle(id, MutateCommand::new("refund", json!("abc")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Amount(_)));

    let err = engine
        .handle(id, MutateCommand::new("refund", json!(100)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::UnknownAction(_))
    ));
}

#[tokio::test]
async fn test_concurrent_withdrawals_drain_to_zero() {
    let db = common::setup_test_db().await;
    let id = register(&db, "Alice", "1000000001").await;
    let engine = MutationHandler::new(db.pool.clone());

    engine
        .handle(id, MutateCommand::new("deposit", json!(1000)))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let pool = db.pool.clone();
        tasks.push(tokio::spawn(async move {
            let engine = MutationHandler::new(pool);
            engine
                .handle(id, MutateCommand::new("withdraw", json!(250)))
                .await
        }));
    }

    for task in tasks {
        task.await.unwrap().expect("withdrawal failed");
    }

    let store = AccountStore::new(db.pool.clone());
    let account = store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(account.balance, 0);

    // Each withdrawal saw the previous one: resulting balances decrease
    // strictly and end at zero.
    let ledger = store.ledger(id).await.unwrap();
    let balances: Vec<i64> = ledger[1..].iter().map(|e| e.resulting_balance).collect();
    assert_eq!(balances, vec![750, 500, 250, 0]);
}

#[tokio::test]
async fn test_concurrent_transfers_conserve_total() {
    let db = common::setup_test_db().await;
    let alice = register(&db, "Alice", "1000000001").await;
    let bob = register(&db, "Bob", "2000000002").await;
    let engine = MutationHandler::new(db.pool.clone());

    engine
        .handle(alice, MutateCommand::new("deposit", json!(500)))
        .await
        .unwrap();
    engine
        .handle(bob, MutateCommand::new("deposit", json!(500)))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for (from, to) in [(alice, "2000000002"), (bob, "1000000001")] {
        for _ in 0..3 {
            let pool = db.pool.clone();
            let to = to.to_string();
            tasks.push(tokio::spawn(async move {
                let engine = MutationHandler::new(pool);
                engine
                    .handle(from, MutateCommand::new("transfer", json!(10)).with_target(to))
                    .await
            }));
        }
    }

    for task in tasks {
        task.await.unwrap().expect("transfer failed");
    }

    let store = AccountStore::new(db.pool.clone());
    let alice_balance = store.find_by_id(alice).await.unwrap().unwrap().balance;
    let bob_balance = store.find_by_id(bob).await.unwrap().unwrap().balance;
    assert_eq!(alice_balance + bob_balance, 1000);
    assert_eq!(alice_balance, 500);
    assert_eq!(bob_balance, 500);
}

#[tokio::test]
async fn test_expired_session_rejected_and_dropped() {
    let db = common::setup_test_db().await;
    let id = register(&db, "Alice", "1000000001").await;
    let sessions = cubank::auth::SessionStore::new(db.pool.clone());

    // Registration already issued one live token
    let before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&db.pool)
        .await
        .unwrap();

    // Already expired at issue time
    let token = sessions
        .issue_token(id, chrono::Duration::seconds(-1))
        .await
        .unwrap();
    assert_eq!(sessions.authenticate(&token).await.unwrap(), None);

    // The expired row was deleted on sight
    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(after, before);

    // A live token still authenticates
    let token = sessions
        .issue_token(id, chrono::Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(sessions.authenticate(&token).await.unwrap(), Some(id));
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let db = common::setup_test_db().await;
    register(&db, "Alice", "1000000001").await;

    let handler = RegisterHandler::new(db.pool.clone(), &db.config);
    let err = handler
        .handle(RegisterCommand::new(
            "Impostor".to_string(),
            "1000000001".to_string(),
            "9999".to_string(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::DuplicateAccount(_))
    ));
}
