mod common;

use pravda_exchange::models::WithdrawalStatus;
use pravda_exchange::services::ledger::LedgerService;
use pravda_exchange::services::withdrawal::{cancel_withdrawal, create_withdrawal};

#[tokio::test]
async fn create_withdrawal_locks_the_requested_amount() {
    let Some(pool) = common::pool().await else { return };
    let user = common::create_user(&pool).await;
    common::credit_deposit(&pool, user.id, 10_000).await;

    let withdrawal = create_withdrawal(&pool, user.id, "EQsome-destination-address", 4_000)
        .await
        .unwrap();

    assert_eq!(withdrawal.status, WithdrawalStatus::Pending);
    assert_eq!(withdrawal.amount_kopecks, 4_000);
    assert!(withdrawal.ledger_entry_id.is_some());
    assert_eq!(LedgerService::available(&pool, user.id).await.unwrap(), 6_000);
    assert_eq!(LedgerService::total(&pool, user.id).await.unwrap(), 6_000);
}

#[tokio::test]
async fn create_withdrawal_rejects_insufficient_balance() {
    let Some(pool) = common::pool().await else { return };
    let user = common::create_user(&pool).await;
    common::credit_deposit(&pool, user.id, 1_000).await;

    let result = create_withdrawal(&pool, user.id, "EQsome-destination-address", 2_000).await;

    assert!(result.is_err());
    assert_eq!(LedgerService::total(&pool, user.id).await.unwrap(), 1_000);
}

#[tokio::test]
async fn cancel_withdrawal_refunds_the_locked_amount() {
    let Some(pool) = common::pool().await else { return };
    let user = common::create_user(&pool).await;
    common::credit_deposit(&pool, user.id, 10_000).await;

    let withdrawal = create_withdrawal(&pool, user.id, "EQsome-destination-address", 4_000)
        .await
        .unwrap();
    let cancelled = cancel_withdrawal(&pool, user.id, withdrawal.id).await.unwrap();

    assert_eq!(cancelled.status, WithdrawalStatus::Cancelled);
    assert_eq!(LedgerService::total(&pool, user.id).await.unwrap(), 10_000);
}

#[tokio::test]
async fn cancel_withdrawal_rejects_a_non_owner() {
    let Some(pool) = common::pool().await else { return };
    let owner = common::create_user(&pool).await;
    let other = common::create_user(&pool).await;
    common::credit_deposit(&pool, owner.id, 10_000).await;

    let withdrawal = create_withdrawal(&pool, owner.id, "EQsome-destination-address", 4_000)
        .await
        .unwrap();

    let result = cancel_withdrawal(&pool, other.id, withdrawal.id).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn cancelling_twice_fails_the_second_time() {
    let Some(pool) = common::pool().await else { return };
    let user = common::create_user(&pool).await;
    common::credit_deposit(&pool, user.id, 10_000).await;

    let withdrawal = create_withdrawal(&pool, user.id, "EQsome-destination-address", 4_000)
        .await
        .unwrap();
    cancel_withdrawal(&pool, user.id, withdrawal.id).await.unwrap();

    let second = cancel_withdrawal(&pool, user.id, withdrawal.id).await;
    assert!(second.is_err());
}
