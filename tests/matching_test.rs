mod common;

use pravda_exchange::models::{LedgerEntryType, Order, OrderStatus, Side};
use pravda_exchange::services::ledger::LedgerService;
use pravda_exchange::services::matching::match_order;

async fn insert_order(
    pool: &sqlx::PgPool,
    user_id: i64,
    market_id: i64,
    side: Side,
    price_bp: i32,
    amount_kopecks: i64,
) -> Order {
    sqlx::query_as(
        r#"
        INSERT INTO orders (user_id, market_id, side, price_bp, amount_kopecks, status)
        VALUES ($1, $2, $3, $4, $5, 'open')
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(market_id)
    .bind(side)
    .bind(price_bp)
    .bind(amount_kopecks)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn exact_complement_orders_fill_each_other_completely() {
    let Some(pool) = common::pool().await else { return };
    let market_id = common::create_market(&pool, 6500).await;

    let maker_user = common::create_user(&pool).await;
    let taker_user = common::create_user(&pool).await;
    common::credit_deposit(&pool, maker_user.id, 10_000).await;
    common::credit_deposit(&pool, taker_user.id, 10_000).await;

    let maker = insert_order(&pool, maker_user.id, market_id, Side::No, 3500, 10_000).await;
    LedgerService::append(&pool, maker_user.id, -10_000, LedgerEntryType::OrderLock, Some(maker.id))
        .await
        .unwrap();

    let mut tx = pool.begin().await.unwrap();
    let mut taker = insert_order(&pool, taker_user.id, market_id, Side::Yes, 6500, 10_000).await;
    LedgerService::append(&mut *tx, taker_user.id, -10_000, LedgerEntryType::OrderLock, Some(taker.id))
        .await
        .unwrap();

    let trades = match_order(&mut tx, &mut taker).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].amount_kopecks, 10_000);
    assert_eq!(trades[0].yes_cost_kopecks, 6_500);
    assert_eq!(trades[0].no_cost_kopecks, 3_500);
    assert_eq!(trades[0].yes_cost_kopecks + trades[0].no_cost_kopecks, trades[0].amount_kopecks);

    assert_eq!(taker.status, OrderStatus::Filled);

    let maker_row: Order = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(maker.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(maker_row.status, OrderStatus::Filled);
}

#[tokio::test]
async fn incompatible_prices_never_cross() {
    let Some(pool) = common::pool().await else { return };
    let market_id = common::create_market(&pool, 6500).await;

    let maker_user = common::create_user(&pool).await;
    let taker_user = common::create_user(&pool).await;
    common::credit_deposit(&pool, maker_user.id, 10_000).await;
    common::credit_deposit(&pool, taker_user.id, 10_000).await;

    // maker wants NO at 0.30 (3000bp): 6500 + 3000 = 9500 < 10000, no cross.
    insert_order(&pool, maker_user.id, market_id, Side::No, 3000, 5_000).await;

    let mut tx = pool.begin().await.unwrap();
    let mut taker = insert_order(&pool, taker_user.id, market_id, Side::Yes, 6500, 5_000).await;

    let trades = match_order(&mut tx, &mut taker).await.unwrap();
    tx.commit().await.unwrap();

    assert!(trades.is_empty());
    assert_eq!(taker.status, OrderStatus::Open);
}

#[tokio::test]
async fn partial_fill_leaves_the_remainder_resting() {
    let Some(pool) = common::pool().await else { return };
    let market_id = common::create_market(&pool, 6500).await;

    let maker_user = common::create_user(&pool).await;
    let taker_user = common::create_user(&pool).await;
    common::credit_deposit(&pool, maker_user.id, 10_000).await;
    common::credit_deposit(&pool, taker_user.id, 10_000).await;

    insert_order(&pool, maker_user.id, market_id, Side::No, 3500, 4_000).await;

    let mut tx = pool.begin().await.unwrap();
    let mut taker = insert_order(&pool, taker_user.id, market_id, Side::Yes, 6500, 10_000).await;

    let trades = match_order(&mut tx, &mut taker).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].amount_kopecks, 4_000);
    assert_eq!(taker.filled_kopecks, 4_000);
    assert_eq!(taker.status, OrderStatus::Partial);
}

/// Scenario S4: a resting book of 100 same-priced NO orders can only ever
/// absorb `MAX_TRADES_PER_ORDER` of them against a single aggressor.
#[tokio::test]
async fn dos_bound_caps_trades_per_aggressor() {
    let Some(pool) = common::pool().await else { return };
    let market_id = common::create_market(&pool, 6000).await;

    let taker_user = common::create_user(&pool).await;
    common::credit_deposit(&pool, taker_user.id, 20_000).await;

    for _ in 0..100 {
        let maker_user = common::create_user(&pool).await;
        common::credit_deposit(&pool, maker_user.id, 200).await;
        insert_order(&pool, maker_user.id, market_id, Side::No, 4000, 200).await;
    }

    let mut tx = pool.begin().await.unwrap();
    let mut taker = insert_order(&pool, taker_user.id, market_id, Side::Yes, 6000, 20_000).await;

    let trades = match_order(&mut tx, &mut taker).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(trades.len(), 50);
    assert_eq!(taker.filled_kopecks, 10_000);
    assert_eq!(taker.status, OrderStatus::Partial);

    let untouched: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE market_id = $1 AND side = 'no' AND status = 'open'",
    )
    .bind(market_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(untouched, 50);
}

/// Invariant 3: matching a complementary pair moves money between users but
/// never changes the total sum of ledger entries.
#[tokio::test]
async fn matching_preserves_the_ledger_identity() {
    let Some(pool) = common::pool().await else { return };
    let market_id = common::create_market(&pool, 6500).await;

    let maker_user = common::create_user(&pool).await;
    let taker_user = common::create_user(&pool).await;
    common::credit_deposit(&pool, maker_user.id, 10_000).await;
    common::credit_deposit(&pool, taker_user.id, 10_000).await;

    let sum_before = LedgerService::total(&pool, maker_user.id).await.unwrap()
        + LedgerService::total(&pool, taker_user.id).await.unwrap();

    let maker = insert_order(&pool, maker_user.id, market_id, Side::No, 3500, 10_000).await;
    LedgerService::append(&pool, maker_user.id, -10_000, LedgerEntryType::OrderLock, Some(maker.id))
        .await
        .unwrap();

    let mut tx = pool.begin().await.unwrap();
    let mut taker = insert_order(&pool, taker_user.id, market_id, Side::Yes, 6500, 10_000).await;
    LedgerService::append(&mut *tx, taker_user.id, -10_000, LedgerEntryType::OrderLock, Some(taker.id))
        .await
        .unwrap();
    match_order(&mut tx, &mut taker).await.unwrap();
    tx.commit().await.unwrap();

    let sum_after = LedgerService::total(&pool, maker_user.id).await.unwrap()
        + LedgerService::total(&pool, taker_user.id).await.unwrap();

    assert_eq!(sum_before, sum_after);
}
