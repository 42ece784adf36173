//! Market resolution and payout distribution.
//!
//! Winner gets the gross pot minus the platform fee; their `trade_lock`
//! (their cost) stays as-is. Loser gets nothing; their `trade_lock` stays
//! as their loss. Preserves the Ledger Identity exactly down to the sum of
//! the resolved market's per-trade fees.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::CoreError;
use crate::models::{LedgerEntryType, Market, Order, Outcome, Trade};
use crate::services::ledger::LedgerService;

#[derive(Debug, serde::Serialize)]
pub struct SettlementStats {
    pub winners_paid: usize,
    pub losers_count: usize,
    pub total_payout_kopecks: i64,
    pub total_fees_kopecks: i64,
}

/// Resolves `market_id` with `outcome`, walking every trade on the market
/// and distributing payouts. Must run inside its own transaction: the
/// market row is locked first, `resolved` is re-checked after the lock
/// closes the time-of-check/time-of-use race between two concurrent
/// resolve calls.
pub async fn settle_market(
    pool: &PgPool,
    market_id: i64,
    outcome: Outcome,
    fee_rate: Decimal,
) -> Result<SettlementStats, CoreError> {
    let mut tx = pool.begin().await?;

    let market: Option<Market> =
        sqlx::query_as("SELECT * FROM markets WHERE id = $1 FOR UPDATE")
            .bind(market_id)
            .fetch_optional(&mut *tx)
            .await?;

    let market = market.ok_or(CoreError::NotFound("market"))?;

    if market.resolved {
        return Err(CoreError::Conflict(format!(
            "market {market_id} is already resolved"
        )));
    }

    let trades: Vec<Trade> = sqlx::query_as("SELECT * FROM trades WHERE market_id = $1")
        .bind(market_id)
        .fetch_all(&mut *tx)
        .await?;

    let mut winners_paid = 0usize;
    let mut losers_count = 0usize;
    let mut total_payout = 0i64;
    let mut total_fees = 0i64;

    for trade in &trades {
        let gross_pot = trade.amount_kopecks;
        let fee = (Decimal::from(gross_pot) * fee_rate)
            .trunc()
            .to_string()
            .parse::<i64>()
            .map_err(|_| CoreError::Invariant("fee computation overflowed i64".to_string()))?;

        let (winner_order_id, loser_order_id) = match outcome {
            Outcome::Yes => (trade.yes_order_id, trade.no_order_id),
            Outcome::No => (trade.no_order_id, trade.yes_order_id),
        };

        settle_winner(&mut tx, winner_order_id, gross_pot, fee, trade.id).await?;
        settle_loser(&mut tx, loser_order_id, trade.id).await?;

        winners_paid += 1;
        losers_count += 1;
        total_payout += gross_pot - fee;
        total_fees += fee;
    }

    sqlx::query(
        "UPDATE markets SET resolved = true, outcome = $1, resolved_at = $2 WHERE id = $3",
    )
    .bind(outcome)
    .bind(Utc::now())
    .bind(market_id)
    .execute(&mut *tx)
    .await?;

    verify_settlement_invariant(&mut tx, &trades, total_payout, total_fees).await?;

    tx.commit().await?;

    Ok(SettlementStats {
        winners_paid,
        losers_count,
        total_payout_kopecks: total_payout,
        total_fees_kopecks: total_fees,
    })
}

async fn settle_winner(
    tx: &mut Transaction<'_, Postgres>,
    order_id: i64,
    gross_payout: i64,
    fee_amount: i64,
    trade_id: i64,
) -> Result<(), CoreError> {
    let order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(CoreError::NotFound("order"))?;

    LedgerService::append(
        &mut **tx,
        order.user_id,
        gross_payout,
        LedgerEntryType::Payout,
        Some(trade_id),
    )
    .await?;

    if fee_amount > 0 {
        LedgerService::append(
            &mut **tx,
            order.user_id,
            -fee_amount,
            LedgerEntryType::Fee,
            Some(trade_id),
        )
        .await?;
    }

    Ok(())
}

/// The loser receives no entries; their `trade_lock` stays locked, which is
/// exactly their loss.
async fn settle_loser(
    tx: &mut Transaction<'_, Postgres>,
    order_id: i64,
    _trade_id: i64,
) -> Result<(), CoreError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?;
    exists.ok_or(CoreError::NotFound("order"))?;
    Ok(())
}

/// Critical pre-commit check, scoped to this market's trade ids so it stays
/// correct under concurrent settlement of other markets.
async fn verify_settlement_invariant(
    tx: &mut Transaction<'_, Postgres>,
    trades: &[Trade],
    expected_net_payout: i64,
    expected_fees: i64,
) -> Result<(), CoreError> {
    if trades.is_empty() {
        return Ok(());
    }
    let trade_ids: Vec<i64> = trades.iter().map(|t| t.id).collect();

    let actual_payout: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(amount_kopecks) FROM ledger_entries WHERE entry_type = 'payout' AND reference_id = ANY($1)",
    )
    .bind(&trade_ids)
    .fetch_one(&mut **tx)
    .await?;
    let actual_payout = actual_payout.unwrap_or(0);

    let actual_fees: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(amount_kopecks) FROM ledger_entries WHERE entry_type = 'fee' AND reference_id = ANY($1)",
    )
    .bind(&trade_ids)
    .fetch_one(&mut **tx)
    .await?;
    let actual_fees = actual_fees.unwrap_or(0);

    let expected_gross_payout = expected_net_payout + expected_fees;
    if actual_payout != expected_gross_payout {
        return Err(CoreError::Invariant(format!(
            "settlement payout mismatch: expected {expected_gross_payout}, got {actual_payout}"
        )));
    }
    if actual_fees != -expected_fees {
        return Err(CoreError::Invariant(format!(
            "settlement fee mismatch: expected {}, got {actual_fees}",
            -expected_fees
        )));
    }

    Ok(())
}
