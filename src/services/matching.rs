//! Order Matching Engine
//!
//! Row-level locking (`SELECT ... FOR UPDATE SKIP LOCKED`) keeps two
//! concurrent aggressors from both filling against the same resting order.
//! A DOS bound caps the amount of work a single call can be made to do.

use chrono::Utc;
use sqlx::{Postgres, Transaction};

use crate::error::CoreError;
use crate::models::{LedgerEntryType, Order, OrderStatus, Side, Trade};
use crate::services::ledger::LedgerService;
use crate::services::validation::calculate_settlement;

/// DOS protection: caps the number of trades a single `match_order` call
/// may execute. Prevents an attacker from posting thousands of micro-orders
/// to slow an honest large order to a crawl.
pub const MAX_TRADES_PER_ORDER: usize = 50;

/// Matches `aggressor` (already persisted, already locked for
/// `-amount_kopecks` as an `order_lock`) against the order book. Returns the
/// trades created; always preserves the Ledger Identity.
pub async fn match_order(
    tx: &mut Transaction<'_, Postgres>,
    aggressor: &mut Order,
) -> Result<Vec<Trade>, CoreError> {
    let mut trades = Vec::new();
    let mut remaining = aggressor.remaining_kopecks();

    while remaining > 0 && trades.len() < MAX_TRADES_PER_ORDER {
        let Some(mut counter) = find_best_match(tx, aggressor).await? else {
            break;
        };

        let counter_remaining = counter.remaining_kopecks();
        let fill = remaining.min(counter_remaining);
        if fill <= 0 {
            break; // defensive: should not happen given the row lock
        }

        let trade = execute_trade(tx, aggressor, &counter, fill).await?;

        aggressor.filled_kopecks += fill;
        counter.filled_kopecks += fill;
        remaining -= fill;

        aggressor.status = OrderStatus::from_fill(aggressor.filled_kopecks, aggressor.amount_kopecks);
        counter.status = OrderStatus::from_fill(counter.filled_kopecks, counter.amount_kopecks);

        update_order_fill(tx, aggressor).await?;
        update_order_fill(tx, &counter).await?;

        trades.push(trade);
    }

    Ok(trades)
}

/// Best opposite-side candidate under a row-level exclusive lock with
/// skip-locked semantics: a row already locked by another concurrent
/// matcher is skipped rather than waited on.
async fn find_best_match(
    tx: &mut Transaction<'_, Postgres>,
    aggressor: &Order,
) -> Result<Option<Order>, CoreError> {
    let opposite = aggressor.side.opposite();
    let matching_price = 10_000 - aggressor.price_bp;

    // Either side wants a counter-order whose price makes the pair sum to
    // at least 10000bp (`is_price_compatible`), best (highest) price first,
    // FIFO within a price level.
    let row = match aggressor.side {
        Side::Yes => {
            sqlx::query_as::<_, Order>(
                r#"
                SELECT * FROM orders
                WHERE market_id = $1
                  AND side = $2
                  AND status IN ('open', 'partial')
                  AND id != $3
                  AND price_bp >= $4
                ORDER BY price_bp DESC, created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
                "#,
            )
            .bind(aggressor.market_id)
            .bind(opposite)
            .bind(aggressor.id)
            .bind(matching_price)
            .fetch_optional(&mut **tx)
            .await?
        }
        Side::No => {
            sqlx::query_as::<_, Order>(
                r#"
                SELECT * FROM orders
                WHERE market_id = $1
                  AND side = $2
                  AND status IN ('open', 'partial')
                  AND id != $3
                  AND price_bp >= $4
                ORDER BY price_bp DESC, created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
                "#,
            )
            .bind(aggressor.market_id)
            .bind(opposite)
            .bind(aggressor.id)
            .bind(matching_price)
            .fetch_optional(&mut **tx)
            .await?
        }
    };

    Ok(row)
}

/// Executes one fill between `order1` (the aggressor, already locked) and
/// `order2` (the resting counter-order, just locked by `find_best_match`).
/// Creates the Trade row and the four ledger entries for the fill.
async fn execute_trade(
    tx: &mut Transaction<'_, Postgres>,
    order1: &Order,
    order2: &Order,
    amount: i64,
) -> Result<Trade, CoreError> {
    let (yes_order, no_order) = match order1.side {
        Side::Yes => (order1, order2),
        Side::No => (order2, order1),
    };

    let (yes_cost, no_cost) = calculate_settlement(amount, yes_order.price_bp)?;

    let trade: Trade = sqlx::query_as(
        r#"
        INSERT INTO trades (market_id, yes_order_id, no_order_id, price_bp, amount_kopecks, yes_cost_kopecks, no_cost_kopecks, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(yes_order.market_id)
    .bind(yes_order.id)
    .bind(no_order.id)
    .bind(yes_order.price_bp)
    .bind(amount)
    .bind(yes_cost)
    .bind(no_cost)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    settle_order_for_fill(tx, yes_order, amount, yes_cost, trade.id).await?;
    settle_order_for_fill(tx, no_order, amount, no_cost, trade.id).await?;

    Ok(trade)
}

/// Ledger effect of one side of one fill: unlock the matched *amount* (not
/// the cost — the initial lock was proportional to the full order amount),
/// then lock the side's actual cost against the trade. Net: `amount - cost`
/// returns to `available`.
async fn settle_order_for_fill(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
    amount: i64,
    cost: i64,
    trade_id: i64,
) -> Result<(), CoreError> {
    LedgerService::append(
        &mut **tx,
        order.user_id,
        amount,
        LedgerEntryType::OrderUnlock,
        Some(order.id),
    )
    .await?;

    LedgerService::append(
        &mut **tx,
        order.user_id,
        -cost,
        LedgerEntryType::TradeLock,
        Some(trade_id),
    )
    .await?;

    Ok(())
}

async fn update_order_fill(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<(), CoreError> {
    sqlx::query(
        "UPDATE orders SET filled_kopecks = $1, status = $2, updated_at = now() WHERE id = $3",
    )
    .bind(order.filled_kopecks)
    .bind(order.status)
    .bind(order.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_trades_per_order_matches_dos_bound() {
        assert_eq!(MAX_TRADES_PER_ORDER, 50);
    }
}
