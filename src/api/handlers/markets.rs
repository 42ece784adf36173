//! Market listing, the aggregated orderbook view, and operator-only
//! create/delete/resolve.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use crate::api::dto::{CreateMarketBody, OrderBookLevel, OrderBookResponse, ResolveMarketBody, SettlementResponse};
use crate::error::{CoreError, CoreResult};
use crate::models::{Market, MarketResponse};
use crate::services::settlement;
use crate::utils::money::{decimal_to_price_bp, kopecks_to_decimal, price_bp_to_decimal};
use crate::AppState;

pub async fn list_markets(State(state): State<Arc<AppState>>) -> CoreResult<Json<Vec<MarketResponse>>> {
    let markets: Vec<Market> = sqlx::query_as("SELECT * FROM markets ORDER BY created_at DESC")
        .fetch_all(&state.db.pool)
        .await?;
    Ok(Json(markets.into_iter().map(MarketResponse::from).collect()))
}

pub async fn get_market(
    State(state): State<Arc<AppState>>,
    Path(market_id): Path<i64>,
) -> CoreResult<Json<MarketResponse>> {
    let market: Market = sqlx::query_as("SELECT * FROM markets WHERE id = $1")
        .bind(market_id)
        .fetch_optional(&state.db.pool)
        .await?
        .ok_or(CoreError::NotFound("market"))?;
    Ok(Json(market.into()))
}

/// No per-user information: aggregated `(price, remaining_amount)` per side,
/// sorted best-first — the same ordering the matching engine uses to pick
/// its next candidate.
pub async fn get_orderbook(
    State(state): State<Arc<AppState>>,
    Path(market_id): Path<i64>,
) -> CoreResult<Json<OrderBookResponse>> {
    let rows: Vec<(String, i32, i64)> = sqlx::query_as(
        r#"
        SELECT side::text, price_bp, SUM(amount_kopecks - filled_kopecks) AS remaining
        FROM orders
        WHERE market_id = $1 AND status IN ('open', 'partial')
        GROUP BY side, price_bp
        ORDER BY price_bp DESC
        "#,
    )
    .bind(market_id)
    .fetch_all(&state.db.pool)
    .await?;

    let mut yes = Vec::new();
    let mut no = Vec::new();
    for (side, price_bp, remaining) in rows {
        let level = OrderBookLevel {
            price: price_bp_to_decimal(price_bp),
            amount: kopecks_to_decimal(remaining),
        };
        match side.as_str() {
            "yes" => yes.push(level),
            "no" => no.push(level),
            _ => {}
        }
    }

    Ok(Json(OrderBookResponse { market_id, yes, no }))
}

pub async fn create_market(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMarketBody>,
) -> CoreResult<Json<MarketResponse>> {
    use validator::Validate;
    body.validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let yes_price_bp = decimal_to_price_bp(body.initial_yes_price)?;
    let no_price_bp = 10_000 - yes_price_bp;

    let market: Market = sqlx::query_as(
        r#"
        INSERT INTO markets (title, description, category, deadline, resolved, outcome, yes_price_bp, no_price_bp, volume_kopecks, created_at)
        VALUES ($1, $2, $3, $4, false, NULL, $5, $6, 0, $7)
        RETURNING *
        "#,
    )
    .bind(&body.title)
    .bind(&body.description)
    .bind(&body.category)
    .bind(body.deadline)
    .bind(yes_price_bp)
    .bind(no_price_bp)
    .bind(Utc::now())
    .fetch_one(&state.db.pool)
    .await?;

    Ok(Json(market.into()))
}

/// Deletion is a hard precondition, not a soft warning: any order at all —
/// open, filled or cancelled — blocks it.
pub async fn delete_market(
    State(state): State<Arc<AppState>>,
    Path(market_id): Path<i64>,
) -> CoreResult<Json<serde_json::Value>> {
    let order_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE market_id = $1")
        .bind(market_id)
        .fetch_one(&state.db.pool)
        .await?;

    if order_count > 0 {
        return Err(CoreError::Conflict(
            "market cannot be deleted while it has orders".to_string(),
        ));
    }

    let deleted = sqlx::query("DELETE FROM markets WHERE id = $1")
        .bind(market_id)
        .execute(&state.db.pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(CoreError::NotFound("market"));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn resolve_market(
    State(state): State<Arc<AppState>>,
    Path(market_id): Path<i64>,
    Json(body): Json<ResolveMarketBody>,
) -> CoreResult<Json<SettlementResponse>> {
    let stats = settlement::settle_market(
        &state.db.pool,
        market_id,
        body.outcome,
        state.config.platform_fee_rate,
    )
    .await?;

    Ok(Json(SettlementResponse {
        market_id,
        outcome: body.outcome,
        winners_paid: stats.winners_paid,
        losers_count: stats.losers_count,
        total_payout: kopecks_to_decimal(stats.total_payout_kopecks),
        total_fees: kopecks_to_decimal(stats.total_fees_kopecks),
    }))
}
