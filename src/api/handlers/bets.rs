//! Order placement, cancellation and the caller's own order/trade history.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use chrono::Utc;

use crate::api::dto::{ListOrdersQuery, ListTradesQuery, PlaceBetRequest};
use crate::auth::Principal;
use crate::error::{CoreError, CoreResult};
use crate::models::{LedgerEntryType, Order, OrderResponse, OrderStatus, Trade, TradeSummary};
use crate::services::ledger::LedgerService;
use crate::services::matching;
use crate::services::validation;
use crate::utils::money::{decimal_to_kopecks, decimal_to_price_bp, kopecks_to_decimal, price_bp_to_decimal};
use crate::AppState;

fn require_user(principal: &Principal) -> CoreResult<i64> {
    principal.user_id().ok_or(CoreError::Forbidden)
}

pub async fn place_bet(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<PlaceBetRequest>,
) -> CoreResult<Json<OrderResponse>> {
    let user_id = require_user(&principal)?;

    let amount_kopecks = decimal_to_kopecks(body.amount)?;
    let price_bp = decimal_to_price_bp(body.price)?;
    validation::validate_price_bp(price_bp)?;
    validation::validate_order_size(
        amount_kopecks,
        state.config.min_order_size_kopecks,
        state.config.max_order_size_kopecks,
    )?;

    let mut tx = state.db.pool.begin().await?;

    // Lock the market row so a concurrent resolve can't slip in between this
    // check and the order insert below (invariant: a resolved market never
    // accepts a new order).
    let market_resolved: bool =
        sqlx::query_scalar("SELECT resolved FROM markets WHERE id = $1 FOR UPDATE")
            .bind(body.market_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound("market"))?;
    if market_resolved {
        return Err(CoreError::Conflict("market is already resolved".to_string()));
    }

    if !LedgerService::sufficient_for_update(&mut *tx, user_id, amount_kopecks).await? {
        let available = LedgerService::available(&mut *tx, user_id).await?;
        return Err(CoreError::InsufficientFunds {
            available,
            requested: amount_kopecks,
        });
    }

    let mut order: Order = sqlx::query_as(
        r#"
        INSERT INTO orders (user_id, market_id, side, price_bp, amount_kopecks, filled_kopecks, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 0, 'open', $6, $6)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(body.market_id)
    .bind(body.side)
    .bind(price_bp)
    .bind(amount_kopecks)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    LedgerService::append(
        &mut *tx,
        user_id,
        -amount_kopecks,
        LedgerEntryType::OrderLock,
        Some(order.id),
    )
    .await?;

    let trades = matching::match_order(&mut tx, &mut order).await?;

    tx.commit().await?;

    let summaries = trades
        .iter()
        .map(|t| TradeSummary {
            trade_id: t.id,
            amount: kopecks_to_decimal(t.amount_kopecks),
            price: price_bp_to_decimal(t.price_bp),
        })
        .collect();

    Ok(Json(OrderResponse::from_order(order, summaries)))
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(order_id): Path<i64>,
) -> CoreResult<Json<OrderResponse>> {
    let user_id = require_user(&principal)?;

    let mut tx = state.db.pool.begin().await?;

    let order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::NotFound("order"))?;

    if order.user_id != user_id {
        return Err(CoreError::Forbidden);
    }
    if order.status != OrderStatus::Open {
        return Err(CoreError::Conflict(
            "only an open order can be cancelled".to_string(),
        ));
    }

    let updated: Order = sqlx::query_as(
        "UPDATE orders SET status = 'cancelled', updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(order_id)
    .fetch_one(&mut *tx)
    .await?;

    LedgerService::append(
        &mut *tx,
        user_id,
        updated.amount_kopecks,
        LedgerEntryType::OrderUnlock,
        Some(order_id),
    )
    .await?;

    tx.commit().await?;

    Ok(Json(OrderResponse::from_order(updated, Vec::new())))
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(filters): Query<ListOrdersQuery>,
) -> CoreResult<Json<Vec<OrderResponse>>> {
    let user_id = require_user(&principal)?;

    let orders: Vec<Order> = sqlx::query_as(
        r#"
        SELECT * FROM orders
        WHERE user_id = $1
          AND ($2::bigint IS NULL OR market_id = $2)
          AND ($3::text IS NULL OR status = $3::text::order_status)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(filters.market_id)
    .bind(filters.status)
    .fetch_all(&state.db.pool)
    .await?;

    let responses = orders
        .into_iter()
        .map(|o| OrderResponse::from_order(o, Vec::new()))
        .collect();
    Ok(Json(responses))
}

pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(filters): Query<ListTradesQuery>,
) -> CoreResult<Json<Vec<TradeSummary>>> {
    let user_id = require_user(&principal)?;
    let limit = filters.limit.unwrap_or(50).clamp(1, 100);

    let trades: Vec<Trade> = sqlx::query_as(
        r#"
        SELECT t.* FROM trades t
        JOIN orders o ON o.id = t.yes_order_id OR o.id = t.no_order_id
        WHERE o.user_id = $1
          AND ($2::bigint IS NULL OR t.market_id = $2)
        ORDER BY t.created_at DESC
        LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(filters.market_id)
    .bind(limit)
    .fetch_all(&state.db.pool)
    .await?;

    let summaries = trades
        .into_iter()
        .map(|t| TradeSummary {
            trade_id: t.id,
            amount: kopecks_to_decimal(t.amount_kopecks),
            price: price_bp_to_decimal(t.price_bp),
        })
        .collect();
    Ok(Json(summaries))
}
