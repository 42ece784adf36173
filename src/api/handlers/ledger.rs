//! Balance readout and paginated ledger history for the caller.

use std::sync::Arc;

use axum::extract::{Extension, Query, State};
use axum::Json;

use crate::api::dto::LedgerHistoryQuery;
use crate::auth::Principal;
use crate::error::{CoreError, CoreResult};
use crate::models::{BalanceResponse, LedgerEntry};
use crate::services::ledger::LedgerService;
use crate::utils::money::kopecks_to_decimal;
use crate::AppState;

fn require_user(principal: &Principal) -> CoreResult<i64> {
    principal.user_id().ok_or(CoreError::Forbidden)
}

pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> CoreResult<Json<BalanceResponse>> {
    let user_id = require_user(&principal)?;

    let total = LedgerService::total(&state.db.pool, user_id).await?;
    let available = LedgerService::available(&state.db.pool, user_id).await?;
    let locked = LedgerService::locked(&state.db.pool, user_id).await?;

    Ok(Json(BalanceResponse {
        total: kopecks_to_decimal(total),
        available: kopecks_to_decimal(available),
        locked: kopecks_to_decimal(locked),
    }))
}

pub async fn get_ledger_history(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(page): Query<LedgerHistoryQuery>,
) -> CoreResult<Json<Vec<LedgerEntry>>> {
    let user_id = require_user(&principal)?;
    let limit = page.limit.unwrap_or(50).clamp(1, 100);

    let entries: Vec<LedgerEntry> = sqlx::query_as(
        r#"
        SELECT * FROM ledger_entries
        WHERE user_id = $1
          AND ($2::bigint IS NULL OR id < $2)
        ORDER BY id DESC
        LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(page.before_id)
    .bind(limit)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(entries))
}
