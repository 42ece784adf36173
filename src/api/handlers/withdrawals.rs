//! Withdrawal creation and pending-only cancellation.

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::Json;

use crate::api::dto::CreateWithdrawalBody;
use crate::auth::Principal;
use crate::error::{CoreError, CoreResult};
use crate::models::WithdrawalResponse;
use crate::services::withdrawal;
use crate::utils::money::decimal_to_kopecks;
use crate::AppState;

fn require_user(principal: &Principal) -> CoreResult<i64> {
    principal.user_id().ok_or(CoreError::Forbidden)
}

pub async fn create_withdrawal(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<CreateWithdrawalBody>,
) -> CoreResult<Json<WithdrawalResponse>> {
    use validator::Validate;
    body.validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let user_id = require_user(&principal)?;
    let amount_kopecks = decimal_to_kopecks(body.amount)?;

    let request = withdrawal::create_withdrawal(
        &state.db.pool,
        user_id,
        &body.destination_address,
        amount_kopecks,
    )
    .await?;

    Ok(Json(request.into()))
}

pub async fn cancel_withdrawal(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(withdrawal_id): Path<i64>,
) -> CoreResult<Json<WithdrawalResponse>> {
    let user_id = require_user(&principal)?;

    let request = withdrawal::cancel_withdrawal(&state.db.pool, user_id, withdrawal_id).await?;

    Ok(Json(request.into()))
}

pub async fn list_withdrawals(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> CoreResult<Json<Vec<WithdrawalResponse>>> {
    let user_id = require_user(&principal)?;

    let requests: Vec<crate::models::WithdrawalRequest> = sqlx::query_as(
        "SELECT * FROM withdrawal_requests WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(requests.into_iter().map(WithdrawalResponse::from).collect()))
}
