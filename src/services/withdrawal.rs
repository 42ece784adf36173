//! Withdrawal queue: records user-initiated withdrawal intents, locks
//! funds immediately, and waits for the operator-driven release (outside
//! this crate's scope) to move a request through `processing` to
//! `completed` or `failed`.

use sqlx::PgPool;

use crate::error::CoreError;
use crate::models::{LedgerEntryType, WithdrawalRequest, WithdrawalStatus};
use crate::services::ledger::LedgerService;

pub async fn create_withdrawal(
    pool: &PgPool,
    user_id: i64,
    destination_address: &str,
    amount_kopecks: i64,
) -> Result<WithdrawalRequest, CoreError> {
    if amount_kopecks <= 0 {
        return Err(CoreError::Validation("withdrawal amount must be positive".to_string()));
    }

    let mut tx = pool.begin().await?;

    if !LedgerService::sufficient_for_update(&mut *tx, user_id, amount_kopecks).await? {
        let available = LedgerService::available(&mut *tx, user_id).await?;
        return Err(CoreError::InsufficientFunds {
            available,
            requested: amount_kopecks,
        });
    }

    let withdrawal: WithdrawalRequest = sqlx::query_as(
        r#"
        INSERT INTO withdrawal_requests (user_id, destination_address, amount_kopecks, status)
        VALUES ($1, $2, $3, 'pending')
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(destination_address)
    .bind(amount_kopecks)
    .fetch_one(&mut *tx)
    .await?;

    let ledger_entry_id = LedgerService::append(
        &mut *tx,
        user_id,
        -amount_kopecks,
        LedgerEntryType::WithdrawalPending,
        Some(withdrawal.id),
    )
    .await?;

    sqlx::query("UPDATE withdrawal_requests SET ledger_entry_id = $1 WHERE id = $2")
        .bind(ledger_entry_id)
        .bind(withdrawal.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(WithdrawalRequest {
        ledger_entry_id: Some(ledger_entry_id),
        ..withdrawal
    })
}

/// Cancellation is pending-only: once the operator has moved a request to
/// `processing` the user can no longer pull it back.
pub async fn cancel_withdrawal(
    pool: &PgPool,
    user_id: i64,
    withdrawal_id: i64,
) -> Result<WithdrawalRequest, CoreError> {
    let mut tx = pool.begin().await?;

    let withdrawal: WithdrawalRequest =
        sqlx::query_as("SELECT * FROM withdrawal_requests WHERE id = $1 FOR UPDATE")
            .bind(withdrawal_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound("withdrawal"))?;

    if withdrawal.user_id != user_id {
        return Err(CoreError::Forbidden);
    }
    if withdrawal.status != WithdrawalStatus::Pending {
        return Err(CoreError::Conflict(
            "only a pending withdrawal can be cancelled".to_string(),
        ));
    }

    LedgerService::append(
        &mut *tx,
        user_id,
        withdrawal.amount_kopecks,
        LedgerEntryType::WithdrawalCancelled,
        Some(withdrawal.id),
    )
    .await?;

    let updated: WithdrawalRequest = sqlx::query_as(
        "UPDATE withdrawal_requests SET status = 'cancelled', updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(withdrawal_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(updated)
}
