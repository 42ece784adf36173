//! The ledger: an append-only record of signed monetary deltas and the sole
//! source of truth for balances. No mutation, ever — only `append`.
//!
//! `balance`/`available`/`locked` are deliberately split into a plain read
//! and a `*_for_update` locked read instead of taking a `for_update: bool`
//! parameter. The locked variants take a user-scoped `SELECT ... FOR UPDATE`
//! against the ledger rows so a caller can check sufficiency and then append
//! inside the same transaction without a concurrent appender slipping in
//! between the check and the write.

use sqlx::{Executor, Postgres};

use crate::error::CoreError;
use crate::models::LedgerEntryType;

pub struct LedgerService;

impl LedgerService {
    /// Plain, unlocked read of the signed sum of all of a user's entries.
    /// May transiently be negative if observed between two offsetting
    /// entries written by different transactions.
    pub async fn total<'e, E>(executor: E, user_id: i64) -> Result<i64, CoreError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sum: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_kopecks) FROM ledger_entries WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(sum.unwrap_or(0))
    }

    /// Locked read for use as a guard immediately before a mutating append
    /// in the same transaction. Takes a row-level exclusive lock on the
    /// user's ledger rows, blocking (not skipping) concurrent lockers —
    /// unlike matching, a balance check must not silently skip the user.
    pub async fn total_for_update<'e, E>(executor: E, user_id: i64) -> Result<i64, CoreError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sum: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_kopecks) FROM ledger_entries WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(sum.unwrap_or(0))
    }

    pub async fn available<'e, E>(executor: E, user_id: i64) -> Result<i64, CoreError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(Self::total(executor, user_id).await?.max(0))
    }

    pub async fn available_for_update<'e, E>(executor: E, user_id: i64) -> Result<i64, CoreError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(Self::total_for_update(executor, user_id).await?.max(0))
    }

    /// Net of `order_lock`, `order_unlock` and `trade_lock` entries, taken
    /// as an absolute value. Display-only — not an independent source of
    /// truth, and not "sum of all locks" despite the name the source
    /// system uses; `order_unlock` is the positive counterpart of
    /// `order_lock`; what actually survives in this sum is net
    /// locked-for-resting-orders plus locked-for-trade.
    pub async fn locked<'e, E>(executor: E, user_id: i64) -> Result<i64, CoreError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sum: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount_kopecks) FROM ledger_entries
            WHERE user_id = $1 AND entry_type IN ('order_lock', 'order_unlock', 'trade_lock')
            "#,
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(sum.unwrap_or(0).abs())
    }

    /// Never checks anything on its own — all policy (sufficiency, validity
    /// of the reference) lives in the caller. Returns the new entry's id.
    pub async fn append<'e, E>(
        executor: E,
        user_id: i64,
        amount_kopecks: i64,
        entry_type: LedgerEntryType,
        reference_id: Option<i64>,
    ) -> Result<i64, CoreError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO ledger_entries (user_id, amount_kopecks, entry_type, reference_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(amount_kopecks)
        .bind(entry_type)
        .bind(reference_id)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn sufficient<'e, E>(executor: E, user_id: i64, need: i64) -> Result<bool, CoreError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(Self::available(executor, user_id).await? >= need)
    }

    pub async fn sufficient_for_update<'e, E>(
        executor: E,
        user_id: i64,
        need: i64,
    ) -> Result<bool, CoreError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(Self::available_for_update(executor, user_id).await? >= need)
    }
}

#[cfg(test)]
mod tests {
    // Ledger reads/writes require a live Postgres connection (SUM(...) FOR
    // UPDATE, row locks); they are exercised in tests/ledger_test.rs against
    // a real database rather than here.
}
