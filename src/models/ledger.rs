use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Kind of a signed ledger entry. Entries are append-only; this enum is
/// never used to mutate a row, only to classify one at write time or
/// to filter a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ledger_entry_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Deposit,
    OrderLock,
    OrderUnlock,
    TradeLock,
    Payout,
    Fee,
    WithdrawalPending,
    WithdrawalCancelled,
}

impl fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub amount_kopecks: i64,
    pub entry_type: LedgerEntryType,
    pub reference_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub total: rust_decimal::Decimal,
    pub available: rust_decimal::Decimal,
    pub locked: rust_decimal::Decimal,
}
