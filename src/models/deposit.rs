use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "deposit_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Confirmed,
    Credited,
    Failed,
}

/// A single inbound chain transaction, keyed for exactly-once crediting by
/// the unique index on `tx_hash`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChainDepositRecord {
    pub id: i64,
    pub tx_hash: String,
    pub logical_time: i64,
    pub sender_address: String,
    pub amount_chain_units: i64,
    pub user_id: i64,
    pub status: DepositStatus,
    pub ledger_entry_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
