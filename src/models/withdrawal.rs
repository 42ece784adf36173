use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "withdrawal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WithdrawalRequest {
    pub id: i64,
    pub user_id: i64,
    pub destination_address: String,
    pub amount_kopecks: i64,
    pub status: WithdrawalStatus,
    pub chain_tx_hash: Option<String>,
    pub error_message: Option<String>,
    pub ledger_entry_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWithdrawalRequest {
    pub destination_address: String,
    pub amount: rust_decimal::Decimal,
}

#[derive(Debug, Serialize)]
pub struct WithdrawalResponse {
    pub id: i64,
    pub destination_address: String,
    pub amount: rust_decimal::Decimal,
    pub status: WithdrawalStatus,
    pub chain_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<WithdrawalRequest> for WithdrawalResponse {
    fn from(w: WithdrawalRequest) -> Self {
        Self {
            id: w.id,
            destination_address: w.destination_address.clone(),
            amount: rust_decimal::Decimal::new(w.amount_kopecks, 2),
            status: w.status,
            chain_tx_hash: w.chain_tx_hash,
            created_at: w.created_at,
        }
    }
}
