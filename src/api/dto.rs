//! Request/response bodies for the HTTP boundary. Monetary amounts cross the
//! wire in the major unit; conversion to kopecks/bp happens here, once, via
//! [`crate::utils::money`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Outcome, Side};

/// Price/amount bounds and basis-point granularity are checked during
/// conversion in [`crate::utils::money`], not here — `rust_decimal::Decimal`
/// doesn't implement the numeric traits `validator`'s range check wants.
#[derive(Debug, Deserialize)]
pub struct PlaceBetRequest {
    pub market_id: i64,
    pub side: Side,
    pub price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub market_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTradesQuery {
    pub market_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderBookResponse {
    pub market_id: i64,
    pub yes: Vec<OrderBookLevel>,
    pub no: Vec<OrderBookLevel>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMarketBody {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub category: String,
    pub deadline: DateTime<Utc>,
    pub initial_yes_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ResolveMarketBody {
    pub outcome: Outcome,
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub market_id: i64,
    pub outcome: Outcome,
    pub winners_paid: usize,
    pub losers_count: usize,
    pub total_payout: Decimal,
    pub total_fees: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWithdrawalBody {
    #[validate(length(min = 1))]
    pub destination_address: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct LedgerHistoryQuery {
    pub limit: Option<i64>,
    pub before_id: Option<i64>,
}
