use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_side", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => write!(f, "yes"),
            Side::No => write!(f, "no"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Partial,
    Filled,
    Cancelled,
}

impl OrderStatus {
    /// Status implied purely by the fill ratio; cancellation is set elsewhere.
    pub fn from_fill(filled_kopecks: i64, amount_kopecks: i64) -> Self {
        if filled_kopecks <= 0 {
            OrderStatus::Open
        } else if filled_kopecks >= amount_kopecks {
            OrderStatus::Filled
        } else {
            OrderStatus::Partial
        }
    }

    pub fn is_resting(self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::Partial)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub market_id: i64,
    pub side: Side,
    pub price_bp: i32,
    pub amount_kopecks: i64,
    pub filled_kopecks: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn remaining_kopecks(&self) -> i64 {
        self.amount_kopecks - self.filled_kopecks
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSummary {
    pub trade_id: i64,
    pub amount: rust_decimal::Decimal,
    pub price: rust_decimal::Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: i64,
    pub market_id: i64,
    pub side: Side,
    pub price: rust_decimal::Decimal,
    pub amount: rust_decimal::Decimal,
    pub filled: rust_decimal::Decimal,
    pub status: OrderStatus,
    pub trades: Vec<TradeSummary>,
    pub created_at: DateTime<Utc>,
}

impl OrderResponse {
    pub fn from_order(order: Order, trades: Vec<TradeSummary>) -> Self {
        Self {
            order_id: order.id,
            market_id: order.market_id,
            side: order.side,
            price: rust_decimal::Decimal::new(order.price_bp as i64, 4),
            amount: rust_decimal::Decimal::new(order.amount_kopecks, 2),
            filled: rust_decimal::Decimal::new(order.filled_kopecks, 2),
            status: order.status,
            trades,
            created_at: order.created_at,
        }
    }
}
