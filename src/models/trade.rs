use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One fill between a YES order and a NO order.
///
/// Settlement invariant (also a stored CHECK constraint):
/// `yes_cost_kopecks + no_cost_kopecks == amount_kopecks`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trade {
    pub id: i64,
    pub market_id: i64,
    pub yes_order_id: i64,
    pub no_order_id: i64,
    pub price_bp: i32,
    pub amount_kopecks: i64,
    pub yes_cost_kopecks: i64,
    pub no_cost_kopecks: i64,
    pub created_at: DateTime<Utc>,
}

impl Trade {
    pub fn settlement_invariant_holds(&self) -> bool {
        self.yes_cost_kopecks >= 0
            && self.no_cost_kopecks >= 0
            && self.amount_kopecks >= 0
            && self.yes_cost_kopecks + self.no_cost_kopecks == self.amount_kopecks
    }
}
