use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "market_outcome", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Yes,
    No,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Yes => write!(f, "yes"),
            Outcome::No => write!(f, "no"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Market {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub deadline: DateTime<Utc>,
    pub resolved: bool,
    pub outcome: Option<Outcome>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub yes_price_bp: i32,
    pub no_price_bp: i32,
    pub volume_kopecks: i64,
    pub created_at: DateTime<Utc>,
}

impl Market {
    pub fn yes_price_decimal(&self) -> rust_decimal::Decimal {
        rust_decimal::Decimal::new(self.yes_price_bp as i64, 4)
    }

    pub fn no_price_decimal(&self) -> rust_decimal::Decimal {
        rust_decimal::Decimal::new(self.no_price_bp as i64, 4)
    }

    pub fn volume_rubles(&self) -> rust_decimal::Decimal {
        rust_decimal::Decimal::new(self.volume_kopecks, 2)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMarketRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub deadline: DateTime<Utc>,
    pub initial_yes_price_bp: i32,
}

#[derive(Debug, Serialize)]
pub struct MarketResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub deadline: DateTime<Utc>,
    pub resolved: bool,
    pub outcome: Option<Outcome>,
    pub yes_price_bp: i32,
    pub no_price_bp: i32,
    pub volume_rubles: rust_decimal::Decimal,
}

impl From<Market> for MarketResponse {
    fn from(market: Market) -> Self {
        Self {
            id: market.id,
            title: market.title.clone(),
            description: market.description.clone(),
            category: market.category.clone(),
            deadline: market.deadline,
            resolved: market.resolved,
            outcome: market.outcome,
            yes_price_bp: market.yes_price_bp,
            no_price_bp: market.no_price_bp,
            volume_rubles: market.volume_rubles(),
        }
    }
}
