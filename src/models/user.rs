use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user identified by an external chat-platform id (e.g. a Telegram user id).
///
/// Carries no balance field — balance is always derived from the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub external_id: i64,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub external_id: i64,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            external_id: user.external_id,
            display_name: user.display_name,
            created_at: user.created_at,
        }
    }
}
