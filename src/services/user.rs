//! User resolution: the core only ever receives an external chat-platform
//! id (session validation is a boundary concern); this maps it to the
//! internal user row, creating a nameless placeholder on first sight. Used
//! both by the HTTP boundary (on every authenticated request) and by the
//! deposit indexer (a deposit may arrive before the user ever logs in).

use sqlx::PgPool;

use crate::error::CoreError;
use crate::models::User;

pub async fn find_or_create_by_external_id(pool: &PgPool, external_id: i64) -> Result<User, CoreError> {
    if let Some(user) = find_by_external_id(pool, external_id).await? {
        return Ok(user);
    }

    let user: User = sqlx::query_as(
        "INSERT INTO users (external_id, display_name) VALUES ($1, NULL) \
         ON CONFLICT (external_id) DO UPDATE SET external_id = EXCLUDED.external_id \
         RETURNING *",
    )
    .bind(external_id)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_external_id(pool: &PgPool, external_id: i64) -> Result<Option<User>, CoreError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE external_id = $1")
        .bind(external_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}
