//! Shared setup for the integration suite. Every test in `tests/` needs a
//! live Postgres database with the migrations applied; tests are skipped
//! (not failed) when `DATABASE_URL` isn't set so the suite stays runnable
//! in environments without a database.

use fake::faker::lorem::en::Sentence;
use fake::Fake;
use pravda_exchange::models::User;
use sqlx::PgPool;

pub async fn pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to DATABASE_URL");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    Some(pool)
}

/// Creates a fresh user with a random external id so tests never collide on
/// the `external_id` unique constraint when run concurrently.
pub async fn create_user(pool: &PgPool) -> User {
    let external_id: i64 = rand_external_id();
    sqlx::query_as::<_, User>(
        "INSERT INTO users (external_id, display_name) VALUES ($1, NULL) RETURNING *",
    )
    .bind(external_id)
    .fetch_one(pool)
    .await
    .expect("failed to create test user")
}

fn rand_external_id() -> i64 {
    use std::sync::atomic::{AtomicI64, Ordering};
    static COUNTER: AtomicI64 = AtomicI64::new(1);
    // Offset well clear of any external ids a developer might use by hand
    // when poking at a local database alongside the suite.
    1_000_000_000 + COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// The title and description are random prose — no assertion in the suite
/// depends on their content, only on the row existing with the given price.
pub async fn create_market(pool: &PgPool, yes_price_bp: i32) -> i64 {
    let title: String = Sentence(3..6).fake();
    let description: String = Sentence(8..15).fake();

    sqlx::query_scalar(
        r#"
        INSERT INTO markets (title, description, category, deadline, yes_price_bp, no_price_bp)
        VALUES ($1, $2, $3, now() + interval '7 days', $4, $5)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(description)
    .bind("weather")
    .bind(yes_price_bp)
    .bind(10_000 - yes_price_bp)
    .fetch_one(pool)
    .await
    .expect("failed to create test market")
}

pub async fn credit_deposit(pool: &PgPool, user_id: i64, amount_kopecks: i64) {
    sqlx::query(
        "INSERT INTO ledger_entries (user_id, amount_kopecks, entry_type) VALUES ($1, $2, 'deposit')",
    )
    .bind(user_id)
    .bind(amount_kopecks)
    .execute(pool)
    .await
    .expect("failed to seed deposit");
}
