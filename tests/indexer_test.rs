mod common;

use pravda_exchange::models::DepositStatus;

/// Exercises the exactly-once invariant the indexer relies on
/// (`chain_deposit_records.tx_hash` is `UNIQUE`): crediting the same chain
/// transaction hash twice must be rejected at the database layer even if
/// the indexer's own lookup-before-insert check were ever bypassed.
#[tokio::test]
async fn duplicate_tx_hash_is_rejected_by_the_schema() {
    let Some(pool) = common::pool().await else { return };
    let user = common::create_user(&pool).await;

    let insert = || {
        sqlx::query(
            r#"
            INSERT INTO chain_deposit_records
                (tx_hash, logical_time, sender_address, amount_chain_units, user_id, status)
            VALUES ('dup-hash-123', 1, 'EQsender', 1_000_000_000, $1, $2)
            "#,
        )
        .bind(user.id)
        .bind(DepositStatus::Credited)
    };

    insert().execute(&pool).await.unwrap();
    let second = insert().execute(&pool).await;

    assert!(second.is_err());
}

#[tokio::test]
async fn amount_chain_units_must_be_positive() {
    let Some(pool) = common::pool().await else { return };
    let user = common::create_user(&pool).await;

    let result = sqlx::query(
        r#"
        INSERT INTO chain_deposit_records
            (tx_hash, logical_time, sender_address, amount_chain_units, user_id, status)
        VALUES ('zero-amount', 1, 'EQsender', 0, $1, 'pending')
        "#,
    )
    .bind(user.id)
    .execute(&pool)
    .await;

    assert!(result.is_err());
}
