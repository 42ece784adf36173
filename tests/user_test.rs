mod common;

use pravda_exchange::services::user::{find_by_external_id, find_or_create_by_external_id};

#[tokio::test]
async fn first_sight_creates_a_placeholder_user() {
    let Some(pool) = common::pool().await else { return };
    let external_id = 424_242_424_242i64;

    assert!(find_by_external_id(&pool, external_id).await.unwrap().is_none());

    let created = find_or_create_by_external_id(&pool, external_id).await.unwrap();
    assert_eq!(created.external_id, external_id);
    assert!(created.display_name.is_none());
}

#[tokio::test]
async fn repeated_lookups_return_the_same_internal_id() {
    let Some(pool) = common::pool().await else { return };
    let external_id = 424_242_424_243i64;

    let first = find_or_create_by_external_id(&pool, external_id).await.unwrap();
    let second = find_or_create_by_external_id(&pool, external_id).await.unwrap();

    assert_eq!(first.id, second.id);
}
