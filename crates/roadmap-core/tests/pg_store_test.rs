//! Integration tests for `PgRoadmapStore`.
//!
//! These run against the shared PostgreSQL test container from
//! `roadmap-test-utils` (or `ROADMAP_TEST_PG_URL` when set). Each test gets
//! its own temporary database.

use chrono::Utc;

use roadmap_core::service;
use roadmap_core::store::{PgRoadmapStore, RoadmapStore};
use roadmap_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn fetch_missing_row() {
    let (pool, db_name) = create_test_db().await;
    let store = PgRoadmapStore::new(pool.clone());

    assert!(store.fetch("nobody").await.unwrap().is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn plan_and_progress_round_trip() {
    let (pool, db_name) = create_test_db().await;
    let store = PgRoadmapStore::new(pool.clone());

    store.save_plan("u1", "raw plan").await.unwrap();
    store.save_progress("u1", "{}").await.unwrap();

    let row = store.fetch("u1").await.unwrap().unwrap();
    assert_eq!(row.plan_raw.as_deref(), Some("raw plan"));
    assert_eq!(row.progress_raw.as_deref(), Some("{}"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn service_completion_against_postgres() {
    let (pool, db_name) = create_test_db().await;
    let store = PgRoadmapStore::new(pool.clone());

    service::store_plan(
        &store,
        "u1",
        r#"{"northstar":"x","monthly_plan":[{"focus":"A"}]}"#,
    )
    .await
    .unwrap();
    service::complete_milestone(&store, "u1", 1, Utc::now())
        .await
        .unwrap();
    service::complete_milestone(&store, "u1", 4, Utc::now())
        .await
        .unwrap();

    let view = service::load_roadmap(&store, "u1").await.unwrap();
    assert_eq!(view.plan.unwrap().milestones()[0].focus, "A");
    assert_eq!(view.progress.milestones_completed, vec![1, 4]);
    assert_eq!(view.progress.current_milestone, 5);

    pool.close().await;
    drop_test_db(&db_name).await;
}
