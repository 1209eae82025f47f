//! Integration tests for the access log database.
//!
//! Run with: cargo test --package smartlock-storage --test integration_database

use chrono::Utc;
use smartlock_core::CardUid;
use smartlock_storage::{
    AccessLog, AccessLogRepository, Database, DatabaseConfig, SqliteAccessLogRepository,
};
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_concurrent_log_writers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("access.db");
    let db = Database::new(DatabaseConfig::new(&path).max_connections(4))
        .await
        .unwrap();

    const NUM_CONCURRENT_TASKS: usize = 10;
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS));

    let mut handles = vec![];

    for i in 0..NUM_CONCURRENT_TASKS {
        let repo = SqliteAccessLogRepository::new(db.pool().clone());
        let barrier_clone = barrier.clone();

        let handle = tokio::spawn(async move {
            barrier_clone.wait().await;

            let log = AccessLog::card(
                CardUid::new([i as u8, 0, 0, 0]),
                i % 2 == 0,
                "ACCESS GRANTED",
                Utc::now(),
            );
            repo.create(&log).await.unwrap()
        });

        handles.push(handle);
    }

    let results: Vec<_> = futures::future::join_all(handles).await;
    let mut ids: Vec<i64> = results.into_iter().map(|r| r.unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), NUM_CONCURRENT_TASKS);

    let repo = SqliteAccessLogRepository::new(db.pool().clone());
    assert_eq!(repo.find_recent(100).await.unwrap().len(), NUM_CONCURRENT_TASKS);
    assert_eq!(
        repo.find_recent_denied(100).await.unwrap().len(),
        NUM_CONCURRENT_TASKS / 2
    );

    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='access_logs'",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(result.0, 1);

    db.close().await;
}

#[tokio::test]
async fn test_log_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("access.db");

    let db = Database::new(DatabaseConfig::new(&path))
        .await
        .unwrap();
    SqliteAccessLogRepository::new(db.pool().clone())
        .create(&AccessLog::pin(false, "ACCESS DENIED", Utc::now()))
        .await
        .unwrap();
    db.close().await;

    let db = Database::new(DatabaseConfig::new(&path))
        .await
        .unwrap();
    let logs = SqliteAccessLogRepository::new(db.pool().clone())
        .find_recent(10)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].was_denied());
    db.close().await;
}

#[tokio::test]
async fn test_credential_kind_is_constrained() {
    let db = Database::in_memory().await.unwrap();

    let result = sqlx::query(
        "INSERT INTO access_logs (credential_kind, granted, timestamp) VALUES ('fingerprint', 1, ?)",
    )
    .bind(Utc::now())
    .execute(db.pool())
    .await;

    assert!(result.is_err());
    db.close().await;
}
