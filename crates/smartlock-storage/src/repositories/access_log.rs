#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::AccessLog;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository for the access attempt audit trail.
///
/// Uses native async trait methods (Edition 2024), so no `async-trait`.
pub trait AccessLogRepository: Send + Sync {
    /// Append an entry, returning its id.
    async fn create(&self, log: &AccessLog) -> StorageResult<i64>;

    /// Most recent entries first.
    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>>;

    /// Most recent denied entries first.
    async fn find_recent_denied(&self, limit: i64) -> StorageResult<Vec<AccessLog>>;

    /// Entries for one card UID or barcode.
    async fn find_by_credential(
        &self,
        credential: &str,
        limit: i64,
    ) -> StorageResult<Vec<AccessLog>>;

    /// Denied attempts at or after `since`.
    async fn count_denied_since(&self, since: DateTime<Utc>) -> StorageResult<i64>;
}

/// SQLite implementation of [`AccessLogRepository`].
#[derive(Debug, Clone)]
pub struct SqliteAccessLogRepository {
    pool: SqlitePool,
}

impl SqliteAccessLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AccessLogRepository for SqliteAccessLogRepository {
    async fn create(&self, log: &AccessLog) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO access_logs (
                credential_kind, credential, granted,
                display_message, timestamp, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.credential_kind)
        .bind(&log.credential)
        .bind(log.granted)
        .bind(&log.display_message)
        .bind(log.timestamp)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, credential_kind, credential, granted,
                   display_message, timestamp, created_at
            FROM access_logs
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_recent_denied(&self, limit: i64) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, credential_kind, credential, granted,
                   display_message, timestamp, created_at
            FROM access_logs
            WHERE granted = 0
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_credential(
        &self,
        credential: &str,
        limit: i64,
    ) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, credential_kind, credential, granted,
                   display_message, timestamp, created_at
            FROM access_logs
            WHERE credential = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(credential)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn count_denied_since(&self, since: DateTime<Utc>) -> StorageResult<i64> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM access_logs WHERE granted = 0 AND timestamp >= ?",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }
}
