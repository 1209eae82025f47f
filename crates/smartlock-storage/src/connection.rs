//! SQLite pool for the access log.
//!
//! The lock writes one row per credential check and the admin panel reads
//! the most recent ones, so the pool stays small. WAL lets those readers run
//! while the runtime appends.

use crate::error::{StorageError, StorageResult};
use sqlx::ConnectOptions;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Where the access log lives and how the pool behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub path: PathBuf,

    /// Runtime writer plus admin panel readers.
    pub max_connections: u32,

    /// How long a statement waits on a locked database.
    pub busy_timeout: Duration,

    pub create_if_missing: bool,

    /// Apply pending migrations when the pool opens.
    pub migrate_on_open: bool,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            create_if_missing: true,
            migrate_on_open: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn migrate_on_open(mut self, migrate: bool) -> Self {
        self.migrate_on_open = migrate;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(self.create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .disable_statement_logging()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("smartlock.db")
    }
}

/// Handle to the access log database.
///
/// Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (and by default create and migrate) the database file.
    ///
    /// ```no_run
    /// use smartlock_storage::{Database, DatabaseConfig};
    ///
    /// # async fn open() -> smartlock_storage::StorageResult<()> {
    /// let db = Database::new(DatabaseConfig::new("/var/lib/smartlock/access.db")).await?;
    /// db.close().await;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Fails if the parent directory cannot be created, the file cannot be
    /// opened or a migration fails.
    pub async fn new(config: DatabaseConfig) -> StorageResult<Self> {
        ensure_parent_dir(&config.path)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await?;
        let db = Self { pool };

        if config.migrate_on_open {
            db.migrate().await?;
        }

        info!(path = %config.path.display(), "Access log database opened");
        Ok(db)
    }

    /// A private in-memory database, already migrated.
    ///
    /// Uses a single connection: every connection to `:memory:` would
    /// otherwise see its own empty database.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the workspace migrations. Already-applied ones are skipped.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        debug!("Access log schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for in-flight queries, then close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Configuration(format!(
                    "cannot create {}: {e}",
                    parent.display()
                ))
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, PathBuf::from("smartlock.db"));
        assert_eq!(config.max_connections, 4);
        assert!(config.create_if_missing);
        assert!(config.migrate_on_open);
    }

    #[test]
    fn test_config_builder() {
        let config = DatabaseConfig::new("access.db")
            .max_connections(0)
            .busy_timeout(Duration::from_millis(250))
            .create_if_missing(false)
            .migrate_on_open(false);

        assert_eq!(config.max_connections, 1);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.create_if_missing);
        assert!(!config.migrate_on_open);
    }

    #[tokio::test]
    async fn test_in_memory_database_is_healthy() {
        let db = Database::in_memory().await.unwrap();
        db.health_check().await.unwrap();
        db.close().await;
    }

    #[tokio::test]
    async fn test_file_database_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("access.db");

        let db = Database::new(DatabaseConfig::new(&path)).await.unwrap();
        db.health_check().await.unwrap();
        assert!(path.exists());
        db.close().await;
    }

    #[tokio::test]
    async fn test_missing_file_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::new(dir.path().join("absent.db")).create_if_missing(false);
        assert!(Database::new(config).await.is_err());
    }
}
