//! SQLite pool for the offset database
//!
//! File databases run in WAL mode with a busy timeout so the sync runner and
//! a status reader can share one file. Schema migrations are recorded in
//! `schema_migrations` and each one is applied at most once per database.

use std::path::Path;
use std::time::Duration;

use bucketsync_core::config::OffsetConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

/// Ordered `(name, sql)` pairs
const MIGRATIONS: &[(&str, &str)] = &[(
    "20261016_sync_offsets",
    include_str!("migrations/20261016_sync_offsets.sql"),
)];

const MIGRATION_LEDGER: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (\
    name TEXT PRIMARY KEY NOT NULL, \
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP)";

const FILE_POOL_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated connection pool
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (creating if needed) the database file at `db_path`
    ///
    /// # Errors
    ///
    /// `CacheError::ConnectionFailed` if the parent directory or the
    /// connection cannot be created, `CacheError::MigrationFailed` if the
    /// schema cannot be brought up to date.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(FILE_POOL_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to open offset database {}: {e}",
                    db_path.display()
                ))
            })?;

        let applied = Self::migrate(&pool).await?;
        tracing::info!(path = %db_path.display(), applied, "Offset database ready");

        Ok(Self { pool })
    }

    /// Opens the database named by the `offset` configuration section
    ///
    /// # Errors
    ///
    /// See [`DatabasePool::new`].
    pub async fn from_config(config: &OffsetConfig) -> Result<Self, CacheError> {
        Self::new(&config.database).await
    }

    /// Private in-memory database, used by tests
    ///
    /// Limited to one connection: every SQLite in-memory connection is its
    /// own database.
    ///
    /// # Errors
    ///
    /// See [`DatabasePool::new`].
    pub async fn in_memory() -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies pending migrations, returning how many ran
    async fn migrate(pool: &SqlitePool) -> Result<usize, CacheError> {
        let failed = |name: &str, e: sqlx::Error| {
            CacheError::MigrationFailed(format!("Failed to run migration {name}: {e}"))
        };

        sqlx::raw_sql(MIGRATION_LEDGER)
            .execute(pool)
            .await
            .map_err(|e| failed("schema_migrations", e))?;

        let mut applied = 0;
        for &(name, sql) in MIGRATIONS {
            let done: Option<String> =
                sqlx::query_scalar("SELECT name FROM schema_migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| failed(name, e))?;
            if done.is_some() {
                continue;
            }

            let mut tx = pool.begin().await.map_err(|e| failed(name, e))?;
            sqlx::raw_sql(sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| failed(name, e))?;
            sqlx::query("INSERT INTO schema_migrations (name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(|e| failed(name, e))?;
            tx.commit().await.map_err(|e| failed(name, e))?;

            tracing::debug!(migration = name, "Applied migration");
            applied += 1;
        }

        Ok(applied)
    }
}
