//! SQLite implementation of IOffsetStore
//!
//! One row per `(job_name, root_path)`. Writes never lower a stored offset:
//! the upsert keeps the maximum of the stored and the incoming value, so a
//! job restarted with an explicit look-back cannot move progress backwards.
//!
//! | Column       | SQL Type | Content                          |
//! |--------------|----------|----------------------------------|
//! | job_name     | TEXT     | subscription client name         |
//! | root_path    | TEXT     | watched buckets directory        |
//! | ts_ns        | INTEGER  | event time in nanoseconds        |
//! | updated_at   | TEXT     | ISO 8601 via `to_rfc3339()`      |

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use bucketsync_core::ports::IOffsetStore;

use crate::CacheError;

/// A stored offset row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOffsetRecord {
    pub job_name: String,
    pub root_path: String,
    pub ts_ns: i64,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed offset store
pub struct SqliteOffsetStore {
    pool: SqlitePool,
}

impl SqliteOffsetStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All stored offsets, ordered by job and root
    ///
    /// # Errors
    /// `CacheError::QueryFailed` if the query fails or a row is malformed.
    pub async fn list_offsets(&self) -> Result<Vec<SyncOffsetRecord>, CacheError> {
        let rows = sqlx::query(
            "SELECT job_name, root_path, ts_ns, updated_at FROM sync_offsets \
             ORDER BY job_name, root_path",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }
}

fn row_to_record(row: &SqliteRow) -> Result<SyncOffsetRecord, CacheError> {
    let updated_at: String = row.try_get("updated_at")?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| CacheError::QueryFailed(format!("Invalid updated_at '{updated_at}': {e}")))?
        .with_timezone(&Utc);

    Ok(SyncOffsetRecord {
        job_name: row.try_get("job_name")?,
        root_path: row.try_get("root_path")?,
        ts_ns: row.try_get("ts_ns")?,
        updated_at,
    })
}

#[async_trait::async_trait]
impl IOffsetStore for SqliteOffsetStore {
    async fn get_sync_offset(&self, job_name: &str, root_path: &str) -> anyhow::Result<i64> {
        let ts_ns: Option<i64> = sqlx::query_scalar(
            "SELECT ts_ns FROM sync_offsets WHERE job_name = ? AND root_path = ?",
        )
        .bind(job_name)
        .bind(root_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(CacheError::from)?;

        Ok(ts_ns.unwrap_or(0))
    }

    async fn set_sync_offset(
        &self,
        job_name: &str,
        root_path: &str,
        ts_ns: i64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_offsets (job_name, root_path, ts_ns, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(job_name, root_path) DO UPDATE SET
                ts_ns = MAX(sync_offsets.ts_ns, excluded.ts_ns),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(job_name)
        .bind(root_path)
        .bind(ts_ns)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(CacheError::from)?;

        tracing::trace!(job = job_name, root = root_path, ts_ns, "Saved sync offset");
        Ok(())
    }
}
