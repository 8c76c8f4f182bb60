//! Sync offset persistence port (driven/secondary port)
//!
//! The offset is the event time (nanoseconds) of the latest event known to be
//! fully processed, keyed by `(job name, watched root path)`.

/// Port trait for persisting replication progress
#[async_trait::async_trait]
pub trait IOffsetStore: Send + Sync {
    /// Reads the stored offset; `0` when nothing was stored yet
    async fn get_sync_offset(&self, job_name: &str, root_path: &str) -> anyhow::Result<i64>;

    /// Stores the offset for `(job_name, root_path)`
    async fn set_sync_offset(
        &self,
        job_name: &str,
        root_path: &str,
        ts_ns: i64,
    ) -> anyhow::Result<()>;
}
