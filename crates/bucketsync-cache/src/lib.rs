//! BucketSync Cache - Local persistence of replication progress
//!
//! SQLite-based storage for the sync offset of each `(job name, watched
//! root)` pair.
//!
//! ## Architecture
//!
//! This crate implements the `IOffsetStore` port from `bucketsync-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteOffsetStore`] - `IOffsetStore` implementation
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use bucketsync_cache::{DatabasePool, SqliteOffsetStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/var/lib/bucketsync/offsets.db")).await?;
//! let offsets = SqliteOffsetStore::new(pool.pool().clone());
//! // Use offsets as IOffsetStore...
//! # Ok(())
//! # }
//! ```

pub mod offset_repository;
pub mod pool;

pub use offset_repository::{SqliteOffsetStore, SyncOffsetRecord};
pub use pool::DatabasePool;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
