//! Remote storage port (driven/secondary port)
//!
//! This module defines the capability set the engine needs from a remote
//! object store (S3-compatible, GCS, Azure, ...). A client is resolved per
//! named [`RemoteConf`] through an [`IRemoteStorageFactory`].
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and don't need domain-level classification.
//! - Every operation must be idempotent: after a restart the engine replays
//!   the events that followed the last persisted offset.
//! - Retry and timeouts are the adapter's business.

use std::sync::Arc;

use crate::domain::{Entry, RemoteConf, RemoteEntry, RemoteStorageLocation};

use super::file_content::ContentReader;

/// Port trait for remote object storage operations
#[async_trait::async_trait]
pub trait IRemoteStorageClient: Send + Sync {
    /// Creates a bucket; succeeds if it already exists
    async fn create_bucket(&self, name: &str) -> anyhow::Result<()>;

    /// Deletes a bucket; succeeds if it does not exist
    async fn delete_bucket(&self, name: &str) -> anyhow::Result<()>;

    /// Materializes a directory at `location`
    async fn write_directory(
        &self,
        location: &RemoteStorageLocation,
        entry: &Entry,
    ) -> anyhow::Result<()>;

    /// Removes the directory at `location`
    async fn remove_directory(&self, location: &RemoteStorageLocation) -> anyhow::Result<()>;

    /// Uploads the content read from `reader` to `location`
    ///
    /// # Returns
    /// The identity the remote store assigned to the written object
    async fn write_file(
        &self,
        location: &RemoteStorageLocation,
        entry: &Entry,
        reader: ContentReader,
    ) -> anyhow::Result<RemoteEntry>;

    /// Deletes the object at `location`
    async fn delete_file(&self, location: &RemoteStorageLocation) -> anyhow::Result<()>;

    /// Updates object metadata without re-uploading content
    async fn update_file_metadata(
        &self,
        location: &RemoteStorageLocation,
        old_entry: &Entry,
        new_entry: &Entry,
    ) -> anyhow::Result<()>;

    /// Human-readable form of a location, used in logs
    fn format_location(&self, location: &RemoteStorageLocation) -> String {
        location.to_string()
    }
}

/// Resolves a client for a named remote configuration
pub trait IRemoteStorageFactory: Send + Sync {
    /// Builds (or returns a cached) client for `conf`
    ///
    /// # Errors
    /// Returns an error when the storage kind is unsupported or the
    /// configuration is incomplete.
    fn client(&self, conf: &RemoteConf) -> anyhow::Result<Arc<dyn IRemoteStorageClient>>;
}
