//! Filer metadata store port (driven/secondary port)
//!
//! Everything the engine reads from or writes back to the local metadata
//! service outside of the event stream: the configuration directory, the
//! persisted mount mapping table, and entry updates.
//!
//! ## Design Notes
//!
//! - `insert_mount_mapping` / `delete_mount_mapping` are read-modify-write
//!   operations on the mapping file; the resulting file change is also
//!   delivered on the event stream later.
//! - `update_entry` replaces the stored entry in `directory` by name.

use crate::domain::{Entry, FullPath, MountMappings, RemoteStorageLocation};

/// Port trait for the local metadata store
#[async_trait::async_trait]
pub trait IFilerStore: Send + Sync {
    /// Reads the full mount mapping table
    async fn read_mount_mappings(&self) -> anyhow::Result<MountMappings>;

    /// Lists all entries directly inside `directory`
    async fn list_entries(&self, directory: &str) -> anyhow::Result<Vec<Entry>>;

    /// Looks up a single entry by its full path
    async fn get_entry(&self, path: &FullPath) -> anyhow::Result<Option<Entry>>;

    /// Saves `entry` in `directory`, replacing the existing entry of the same name
    async fn update_entry(&self, directory: &str, entry: &Entry) -> anyhow::Result<()>;

    /// Adds or replaces the mapping for `bucket_path` in the persisted table
    async fn insert_mount_mapping(
        &self,
        bucket_path: &str,
        location: &RemoteStorageLocation,
    ) -> anyhow::Result<()>;

    /// Removes the mapping for `bucket_path` from the persisted table
    async fn delete_mount_mapping(&self, bucket_path: &str) -> anyhow::Result<()>;
}
