//! Remote action executor
//!
//! Applies planned [`RemoteAction`]s against the remote storage, file content
//! and filer ports. Every mutation is logged at `info` level with the
//! client's formatted location.

use std::sync::Arc;

use bucketsync_core::domain::newtypes::join_path;
use bucketsync_core::domain::{Entry, RemoteStorageLocation};
use bucketsync_core::ports::{
    IFileContentSource, IFilerStore, IRemoteStorageClient, IRemoteStorageFactory,
};
use chrono::Utc;
use tracing::{debug, info};

use crate::planner::RemoteAction;
use crate::state::SyncState;
use crate::SyncError;

/// Current time in nanoseconds since the Unix epoch
pub(crate) fn now_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Runs remote actions one at a time
pub struct ActionExecutor {
    factory: Arc<dyn IRemoteStorageFactory>,
    content: Arc<dyn IFileContentSource>,
    filer: Arc<dyn IFilerStore>,
}

impl ActionExecutor {
    pub fn new(
        factory: Arc<dyn IRemoteStorageFactory>,
        content: Arc<dyn IFileContentSource>,
        filer: Arc<dyn IFilerStore>,
    ) -> Self {
        Self {
            factory,
            content,
            filer,
        }
    }

    /// Executes one action
    ///
    /// Bucket lifecycle actions also update the persisted mount mapping file
    /// and the in-memory table in `state`.
    ///
    /// # Errors
    /// The first failing port call aborts the action.
    pub async fn execute(&self, state: &mut SyncState, action: RemoteAction) -> Result<(), SyncError> {
        let client = self.factory.client(action.remote()).map_err(|source| {
            SyncError::RemoteOperation {
                operation: "connect",
                location: action.remote().name.clone(),
                source,
            }
        })?;

        match action {
            RemoteAction::CreateBucket {
                bucket_path, mount, ..
            } => {
                info!(remote = %mount.name, "create bucket {}", mount.bucket);
                client
                    .create_bucket(&mount.bucket)
                    .await
                    .map_err(|source| remote_err("create bucket", mount.bucket.clone(), source))?;
                self.filer
                    .insert_mount_mapping(bucket_path.as_str(), &mount)
                    .await
                    .map_err(|source| SyncError::MetadataUpdate {
                        path: bucket_path.to_string(),
                        source,
                    })?;
                state.insert_mapping(&bucket_path, mount);
            }

            RemoteAction::DeleteBucket {
                bucket,
                bucket_path,
                remote,
            } => {
                info!(remote = %remote.name, "delete bucket {bucket}");
                client
                    .delete_bucket(&bucket)
                    .await
                    .map_err(|source| remote_err("delete bucket", bucket.clone(), source))?;
                self.filer
                    .delete_mount_mapping(bucket_path.as_str())
                    .await
                    .map_err(|source| SyncError::MetadataUpdate {
                        path: bucket_path.to_string(),
                        source,
                    })?;
                state.remove_mapping(&bucket_path);
            }

            RemoteAction::WriteDirectory {
                location, entry, ..
            } => {
                let dest = client.format_location(&location);
                info!("mkdir  {dest}");
                client
                    .write_directory(&location, &entry)
                    .await
                    .map_err(|source| remote_err("mkdir", dest, source))?;
            }

            RemoteAction::RemoveDirectory { location, .. } => {
                let dest = client.format_location(&location);
                info!("rmdir  {dest}");
                client
                    .remove_directory(&location)
                    .await
                    .map_err(|source| remote_err("rmdir", dest, source))?;
            }

            RemoteAction::WriteFile {
                location,
                parent,
                entry,
                ..
            } => {
                self.write_file(client.as_ref(), &location, &parent, &entry)
                    .await?;
            }

            RemoteAction::DeleteFile { location, .. } => {
                let dest = client.format_location(&location);
                info!("delete {dest}");
                client
                    .delete_file(&location)
                    .await
                    .map_err(|source| remote_err("delete", dest, source))?;
            }

            RemoteAction::UpdateFileMetadata {
                location,
                old_entry,
                new_entry,
                ..
            } => {
                let dest = client.format_location(&location);
                debug!("update meta {dest}");
                client
                    .update_file_metadata(&location, &old_entry, &new_entry)
                    .await
                    .map_err(|source| remote_err("update metadata", dest, source))?;
            }
        }

        Ok(())
    }

    /// Streams content to the remote, then records the remote identity locally
    async fn write_file(
        &self,
        client: &dyn IRemoteStorageClient,
        location: &RemoteStorageLocation,
        parent: &str,
        entry: &Entry,
    ) -> Result<(), SyncError> {
        let dest = client.format_location(location);
        let path = join_path(parent, &entry.name);

        let reader = self
            .content
            .open(entry)
            .await
            .map_err(|source| SyncError::ContentRead {
                path: path.clone(),
                source,
            })?;

        info!("create {dest}");
        let remote_entry = client
            .write_file(location, entry, reader)
            .await
            .map_err(|source| remote_err("create", dest, source))?;

        let synced = entry.with_remote_entry(remote_entry, now_ns());
        self.filer
            .update_entry(parent, &synced)
            .await
            .map_err(|source| SyncError::MetadataUpdate { path, source })
    }
}

fn remote_err(operation: &'static str, location: String, source: anyhow::Error) -> SyncError {
    SyncError::RemoteOperation {
        operation,
        location,
        source,
    }
}
