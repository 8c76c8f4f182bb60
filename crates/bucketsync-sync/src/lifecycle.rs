//! Bucket lifecycle
//!
//! Directories created or deleted directly under the buckets root become
//! remote buckets. Unlike ordinary tree events, failing to resolve the
//! remote for a lifecycle event is an error: someone asked for a bucket on
//! a specific remote.

use bucketsync_core::domain::{Entry, RemoteStorageLocation};
use tracing::debug;

use crate::planner::RemoteAction;
use crate::state::SyncState;
use crate::SyncError;

/// Plans the creation of a bucket for a new top-level directory
///
/// The bucket is created on the `create_bucket_at` remote and mounted at
/// its root. Files created directly under the buckets root are ignored.
///
/// # Errors
/// [`SyncError::NoCreateTarget`] when no target remote is configured and
/// [`SyncError::UnknownRemote`] when the target remote is not registered.
pub fn plan_create_bucket(
    state: &SyncState,
    entry: &Entry,
    create_bucket_at: Option<&str>,
) -> Result<Option<RemoteAction>, SyncError> {
    if !entry.is_directory {
        debug!(name = %entry.name, "Ignoring file under buckets root");
        return Ok(None);
    }

    let target = create_bucket_at.ok_or_else(|| SyncError::NoCreateTarget(entry.name.clone()))?;
    let remote = state
        .remote_conf(target)
        .ok_or_else(|| SyncError::UnknownRemote(target.to_string()))?;

    Ok(Some(RemoteAction::CreateBucket {
        remote: remote.clone(),
        bucket_path: state.buckets_dir().child(&entry.name),
        mount: RemoteStorageLocation::new(target, entry.name.clone(), "/"),
    }))
}

/// Plans the deletion of the bucket behind a removed top-level directory
///
/// # Errors
/// [`SyncError::NotMounted`] or [`SyncError::UnconfiguredRemote`] when the
/// bucket cannot be resolved.
pub fn plan_delete_bucket(
    state: &SyncState,
    entry: &Entry,
) -> Result<Option<RemoteAction>, SyncError> {
    if !entry.is_directory {
        debug!(name = %entry.name, "Ignoring file under buckets root");
        return Ok(None);
    }

    let ctx = state.resolve_bucket(&entry.name)?;
    Ok(Some(RemoteAction::DeleteBucket {
        remote: ctx.remote,
        bucket: entry.name.clone(),
        bucket_path: ctx.bucket_path,
    }))
}
