//! Event planner
//!
//! [`Planner::plan`] is the decision half of the engine: given the current
//! [`SyncState`] and one event it returns the configuration changes and
//! remote actions the event calls for, without touching any port. The
//! [`ActionExecutor`](crate::executor::ActionExecutor) applies the result.
//!
//! ## Tree events
//!
//! | Kind | Action |
//! |---|---|
//! | create | mkdir / upload, placeholders skipped |
//! | delete | rmdir / delete |
//! | update, same content | metadata update |
//! | update, new content | upload |
//! | rename / move | delete old side, create new side |
//!
//! Entries rejected by [`Entry::should_send_to_remote`] never produce an
//! upload or a metadata update.

use bucketsync_core::domain::newtypes::join_path;
use bucketsync_core::domain::{Entry, FullPath, MetadataEvent, RemoteConf, RemoteStorageLocation};
use tracing::debug;

use crate::classify::{route, EventKind, Route};
use crate::lifecycle::{plan_create_bucket, plan_delete_bucket};
use crate::state::{BucketContext, SyncState};
use crate::tracker::{ConfigChange, ConfigTracker};
use crate::SyncError;

// ============================================================================
// RemoteAction
// ============================================================================

/// A single remote side effect, carrying everything needed to perform it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAction {
    /// Create a remote bucket and record its mount mapping
    CreateBucket {
        remote: RemoteConf,
        bucket_path: FullPath,
        mount: RemoteStorageLocation,
    },
    /// Delete a remote bucket and drop its mount mapping
    DeleteBucket {
        remote: RemoteConf,
        bucket: String,
        bucket_path: FullPath,
    },
    WriteDirectory {
        remote: RemoteConf,
        location: RemoteStorageLocation,
        entry: Entry,
    },
    RemoveDirectory {
        remote: RemoteConf,
        location: RemoteStorageLocation,
    },
    /// Upload content, then write the remote identity back to `parent`
    WriteFile {
        remote: RemoteConf,
        location: RemoteStorageLocation,
        parent: String,
        entry: Entry,
    },
    DeleteFile {
        remote: RemoteConf,
        location: RemoteStorageLocation,
    },
    UpdateFileMetadata {
        remote: RemoteConf,
        location: RemoteStorageLocation,
        old_entry: Entry,
        new_entry: Entry,
    },
}

impl RemoteAction {
    /// Remote configuration the action runs against
    pub fn remote(&self) -> &RemoteConf {
        match self {
            Self::CreateBucket { remote, .. }
            | Self::DeleteBucket { remote, .. }
            | Self::WriteDirectory { remote, .. }
            | Self::RemoveDirectory { remote, .. }
            | Self::WriteFile { remote, .. }
            | Self::DeleteFile { remote, .. }
            | Self::UpdateFileMetadata { remote, .. } => remote,
        }
    }
}

// ============================================================================
// Plan
// ============================================================================

/// Outcome of planning one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Applied to the state before any action runs
    pub config_changes: Vec<ConfigChange>,
    /// Executed in order
    pub actions: Vec<RemoteAction>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.config_changes.is_empty() && self.actions.is_empty()
    }

    fn with_action(action: RemoteAction) -> Self {
        Self {
            config_changes: Vec::new(),
            actions: vec![action],
        }
    }
}

// ============================================================================
// Planner
// ============================================================================

/// Turns metadata events into plans
#[derive(Debug, Clone)]
pub struct Planner {
    tracker: ConfigTracker,
    create_bucket_at: Option<String>,
}

impl Planner {
    pub fn new(tracker: ConfigTracker, create_bucket_at: Option<String>) -> Self {
        Self {
            tracker,
            create_bucket_at,
        }
    }

    pub fn tracker(&self) -> &ConfigTracker {
        &self.tracker
    }

    /// Plans one event against `state`
    ///
    /// # Errors
    /// Configuration decode failures and unresolvable bucket lifecycle
    /// events. Unmapped tree events yield an empty plan instead.
    pub fn plan(&self, state: &SyncState, event: &MetadataEvent) -> Result<Plan, SyncError> {
        let buckets_dir = state.buckets_dir().as_str();

        match route(event, &self.tracker, buckets_dir) {
            Route::Config => Ok(Plan {
                config_changes: self.tracker.plan(event)?,
                actions: Vec::new(),
            }),
            Route::BucketCreated(entry) => Ok(self
                .create_bucket(state, entry)?
                .map(Plan::with_action)
                .unwrap_or_default()),
            Route::BucketDeleted(entry) => Ok(plan_delete_bucket(state, entry)?
                .map(Plan::with_action)
                .unwrap_or_default()),
            Route::BucketRenamed { old, new } => {
                let actions = self
                    .create_bucket(state, new)?
                    .into_iter()
                    .chain(plan_delete_bucket(state, old)?)
                    .collect();
                Ok(Plan {
                    config_changes: Vec::new(),
                    actions,
                })
            }
            Route::Tree(kind) => Ok(Plan {
                config_changes: Vec::new(),
                actions: plan_tree(state, kind)?,
            }),
        }
    }

    fn create_bucket(
        &self,
        state: &SyncState,
        entry: &Entry,
    ) -> Result<Option<RemoteAction>, SyncError> {
        plan_create_bucket(state, entry, self.create_bucket_at.as_deref())
    }
}

/// Plans an event inside the bucket tree
fn plan_tree(state: &SyncState, kind: EventKind<'_>) -> Result<Vec<RemoteAction>, SyncError> {
    let mut actions = Vec::new();

    match kind {
        EventKind::Noop => {}

        EventKind::Created { dir, entry } => {
            if entry.is_placeholder() {
                debug!(dir, name = %entry.name, "Skipping entry without data");
                return Ok(actions);
            }
            let Some(ctx) = state.detect_bucket(dir) else {
                return Ok(actions);
            };
            actions.extend(plan_write(&ctx, dir, entry)?);
        }

        EventKind::Deleted { dir, entry } => {
            if let Some(ctx) = state.detect_bucket(dir) {
                actions.push(plan_remove(&ctx, dir, entry)?);
            }
        }

        EventKind::SameLocationUpdate { dir, old, new } => {
            let Some(ctx) = state.detect_bucket(dir) else {
                return Ok(actions);
            };
            if !new.should_send_to_remote() {
                debug!(dir, name = %new.name, "Skipping update of entry already in remote storage");
                return Ok(actions);
            }
            if new.is_directory {
                // directory attributes are not replicated
                debug!(dir, name = %new.name, "Ignoring directory metadata update");
                return Ok(actions);
            }
            let location = locate(&ctx, dir, &new.name)?;
            if old.is_same_data(new) {
                actions.push(RemoteAction::UpdateFileMetadata {
                    remote: ctx.remote,
                    location,
                    old_entry: old.clone(),
                    new_entry: new.clone(),
                });
            } else {
                actions.push(RemoteAction::WriteFile {
                    remote: ctx.remote,
                    location,
                    parent: dir.to_string(),
                    entry: new.clone(),
                });
            }
        }

        EventKind::CrossLocationChange {
            old_dir,
            old,
            new_dir,
            new,
        } => {
            if let Some(ctx) = state.detect_bucket(old_dir) {
                actions.push(plan_remove(&ctx, old_dir, old)?);
            }
            if let Some(ctx) = state.detect_bucket(new_dir) {
                actions.extend(plan_write(&ctx, new_dir, new)?);
            }
        }
    }

    Ok(actions)
}

/// Creation side: mkdir or upload, unless the entry is filtered out
fn plan_write(
    ctx: &BucketContext,
    dir: &str,
    entry: &Entry,
) -> Result<Option<RemoteAction>, SyncError> {
    if !entry.should_send_to_remote() {
        debug!(dir, name = %entry.name, "Skipping entry already in remote storage");
        return Ok(None);
    }
    let location = locate(ctx, dir, &entry.name)?;
    let action = if entry.is_directory {
        RemoteAction::WriteDirectory {
            remote: ctx.remote.clone(),
            location,
            entry: entry.clone(),
        }
    } else {
        RemoteAction::WriteFile {
            remote: ctx.remote.clone(),
            location,
            parent: dir.to_string(),
            entry: entry.clone(),
        }
    };
    Ok(Some(action))
}

/// Deletion side: rmdir or delete
fn plan_remove(ctx: &BucketContext, dir: &str, entry: &Entry) -> Result<RemoteAction, SyncError> {
    let location = locate(ctx, dir, &entry.name)?;
    Ok(if entry.is_directory {
        RemoteAction::RemoveDirectory {
            remote: ctx.remote.clone(),
            location,
        }
    } else {
        RemoteAction::DeleteFile {
            remote: ctx.remote.clone(),
            location,
        }
    })
}

fn locate(ctx: &BucketContext, dir: &str, name: &str) -> Result<RemoteStorageLocation, SyncError> {
    let path = FullPath::new(join_path(dir, name))?;
    ctx.location_of(&path)
        .ok_or_else(|| SyncError::NotMounted(path.to_string()))
}
