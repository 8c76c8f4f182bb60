//! Bucket synchronization engine
//!
//! The [`BucketSyncEngine`] processes one metadata event at a time, strictly
//! in arrival order:
//!
//! 1. **Plan**: the [`Planner`] turns the event into configuration changes
//!    and remote actions against the current [`SyncState`]
//! 2. **Track**: configuration changes are applied to the state
//! 3. **Execute**: remote actions run one after another through the
//!    [`ActionExecutor`]
//!
//! The first failure aborts the event. The caller is expected to stop the
//! stream and resume from the last persisted offset; every remote operation
//! is safe to repeat.

use anyhow::{Context, Result};
use bucketsync_core::domain::newtypes::join_path;
use bucketsync_core::domain::MetadataEvent;
use tracing::debug;

use crate::classify::EventKind;
use crate::executor::ActionExecutor;
use crate::planner::Planner;
use crate::state::SyncState;

/// Single-worker event processor for one buckets root
pub struct BucketSyncEngine {
    planner: Planner,
    executor: ActionExecutor,
    state: SyncState,
}

impl BucketSyncEngine {
    pub fn new(planner: Planner, executor: ActionExecutor, state: SyncState) -> Self {
        Self {
            planner,
            executor,
            state,
        }
    }

    /// Current mapping table and remote registry
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Processes a single event to completion
    ///
    /// # Errors
    /// Planning or execution failures, with the event kind and path attached
    /// as context.
    pub async fn process_event(&mut self, event: &MetadataEvent) -> Result<()> {
        let plan = self
            .planner
            .plan(&self.state, event)
            .with_context(|| describe(event))?;

        if plan.is_empty() {
            debug!(ts_ns = event.ts_ns, event = %describe(event), "Nothing to do");
            return Ok(());
        }

        for change in plan.config_changes {
            self.state.apply(change);
        }

        for action in plan.actions {
            self.executor
                .execute(&mut self.state, action)
                .await
                .with_context(|| describe(event))?;
        }

        Ok(())
    }
}

/// `"<kind> <path>"` of an event, used for logs and error context
fn describe(event: &MetadataEvent) -> String {
    let kind = EventKind::of(event);
    match kind {
        EventKind::Noop => format!("{} {}", kind.label(), event.directory),
        EventKind::Created { dir, entry } | EventKind::Deleted { dir, entry } => {
            format!("{} {}", kind.label(), join_path(dir, &entry.name))
        }
        EventKind::SameLocationUpdate { dir, new, .. } => {
            format!("{} {}", kind.label(), join_path(dir, &new.name))
        }
        EventKind::CrossLocationChange {
            old_dir,
            old,
            new_dir,
            new,
        } => format!(
            "{} {} -> {}",
            kind.label(),
            join_path(old_dir, &old.name),
            join_path(new_dir, &new.name)
        ),
    }
}
