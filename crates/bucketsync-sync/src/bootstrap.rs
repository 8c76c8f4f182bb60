//! Configuration bootstrap
//!
//! Loads the mount mapping table and every remote configuration entry before
//! the subscription starts. Any failure here is fatal: streaming with a
//! partial view of the configuration would silently skip mapped buckets.

use bucketsync_core::domain::FullPath;
use bucketsync_core::ports::IFilerStore;
use tracing::{debug, info};

use crate::state::SyncState;
use crate::tracker::ConfigTracker;
use crate::SyncError;

/// Builds the initial [`SyncState`] from the filer
///
/// # Errors
/// Returns [`SyncError::Bootstrap`] if the mapping table or the configuration
/// directory cannot be read, or if any remote configuration entry fails to
/// decode.
#[tracing::instrument(skip(filer, tracker), fields(config_dir = %tracker.config_dir()))]
pub async fn bootstrap(
    filer: &dyn IFilerStore,
    tracker: &ConfigTracker,
    buckets_dir: FullPath,
) -> Result<SyncState, SyncError> {
    let mappings = filer
        .read_mount_mappings()
        .await
        .map_err(|source| SyncError::Bootstrap {
            stage: "reading mount mappings",
            source,
        })?;

    let entries = filer
        .list_entries(tracker.config_dir())
        .await
        .map_err(|source| SyncError::Bootstrap {
            stage: "listing remote storage configurations",
            source,
        })?;

    let mut remote_confs = Vec::new();
    for entry in entries
        .iter()
        .filter(|e| !e.is_directory && tracker.is_remote_conf(&e.name))
    {
        let conf = tracker
            .decode_remote_conf(tracker.config_dir(), entry)
            .map_err(|err| SyncError::Bootstrap {
                stage: "decoding remote storage configuration",
                source: err.into(),
            })?;
        debug!(remote = %conf.name, kind = %conf.kind, "Loaded remote storage configuration");
        remote_confs.push(conf);
    }

    info!(
        mappings = mappings.len(),
        remotes = remote_confs.len(),
        "Remote storage configuration loaded"
    );

    Ok(SyncState::new(buckets_dir, mappings, remote_confs))
}
