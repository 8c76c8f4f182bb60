//! Live configuration tracker
//!
//! The configuration directory (`/etc/remote` by default) is subscribed to
//! alongside the buckets root. Its events never produce remote operations;
//! they are decoded into [`ConfigChange`]s and applied to the
//! [`SyncState`](crate::state::SyncState) before the next event is handled.

use bucketsync_core::config::RemoteConfig;
use bucketsync_core::domain::newtypes::join_path;
use bucketsync_core::domain::{Entry, MetadataEvent, MountMappings, RemoteConf};
use tracing::debug;

use crate::SyncError;

/// A decoded change to the replication configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    /// The mount mapping file was written; replaces the whole table
    ReplaceMappings(MountMappings),
    /// A remote configuration entry was written
    UpsertRemote(RemoteConf),
    /// A remote configuration entry was deleted
    RemoveRemote(String),
}

/// Recognizes and decodes configuration directory events
#[derive(Debug, Clone)]
pub struct ConfigTracker {
    config_dir: String,
    mount_file: String,
    conf_suffix: String,
}

impl ConfigTracker {
    pub fn new(
        config_dir: impl Into<String>,
        mount_file: impl Into<String>,
        conf_suffix: impl Into<String>,
    ) -> Self {
        let config_dir: String = config_dir.into();
        let trimmed = config_dir.trim_end_matches('/');
        Self {
            config_dir: if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() },
            mount_file: mount_file.into(),
            conf_suffix: conf_suffix.into(),
        }
    }

    pub fn from_config(config: &RemoteConfig) -> Self {
        Self::new(&config.config_dir, &config.mount_file, &config.conf_suffix)
    }

    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Returns true if events in `dir` belong to the configuration directory
    pub fn covers(&self, dir: &str) -> bool {
        dir == self.config_dir
            || dir
                .strip_prefix(self.config_dir.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Returns true if `name` is a remote configuration entry
    pub fn is_remote_conf(&self, name: &str) -> bool {
        name.ends_with(&self.conf_suffix)
    }

    /// Returns true if `name` is the mount mapping file
    pub fn is_mount_file(&self, name: &str) -> bool {
        name == self.mount_file
    }

    /// Decodes the remote configuration carried by a config entry
    ///
    /// `dir` is only used for error reporting.
    pub fn decode_remote_conf(&self, dir: &str, entry: &Entry) -> Result<RemoteConf, SyncError> {
        RemoteConf::decode(&entry.name, &entry.content).map_err(|source| SyncError::ConfigDecode {
            path: join_path(dir, &entry.name),
            source,
        })
    }

    /// Turns a configuration directory event into configuration changes
    ///
    /// Writes of the mount file replace the mapping table, writes of remote
    /// configuration entries upsert the registry and their deletions (which
    /// still carry the last content) remove from it. Everything else is
    /// ignored.
    ///
    /// # Errors
    /// A payload that cannot be decoded yields [`SyncError::ConfigDecode`];
    /// nothing is applied in that case.
    pub fn plan(&self, event: &MetadataEvent) -> Result<Vec<ConfigChange>, SyncError> {
        let mut changes = Vec::new();

        if let Some(new_entry) = &event.new_entry {
            let dir = event.new_parent();
            if self.is_mount_file(&new_entry.name) {
                let mappings = MountMappings::decode(&new_entry.content).map_err(|source| {
                    SyncError::ConfigDecode {
                        path: join_path(dir, &new_entry.name),
                        source,
                    }
                })?;
                debug!(mappings = mappings.len(), "Mount mappings replaced");
                changes.push(ConfigChange::ReplaceMappings(mappings));
            }
            if self.is_remote_conf(&new_entry.name) {
                let conf = self.decode_remote_conf(dir, new_entry)?;
                debug!(remote = %conf.name, "Remote storage configuration updated");
                changes.push(ConfigChange::UpsertRemote(conf));
            }
        } else if let Some(old_entry) = &event.old_entry {
            if self.is_remote_conf(&old_entry.name) {
                let conf = self.decode_remote_conf(&event.directory, old_entry)?;
                debug!(remote = %conf.name, "Remote storage configuration removed");
                changes.push(ConfigChange::RemoveRemote(conf.name));
            }
        }

        Ok(changes)
    }
}
