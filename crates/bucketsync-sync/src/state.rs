//! Live replication state
//!
//! [`SyncState`] holds the mount mapping table and the remote configuration
//! registry for one watched buckets root. It is owned by a single engine
//! instance and only ever touched from the event path, so it needs no locks.

use std::collections::HashMap;

use bucketsync_core::domain::{FullPath, MountMappings, RemoteConf, RemoteStorageLocation};
use tracing::warn;

use crate::tracker::ConfigChange;
use crate::SyncError;

/// Everything needed to act on paths inside one mapped bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketContext {
    /// Absolute path of the bucket directory
    pub bucket_path: FullPath,
    /// Where the bucket is mounted in remote storage
    pub mount: RemoteStorageLocation,
    /// Configuration of the remote named by `mount`
    pub remote: RemoteConf,
}

impl BucketContext {
    /// Resolves the remote location of a path inside this bucket
    pub fn location_of(&self, path: &FullPath) -> Option<RemoteStorageLocation> {
        self.mount.resolve(&self.bucket_path, path)
    }
}

/// Mapping table and remote registry for one buckets root
#[derive(Debug, Clone)]
pub struct SyncState {
    buckets_dir: FullPath,
    mappings: MountMappings,
    remote_confs: HashMap<String, RemoteConf>,
}

impl SyncState {
    pub fn new(
        buckets_dir: FullPath,
        mappings: MountMappings,
        remote_confs: impl IntoIterator<Item = RemoteConf>,
    ) -> Self {
        Self {
            buckets_dir,
            mappings,
            remote_confs: remote_confs
                .into_iter()
                .map(|conf| (conf.name.clone(), conf))
                .collect(),
        }
    }

    pub fn buckets_dir(&self) -> &FullPath {
        &self.buckets_dir
    }

    pub fn mappings(&self) -> &MountMappings {
        &self.mappings
    }

    pub fn remote_conf(&self, name: &str) -> Option<&RemoteConf> {
        self.remote_confs.get(name)
    }

    pub fn remote_count(&self) -> usize {
        self.remote_confs.len()
    }

    /// Path of the bucket that contains `dir`
    ///
    /// `dir` must lie strictly below the buckets root; the bucket is its
    /// first component there.
    pub fn bucket_path_of(&self, dir: &str) -> Option<FullPath> {
        let root = self.buckets_dir.as_str();
        let rest = dir.strip_prefix(root)?.strip_prefix('/')?;
        let bucket = rest.split('/').next().filter(|name| !name.is_empty())?;
        Some(self.buckets_dir.child(bucket))
    }

    /// Resolves the bucket context for an event directory
    ///
    /// Unmapped buckets and mappings naming an unconfigured remote are
    /// skipped with a warning. Directories outside the buckets root resolve
    /// to `None` silently.
    pub fn detect_bucket(&self, dir: &str) -> Option<BucketContext> {
        let bucket_path = self.bucket_path_of(dir)?;
        let Some(mount) = self.mappings.get(bucket_path.as_str()) else {
            warn!(bucket = %bucket_path, "{bucket_path} is not mounted");
            return None;
        };
        let Some(remote) = self.remote_confs.get(&mount.name) else {
            warn!(
                bucket = %bucket_path,
                remote = %mount.name,
                "{bucket_path} mounted to un-configured {mount}"
            );
            return None;
        };
        Some(BucketContext {
            bucket_path,
            mount: mount.clone(),
            remote: remote.clone(),
        })
    }

    /// Resolves a bucket by name for an explicit lifecycle operation
    ///
    /// # Errors
    /// Unlike [`detect_bucket`](Self::detect_bucket), a missing mapping or
    /// unconfigured remote is an error here.
    pub fn resolve_bucket(&self, name: &str) -> Result<BucketContext, SyncError> {
        let bucket_path = self.buckets_dir.child(name);
        let mount = self
            .mappings
            .get(bucket_path.as_str())
            .ok_or_else(|| SyncError::NotMounted(bucket_path.to_string()))?;
        let remote = self
            .remote_confs
            .get(&mount.name)
            .ok_or_else(|| SyncError::UnconfiguredRemote {
                bucket: bucket_path.to_string(),
                remote: mount.name.clone(),
            })?;
        Ok(BucketContext {
            bucket_path,
            mount: mount.clone(),
            remote: remote.clone(),
        })
    }

    /// Applies a configuration change decoded from the config directory
    pub fn apply(&mut self, change: ConfigChange) {
        match change {
            ConfigChange::ReplaceMappings(mappings) => self.mappings = mappings,
            ConfigChange::UpsertRemote(conf) => {
                self.remote_confs.insert(conf.name.clone(), conf);
            }
            ConfigChange::RemoveRemote(name) => {
                self.remote_confs.remove(&name);
            }
        }
    }

    /// Inserts or replaces the mapping of one bucket
    pub fn insert_mapping(&mut self, bucket_path: &FullPath, location: RemoteStorageLocation) {
        self.mappings.insert(bucket_path.as_str(), location);
    }

    /// Drops the mapping of one bucket
    pub fn remove_mapping(&mut self, bucket_path: &FullPath) -> Option<RemoteStorageLocation> {
        self.mappings.remove(bucket_path.as_str())
    }
}
