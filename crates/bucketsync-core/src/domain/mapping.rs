//! Mount mappings and remote storage configuration
//!
//! Both payloads live as inline content of entries in the configuration
//! directory and are JSON encoded.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{join_path, FullPath};

/// A fully resolved destination in remote storage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteStorageLocation {
    /// Name of the remote configuration
    pub name: String,
    /// Bucket on the remote side
    pub bucket: String,
    /// Absolute path inside the remote bucket
    pub path: String,
}

impl RemoteStorageLocation {
    /// Creates a new location
    pub fn new(name: impl Into<String>, bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    /// Resolves where `source` lands when `mount_dir` is mounted at `self`
    ///
    /// The part of `source` below `mount_dir` is appended to this location's
    /// path prefix. Returns `None` if `source` is not inside `mount_dir`.
    pub fn resolve(&self, mount_dir: &FullPath, source: &FullPath) -> Option<Self> {
        let relative = source.relative_to(mount_dir)?;
        Some(Self {
            name: self.name.clone(),
            bucket: self.bucket.clone(),
            path: join_path(&self.path, relative),
        })
    }
}

impl Display for RemoteStorageLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}{}", self.name, self.bucket, self.path)
    }
}

/// The bucket path -> remote location table
///
/// Keys are absolute filer paths of bucket directories. There is at most one
/// mapping per bucket path; inserting for an existing path replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountMappings {
    #[serde(default)]
    mappings: BTreeMap<String, RemoteStorageLocation>,
}

impl MountMappings {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the content of the mount mapping file
    ///
    /// An empty payload decodes to an empty table.
    pub fn decode(data: &[u8]) -> Result<Self, DomainError> {
        if data.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(data).map_err(|e| DomainError::MalformedMappings(e.to_string()))
    }

    /// Encodes the table into the mount mapping file format
    pub fn encode(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec_pretty(self).map_err(|e| DomainError::Serialization(e.to_string()))
    }

    /// Looks up the mapping of a bucket path
    pub fn get(&self, bucket_path: &str) -> Option<&RemoteStorageLocation> {
        self.mappings.get(bucket_path)
    }

    /// Inserts or replaces the mapping for `bucket_path`
    pub fn insert(
        &mut self,
        bucket_path: impl Into<String>,
        location: RemoteStorageLocation,
    ) -> Option<RemoteStorageLocation> {
        self.mappings.insert(bucket_path.into(), location)
    }

    /// Removes the mapping for `bucket_path`
    pub fn remove(&mut self, bucket_path: &str) -> Option<RemoteStorageLocation> {
        self.mappings.remove(bucket_path)
    }

    /// Iterates over `(bucket path, location)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RemoteStorageLocation)> {
        self.mappings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Named configuration for one remote storage backend
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConf {
    /// Unique name, referenced by mount mappings
    pub name: String,
    /// Storage kind, e.g. `s3`, `gcs`, `azure`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Backend-specific settings
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl RemoteConf {
    /// Creates a configuration with only a name and kind
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            endpoint: None,
            region: None,
            access_key: None,
            secret_key: None,
            options: BTreeMap::new(),
        }
    }

    /// Decodes a remote configuration entry's content
    ///
    /// `entry_name` is only used for error reporting.
    pub fn decode(entry_name: &str, data: &[u8]) -> Result<Self, DomainError> {
        let conf: Self =
            serde_json::from_slice(data).map_err(|e| DomainError::MalformedRemoteConf {
                name: entry_name.to_string(),
                reason: e.to_string(),
            })?;
        if conf.name.is_empty() {
            return Err(DomainError::MalformedRemoteConf {
                name: entry_name.to_string(),
                reason: "missing remote name".to_string(),
            });
        }
        Ok(conf)
    }

    /// Encodes this configuration into the entry content format
    pub fn encode(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec_pretty(self).map_err(|e| DomainError::Serialization(e.to_string()))
    }
}

// Credentials stay out of logs.
impl fmt::Debug for RemoteConf {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConf")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("options", &self.options)
            .finish()
    }
}
