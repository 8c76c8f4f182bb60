//! Filer entry snapshots
//!
//! An [`Entry`] is an immutable snapshot of a file or directory as carried by
//! a metadata event. The engine never keeps entries beyond a single event;
//! the only thing that survives is the [`RemoteEntry`] written back into the
//! local metadata store after a successful upload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// File attributes tracked by the filer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryAttributes {
    /// Last modification time (seconds since the Unix epoch)
    pub mtime: i64,
    /// Creation time (seconds since the Unix epoch)
    pub crtime: i64,
    /// Logical file size in bytes
    pub file_size: u64,
    /// Unix permission bits
    pub file_mode: u32,
    /// MIME type, empty when unknown
    pub mime: String,
    /// Hex-encoded MD5 of the whole content, when the filer computed one
    pub md5: Option<String>,
}

/// A stored piece of file content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChunk {
    /// Volume-server file id
    pub file_id: String,
    /// Offset of this chunk within the file
    pub offset: i64,
    /// Chunk length in bytes
    pub size: u64,
    /// Chunk content etag
    pub etag: String,
}

/// Identity assigned by the remote storage to an uploaded entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteEntry {
    /// Name of the remote configuration the entry was written to
    pub storage_name: String,
    /// ETag reported by the remote store
    pub remote_etag: String,
    /// Modification time on the remote side (seconds since the Unix epoch)
    pub remote_mtime: i64,
    /// Size reported by the remote store
    pub remote_size: u64,
    /// When this entry was last written to the remote (nanoseconds)
    pub last_local_sync_ts_ns: i64,
}

/// Snapshot of a filer node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    /// Base name (no directory component)
    pub name: String,
    /// Whether this is a directory
    pub is_directory: bool,
    /// File attributes
    pub attributes: EntryAttributes,
    /// Inline content (small files, configuration entries)
    pub content: Vec<u8>,
    /// Chunked content stored on volume servers
    pub chunks: Vec<FileChunk>,
    /// Extended attributes
    pub extended: BTreeMap<String, Vec<u8>>,
    /// Remote identity, set once the entry has been written to remote storage
    pub remote_entry: Option<RemoteEntry>,
}

impl Entry {
    /// Creates an empty file entry
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a directory entry
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            ..Self::default()
        }
    }

    /// Sets inline content and the matching file size
    #[must_use]
    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = content.into();
        self.attributes.file_size = self.content.len() as u64;
        self
    }

    /// Appends a chunk and grows the file size accordingly
    #[must_use]
    pub fn with_chunk(mut self, file_id: impl Into<String>, size: u64, etag: impl Into<String>) -> Self {
        let offset = self.chunks.iter().map(|c| c.size).sum::<u64>() as i64;
        self.chunks.push(FileChunk {
            file_id: file_id.into(),
            offset,
            size,
            etag: etag.into(),
        });
        self.attributes.file_size = self.attributes.file_size.max(offset as u64 + size);
        self
    }

    /// Sets the modification time
    #[must_use]
    pub fn with_mtime(mut self, mtime: i64) -> Self {
        self.attributes.mtime = mtime;
        self
    }

    /// Returns true if the entry has content that can be read back
    pub fn has_data(&self) -> bool {
        !self.content.is_empty() || !self.chunks.is_empty()
    }

    /// Returns true for file entries that carry no retrievable data
    ///
    /// Directories are never placeholders.
    pub fn is_placeholder(&self) -> bool {
        !self.is_directory && !self.has_data()
    }

    /// Stable fingerprint of the entry's content
    ///
    /// Resolution order: the filer-computed MD5, the single chunk's etag,
    /// a SHA-256 over all chunk etags suffixed with the chunk count, and
    /// finally a SHA-256 of inline content. `None` means the entry is empty.
    pub fn content_signature(&self) -> Option<String> {
        if let Some(md5) = self.attributes.md5.as_deref().filter(|m| !m.is_empty()) {
            return Some(md5.to_string());
        }

        match self.chunks.as_slice() {
            [] if self.content.is_empty() => None,
            [] => Some(format!("{:x}", Sha256::digest(&self.content))),
            [single] => Some(single.etag.clone()),
            many => {
                let mut hasher = Sha256::new();
                for chunk in many {
                    hasher.update(chunk.etag.as_bytes());
                }
                Some(format!("{:x}-{}", hasher.finalize(), many.len()))
            }
        }
    }

    /// Returns true if both entries carry the same content
    pub fn is_same_data(&self, other: &Entry) -> bool {
        self.content_signature() == other.content_signature()
    }

    /// Decides whether this entry still needs to be written to remote storage
    ///
    /// Entries last synced (by local clock) no earlier than their local
    /// modification time are already on the remote side and are skipped.
    /// The remote's own `remote_mtime` is never consulted.
    pub fn should_send_to_remote(&self) -> bool {
        match &self.remote_entry {
            None => true,
            Some(remote) => {
                remote.last_local_sync_ts_ns.div_euclid(NANOS_PER_SEC) < self.attributes.mtime
            }
        }
    }

    /// Returns a copy of this entry carrying the given remote identity
    #[must_use]
    pub fn with_remote_entry(&self, mut remote: RemoteEntry, synced_at_ns: i64) -> Self {
        remote.last_local_sync_ts_ns = synced_at_ns;
        Self {
            remote_entry: Some(remote),
            ..self.clone()
        }
    }
}
