//! Metadata change events
//!
//! The filer describes every namespace change with the same compact shape:
//! an optional old entry, an optional new entry, and the directories they
//! live in. Interpreting that shape is the sync engine's job.

use serde::{Deserialize, Serialize};

use super::entry::Entry;

/// A single change notification from the filer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataEvent {
    /// Directory of the old entry (or of the new entry for creations)
    pub directory: String,
    /// Directory of the new entry; empty means same as `directory`
    pub new_parent_path: String,
    /// Entry before the change, absent for creations
    pub old_entry: Option<Entry>,
    /// Entry after the change, absent for deletions
    pub new_entry: Option<Entry>,
    /// Event time in nanoseconds since the Unix epoch
    pub ts_ns: i64,
}

impl MetadataEvent {
    /// A creation of `entry` in `directory`
    pub fn created(directory: impl Into<String>, entry: Entry, ts_ns: i64) -> Self {
        let directory = directory.into();
        Self {
            new_parent_path: directory.clone(),
            directory,
            old_entry: None,
            new_entry: Some(entry),
            ts_ns,
        }
    }

    /// A deletion of `entry` from `directory`
    pub fn deleted(directory: impl Into<String>, entry: Entry, ts_ns: i64) -> Self {
        Self {
            directory: directory.into(),
            new_parent_path: String::new(),
            old_entry: Some(entry),
            new_entry: None,
            ts_ns,
        }
    }

    /// An in-place update of an entry in `directory`
    pub fn updated(directory: impl Into<String>, old: Entry, new: Entry, ts_ns: i64) -> Self {
        let directory = directory.into();
        Self {
            new_parent_path: directory.clone(),
            directory,
            old_entry: Some(old),
            new_entry: Some(new),
            ts_ns,
        }
    }

    /// A rename or move from `old_dir` to `new_dir`
    pub fn renamed(
        old_dir: impl Into<String>,
        old: Entry,
        new_dir: impl Into<String>,
        new: Entry,
        ts_ns: i64,
    ) -> Self {
        Self {
            directory: old_dir.into(),
            new_parent_path: new_dir.into(),
            old_entry: Some(old),
            new_entry: Some(new),
            ts_ns,
        }
    }

    /// Directory of the new entry
    pub fn new_parent(&self) -> &str {
        if self.new_parent_path.is_empty() {
            &self.directory
        } else {
            &self.new_parent_path
        }
    }
}
