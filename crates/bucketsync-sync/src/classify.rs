//! Event classification and routing
//!
//! The filer encodes every change as an optional old entry plus an optional
//! new entry. [`EventKind::of`] turns that shape into an explicit variant
//! once per event, and [`route`] decides which handler owns it.

use bucketsync_core::domain::{Entry, MetadataEvent};

use crate::tracker::ConfigTracker;

/// What happened to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind<'a> {
    /// Neither side present
    Noop,
    /// `entry` appeared in `dir`
    Created { dir: &'a str, entry: &'a Entry },
    /// `entry` disappeared from `dir`
    Deleted { dir: &'a str, entry: &'a Entry },
    /// The entry changed in place (same directory, same name)
    SameLocationUpdate {
        dir: &'a str,
        old: &'a Entry,
        new: &'a Entry,
    },
    /// Rename or move
    CrossLocationChange {
        old_dir: &'a str,
        old: &'a Entry,
        new_dir: &'a str,
        new: &'a Entry,
    },
}

impl<'a> EventKind<'a> {
    pub fn of(event: &'a MetadataEvent) -> Self {
        match (&event.old_entry, &event.new_entry) {
            (None, None) => Self::Noop,
            (None, Some(entry)) => Self::Created {
                dir: event.new_parent(),
                entry,
            },
            (Some(entry), None) => Self::Deleted {
                dir: &event.directory,
                entry,
            },
            (Some(old), Some(new)) => {
                let new_dir = event.new_parent();
                if event.directory == new_dir && old.name == new.name {
                    Self::SameLocationUpdate {
                        dir: new_dir,
                        old,
                        new,
                    }
                } else {
                    Self::CrossLocationChange {
                        old_dir: &event.directory,
                        old,
                        new_dir,
                        new,
                    }
                }
            }
        }
    }

    /// Short label used in logs and error context
    pub fn label(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Created { .. } => "create",
            Self::Deleted { .. } => "delete",
            Self::SameLocationUpdate { .. } => "update",
            Self::CrossLocationChange { .. } => "rename",
        }
    }
}

/// Which handler an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Configuration directory change, owned by the config tracker
    Config,
    /// A direct child of the buckets root appeared
    BucketCreated(&'a Entry),
    /// A direct child of the buckets root disappeared
    BucketDeleted(&'a Entry),
    /// A direct child of the buckets root was renamed in place
    BucketRenamed { old: &'a Entry, new: &'a Entry },
    /// Anything else; resolved against the mapping table
    Tree(EventKind<'a>),
}

/// Routes an event
///
/// Configuration events win over everything else. Creations and deletions
/// directly under the buckets root are bucket lifecycle events; an in-place
/// update of a bucket directory is ignored.
pub fn route<'a>(
    event: &'a MetadataEvent,
    tracker: &ConfigTracker,
    buckets_dir: &str,
) -> Route<'a> {
    if tracker.covers(&event.directory) {
        return Route::Config;
    }

    match EventKind::of(event) {
        EventKind::Created { dir, entry } if dir == buckets_dir => Route::BucketCreated(entry),
        EventKind::Deleted { dir, entry } if dir == buckets_dir => Route::BucketDeleted(entry),
        EventKind::SameLocationUpdate { dir, .. } if dir == buckets_dir => {
            Route::Tree(EventKind::Noop)
        }
        EventKind::CrossLocationChange {
            old_dir,
            old,
            new_dir,
            new,
        } if old_dir == buckets_dir && new_dir == buckets_dir => {
            Route::BucketRenamed { old, new }
        }
        kind => Route::Tree(kind),
    }
}
