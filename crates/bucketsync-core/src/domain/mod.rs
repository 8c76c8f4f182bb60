//! Domain entities and business rules
//!
//! This module contains the core domain types for BucketSync:
//! - Path newtype for absolute filer paths
//! - Filer entries as carried by metadata events
//! - Mount mappings, remote configurations and resolved remote locations
//! - Metadata change events
//! - Domain-specific error types

pub mod entry;
pub mod errors;
pub mod event;
pub mod mapping;
pub mod newtypes;

// Re-export commonly used types
pub use entry::{Entry, EntryAttributes, FileChunk, RemoteEntry};
pub use errors::DomainError;
pub use event::MetadataEvent;
pub use mapping::{MountMappings, RemoteConf, RemoteStorageLocation};
pub use newtypes::FullPath;
