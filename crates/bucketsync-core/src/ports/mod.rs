//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync engine
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStorageClient`] / [`IRemoteStorageFactory`] - Remote object storage operations
//! - [`IFileContentSource`] - Sequential reads of local file content
//! - [`IFilerStore`] - Local metadata store: config entries, mount mappings, entry write-back
//! - [`IOffsetStore`] - Persistence of the replication progress offset
//! - [`IMetadataSubscriber`] - Ordered metadata change subscription

pub mod file_content;
pub mod filer;
pub mod offset_store;
pub mod remote_storage;
pub mod subscription;

pub use file_content::{ContentReader, IFileContentSource};
pub use filer::IFilerStore;
pub use offset_store::IOffsetStore;
pub use remote_storage::{IRemoteStorageClient, IRemoteStorageFactory};
pub use subscription::{EventReceiver, IMetadataSubscriber, SubscriptionRequest};
