//! BucketSync Core - Domain types and ports for remote bucket replication
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Entry`, `MountMappings`, `RemoteConf`, `RemoteStorageLocation`, `MetadataEvent`
//! - **Port definitions** - Traits for adapters: `IRemoteStorageClient`, `IFileContentSource`,
//!   `IFilerStore`, `IOffsetStore`, `IMetadataSubscriber`
//! - **Configuration** - Typed YAML configuration with validation and a builder
//!
//! # Architecture
//!
//! The domain module is pure data plus the rules that live on it (content
//! signatures, location resolution, mapping decode). Ports define the trait
//! interfaces for every external collaborator; the sync engine in
//! `bucketsync-sync` only ever talks to them.

pub mod config;
pub mod domain;
pub mod ports;
