//! BucketSync Sync - Remote bucket synchronization engine
//!
//! Provides:
//! - Bootstrap of mount mappings and remote configurations
//! - Live tracking of configuration changes arriving on the event stream
//! - Classification of filer metadata events into remote operations
//! - Throttled, resumable progress offsets
//! - A restartable stream runner
//!
//! ## Modules
//!
//! - [`state`] - Mapping table + remote registry owned by one engine instance
//! - [`tracker`] - Configuration directory events
//! - [`bootstrap`] - Initial configuration load
//! - [`classify`] - Event kinds and routing
//! - [`lifecycle`] - Bucket create/delete planning
//! - [`planner`] - Pure `(state, event) -> actions` decision logic
//! - [`executor`] - Applies actions against the remote storage ports
//! - [`engine`] - Per-event processing (plan, track, execute)
//! - [`logging`] - Tracing subscriber setup from the `logging` section
//! - [`offset`] - Start offset resolution and throttled offset persistence
//! - [`runner`] - Subscription loop and restart supervisor

pub mod bootstrap;
pub mod classify;
pub mod engine;
pub mod executor;
pub mod lifecycle;
pub mod logging;
pub mod offset;
pub mod planner;
pub mod runner;
pub mod state;
pub mod tracker;

use bucketsync_core::config::ValidationError;
use bucketsync_core::domain::errors::DomainError;
use thiserror::Error;

/// Errors that can occur during synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configuration failed validation
    #[error("Invalid configuration: {}", join_validation(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// Initial configuration could not be loaded; the engine must not start
    #[error("Bootstrap failed while {stage}: {source:#}")]
    Bootstrap {
        stage: &'static str,
        source: anyhow::Error,
    },

    /// A mount mapping or remote configuration payload could not be decoded
    #[error("Config decode error in {path}: {source}")]
    ConfigDecode {
        path: String,
        #[source]
        source: DomainError,
    },

    /// No mount mapping exists for the bucket path
    #[error("{0} is not mounted")]
    NotMounted(String),

    /// The bucket's mapping names a remote that is not configured
    #[error("{bucket} mounted to un-configured remote storage {remote}")]
    UnconfiguredRemote { bucket: String, remote: String },

    /// A remote named by configuration is not in the registry
    #[error("un-configured remote storage {0}")]
    UnknownRemote(String),

    /// A bucket appeared but no remote is configured for new buckets
    #[error("no remote storage configured to create bucket {0}")]
    NoCreateTarget(String),

    /// A remote storage call failed
    #[error("{operation} {location} failed: {source:#}")]
    RemoteOperation {
        operation: &'static str,
        location: String,
        source: anyhow::Error,
    },

    /// Reading local content for an upload failed
    #[error("Reading content of {path} failed: {source:#}")]
    ContentRead { path: String, source: anyhow::Error },

    /// Writing the remote identity back into the local entry failed
    #[error("Updating local entry {path} failed: {source:#}")]
    MetadataUpdate { path: String, source: anyhow::Error },

    /// Reading the stored sync offset failed
    #[error("Reading sync offset of {job_name} {root_path} failed: {source:#}")]
    OffsetRead {
        job_name: String,
        root_path: String,
        source: anyhow::Error,
    },

    /// Persisting the sync offset failed
    #[error("Persisting sync offset {ts_ns} failed: {source:#}")]
    OffsetPersist { ts_ns: i64, source: anyhow::Error },

    /// The metadata subscription failed
    #[error("Subscription error: {0:#}")]
    Subscription(anyhow::Error),

    /// A domain-level error propagated from bucketsync-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
