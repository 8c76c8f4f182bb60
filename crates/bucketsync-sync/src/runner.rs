//! Subscription runner and restart supervisor
//!
//! [`BucketSyncRunner::run_once`] performs one complete subscription:
//!
//! ```text
//! bootstrap ──→ start offset ──→ subscribe ──→ engine ──→ offset tracker
//!                                     │            (one event at a time)
//!                              CancellationToken
//! ```
//!
//! [`BucketSyncRunner::run`] repeats it after failures, waiting
//! `restart_delay` between attempts, until cancelled. Bootstrap failures are
//! not retried.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bucketsync_core::config::Config;
use bucketsync_core::domain::FullPath;
use bucketsync_core::ports::{
    IFileContentSource, IFilerStore, IMetadataSubscriber, IOffsetStore, IRemoteStorageFactory,
    SubscriptionRequest,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bootstrap::bootstrap;
use crate::engine::BucketSyncEngine;
use crate::executor::{now_ns, ActionExecutor};
use crate::offset::{format_ts, resolve_start_offset, OffsetTracker};
use crate::planner::Planner;
use crate::tracker::ConfigTracker;
use crate::SyncError;

// ============================================================================
// Settings & ports
// ============================================================================

/// Runtime settings derived from [`Config`]
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub job_name: String,
    pub buckets_dir: FullPath,
    pub create_bucket_at: Option<String>,
    pub excluded_prefixes: Vec<String>,
    pub time_ago: Option<Duration>,
    pub flush_interval: Duration,
    pub restart_delay: Duration,
}

impl RunnerSettings {
    /// # Errors
    /// [`SyncError::InvalidConfig`] listing every problem `Config::validate`
    /// reports.
    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(SyncError::InvalidConfig(errors));
        }

        Ok(Self {
            job_name: config.sync.job_name.clone(),
            buckets_dir: FullPath::new(config.sync.buckets_dir.as_str())?,
            create_bucket_at: config.sync.create_bucket_at.clone(),
            excluded_prefixes: config.sync.excluded_prefixes.clone(),
            time_ago: config.sync.time_ago_secs.map(Duration::from_secs),
            flush_interval: Duration::from_secs(config.offset.flush_interval_secs),
            restart_delay: Duration::from_millis(config.sync.restart_delay_ms),
        })
    }
}

/// Adapters the runner drives
#[derive(Clone)]
pub struct SyncPorts {
    pub subscriber: Arc<dyn IMetadataSubscriber>,
    pub filer: Arc<dyn IFilerStore>,
    pub offsets: Arc<dyn IOffsetStore>,
    pub remote_factory: Arc<dyn IRemoteStorageFactory>,
    pub content: Arc<dyn IFileContentSource>,
}

/// How a single subscription ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Shutdown was requested
    Cancelled,
    /// The subscription closed without an error
    StreamEnded,
}

// ============================================================================
// BucketSyncRunner
// ============================================================================

/// Drives the engine from a metadata subscription
pub struct BucketSyncRunner {
    settings: RunnerSettings,
    tracker: ConfigTracker,
    ports: SyncPorts,
}

impl BucketSyncRunner {
    pub fn new(settings: RunnerSettings, tracker: ConfigTracker, ports: SyncPorts) -> Self {
        Self {
            settings,
            tracker,
            ports,
        }
    }

    /// Builds a runner from the configuration file sections
    ///
    /// # Errors
    /// [`SyncError::InvalidConfig`] if the configuration does not validate.
    pub fn from_config(config: &Config, ports: SyncPorts) -> Result<Self, SyncError> {
        Ok(Self::new(
            RunnerSettings::from_config(config)?,
            ConfigTracker::from_config(&config.remote),
            ports,
        ))
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Subscription parameters for a start offset
    pub fn subscription_request(&self, since_ns: i64) -> SubscriptionRequest {
        SubscriptionRequest {
            client_name: self.settings.job_name.clone(),
            path_prefix: self.settings.buckets_dir.to_string(),
            additional_prefixes: vec![self.tracker.config_dir().to_string()],
            excluded_prefixes: self.settings.excluded_prefixes.clone(),
            since_ns,
        }
    }

    /// Runs one subscription until it ends, fails, or `shutdown` fires
    ///
    /// Events are processed strictly in order; an in-flight event always
    /// completes before cancellation is observed. The offset is flushed when
    /// the run ends cleanly.
    ///
    /// # Errors
    /// Bootstrap failures ([`SyncError::Bootstrap`]), subscription failures
    /// and the first event that fails to process.
    #[tracing::instrument(skip_all, fields(root = %self.settings.buckets_dir))]
    pub async fn run_once(&self, shutdown: &CancellationToken) -> Result<RunOutcome> {
        let state = bootstrap(
            self.ports.filer.as_ref(),
            &self.tracker,
            self.settings.buckets_dir.clone(),
        )
        .await?;

        let start = resolve_start_offset(
            self.ports.filer.as_ref(),
            self.ports.offsets.as_ref(),
            &self.settings.job_name,
            &self.settings.buckets_dir,
            self.settings.time_ago,
            now_ns(),
        )
        .await?;

        let mut events = self
            .ports
            .subscriber
            .subscribe(self.subscription_request(start.since_ns))
            .await
            .map_err(SyncError::Subscription)?;
        info!(since = %format_ts(start.since_ns), "Subscribed to metadata events");

        let mut engine = BucketSyncEngine::new(
            Planner::new(self.tracker.clone(), self.settings.create_bucket_at.clone()),
            ActionExecutor::new(
                self.ports.remote_factory.clone(),
                self.ports.content.clone(),
                self.ports.filer.clone(),
            ),
            state,
        );
        let mut offsets = OffsetTracker::new(
            self.ports.offsets.clone(),
            self.settings.job_name.clone(),
            self.settings.buckets_dir.to_string(),
            self.settings.flush_interval,
            start.persisted_ns,
        );

        let outcome = loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break RunOutcome::Cancelled,

                item = events.recv() => match item {
                    Some(Ok(event)) => {
                        engine.process_event(&event).await?;
                        offsets.record(event.ts_ns).await?;
                    }
                    Some(Err(err)) => return Err(SyncError::Subscription(err).into()),
                    None => break RunOutcome::StreamEnded,
                },
            }
        };

        offsets.flush().await?;
        info!(outcome = ?outcome, offset = offsets.persisted_ns(), "Subscription finished");
        Ok(outcome)
    }

    /// Supervises [`run_once`](Self::run_once) until cancelled
    ///
    /// # Errors
    /// Only bootstrap failures end the loop with an error.
    #[tracing::instrument(skip_all, fields(root = %self.settings.buckets_dir))]
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        info!(job = %self.settings.job_name, "Remote bucket sync starting");

        loop {
            match self.run_once(&shutdown).await {
                Ok(RunOutcome::Cancelled) => break,
                Ok(RunOutcome::StreamEnded) => {
                    warn!("Metadata subscription ended, restarting");
                }
                Err(err) if is_bootstrap_failure(&err) => {
                    error!(error = %format!("{err:#}"), "Bootstrap failed, giving up");
                    return Err(err);
                }
                Err(err) => {
                    error!("synchronize {}: {err:#}", self.settings.buckets_dir);
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.settings.restart_delay) => {}
            }
        }

        info!("Remote bucket sync stopped");
        Ok(())
    }
}

fn is_bootstrap_failure(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<SyncError>(), Some(SyncError::Bootstrap { .. }))
}
