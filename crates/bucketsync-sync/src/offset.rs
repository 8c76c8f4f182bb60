//! Sync offset handling
//!
//! - [`resolve_start_offset`] picks where a subscription starts
//! - [`OffsetTracker`] turns per-event progress into a throttled,
//!   monotonically increasing persisted offset

use std::sync::Arc;
use std::time::Duration;

use bucketsync_core::domain::FullPath;
use bucketsync_core::ports::{IFilerStore, IOffsetStore};
use chrono::DateTime;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::SyncError;

const NANOS_PER_SEC: i64 = 1_000_000_000;

// ============================================================================
// Start offset
// ============================================================================

/// Where a subscription starts and what was persisted before
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOffset {
    /// Events strictly after this timestamp are delivered
    pub since_ns: i64,
    /// Last persisted offset, `0` if none; never persisted again or lower
    pub persisted_ns: i64,
}

/// Decides the start offset for `root`
///
/// In order of precedence:
/// 1. `time_ago` before `now_ns`, when given
/// 2. the stored offset, if it is later than the root's creation time
/// 3. the root's creation time
/// 4. `now_ns` when the root does not exist or cannot be read
///
/// # Errors
/// [`SyncError::OffsetRead`] if the stored offset cannot be read.
pub async fn resolve_start_offset(
    filer: &dyn IFilerStore,
    store: &dyn IOffsetStore,
    job_name: &str,
    root: &FullPath,
    time_ago: Option<Duration>,
    now_ns: i64,
) -> Result<StartOffset, SyncError> {
    let persisted_ns = store
        .get_sync_offset(job_name, root.as_str())
        .await
        .map_err(|source| SyncError::OffsetRead {
            job_name: job_name.to_string(),
            root_path: root.to_string(),
            source,
        })?;

    let since_ns = if let Some(ago) = time_ago {
        let ago_ns = i64::try_from(ago.as_nanos()).unwrap_or(i64::MAX);
        now_ns.saturating_sub(ago_ns)
    } else {
        match filer.get_entry(root).await {
            Ok(Some(entry)) => {
                let created_ns = entry.attributes.crtime.saturating_mul(NANOS_PER_SEC);
                if created_ns < persisted_ns {
                    info!("resume from {}", format_ts(persisted_ns));
                    persisted_ns
                } else {
                    created_ns
                }
            }
            Ok(None) => now_ns,
            Err(err) => {
                info!(root = %root, error = %err, "get mounted directory {root} failed");
                now_ns
            }
        }
    };

    Ok(StartOffset {
        since_ns,
        persisted_ns,
    })
}

/// RFC 3339 rendering of a nanosecond timestamp
pub fn format_ts(ts_ns: i64) -> String {
    DateTime::from_timestamp(
        ts_ns.div_euclid(NANOS_PER_SEC),
        ts_ns.rem_euclid(NANOS_PER_SEC) as u32,
    )
    .map(|t| t.to_rfc3339())
    .unwrap_or_else(|| ts_ns.to_string())
}

// ============================================================================
// OffsetTracker
// ============================================================================

/// Throttled persistence of the processed-events high-water mark
///
/// [`record`](Self::record) is called after every successfully processed
/// event. The first record flushes immediately; afterwards the offset is
/// persisted at most once per interval. A value is only ever persisted if
/// it is higher than the last persisted one.
pub struct OffsetTracker {
    store: Arc<dyn IOffsetStore>,
    job_name: String,
    root_path: String,
    interval: Duration,
    counter: u64,
    high_water_ns: i64,
    persisted_ns: i64,
    last_flush: Option<Instant>,
}

impl OffsetTracker {
    pub fn new(
        store: Arc<dyn IOffsetStore>,
        job_name: impl Into<String>,
        root_path: impl Into<String>,
        interval: Duration,
        persisted_ns: i64,
    ) -> Self {
        Self {
            store,
            job_name: job_name.into(),
            root_path: root_path.into(),
            interval,
            counter: 0,
            high_water_ns: persisted_ns,
            persisted_ns,
            last_flush: None,
        }
    }

    /// Last value handed to the offset store
    pub fn persisted_ns(&self) -> i64 {
        self.persisted_ns
    }

    /// Highest event time processed so far
    pub fn high_water_ns(&self) -> i64 {
        self.high_water_ns
    }

    /// Notes one processed event and flushes when the interval elapsed
    ///
    /// # Errors
    /// [`SyncError::OffsetPersist`] if the store rejects the write.
    pub async fn record(&mut self, ts_ns: i64) -> Result<(), SyncError> {
        self.counter += 1;
        self.high_water_ns = self.high_water_ns.max(ts_ns);

        let due = self
            .last_flush
            .map_or(true, |at| at.elapsed() >= self.interval);
        if due {
            self.flush().await?;
        }
        Ok(())
    }

    /// Persists the high-water mark if it advanced
    ///
    /// # Errors
    /// [`SyncError::OffsetPersist`] if the store rejects the write.
    pub async fn flush(&mut self) -> Result<(), SyncError> {
        let now = Instant::now();
        let window = self
            .last_flush
            .map(|at| now.duration_since(at))
            .filter(|d| !d.is_zero())
            .unwrap_or(self.interval);
        self.last_flush = Some(now);

        if self.high_water_ns <= self.persisted_ns {
            debug!(offset = self.persisted_ns, "Sync offset unchanged");
            self.counter = 0;
            return Ok(());
        }

        let rate = self.counter as f64 / window.as_secs_f64().max(f64::EPSILON);
        info!(
            job = %self.job_name,
            root = %self.root_path,
            "remote sync {} progressed to {} {:.2}/sec",
            self.root_path,
            format_ts(self.high_water_ns),
            rate
        );

        self.store
            .set_sync_offset(&self.job_name, &self.root_path, self.high_water_ns)
            .await
            .map_err(|source| SyncError::OffsetPersist {
                ts_ns: self.high_water_ns,
                source,
            })?;

        self.persisted_ns = self.high_water_ns;
        self.counter = 0;
        Ok(())
    }
}
