//! Configuration module for BucketSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for BucketSync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
    pub offset: OffsetConfig,
    pub logging: LoggingConfig,
}

/// What to replicate and how the event loop behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root directory whose direct children are the buckets.
    pub buckets_dir: String,
    /// Remote configuration that newly created buckets are mapped to.
    pub create_bucket_at: Option<String>,
    /// Job name used as the subscription client name and offset key.
    pub job_name: String,
    /// Sub-trees of `buckets_dir` that are never replicated.
    pub excluded_prefixes: Vec<String>,
    /// When set, start this many seconds in the past instead of at the stored offset.
    pub time_ago_secs: Option<u64>,
    /// Milliseconds to wait before re-subscribing after the stream stops.
    pub restart_delay_ms: u64,
}

/// Where remote storage configuration lives in the filer namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Directory holding the mount mapping file and remote config entries.
    pub config_dir: String,
    /// Name of the mount mapping file inside `config_dir`.
    pub mount_file: String,
    /// Suffix shared by all remote configuration entries.
    pub conf_suffix: String,
}

/// Progress offset persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetConfig {
    /// Seconds between offset flushes.
    pub flush_interval_secs: u64,
    /// SQLite database holding the offsets.
    pub database: PathBuf,
}

/// Logging / tracing settings, installed by `bucketsync_sync::logging::init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/bucketsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("bucketsync")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default subscription client name and offset key.
pub const DEFAULT_JOB_NAME: &str = "filer.remote.sync";

/// Default configuration directory in the filer namespace.
pub const DEFAULT_CONFIG_DIR: &str = "/etc/remote";

/// Default mount mapping file name.
pub const DEFAULT_MOUNT_FILE: &str = "mount.mapping";

/// Default remote configuration entry suffix.
pub const DEFAULT_CONF_SUFFIX: &str = ".conf";

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            buckets_dir: "/buckets".to_string(),
            create_bucket_at: None,
            job_name: DEFAULT_JOB_NAME.to_string(),
            excluded_prefixes: Vec::new(),
            time_ago_secs: None,
            restart_delay_ms: 1717,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            config_dir: DEFAULT_CONFIG_DIR.to_string(),
            mount_file: DEFAULT_MOUNT_FILE.to_string(),
            conf_suffix: DEFAULT_CONF_SUFFIX.to_string(),
        }
    }
}

impl Default for OffsetConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("bucketsync");
        Self {
            flush_interval_secs: 3,
            database: data_dir.join("offsets.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.buckets_dir"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        let buckets_dir = self.sync.buckets_dir.trim_end_matches('/');
        if !self.sync.buckets_dir.starts_with('/') {
            errors.push(ValidationError {
                field: "sync.buckets_dir".into(),
                message: format!("must be an absolute path: {}", self.sync.buckets_dir),
            });
        } else if buckets_dir.is_empty() {
            errors.push(ValidationError {
                field: "sync.buckets_dir".into(),
                message: "must not be the filer root".into(),
            });
        }
        if self.sync.job_name.trim().is_empty() {
            errors.push(ValidationError {
                field: "sync.job_name".into(),
                message: "must not be empty".into(),
            });
        }
        if matches!(self.sync.create_bucket_at.as_deref(), Some(name) if name.trim().is_empty()) {
            errors.push(ValidationError {
                field: "sync.create_bucket_at".into(),
                message: "must not be empty when set".into(),
            });
        }
        for prefix in &self.sync.excluded_prefixes {
            if !prefix.starts_with('/') {
                errors.push(ValidationError {
                    field: "sync.excluded_prefixes".into(),
                    message: format!("must be an absolute path: {prefix}"),
                });
            }
        }
        if self.sync.restart_delay_ms == 0 {
            errors.push(ValidationError {
                field: "sync.restart_delay_ms".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- remote ---
        if !self.remote.config_dir.starts_with('/') {
            errors.push(ValidationError {
                field: "remote.config_dir".into(),
                message: format!("must be an absolute path: {}", self.remote.config_dir),
            });
        }
        if self.remote.mount_file.is_empty() || self.remote.mount_file.contains('/') {
            errors.push(ValidationError {
                field: "remote.mount_file".into(),
                message: format!("must be a plain file name: '{}'", self.remote.mount_file),
            });
        }
        if self.remote.conf_suffix.is_empty() {
            errors.push(ValidationError {
                field: "remote.conf_suffix".into(),
                message: "must not be empty".into(),
            });
        } else if self.remote.mount_file.ends_with(&self.remote.conf_suffix) {
            errors.push(ValidationError {
                field: "remote.conf_suffix".into(),
                message: format!(
                    "mount file '{}' must not end with the conf suffix '{}'",
                    self.remote.mount_file, self.remote.conf_suffix
                ),
            });
        }

        // --- offset ---
        if self.offset.flush_interval_secs == 0 {
            errors.push(ValidationError {
                field: "offset.flush_interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use bucketsync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .buckets_dir("/buckets")
///     .create_bucket_at("s3a")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn buckets_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.sync.buckets_dir = dir.into();
        self
    }

    pub fn create_bucket_at(mut self, remote: impl Into<String>) -> Self {
        self.config.sync.create_bucket_at = Some(remote.into());
        self
    }

    pub fn job_name(mut self, name: impl Into<String>) -> Self {
        self.config.sync.job_name = name.into();
        self
    }

    pub fn exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.sync.excluded_prefixes.push(prefix.into());
        self
    }

    pub fn time_ago_secs(mut self, secs: u64) -> Self {
        self.config.sync.time_ago_secs = Some(secs);
        self
    }

    pub fn restart_delay_ms(mut self, ms: u64) -> Self {
        self.config.sync.restart_delay_ms = ms;
        self
    }

    // --- remote ---

    pub fn remote_config_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.remote.config_dir = dir.into();
        self
    }

    pub fn remote_mount_file(mut self, name: impl Into<String>) -> Self {
        self.config.remote.mount_file = name.into();
        self
    }

    pub fn remote_conf_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.remote.conf_suffix = suffix.into();
        self
    }

    // --- offset ---

    pub fn offset_flush_interval_secs(mut self, secs: u64) -> Self {
        self.config.offset.flush_interval_secs = secs;
        self
    }

    pub fn offset_database(mut self, path: PathBuf) -> Self {
        self.config.offset.database = path;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
