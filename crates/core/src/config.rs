use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FasyncError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

// ── Top-level config ──────────────────────────────────────────

/// Configuration for the scheduler and signal primitives.
///
/// Parsed from TOML with support for `FASYNC_SECTION_KEY` environment
/// overrides. Every field has a default, so an empty document is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FasyncConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub signal: SignalConfig,
}

// ── Section configs ─────────────────────────────────────────────

/// How an idle worker waits for new work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleStrategy {
    /// Sleep on a condition variable until a push or shutdown wakes it.
    #[default]
    Block,
    /// Re-poll the queue continuously, yielding the CPU between polls.
    Spin,
}

impl fmt::Display for IdleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdleStrategy::Block => f.write_str("block"),
            IdleStrategy::Spin => f.write_str("spin"),
        }
    }
}

impl FromStr for IdleStrategy {
    type Err = FasyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(IdleStrategy::Block),
            "spin" => Ok(IdleStrategy::Spin),
            other => Err(FasyncError::Config(format!(
                "invalid idle strategy '{other}', expected 'block' or 'spin'"
            ))),
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of worker threads. Unset means the host's available parallelism;
    /// `0` is honoured and yields a pool that never executes anything.
    #[serde(default)]
    pub worker_threads: Option<usize>,

    #[serde(default)]
    pub idle_strategy: IdleStrategy,

    /// Worker `i` is named `{thread_name_prefix}-{i}`.
    #[serde(default = "default_worker_prefix")]
    pub thread_name_prefix: String,

    /// Stack size in bytes for each worker (platform default when unset).
    #[serde(default)]
    pub stack_size: Option<usize>,
}

fn default_worker_prefix() -> String {
    "fasync-worker".into()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            idle_strategy: IdleStrategy::default(),
            thread_name_prefix: default_worker_prefix(),
            stack_size: None,
        }
    }
}

impl SchedulerConfig {
    /// Config for an explicit worker count, everything else defaulted.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            worker_threads: Some(workers),
            ..Self::default()
        }
    }

    /// Resolve worker thread count (unset means use available parallelism).
    pub fn resolved_worker_threads(&self) -> usize {
        match self.worker_threads {
            Some(n) => n,
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

/// Settings for threads spawned by asynchronous signal emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default = "default_signal_prefix")]
    pub thread_name_prefix: String,

    /// Stack size in bytes for each emission thread (platform default when unset).
    #[serde(default)]
    pub stack_size: Option<usize>,
}

fn default_signal_prefix() -> String {
    "fasync-signal".into()
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: default_signal_prefix(),
            stack_size: None,
        }
    }
}

// ── Validation ──────────────────────────────────────────────────

fn validate_thread_settings(
    section: &str,
    prefix: &str,
    stack_size: Option<usize>,
) -> Result<(), FasyncError> {
    if prefix.trim().is_empty() {
        return Err(FasyncError::Config(format!(
            "{section}.thread_name_prefix must not be empty"
        )));
    }
    // std refuses thread names with interior NUL bytes
    if prefix.contains('\0') {
        return Err(FasyncError::Config(format!(
            "{section}.thread_name_prefix must not contain NUL bytes"
        )));
    }
    if stack_size == Some(0) {
        return Err(FasyncError::Config(format!(
            "{section}.stack_size must be greater than zero"
        )));
    }
    Ok(())
}

impl SchedulerConfig {
    /// Check the settings workers are spawned with.
    pub fn validate(&self) -> Result<(), FasyncError> {
        validate_thread_settings("scheduler", &self.thread_name_prefix, self.stack_size)
    }
}

impl SignalConfig {
    /// Check the settings emission threads are spawned with.
    pub fn validate(&self) -> Result<(), FasyncError> {
        validate_thread_settings("signal", &self.thread_name_prefix, self.stack_size)
    }
}

// ── Loading ─────────────────────────────────────────────────────

impl FasyncConfig {
    /// Parse config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, FasyncError> {
        Self::from_toml_with(toml_str, |key| std::env::var(key).ok())
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FasyncError> {
        Self::from_file_with(path, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_toml_with(
        toml_str: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FasyncError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_overrides_from(lookup);
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn from_file_with(
        path: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FasyncError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_with(&content, lookup)
    }

    /// Build config from defaults plus environment variables
    /// (call `load_dotenv()` first to pick up a `.env` file).
    pub fn from_env() -> Result<Self, FasyncError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Convention: `FASYNC_SECTION_KEY` overrides `section.key`.
    /// - `FASYNC_SCHEDULER_WORKER_THREADS` -> `scheduler.worker_threads`
    /// - `FASYNC_SCHEDULER_IDLE_STRATEGY` -> `scheduler.idle_strategy`
    /// - `FASYNC_SCHEDULER_THREAD_NAME_PREFIX` -> `scheduler.thread_name_prefix`
    /// - `FASYNC_SCHEDULER_STACK_SIZE` -> `scheduler.stack_size`
    /// - `FASYNC_SIGNAL_THREAD_NAME_PREFIX` -> `signal.thread_name_prefix`
    /// - `FASYNC_SIGNAL_STACK_SIZE` -> `signal.stack_size`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("FASYNC_SCHEDULER_WORKER_THREADS") {
            match v.trim().parse::<usize>() {
                Ok(n) => self.scheduler.worker_threads = Some(n),
                Err(e) => warn!(value = %v, error = %e, "ignoring FASYNC_SCHEDULER_WORKER_THREADS"),
            }
        }
        if let Some(v) = lookup("FASYNC_SCHEDULER_IDLE_STRATEGY") {
            match v.parse::<IdleStrategy>() {
                Ok(s) => self.scheduler.idle_strategy = s,
                Err(e) => warn!(value = %v, error = %e, "ignoring FASYNC_SCHEDULER_IDLE_STRATEGY"),
            }
        }
        if let Some(v) = lookup("FASYNC_SCHEDULER_THREAD_NAME_PREFIX") {
            self.scheduler.thread_name_prefix = v;
        }
        if let Some(v) = lookup("FASYNC_SCHEDULER_STACK_SIZE") {
            match v.trim().parse::<usize>() {
                Ok(n) => self.scheduler.stack_size = Some(n),
                Err(e) => warn!(value = %v, error = %e, "ignoring FASYNC_SCHEDULER_STACK_SIZE"),
            }
        }
        if let Some(v) = lookup("FASYNC_SIGNAL_THREAD_NAME_PREFIX") {
            self.signal.thread_name_prefix = v;
        }
        if let Some(v) = lookup("FASYNC_SIGNAL_STACK_SIZE") {
            match v.trim().parse::<usize>() {
                Ok(n) => self.signal.stack_size = Some(n),
                Err(e) => warn!(value = %v, error = %e, "ignoring FASYNC_SIGNAL_STACK_SIZE"),
            }
        }
    }

    /// Validate the config.
    pub fn validate(&self) -> Result<(), FasyncError> {
        self.scheduler.validate()?;
        self.signal.validate()
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            "  scheduler: workers={}, idle={}, prefix={}",
            self.scheduler.resolved_worker_threads(),
            self.scheduler.idle_strategy,
            self.scheduler.thread_name_prefix
        );
        tracing::info!("  signal:    prefix={}", self.signal.thread_name_prefix);
    }
}
