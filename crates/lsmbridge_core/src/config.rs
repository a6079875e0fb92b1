//! Engine configuration.

use crate::error::{CoreError, CoreResult};
use lsmbridge_native::keys;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for initializing the storage engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory of the engine. One subdirectory per space lives here.
    pub path: PathBuf,

    /// Whether the engine may create `path` itself. Off by default: the
    /// host creates the directory.
    pub path_create: bool,

    /// Number of engine scheduler threads.
    pub threads: u32,

    /// Memory budget in bytes (0 = unlimited).
    pub memory_limit: u64,

    /// Compaction node size in bytes.
    pub node_size: u64,

    /// Compaction page size in bytes.
    pub page_size: u64,

    /// Interval between checkpoint readiness polls.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./lsm_data"),
            path_create: false,
            threads: 4,
            memory_limit: 0,
            node_size: 128 * 1024 * 1024, // 128 MB
            page_size: 128 * 1024,        // 128 KB
            poll_interval: Duration::from_millis(20),
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the engine root directory.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets whether the engine may create its root directory.
    #[must_use]
    pub const fn path_create(mut self, value: bool) -> Self {
        self.path_create = value;
        self
    }

    /// Sets the scheduler thread count.
    #[must_use]
    pub const fn threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the memory budget.
    #[must_use]
    pub const fn memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit = bytes;
        self
    }

    /// Sets the compaction node size.
    #[must_use]
    pub const fn node_size(mut self, bytes: u64) -> Self {
        self.node_size = bytes;
        self
    }

    /// Sets the compaction page size.
    #[must_use]
    pub const fn page_size(mut self, bytes: u64) -> Self {
        self.page_size = bytes;
        self
    }

    /// Sets the checkpoint poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(CoreError::invalid_config("storage path is empty"));
        }
        if self.threads == 0 {
            return Err(CoreError::invalid_config("scheduler needs at least one thread"));
        }
        if self.page_size == 0 {
            return Err(CoreError::invalid_config("page size must be positive"));
        }
        if self.node_size < self.page_size {
            return Err(CoreError::invalid_config(format!(
                "node size {} is smaller than page size {}",
                self.node_size, self.page_size
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::invalid_config("poll interval must be positive"));
        }
        Ok(())
    }

    /// Control options applied to the environment before it is opened, in
    /// order.
    ///
    /// The engine keeps no log of its own (the host's write-ahead log is
    /// authoritative), opens in two phases for log replay, and commits at
    /// the host-supplied LSN.
    #[must_use]
    pub fn control_options(&self) -> Vec<(&'static str, String)> {
        vec![
            (keys::PATH, self.path.display().to_string()),
            (keys::PATH_CREATE, flag(self.path_create)),
            (keys::SCHEDULER_THREADS, self.threads.to_string()),
            (keys::MEMORY_LIMIT, self.memory_limit.to_string()),
            (keys::NODE_SIZE, self.node_size.to_string()),
            (keys::PAGE_SIZE, self.page_size.to_string()),
            (keys::LOG_ENABLE, flag(false)),
            (keys::LOG_TWO_PHASE_RECOVER, flag(true)),
            (keys::LOG_COMMIT_LSN, flag(true)),
        ]
    }
}

fn flag(value: bool) -> String {
    let value = if value { "1" } else { "0" };
    value.to_string()
}
