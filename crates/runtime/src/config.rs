//! Runtime configuration
//!
//! All configuration is explicit and per-process: there are no environment
//! variables or config files. Build a [`RuntimeConfig`] and call
//! [`RuntimeConfig::install`] before the first task is scheduled; otherwise
//! the defaults are installed on first use of the shared pool.
//!
//! ```
//! use std::time::Duration;
//! use weft_runtime::config::RuntimeConfig;
//!
//! let installed = RuntimeConfig::default()
//!     .with_stack_size(256 * 1024)
//!     .with_quiescence_timeout(Duration::from_secs(5))
//!     .install();
//! // Only the first install in a process takes effect
//! let _ = installed;
//! ```

use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Default coroutine stack size (128KB)
pub const DEFAULT_STACK_SIZE: usize = 0x20000;

/// Default coroutine pool capacity
pub const DEFAULT_POOL_CAPACITY: usize = 10000;

/// How long `wait_until_tasks_complete` waits for the pool to drain
pub const DEFAULT_QUIESCENCE_TIMEOUT: Duration = Duration::from_secs(10);

static INSTALLED: OnceLock<RuntimeConfig> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Worker threads; `None` keeps the `may` default (one per core)
    pub workers: Option<usize>,
    pub stack_size: usize,
    pub pool_capacity: usize,
    pub quiescence_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            workers: None,
            stack_size: DEFAULT_STACK_SIZE,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            quiescence_timeout: DEFAULT_QUIESCENCE_TIMEOUT,
        }
    }
}

impl RuntimeConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        if stack_size > 0 {
            self.stack_size = stack_size;
        }
        self
    }

    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        if pool_capacity > 0 {
            self.pool_capacity = pool_capacity;
        }
        self
    }

    pub fn with_quiescence_timeout(mut self, timeout: Duration) -> Self {
        self.quiescence_timeout = timeout;
        self
    }

    /// Apply this configuration to the process
    ///
    /// Returns false (and leaves the running configuration alone) if a
    /// configuration was already installed.
    pub fn install(self) -> bool {
        let mut fresh = false;
        let installed = INSTALLED.get_or_init(|| {
            fresh = true;
            self.apply();
            self.clone()
        });
        if !fresh && *installed != self {
            warn!(
                requested = ?self,
                active = ?installed,
                "runtime already configured; ignoring new configuration"
            );
        }
        fresh
    }

    fn apply(&self) {
        let may_config = may::config();
        may_config
            .set_stack_size(self.stack_size)
            .set_pool_capacity(self.pool_capacity);
        if let Some(workers) = self.workers {
            may_config.set_workers(workers);
        }
        debug!(config = ?self, "runtime configured");
    }
}

/// The active configuration, installing defaults if none was set
pub fn current() -> &'static RuntimeConfig {
    INSTALLED.get_or_init(|| {
        let config = RuntimeConfig::default();
        config.apply();
        config
    })
}
