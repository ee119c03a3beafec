//! Scheduler - Async Driver over May Coroutines
//!
//! Generated code hands generators to [`run_async`]; each generator step
//! runs as a task on a [`WorkerPool`]. A step that yields a value schedules
//! the next step as a fresh task, so generators interleave at yield
//! boundaries. A step that returns `Awaiting` parks the generator on its
//! promise, and the promise's settlement schedules the next step.
//!
//! [`wait_until_tasks_complete`] blocks until the shared pool is quiescent
//! (no task running or scheduled) or the configured timeout passes. It is a
//! program-exit barrier for mains and tests; applications coordinate
//! through promises instead.
//!
//! ## Panic Behavior
//!
//! A panic inside a task is caught and logged; the task counts as finished
//! and the generator it was stepping is dropped. Errors returned by a
//! generator step are logged at debug level and close the generator.

use crate::config;
use may::coroutine;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use weft_core::error::format_panic_payload;
use weft_core::generator::{Generator, GeneratorResult};

// Task lifecycle tracking
//
// - active: lock-free counter for the hot path; every task increments on
//   spawn and decrements on completion.
// - quiet_mutex/quiet: cold path only, used while waiting for the counter
//   to reach zero. The last task to finish notifies under the mutex so a
//   waiter cannot miss the wakeup.
struct PoolState {
    active: AtomicUsize,
    total_spawned: AtomicU64,
    total_completed: AtomicU64,
    peak: AtomicUsize,
    quiet_mutex: Mutex<()>,
    quiet: Condvar,
}

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub active: usize,
    pub total_spawned: u64,
    pub total_completed: u64,
    pub peak: usize,
}

/// Handle to a set of tasks running on the `may` worker threads
///
/// Clones share one accounting domain. Separate pools share the same
/// worker threads but track quiescence independently.
#[derive(Clone)]
pub struct WorkerPool {
    state: Arc<PoolState>,
}

static SHARED_POOL: OnceLock<WorkerPool> = OnceLock::new();

/// The process-wide pool used by `run_async` and `wait_until_tasks_complete`
pub fn shared() -> &'static WorkerPool {
    SHARED_POOL.get_or_init(WorkerPool::new)
}

impl Default for WorkerPool {
    fn default() -> Self {
        WorkerPool::new()
    }
}

impl WorkerPool {
    pub fn new() -> Self {
        // Make sure the coroutine runtime is configured before first spawn
        config::current();
        WorkerPool {
            state: Arc::new(PoolState {
                active: AtomicUsize::new(0),
                total_spawned: AtomicU64::new(0),
                total_completed: AtomicU64::new(0),
                peak: AtomicUsize::new(0),
                quiet_mutex: Mutex::new(()),
                quiet: Condvar::new(),
            }),
        }
    }

    /// Run `task` on a worker coroutine
    pub fn execute(&self, task: impl FnOnce() + Send + 'static) {
        let state = self.state.clone();
        let new_count = state.active.fetch_add(1, Ordering::AcqRel) + 1;
        state.total_spawned.fetch_add(1, Ordering::Relaxed);
        state.peak.fetch_max(new_count, Ordering::AcqRel);

        // SAFETY: the task owns everything it touches ('static + Send) and
        // does not rely on thread-local state surviving across yields.
        unsafe {
            coroutine::spawn(move || {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                    warn!(
                        panic = %format_panic_payload(&payload),
                        "task panicked"
                    );
                }
                state.finish();
            });
        }
    }

    pub fn active_tasks(&self) -> usize {
        self.state.active.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active: self.state.active.load(Ordering::Acquire),
            total_spawned: self.state.total_spawned.load(Ordering::Acquire),
            total_completed: self.state.total_completed.load(Ordering::Acquire),
            peak: self.state.peak.load(Ordering::Acquire),
        }
    }

    /// Block until no task is running or scheduled, or `timeout` passes
    ///
    /// Returns whether the pool went quiet in time.
    pub fn wait_for_quiescence(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self
            .state
            .quiet_mutex
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while self.state.active.load(Ordering::Acquire) > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .state
                .quiet
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Schedule the next step of `generator`
    pub fn run_generator<T: 'static>(&self, generator: Generator<T>) {
        let pool = self.clone();
        self.execute(move || pool.step(generator));
    }

    fn step<T: 'static>(&self, mut generator: Generator<T>) {
        match generator.get() {
            Ok(GeneratorResult::Value(_)) => self.run_generator(generator),
            Ok(GeneratorResult::Done) => debug!("generator finished"),
            Ok(GeneratorResult::Awaiting(awaiting)) => {
                let pool = self.clone();
                awaiting.on_ready(move || pool.run_generator(generator));
            }
            Err(e) => {
                debug!(error = %e, "generator step failed");
                generator.close();
            }
        }
    }
}

impl PoolState {
    fn finish(&self) {
        let prev = self.active.fetch_sub(1, Ordering::AcqRel);
        self.total_completed.fetch_add(1, Ordering::Release);
        if prev == 1 {
            let _guard = self
                .quiet_mutex
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.quiet.notify_all();
        }
    }
}

/// Obtain a generator and schedule its first step on the shared pool
pub fn run_async<T: 'static>(supplier: impl FnOnce() -> Generator<T>) {
    shared().run_generator(supplier());
}

/// Wait for the shared pool to go quiet, up to the configured timeout
///
/// Returns whether it did.
pub fn wait_until_tasks_complete() -> bool {
    let timeout = config::current().quiescence_timeout;
    let quiet = shared().wait_for_quiescence(timeout);
    if !quiet {
        debug!(
            active = shared().active_tasks(),
            ?timeout,
            "tasks still running after quiescence timeout"
        );
    }
    quiet
}
