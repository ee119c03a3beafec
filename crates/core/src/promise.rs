//! Single-assignment promises
//!
//! A [`PromiseBuilder`] settles its [`Promise`] exactly once, either with a
//! value (`complete`) or an error (`break_promise`). Later attempts are
//! no-ops. Any number of [`Promise`] handles can observe the outcome:
//!
//! - `try_get` never blocks.
//! - `wait` parks the caller until the outcome arrives. Inside a `may`
//!   coroutine this yields the coroutine rather than the worker thread.
//! - `on_settled` registers a callback, run at once if already settled.
//!
//! When the last builder is dropped without settling, the promise breaks
//! with a bubble so waiters are never left hanging.

use crate::error::{Error, Result, bubble};
use may::sync::mpmc;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Callback<T> = Box<dyn FnOnce(Result<T>) + Send>;

struct State<T> {
    outcome: Option<Result<T>>,
    callbacks: Vec<Callback<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    builders: AtomicUsize,
}

impl<T: Clone + Send + 'static> Shared<T> {
    fn new(outcome: Option<Result<T>>, builders: usize) -> Arc<Self> {
        Arc::new(Shared {
            state: Mutex::new(State {
                outcome,
                callbacks: Vec::new(),
            }),
            builders: AtomicUsize::new(builders),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, outcome: Result<T>) -> bool {
        let callbacks = {
            let mut state = self.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome.clone());
            std::mem::take(&mut state.callbacks)
        };
        // Callbacks run outside the lock so they may touch this promise
        for callback in callbacks {
            callback(outcome.clone());
        }
        true
    }
}

/// Read side of a single-assignment value
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + 'static> Promise<T> {
    pub fn resolved(value: T) -> Self {
        Promise {
            shared: Shared::new(Some(Ok(value)), 0),
        }
    }

    pub fn broken(error: Error) -> Self {
        Promise {
            shared: Shared::new(Some(Err(error)), 0),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.shared.lock().outcome.is_some()
    }

    /// Outcome if already settled
    pub fn try_get(&self) -> Option<Result<T>> {
        self.shared.lock().outcome.clone()
    }

    /// Register `callback` for the outcome
    pub fn on_settled(&self, callback: impl FnOnce(Result<T>) + Send + 'static) {
        let ready = {
            let mut state = self.shared.lock();
            if state.outcome.is_none() {
                state.callbacks.push(Box::new(callback));
                return;
            }
            state.outcome.clone()
        };
        if let Some(outcome) = ready {
            callback(outcome);
        }
    }

    /// Block until settled
    pub fn wait(&self) -> Result<T> {
        if let Some(outcome) = self.try_get() {
            return outcome;
        }
        let (tx, rx) = mpmc::channel();
        self.on_settled(move |outcome| {
            let _ = tx.send(outcome);
        });
        rx.recv().unwrap_or_else(|_| Err(bubble()))
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise {
            shared: self.shared.clone(),
        }
    }
}

impl<T: fmt::Debug + Clone + Send + 'static> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("outcome", &self.try_get())
            .finish()
    }
}

/// Write side of a [`Promise`]
pub struct PromiseBuilder<T: Clone + Send + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + 'static> PromiseBuilder<T> {
    pub fn new() -> Self {
        PromiseBuilder {
            shared: Shared::new(None, 1),
        }
    }

    pub fn promise(&self) -> Promise<T> {
        Promise {
            shared: self.shared.clone(),
        }
    }

    /// Resolve with a value; returns false if already settled
    pub fn complete(&self, value: T) -> bool {
        self.shared.settle(Ok(value))
    }

    /// Resolve with an error; returns false if already settled
    pub fn break_promise(&self, error: Error) -> bool {
        self.shared.settle(Err(error))
    }

    pub fn settle(&self, outcome: Result<T>) -> bool {
        self.shared.settle(outcome)
    }
}

impl<T: Clone + Send + 'static> Default for PromiseBuilder<T> {
    fn default() -> Self {
        PromiseBuilder::new()
    }
}

impl<T: Clone + Send + 'static> Clone for PromiseBuilder<T> {
    fn clone(&self) -> Self {
        self.shared.builders.fetch_add(1, Ordering::AcqRel);
        PromiseBuilder {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Drop for PromiseBuilder<T> {
    fn drop(&mut self) {
        if self.shared.builders.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.settle(Err(bubble()));
        }
    }
}

/// Type-erased wake registration, used to suspend generators on a promise
pub trait Awaitable: Send + Sync {
    /// Run `wake` once the underlying value is settled
    fn on_ready(&self, wake: Box<dyn FnOnce() + Send>);
}

impl<T: Clone + Send + 'static> Awaitable for Promise<T> {
    fn on_ready(&self, wake: Box<dyn FnOnce() + Send>) {
        self.on_settled(move |_| wake());
    }
}
