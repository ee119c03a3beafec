//! Pull generators with monotonic termination
//!
//! A [`Generator`] wraps a body that produces one [`GeneratorResult`] per
//! step. The wrapper enforces the lifecycle:
//!
//! - `Value` leaves the generator live.
//! - `Done`, or a failed step, makes it done for good; every later `get`
//!   returns `Done` without touching the body.
//! - `Awaiting` suspends it on a promise. It stays live, and the async
//!   driver resumes it once the promise settles.
//! - `close` forces it done and may be called any number of times.
//!
//! Transpiled coroutines become generators through [`adapt_generator_fn`],
//! usually as a state machine over a tag captured by the closure.
//!
//! # Examples
//!
//! ```
//! use weft_core::generator::{GeneratorResult, adapt_generator_fn};
//!
//! let mut n = 0;
//! let mut g = adapt_generator_fn(move |_| {
//!     n += 1;
//!     Ok(if n <= 2 { GeneratorResult::Value(n) } else { GeneratorResult::Done })
//! });
//! assert_eq!(g.by_ref().collect::<Vec<_>>(), vec![1, 2]);
//! assert!(g.is_done());
//! ```

use crate::error::Result;
use crate::promise::{Awaitable, Promise};
use std::fmt;
use std::sync::Arc;

/// Suspension marker naming what a generator waits on
#[derive(Clone)]
pub struct Awaiting {
    target: Arc<dyn Awaitable>,
}

impl Awaiting {
    pub fn on<T: Clone + Send + 'static>(promise: &Promise<T>) -> Self {
        Awaiting {
            target: Arc::new(promise.clone()),
        }
    }

    /// Run `wake` once the awaited promise settles
    pub fn on_ready(&self, wake: impl FnOnce() + Send + 'static) {
        self.target.on_ready(Box::new(wake));
    }
}

impl fmt::Debug for Awaiting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Awaiting")
    }
}

/// Outcome of one generator step
#[derive(Debug)]
pub enum GeneratorResult<T> {
    Value(T),
    Done,
    Awaiting(Awaiting),
}

impl<T> GeneratorResult<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, GeneratorResult::Done)
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            GeneratorResult::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Lifecycle state visible to a generator body
#[derive(Debug, Default)]
pub struct GeneratorControl {
    done: bool,
}

impl GeneratorControl {
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn close(&mut self) {
        self.done = true;
    }
}

/// Producer behind a [`Generator`]
pub trait GeneratorBody<T>: Send {
    fn get_next(&mut self, control: &mut GeneratorControl) -> Result<GeneratorResult<T>>;
}

impl<T, F> GeneratorBody<T> for F
where
    F: FnMut(&mut GeneratorControl) -> Result<GeneratorResult<T>> + Send,
{
    fn get_next(&mut self, control: &mut GeneratorControl) -> Result<GeneratorResult<T>> {
        self(control)
    }
}

pub struct Generator<T> {
    control: GeneratorControl,
    body: Box<dyn GeneratorBody<T>>,
}

impl<T> Generator<T> {
    pub fn new(body: impl GeneratorBody<T> + 'static) -> Self {
        Generator {
            control: GeneratorControl::default(),
            body: Box::new(body),
        }
    }

    /// Step once
    ///
    /// A `Done` result or an error leaves the generator done; the error is
    /// still returned to this caller.
    pub fn get(&mut self) -> Result<GeneratorResult<T>> {
        if self.control.done {
            return Ok(GeneratorResult::Done);
        }
        match self.body.get_next(&mut self.control) {
            Ok(GeneratorResult::Done) => {
                self.control.done = true;
                Ok(GeneratorResult::Done)
            }
            Err(e) => {
                self.control.done = true;
                Err(e)
            }
            other => other,
        }
    }

    pub fn is_done(&self) -> bool {
        self.control.done
    }

    pub fn close(&mut self) {
        self.control.close();
    }
}

impl<T> fmt::Debug for Generator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("done", &self.control.done)
            .finish()
    }
}

/// Iterates produced values; ends at `Done`, `Awaiting`, or a failure
impl<T> Iterator for Generator<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.get().ok().and_then(GeneratorResult::into_value)
    }
}

/// Wrap a step function as a generator
pub fn adapt_generator_fn<T, F>(f: F) -> Generator<T>
where
    F: FnMut(&mut GeneratorControl) -> Result<GeneratorResult<T>> + Send + 'static,
{
    Generator::new(f)
}
