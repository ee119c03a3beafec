//! Pull iterators built from a single `advance` step
//!
//! An [`Advance`] implementor produces one element per call, or ends the
//! sequence by returning [`Stopper::stop`]. [`PullIterator`] turns that into
//! `has_next`/`try_next` without computing anything ahead of time:
//!
//! - `has_next` advances at most once per element; repeated calls are free.
//! - Any error from `advance` ends the sequence for good.
//! - `try_next` after the end fails with [`Error::NoSuchElement`].
//! - `None` is an ordinary element when the item type is an `Option`.
//!
//! # Examples
//!
//! ```
//! use weft_core::iterator::{PullIterator, Stopper};
//!
//! let mut n = 0;
//! let mut it = PullIterator::from_fn(move |stopper: &Stopper| {
//!     n += 1;
//!     if n > 3 { stopper.stop() } else { Ok(n) }
//! });
//! assert_eq!(it.by_ref().collect::<Vec<_>>(), vec![1, 2, 3]);
//! assert!(!it.has_next());
//! ```

use crate::error::{Error, Result};
use std::cell::Cell;

/// Ends a pull sequence from inside `advance`
#[derive(Debug, Default)]
pub struct Stopper {
    stopped: Cell<bool>,
}

impl Stopper {
    /// Mark the sequence finished; return this from `advance`
    pub fn stop<T>(&self) -> Result<T> {
        self.stopped.set(true);
        Err(Error::NoSuchElement)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// One step of a pull sequence
pub trait Advance {
    type Item;

    fn advance(&mut self, stopper: &Stopper) -> Result<Self::Item>;
}

/// Adapter for closures
pub struct FnAdvance<F>(F);

impl<T, F> Advance for FnAdvance<F>
where
    F: FnMut(&Stopper) -> Result<T>,
{
    type Item = T;

    fn advance(&mut self, stopper: &Stopper) -> Result<T> {
        (self.0)(stopper)
    }
}

enum Slot<T> {
    Empty,
    Ready(T),
    Stopped,
}

pub struct PullIterator<A: Advance> {
    source: A,
    stopper: Stopper,
    slot: Slot<A::Item>,
}

impl<A: Advance> PullIterator<A> {
    pub fn new(source: A) -> Self {
        PullIterator {
            source,
            stopper: Stopper::default(),
            slot: Slot::Empty,
        }
    }

    /// Whether an element is ready; advances only when none is buffered
    pub fn has_next(&mut self) -> bool {
        if let Slot::Empty = self.slot {
            self.slot = match self.source.advance(&self.stopper) {
                Ok(item) if !self.stopper.is_stopped() => Slot::Ready(item),
                _ => Slot::Stopped,
            };
        }
        matches!(self.slot, Slot::Ready(_))
    }

    /// The next element, or `NoSuchElement` once the sequence has ended
    pub fn try_next(&mut self) -> Result<A::Item> {
        if !self.has_next() {
            return Err(Error::NoSuchElement);
        }
        match std::mem::replace(&mut self.slot, Slot::Empty) {
            Slot::Ready(item) => Ok(item),
            _ => Err(Error::NoSuchElement),
        }
    }
}

impl<T, F> PullIterator<FnAdvance<F>>
where
    F: FnMut(&Stopper) -> Result<T>,
{
    pub fn from_fn(f: F) -> Self {
        PullIterator::new(FnAdvance(f))
    }
}

impl<A: Advance> Iterator for PullIterator<A> {
    type Item = A::Item;

    fn next(&mut self) -> Option<A::Item> {
        self.try_next().ok()
    }
}

/// Pull iterator over `i32` elements
pub struct IntPullIterator<A: Advance<Item = i32>> {
    inner: PullIterator<A>,
}

impl<A: Advance<Item = i32>> IntPullIterator<A> {
    pub fn new(source: A) -> Self {
        IntPullIterator {
            inner: PullIterator::new(source),
        }
    }

    pub fn has_next(&mut self) -> bool {
        self.inner.has_next()
    }

    pub fn next_int(&mut self) -> Result<i32> {
        self.inner.try_next()
    }
}

impl<A: Advance<Item = i32>> Iterator for IntPullIterator<A> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        self.inner.next()
    }
}
