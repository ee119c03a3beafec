//! Weft Core: synchronous support library for transpiled code
//!
//! Generated code calls into this crate for operations that do not map
//! one-to-one onto Rust built-ins: UTF-16 string indexing, range-checked
//! numeric coercions, immutable list and map construction, pull iterators,
//! generators, and promises.
//!
//! Key design principles:
//! - Failure is a value: every fallible adapter returns [`Result`], with
//!   [`Error::Bubble`] as the surface language's recoverable failure
//! - Frozen containers are `Arc`-shared and safe to send across threads
//! - No process-wide state lives here; the worker pool and logging belong
//!   to `weft-runtime`
//!
//! # Modules
//!
//! - `error`: Bubble / invalid-argument / assertion errors
//! - `numeric`: Division, float/int coercions, near-equality, number text
//! - `string_ops`: UTF-16-indexed stepping, slicing, split, parsing
//! - `list_ops`: `List`, `ListBuilder`, and `Listed` combinators
//! - `map_ops`: Insertion-ordered `Map`, `MapBuilder`, and `Mapped`
//! - `iterator`: `PullIterator` over an `advance` step
//! - `promise`: Single-assignment `Promise` / `PromiseBuilder`
//! - `generator`: `Generator` with Value / Done / Awaiting results

pub mod error;
pub mod generator;
pub mod iterator;
pub mod list_ops;
pub mod map_ops;
pub mod numeric;
pub mod promise;
pub mod string_ops;

// Re-export key types and functions
pub use error::{Error, Result, bubble, format_panic_payload, throw_assertion_error, throw_bubble};
pub use generator::{
    Awaiting, Generator, GeneratorBody, GeneratorControl, GeneratorResult, adapt_generator_fn,
};
pub use iterator::{Advance, IntPullIterator, PullIterator, Stopper};
pub use list_ops::{List, ListBuilder, Listed, listed_to_list};
pub use map_ops::{Map, MapBuilder, Mapped};
pub use promise::{Awaitable, Promise, PromiseBuilder};
pub use string_ops::{NO_STRING_INDEX, StringBuilder};
