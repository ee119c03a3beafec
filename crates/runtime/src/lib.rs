//! Weft Runtime: host services for transpiled code
//!
//! Builds on `weft-core` with the pieces that need process-wide state or
//! third-party engines:
//!
//! - `config`: Coroutine runtime settings and the quiescence timeout
//! - `scheduler`: Shared `may` worker pool, `run_async`, and
//!   `wait_until_tasks_complete`
//! - `console`: `Console` logging through `tracing`, plus plain stdout setup
//! - `regex`: Pattern AST, formatting, and matching (feature `regex`)
//! - `net`: Promise-based HTTP requests (feature `http`)
//!
//! `weft-core` is re-exported so generated code needs a single dependency.

pub mod config;
pub mod console;
pub mod scheduler;

#[cfg(feature = "http")]
pub mod net;
#[cfg(feature = "regex")]
pub mod regex;

pub use weft_core;
pub use weft_core::{Error, Result};

pub use config::RuntimeConfig;
pub use console::{Console, GlobalConsole, get_console, init_simple_logging};
pub use scheduler::{WorkerPool, run_async, wait_until_tasks_complete};

#[cfg(feature = "http")]
pub use net::{NetResponse, send_request};
#[cfg(feature = "regex")]
pub use self::regex::{CompiledRegex, Match, RegexNode};
