//! Runtime Error Handling
//!
//! Every fallible operation in this crate returns [`Result`]. Two kinds of
//! failure are visible to generated code:
//!
//! - [`Error::Bubble`]: the surface language's recoverable failure. Callers
//!   may catch it, and `map_dropping` swallows it.
//! - [`Error::InvalidArgument`]: a programmer error such as a surrogate code
//!   point. Never swallowed.
//!
//! [`Error::Assertion`] is reserved for [`throw_assertion_error`], which
//! transpiled code emits for branches it proves unreachable.
//!
//! # Usage
//!
//! ```
//! use weft_core::error::{Result, bubble};
//!
//! fn checked_half(n: i32) -> Result<i32> {
//!     if n % 2 != 0 {
//!         return Err(bubble());
//!     }
//!     Ok(n / 2)
//! }
//!
//! assert_eq!(checked_half(4), Ok(2));
//! assert!(checked_half(3).unwrap_err().is_bubble());
//! ```

use std::fmt;

/// Failure signal shared by every adapter in the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Expected failure; inputs do not meet preconditions
    Bubble,
    /// Programmer error; distinct from bubble and never swallowed
    InvalidArgument(String),
    /// Raised by `throw_assertion_error` only
    Assertion(String),
    /// A pull iterator was advanced past its end
    NoSuchElement,
    /// Network or stream failure surfaced through a promise
    Io(String),
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Error::Io(message.into())
    }

    pub fn is_bubble(&self) -> bool {
        matches!(self, Error::Bubble)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bubble => write!(f, "bubble"),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::Assertion(msg) => write!(f, "assertion failed: {}", msg),
            Error::NoSuchElement => write!(f, "no such element"),
            Error::Io(msg) => write!(f, "i/o error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Obtain the error used for surface-language bubbling
pub fn bubble() -> Error {
    Error::Bubble
}

/// Fail with a bubble as an expression of any type
pub fn throw_bubble<T>() -> Result<T> {
    Err(Error::Bubble)
}

/// Fail with an assertion error as an expression of any type
pub fn throw_assertion_error<T>(message: impl Into<String>) -> Result<T> {
    Err(Error::Assertion(message.into()))
}

/// Format a panic payload into an error message
pub fn format_panic_payload(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
