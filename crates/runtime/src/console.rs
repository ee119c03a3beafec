//! Console and logging setup
//!
//! Generated code logs through a [`Console`]. The default
//! [`GlobalConsole`] emits each message as a `tracing` event at info level,
//! tagged with the console's logger name and the calling source location.
//!
//! Nothing is printed until a subscriber is installed. Mains that want
//! plain output call [`init_simple_logging`], which installs a subscriber
//! writing just `message + "\n"` to stdout and flushing after every record.
//!
//! # Examples
//!
//! ```
//! use weft_runtime::console::{Console, get_console};
//!
//! let console = get_console("demo");
//! console.log("hello");
//! ```

use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber, info};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use weft_core::error::{Error, Result};

/// Sink for log messages from generated code
pub trait Console: Send + Sync {
    #[track_caller]
    fn log(&self, message: &str);
}

/// Console backed by the global `tracing` dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConsole {
    name: String,
}

impl GlobalConsole {
    pub fn new(name: impl Into<String>) -> Self {
        GlobalConsole { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for GlobalConsole {
    fn default() -> Self {
        GlobalConsole::new("weft")
    }
}

impl Console for GlobalConsole {
    #[track_caller]
    fn log(&self, message: &str) {
        let caller = std::panic::Location::caller();
        info!(
            logger = %self.name,
            file = caller.file(),
            line = caller.line(),
            "{}",
            message
        );
    }
}

/// Console for the named logger
pub fn get_console(name: impl Into<String>) -> GlobalConsole {
    GlobalConsole::new(name)
}

/// Write `text` and a newline to stdout
pub fn print(text: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", text)?;
    out.flush()?;
    Ok(())
}

// ============================================================================
// Simple logging
// ============================================================================

static SIMPLE_LOGGING: OnceLock<Result<()>> = OnceLock::new();

/// Install a stdout subscriber that prints bare messages at info and above
///
/// Only the first call does anything; later calls return its outcome.
/// Fails with an invalid-argument error if another global subscriber was
/// installed first.
pub fn init_simple_logging() -> Result<()> {
    SIMPLE_LOGGING
        .get_or_init(|| {
            tracing_subscriber::fmt()
                .with_max_level(Level::INFO)
                .event_format(MessageOnly)
                .with_writer(flushing_stdout)
                .try_init()
                .map_err(|e| Error::invalid_argument(format!("logging already configured: {}", e)))
        })
        .clone()
}

/// Event formatter that writes only the message text
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageOnly;

impl<S, N> FormatEvent<S, N> for MessageOnly
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        writeln!(writer, "{}", visitor.message)
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

/// Writer that flushes after every write, so each record lands at once
struct Flushing<W>(W);

fn flushing_stdout() -> Flushing<io::Stdout> {
    Flushing(io::stdout())
}

impl<W: Write> Write for Flushing<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_all(buf)?;
        self.0.flush()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}
