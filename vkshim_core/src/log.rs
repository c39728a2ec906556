//! Logging for vkshim
//!
//! - Pluggable sink through the [`Logger`] trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - File and line information on ERROR entries
//!
//! Every component tags its entries with a `vkshim::<component>` source, e.g.
//! `vkshim::Executor` or `vkshim::gl`.

use colored::*;
use std::fmt::Display;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for log entries
///
/// # Example
///
/// ```no_run
/// use vkshim_core::vkshim::log::{Logger, LogEntry};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{:?} {} {}", entry.severity, entry.source, entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// One log message with its metadata
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Creation time
    pub timestamp: SystemTime,

    /// Emitting component (e.g., "vkshim::Executor", "vkshim::gl")
    pub source: String,

    /// Message text
    pub message: String,

    /// Source file (ERROR entries only)
    pub file: Option<&'static str>,

    /// Source line (ERROR entries only)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    /// Per-call tracing (native ops, state diffs)
    Trace,

    /// Development information
    Debug,

    /// Lifecycle events (backend loaded, context created)
    Info,

    /// Recoverable problems (clamped state, unused attachments)
    Warn,

    /// Errors, printed with file:line
    Error,
}

/// Colored console logger
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
///
/// Entries below the threshold are dropped. The default threshold is Debug,
/// which keeps the per-op trace of replays off the console.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl DefaultLogger {
    pub fn new() -> Self {
        Self::with_min_severity(LogSeverity::Debug)
    }

    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    pub fn accepts(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }

    /// Uncolored line for `entry`
    pub fn format_line(entry: &LogEntry) -> String {
        let (timestamp, severity, message) = Self::parts(entry);
        Self::assemble(&timestamp, severity, &entry.source, &message)
    }

    fn parts(entry: &LogEntry) -> (String, &'static str, String) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let severity = match entry.severity {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        };
        let message = match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!("{} ({}:{})", entry.message, file, line),
            _ => entry.message.clone(),
        };
        (timestamp, severity, message)
    }

    fn assemble(timestamp: &str, severity: impl Display, source: impl Display, message: &str) -> String {
        format!("[{}] [{}] [{}] {}", timestamp, severity, source, message)
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if !self.accepts(entry.severity) {
            return;
        }
        let (timestamp, severity, message) = Self::parts(entry);
        let severity = match entry.severity {
            LogSeverity::Trace => severity.bright_black(),
            LogSeverity::Debug => severity.cyan(),
            LogSeverity::Info => severity.green(),
            LogSeverity::Warn => severity.yellow(),
            LogSeverity::Error => severity.red().bold(),
        };
        let line = Self::assemble(&timestamp, severity, entry.source.bright_blue(), &message);
        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
#[macro_export]
macro_rules! vks_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::vkshim::Runtime::log(
            $crate::vkshim::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! vks_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::vkshim::Runtime::log(
            $crate::vkshim::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
///
/// # Example
///
/// ```no_run
/// vkshim_core::vks_info!("vkshim::gl", "Loaded {} entry points", 42);
/// ```
#[macro_export]
macro_rules! vks_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::vkshim::Runtime::log(
            $crate::vkshim::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! vks_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::vkshim::Runtime::log(
            $crate::vkshim::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! vks_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::vkshim::Runtime::log_detailed(
            $crate::vkshim::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and build an [`Error::BackendError`](crate::vkshim::Error) with the same text
///
/// Meant for `map_err` / `ok_or_else` closures.
///
/// # Example
///
/// ```no_run
/// # fn f() -> vkshim_core::vkshim::Result<()> {
/// let name: Option<u32> = None;
/// let name = name.ok_or_else(|| vkshim_core::vks_err!("vkshim::gl", "No framebuffer name"))?;
/// # Ok(()) }
/// ```
#[macro_export]
macro_rules! vks_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::vkshim::Runtime::log_detailed(
            $crate::vkshim::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::vkshim::Error::BackendError(message)
    }};
}

/// Log an ERROR and return early with [`Error::BackendError`](crate::vkshim::Error)
#[macro_export]
macro_rules! vks_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::vks_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
