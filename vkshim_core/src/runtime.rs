/// vkshim runtime - process-wide singletons
///
/// Holds the global logger used by the `vks_*` macros and the instance-level
/// debug reporter shared by contexts built with
/// [`Context::from_runtime`](crate::context::Context::from_runtime).

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::debug_report::DebugReporter;
use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};

// ===== INTERNAL STATE =====

static RUNTIME_STATE: OnceLock<RuntimeState> = OnceLock::new();

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

struct RuntimeState {
    debug_reporter: RwLock<Option<DebugReporter>>,
}

impl RuntimeState {
    fn new() -> Self {
        Self {
            debug_reporter: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Process-wide runtime
///
/// # Example
///
/// ```no_run
/// use vkshim_core::vkshim::Runtime;
///
/// Runtime::initialize()?;
/// let reporter = Runtime::debug_reporter()?;
/// reporter.register(vkshim_core::vkshim::DebugReportFlags::all(), |message| {
///     eprintln!("{}", message.message);
/// });
/// Runtime::shutdown();
/// # Ok::<(), vkshim_core::vkshim::Error>(())
/// ```
pub struct Runtime;

impl Runtime {
    fn log_and_return_error(error: Error) -> Error {
        crate::vks_error!("vkshim::Runtime", "{}", error);
        error
    }

    /// Initialize the runtime and create the instance debug reporter
    ///
    /// Calling it again keeps the existing reporter.
    pub fn initialize() -> Result<()> {
        let state = RUNTIME_STATE.get_or_init(RuntimeState::new);
        let mut lock = state.debug_reporter.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Debug reporter lock poisoned".to_string())
            ))?;
        if lock.is_none() {
            *lock = Some(DebugReporter::new());
            crate::vks_info!("vkshim::Runtime", "Runtime initialized");
        }
        Ok(())
    }

    /// Drop the instance debug reporter
    ///
    /// Contexts created earlier keep their own clone of it.
    pub fn shutdown() {
        if let Some(state) = RUNTIME_STATE.get() {
            if let Ok(mut reporter) = state.debug_reporter.write() {
                *reporter = None;
            }
        }
    }

    /// Instance debug reporter
    ///
    /// # Errors
    ///
    /// Fails if [`Runtime::initialize`] was not called.
    pub fn debug_reporter() -> Result<DebugReporter> {
        let state = RUNTIME_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Runtime not initialized. Call Runtime::initialize() first.".to_string())
            ))?;

        let lock = state.debug_reporter.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Debug reporter lock poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Runtime shut down. Call Runtime::initialize() again.".to_string())
            ))
    }

    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
        Self::reset_logger();
    }

    // ===== LOGGING API =====

    /// Replace the global logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Restore [`DefaultLogger`]
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger::new());
        }
    }

    /// Log without file:line (used by `vks_trace!` .. `vks_warn!`)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log with file:line (used by `vks_error!`)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
