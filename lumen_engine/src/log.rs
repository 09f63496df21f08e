//! Engine log sink
//!
//! Every engine component reports through [`log`] / [`log_detailed`] or the
//! `engine_*!` macros. Output goes to a single process-wide [`Logger`]
//! (colored stdout via [`DefaultLogger`] unless an application installs its
//! own with [`set_logger`]). Error entries may carry the file and line of
//! the call site.

use chrono::{DateTime, Local};
use colored::*;
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;

/// Process-wide sink, lazily filled with `DefaultLogger`
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Destination for engine log entries
///
/// # Example
///
/// ```no_run
/// use lumen_engine::lumen::log::{DefaultLogger, Logger, LogEntry};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         if let Ok(mut file) = self.file.lock() {
///             let _ = writeln!(file, "{}", DefaultLogger::format_plain(entry));
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Record one entry. Called from any thread.
    fn log(&self, entry: &LogEntry);
}

/// One log record as handed to a [`Logger`]
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// How serious the entry is
    pub severity: LogSeverity,

    /// Wall-clock time of the call
    pub timestamp: SystemTime,

    /// Source module (e.g., "lumen::MeshRegistry", "lumen::vulkan")
    pub source: String,

    /// Formatted message text
    pub message: String,

    /// Call-site file, set by `log_detailed`
    pub file: Option<&'static str>,

    /// Call-site line, set by `log_detailed`
    pub line: Option<u32>,
}

/// Ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-frame chatter
    Trace,
    /// Resource and state transitions
    Debug,
    /// Lifecycle milestones
    Info,
    /// Recoverable problems
    Warn,
    /// Failures surfaced to the caller
    Error,
}

/// Colored console logger installed until `set_logger` replaces it
///
/// Lines read `[timestamp] [SEVERITY] [source] message`, with ` (file:line)`
/// appended when the entry carries a location.
pub struct DefaultLogger;

impl LogSeverity {
    /// Fixed-width label used in log lines
    fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colored_label(self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

fn timestamp(entry: &LogEntry) -> String {
    let local: DateTime<Local> = entry.timestamp.into();
    local.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

fn location(entry: &LogEntry) -> String {
    match (entry.file, entry.line) {
        (Some(file), Some(line)) => format!(" ({}:{})", file, line),
        _ => String::new(),
    }
}

impl DefaultLogger {
    /// Format an entry without colors (used by tests and file sinks)
    pub fn format_plain(entry: &LogEntry) -> String {
        format!(
            "[{}] [{}] [{}] {}{}",
            timestamp(entry),
            entry.severity.label(),
            entry.source,
            entry.message,
            location(entry)
        )
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        println!(
            "[{}] [{}] [{}] {}{}",
            timestamp(entry),
            entry.severity.colored_label(),
            entry.source.bright_blue(),
            entry.message,
            location(entry)
        );
    }
}

fn logger_slot() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Replace the process-wide logger
pub fn set_logger<L: Logger + 'static>(logger: L) {
    if let Ok(mut guard) = logger_slot().write() {
        *guard = Box::new(logger);
    }
}

/// Restore the colored console logger
pub fn reset_logger() {
    if let Ok(mut guard) = logger_slot().write() {
        *guard = Box::new(DefaultLogger);
    }
}

/// Dispatch a log message (used by the `engine_*!` macros)
pub fn log(severity: LogSeverity, source: &str, message: String) {
    dispatch(LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message,
        file: None,
        line: None,
    });
}

/// Dispatch a log message with file:line information
pub fn log_detailed(
    severity: LogSeverity,
    source: &str,
    message: String,
    file: &'static str,
    line: u32,
) {
    dispatch(LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message,
        file: Some(file),
        line: Some(line),
    });
}

fn dispatch(entry: LogEntry) {
    // A poisoned lock means a logger panicked; drop the message.
    if let Ok(logger) = logger_slot().read() {
        logger.log(&entry);
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```no_run
/// lumen_engine::engine_trace!("lumen::Renderer", "Entering frame {}", 3);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Trace, $source, format!($($arg)*))
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Debug, $source, format!($($arg)*))
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Info, $source, format!($($arg)*))
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Warn, $source, format!($($arg)*))
    };
}

/// Log an ERROR message with file:line information
///
/// ```no_run
/// lumen_engine::engine_error!("lumen::vulkan", "Failed to create fence: {}", "ERROR_OUT_OF_HOST_MEMORY");
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and evaluate to `Error::BackendError` with the same message
///
/// Intended for `.map_err(|e| engine_err!(...))` on GPU API calls.
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::lumen::Error::BackendError(message)
    }};
}

/// Log an ERROR and return `Err(Error::BackendError(..))` from the enclosing function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
