//! Integration tests for the engine logging facade
//!
//! These tests verify that a custom logger receives what the public API logs.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use lumen_engine::log::{log, log_detailed};
use lumen_engine::lumen::log::{reset_logger, set_logger, LogEntry, LogSeverity, Logger};
use lumen_engine::lumen::render::select_device;
use lumen_engine::lumen::resource::{require_shader, DirectoryAssets};
use lumen_engine::lumen::Error;
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);

    log(LogSeverity::Info, "test::module", "Test info message".to_string());
    log(LogSeverity::Warn, "test::module", "Test warning message".to_string());
    log(LogSeverity::Error, "test::module", "Test error message".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 3);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[1].severity, LogSeverity::Warn);
    assert_eq!(captured[2].severity, LogSeverity::Error);
    assert!(captured.iter().all(|e| e.source == "test::module"));
    assert_eq!(captured[2].message, "Test error message");
    drop(captured);

    reset_logger();
}

#[test]
#[serial]
fn test_integration_error_logging_with_location() {
    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);

    log_detailed(
        LogSeverity::Error,
        "test::error",
        "Critical error occurred".to_string(),
        "test_file.rs",
        42,
    );

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].file, Some("test_file.rs"));
    assert_eq!(captured[0].line, Some(42));
    drop(captured);

    reset_logger();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);

    log(LogSeverity::Info, "test", "Message 1".to_string());
    assert_eq!(entries.lock().unwrap().len(), 1);

    reset_logger();

    // Goes to the default logger, not captured
    log(LogSeverity::Info, "test", "Message 2".to_string());
    assert_eq!(entries.lock().unwrap().len(), 1);
}

#[test]
#[serial]
fn test_integration_missing_shader_is_logged_and_fatal() {
    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);

    let assets = DirectoryAssets::new(std::env::temp_dir().join("lumen-no-such-assets"));
    let result = require_shader(&assets, "shaders/mesh.vert.spv");
    assert!(matches!(result, Err(Error::AssetMissing(ref name)) if name == "shaders/mesh.vert.spv"));

    let captured = entries.lock().unwrap();
    assert!(captured
        .iter()
        .any(|e| e.severity == LogSeverity::Error && e.source == "lumen::Assets" && e.line.is_some()));
    drop(captured);

    reset_logger();
}

#[test]
#[serial]
fn test_integration_no_device_is_logged_and_fatal() {
    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);

    assert!(matches!(select_device(&[]), Err(Error::NoSuitableDevice(_))));

    let captured = entries.lock().unwrap();
    assert!(captured
        .iter()
        .any(|e| e.severity == LogSeverity::Error && e.source == "lumen::DeviceSelection"));
    drop(captured);

    reset_logger();
}
