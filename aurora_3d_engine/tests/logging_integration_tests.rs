//! Integration tests for Engine logging system
//!
//! Custom logger installation, detailed entries and reset through the public
//! `aurora3d` namespace. No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use aurora_3d_engine::aurora3d::Engine;
use aurora_3d_engine::aurora3d::log::{Logger, LogEntry, LogSeverity};
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
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::swapchain", "Swapchain built".to_string());
    Engine::log(LogSeverity::Warn, "test::swapchain", "Surface suboptimal".to_string());
    Engine::log(LogSeverity::Error, "test::swapchain", "Device lost".to_string());

    let captured = entries.lock().unwrap().clone();
    Engine::reset_logger();

    assert_eq!(captured.len(), 3);
    let severities: Vec<LogSeverity> = captured.iter().map(|e| e.severity).collect();
    assert_eq!(severities, vec![LogSeverity::Info, LogSeverity::Warn, LogSeverity::Error]);
    assert!(captured.iter().all(|e| e.source == "test::swapchain"));
    assert_eq!(captured[1].message, "Surface suboptimal");
    assert!(captured.iter().all(|e| e.file.is_none() && e.line.is_none()));
}

#[test]
#[serial]
fn test_integration_error_logging_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log_detailed(
        LogSeverity::Error,
        "test::error",
        "Critical error occurred".to_string(),
        "test_file.rs",
        42,
    );

    let captured = entries.lock().unwrap().clone();
    Engine::reset_logger();

    assert_eq!(captured.len(), 1);
    let entry = &captured[0];
    assert_eq!(entry.severity, LogSeverity::Error);
    assert_eq!(entry.source, "test::error");
    assert_eq!(entry.message, "Critical error occurred");
    assert_eq!(entry.file, Some("test_file.rs"));
    assert_eq!(entry.line, Some(42));
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);
    Engine::log(LogSeverity::Info, "test::reset", "Before reset".to_string());

    Engine::reset_logger();
    Engine::log(LogSeverity::Info, "test::reset", "After reset".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "Before reset");
}

#[test]
#[serial]
fn test_integration_replacing_logger() {
    let (first, first_entries) = TestLogger::new();
    let (second, second_entries) = TestLogger::new();

    Engine::set_logger(first);
    Engine::log(LogSeverity::Debug, "test::replace", "one".to_string());
    Engine::set_logger(second);
    Engine::log(LogSeverity::Debug, "test::replace", "two".to_string());
    Engine::reset_logger();

    assert_eq!(first_entries.lock().unwrap().len(), 1);
    assert_eq!(second_entries.lock().unwrap()[0].message, "two");
}

#[test]
#[serial]
fn test_integration_logging_from_threads() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                for j in 0..10 {
                    Engine::log(LogSeverity::Trace, "test::threads", format!("{}:{}", i, j));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let count = entries.lock().unwrap().len();
    Engine::reset_logger();
    assert_eq!(count, 40);
}
