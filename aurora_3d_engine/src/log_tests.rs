//! Unit tests for log.rs
//!
//! Severity ordering, DefaultLogger output paths, and the error-building
//! macros used at GPU call sites.

use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::aurora3d::Engine;
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        // Other tests log concurrently under "aurora3d::"
        if entry.source.starts_with("test::") {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

fn capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "aurora3d::Swapchain".to_string(),
        message: "rebuilding after out-of-date present".to_string(),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

// ============================================================================
// DEFAULT LOGGER
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
    ] {
        logger.log(&entry(severity, None, None));
    }
}

#[test]
fn test_default_logger_error_with_location() {
    DefaultLogger.log(&entry(LogSeverity::Error, Some("swapchain.rs"), Some(212)));
}

// ============================================================================
// MACROS
// ============================================================================

#[test]
#[serial]
fn test_engine_err_logs_and_builds_backend_error() {
    let entries = capture();

    let err = crate::engine_err!("test::vulkan", "Failed to create fence: {}", -2);
    assert_eq!(err, Error::BackendError("Failed to create fence: -2".to_string()));

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert_eq!(entries[0].source, "test::vulkan");
    assert!(entries[0].file.is_some());
    assert!(entries[0].line.is_some());
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let entries = capture();

    fn check(index: usize) -> Result<usize> {
        if index >= 3 {
            crate::engine_bail!("test::Swapchain", "image index {} out of range", index);
        }
        Ok(index)
    }

    assert_eq!(check(1), Ok(1));
    assert!(matches!(check(7), Err(Error::BackendError(msg)) if msg.contains("7")));
    assert_eq!(entries.lock().unwrap().len(), 1);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_with_keeps_error_variant() {
    let entries = capture();

    fn check() -> Result<()> {
        crate::engine_bail_with!("test::Swapchain", Error::MissingDepthBuffer);
    }

    assert_eq!(check(), Err(Error::MissingDepthBuffer));
    assert_eq!(entries.lock().unwrap()[0].message, "Depth buffer not created");
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_info_macro_has_no_location() {
    let entries = capture();
    crate::engine_info!("test::Device", "Selected {}", "GPU 0");
    let entries_guard = entries.lock().unwrap();
    assert_eq!(entries_guard[0].severity, LogSeverity::Info);
    assert_eq!(entries_guard[0].message, "Selected GPU 0");
    assert!(entries_guard[0].file.is_none());
    drop(entries_guard);
    Engine::reset_logger();
}
