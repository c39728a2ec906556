//! Unit tests for log.rs

use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use std::time::SystemTime;

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_entry_without_location() {
    let entry = LogEntry {
        severity: LogSeverity::Warn,
        timestamp: SystemTime::now(),
        source: "vkshim::StateStack".to_string(),
        message: "viewport count clamped".to_string(),
        file: None,
        line: None,
    };
    let cloned = entry.clone();
    assert_eq!(cloned.severity, LogSeverity::Warn);
    assert_eq!(cloned.source, "vkshim::StateStack");
    assert!(cloned.file.is_none());
    assert!(cloned.line.is_none());
}

#[test]
fn test_default_logger_prints_both_forms() {
    let logger = DefaultLogger::new();
    logger.log(&LogEntry {
        severity: LogSeverity::Info,
        timestamp: SystemTime::now(),
        source: "vkshim::test".to_string(),
        message: "plain".to_string(),
        file: None,
        line: None,
    });
    logger.log(&LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "vkshim::test".to_string(),
        message: "detailed".to_string(),
        file: Some("log_tests.rs"),
        line: Some(42),
    });
}

#[test]
fn test_logger_is_object_safe() {
    let boxed: Box<dyn Logger> = Box::new(DefaultLogger::default());
    boxed.log(&LogEntry {
        severity: LogSeverity::Trace,
        timestamp: SystemTime::now(),
        source: "vkshim::test".to_string(),
        message: "boxed".to_string(),
        file: None,
        line: None,
    });
}

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "vkshim::Executor".to_string(),
        message: "scissor count clamped to 16".to_string(),
        file,
        line,
    }
}

#[test]
fn test_default_threshold_drops_trace() {
    let logger = DefaultLogger::new();
    assert_eq!(logger.min_severity(), LogSeverity::Debug);
    assert!(!logger.accepts(LogSeverity::Trace));
    assert!(logger.accepts(LogSeverity::Debug));
    assert!(logger.accepts(LogSeverity::Error));
}

#[test]
fn test_custom_threshold() {
    let logger = DefaultLogger::with_min_severity(LogSeverity::Warn);
    assert!(!logger.accepts(LogSeverity::Info));
    assert!(logger.accepts(LogSeverity::Warn));
}

#[test]
fn test_format_line_layout() {
    let line = DefaultLogger::format_line(&entry(LogSeverity::Warn, None, None));
    assert!(line.ends_with("] [WARN ] [vkshim::Executor] scissor count clamped to 16"), "{}", line);
    assert!(line.starts_with('['));
}

#[test]
fn test_format_line_appends_location() {
    let line = DefaultLogger::format_line(&entry(LogSeverity::Error, Some("executor.rs"), Some(88)));
    assert!(line.contains("[ERROR] [vkshim::Executor]"), "{}", line);
    assert!(line.ends_with("clamped to 16 (executor.rs:88)"), "{}", line);
}
