//! Tests for error types

use std::time::Duration;

use headline_scheduler::core::SchedulerError;

#[test]
fn test_queue_full_error() {
    let err = SchedulerError::QueueFull("capacity 1 reached".to_string());
    assert_eq!(format!("{}", err), "queue full: capacity 1 reached");
}

#[test]
fn test_timeout_error() {
    let err = SchedulerError::Timeout(Duration::from_millis(250));
    assert_eq!(format!("{}", err), "timed out after 250ms");
}

#[test]
fn test_fetch_error() {
    let err = SchedulerError::fetch("AAPL", "http status 503 Service Unavailable");
    assert_eq!(
        format!("{}", err),
        "fetch failure for AAPL: http status 503 Service Unavailable"
    );
}

#[test]
fn test_io_error_keeps_source() {
    let err = SchedulerError::io(
        "/tmp/q.json",
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    );
    assert!(format!("{}", err).starts_with("snapshot io failure at /tmp/q.json"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_only_configuration_errors_are_fatal() {
    assert!(!SchedulerError::InvalidConfiguration("threshold".into()).is_recoverable());
    assert!(SchedulerError::Empty.is_recoverable());
    assert!(SchedulerError::Storage("locked".into()).is_recoverable());
    assert!(SchedulerError::UnknownTicker("ZZZ".into()).is_recoverable());
}

#[test]
fn test_rusqlite_error_maps_to_storage() {
    let err: SchedulerError = rusqlite::Error::InvalidQuery.into();
    assert!(matches!(err, SchedulerError::Storage(_)));
}
