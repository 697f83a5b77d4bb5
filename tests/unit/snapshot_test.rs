//! Tests for queue snapshots

use headline_scheduler::core::{FetchQueue, QueueSnapshot, ScheduleRecord, SchedulerError};

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = QueueSnapshot::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SchedulerError::Io { .. }));
}

#[test]
fn test_load_garbage_is_deserialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");
    std::fs::write(&path, "{\"records\": [").unwrap();

    let err = QueueSnapshot::load(&path).unwrap_err();
    assert!(matches!(err, SchedulerError::Deserialization(_)));
}

#[test]
fn test_load_or_empty_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");
    std::fs::write(&path, "not json").unwrap();

    let queue = QueueSnapshot::load_or_empty(&path, Some(8), 92).unwrap();
    assert!(queue.is_empty());
    assert_eq!(queue.capacity(), Some(8));
    assert_eq!(queue.threshold(), 92);
}

#[test]
fn test_saved_threshold_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");
    std::fs::write(&path, r#"{"capacity": null, "threshold": 50, "records": []}"#).unwrap();

    let err = QueueSnapshot::load(&path).unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidConfiguration(_)));
}

#[test]
fn test_save_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");
    let queue = FetchQueue::new(Some(4), 95).unwrap();
    queue.try_enqueue(ScheduleRecord::new("AAPL")).unwrap();
    QueueSnapshot::save(&queue, &path).unwrap();

    queue.try_enqueue(ScheduleRecord::with_count("MSFT", 9)).unwrap();
    queue.set_skip("AAPL", true).unwrap();
    QueueSnapshot::save(&queue, &path).unwrap();

    let loaded = QueueSnapshot::load(&path).unwrap();
    assert_eq!(loaded.capacity(), Some(4));
    assert_eq!(loaded.tickers(), vec!["AAPL", "MSFT"]);
    assert_eq!(loaded.skip_flag("AAPL"), Some(true));
    assert_eq!(loaded.headline_count("MSFT"), Some(9));

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_skip_flag_defaults_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");
    std::fs::write(
        &path,
        r#"{"capacity": null, "threshold": 95, "records": [{"ticker": "AAPL", "headline_count": 2}]}"#,
    )
    .unwrap();

    let loaded = QueueSnapshot::load(&path).unwrap();
    assert_eq!(loaded.skip_flag("AAPL"), Some(false));
    assert_eq!(loaded.headline_count("AAPL"), Some(2));
}

#[test]
fn test_load_normalizes_tickers_and_drops_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");
    std::fs::write(
        &path,
        r#"{"capacity": 2, "threshold": 95, "records": [
            {"ticker": "aapl", "headline_count": 3},
            {"ticker": "msft", "headline_count": 1, "skip": true},
            {"ticker": "AAPL", "headline_count": 7}
        ]}"#,
    )
    .unwrap();

    let loaded = QueueSnapshot::load(&path).unwrap();
    assert_eq!(loaded.tickers(), vec!["AAPL", "MSFT"]);
    assert_eq!(loaded.headline_count("AAPL"), Some(3));
    assert_eq!(loaded.skip_flag("MSFT"), Some(true));

    let marked = loaded.mark_skips(|record| record.ticker == "AAPL");
    assert_eq!(marked, 1);
    assert_eq!(loaded.skip_flag("AAPL"), Some(true));
    assert_eq!(loaded.skip_flag("MSFT"), Some(false));
}
