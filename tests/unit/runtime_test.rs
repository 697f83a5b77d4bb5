//! Tests for the cycle loop and status reporting

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::watch;

use headline_scheduler::core::{
    Coordinator, CoordinatorSettings, FetchQueue, ScheduleRecord, SchedulerError,
};
use headline_scheduler::infra::{InMemoryStore, StaticImporter};
use headline_scheduler::runtime::{queue_status, run_cycles, run_cycles_with_clock};

fn coordinator(
    dir: &tempfile::TempDir,
    importer: &StaticImporter,
    tickers: &[&str],
) -> Coordinator<StaticImporter, InMemoryStore, InMemoryStore> {
    let queue = FetchQueue::unbounded(95).unwrap();
    queue.register_all(tickers).unwrap();
    Coordinator::new(
        Arc::new(queue),
        importer.clone(),
        InMemoryStore::new(),
        InMemoryStore::new(),
        CoordinatorSettings {
            request_spacing: Duration::ZERO,
            snapshot_path: dir.path().join("queue.json"),
            ..CoordinatorSettings::default()
        },
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_cycles_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let importer = StaticImporter::new();
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(run_cycles(
        coordinator(&dir, &importer, &["AAPL"]),
        Duration::from_secs(60),
        rx,
    ));

    tokio::time::sleep(Duration::from_secs(150)).await;
    tx.send(true).unwrap();
    let coordinator = handle.await.unwrap().unwrap();

    assert_eq!(importer.fetch_calls().len(), 3);
    coordinator.close().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_dropped_sender_stops_loop() {
    let dir = tempfile::tempdir().unwrap();
    let importer = StaticImporter::new();
    let (tx, rx) = watch::channel(false);

    let (result, ()) = tokio::join!(
        run_cycles(coordinator(&dir, &importer, &["AAPL"]), Duration::from_secs(30), rx),
        async move {
            tokio::time::sleep(Duration::from_secs(45)).await;
            drop(tx);
        }
    );

    assert!(result.is_ok());
    assert_eq!(importer.fetch_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_date_change_resets_counts() {
    let dir = tempfile::tempdir().unwrap();
    let importer = StaticImporter::new();
    let coordinator = coordinator(&dir, &importer, &["AAPL"]);
    coordinator.queue().set_headline_count("AAPL", 7).unwrap();
    let queue = Arc::clone(coordinator.queue());

    let monday = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
    let mut dates = vec![monday, monday, tuesday].into_iter();
    let (tx, rx) = watch::channel(false);

    let (result, ()) = tokio::join!(
        run_cycles_with_clock(coordinator, Duration::from_secs(10), rx, move || {
            dates.next().unwrap_or(tuesday)
        }),
        async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            assert_eq!(queue.headline_count("AAPL"), Some(7));
            tokio::time::sleep(Duration::from_secs(10)).await;
            tx.send(true).unwrap();
        }
    );

    assert!(result.is_ok());
    assert_eq!(queue.headline_count("AAPL"), Some(0));
}

#[tokio::test]
async fn test_zero_interval_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (_tx, rx) = watch::channel(false);
    let result = run_cycles(
        coordinator(&dir, &StaticImporter::new(), &[]),
        Duration::ZERO,
        rx,
    )
    .await;
    assert!(matches!(result, Err(SchedulerError::InvalidConfiguration(_))));
}

#[test]
fn test_queue_status_summary() {
    let queue = FetchQueue::new(Some(10), 90).unwrap();
    queue.try_enqueue(ScheduleRecord::with_count("AAPL", 4)).unwrap();
    queue
        .try_enqueue(ScheduleRecord::with_count("MSFT", 6).skipped(true))
        .unwrap();

    let status = queue_status(&queue);
    assert_eq!(status.len, 2);
    assert_eq!(status.capacity, Some(10));
    assert_eq!(status.threshold, 90);
    assert_eq!(status.skipped, 1);
    assert_eq!(status.total_headlines, 10);

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["records"][1]["ticker"], "MSFT");
    assert_eq!(json["records"][1]["skip"], true);
}
