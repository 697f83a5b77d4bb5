//! Tests for builder modules

use headline_scheduler::builders::{build_coordinator, build_finviz_coordinator, build_queue};
use headline_scheduler::config::SchedulerConfig;
use headline_scheduler::core::{FetchQueue, QueueSnapshot, ScheduleRecord, SchedulerError};
use headline_scheduler::infra::{InMemoryStore, StaticImporter};

fn config_in(dir: &tempfile::TempDir, tickers: &[&str]) -> SchedulerConfig {
    SchedulerConfig {
        snapshot_path: dir.path().join("news_queue.json"),
        tickers: tickers.iter().map(ToString::to_string).collect(),
        request_spacing_ms: 0,
        ..SchedulerConfig::default()
    }
}

#[test]
fn test_build_queue_registers_seed_tickers() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(&dir, &["aapl", "MSFT", "AAPL"]);

    let queue = build_queue(&cfg).unwrap();
    assert_eq!(queue.tickers(), vec!["AAPL", "MSFT"]);
    assert_eq!(queue.threshold(), 95);
}

#[test]
fn test_build_queue_restores_snapshot_first() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(&dir, &["MSFT", "NVDA"]);

    let saved = FetchQueue::unbounded(95).unwrap();
    saved.try_enqueue(ScheduleRecord::with_count("MSFT", 12)).unwrap();
    saved.try_enqueue(ScheduleRecord::with_count("TSLA", 3)).unwrap();
    QueueSnapshot::save(&saved, &cfg.snapshot_path).unwrap();

    let queue = build_queue(&cfg).unwrap();
    assert_eq!(queue.tickers(), vec!["MSFT", "TSLA", "NVDA"]);
    assert_eq!(queue.headline_count("MSFT"), Some(12));
    assert_eq!(queue.headline_count("NVDA"), Some(0));
}

#[test]
fn test_build_queue_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = SchedulerConfig {
        threshold: 80,
        ..config_in(&dir, &[])
    };
    let err = build_queue(&cfg).unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn test_build_coordinator_runs_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(&dir, &["AAPL"]);
    let store = InMemoryStore::new();

    let mut coordinator =
        build_coordinator(&cfg, StaticImporter::new(), store.clone(), store).unwrap();
    let report = coordinator.run_cycle().await.unwrap();

    assert_eq!(report.selected, vec!["AAPL"]);
    assert!(cfg.snapshot_path.exists());
}

#[test]
fn test_build_finviz_coordinator_opens_database() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_in(&dir, &["AAPL"]);
    cfg.storage.database_path = dir.path().join("db/news.db");

    let coordinator = build_finviz_coordinator(&cfg).unwrap();
    assert_eq!(coordinator.queue().len(), 1);
    assert!(cfg.storage.database_path.exists());
}
