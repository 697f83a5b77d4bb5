//! Tests for headline storage backends

use chrono::NaiveDate;

use headline_scheduler::core::{DedupeCache, Headline, HeadlineStore, SchedulerError};
use headline_scheduler::infra::{InMemoryStore, SqliteStore};

fn headline(ticker: &str, url: &str) -> Headline {
    Headline {
        title: format!("{ticker} {url}"),
        source: "Bloomberg".into(),
        published_at: NaiveDate::from_ymd_opt(2024, 5, 2).and_then(|d| d.and_hms_opt(9, 30, 0)),
        url: url.into(),
        category: "news".into(),
        ticker: ticker.into(),
    }
}

#[test]
fn test_memory_store_recent_rows_newest_first() {
    let mut store = InMemoryStore::new();
    assert!(!store.table_exists("AAPL").unwrap());
    store.ensure_table("aapl").unwrap();
    assert!(store.table_exists("AAPL").unwrap());

    store
        .append_rows("AAPL", &[headline("AAPL", "1"), headline("AAPL", "2")])
        .unwrap();
    store.append_rows("AAPL", &[headline("AAPL", "3")]).unwrap();

    let recent = store.recent_rows("AAPL", 2).unwrap();
    let urls: Vec<&str> = recent.iter().map(|h| h.url.as_str()).collect();
    assert_eq!(urls, vec!["3", "2"]);
    assert_eq!(store.rows("AAPL").len(), 3);
}

#[test]
fn test_memory_store_write_failure() {
    let mut store = InMemoryStore::new();
    store.set_fail_writes(true);
    let err = store.append_rows("AAPL", &[headline("AAPL", "1")]).unwrap_err();
    assert!(matches!(err, SchedulerError::Storage(_)));

    store.set_fail_writes(false);
    assert_eq!(store.append_rows("AAPL", &[headline("AAPL", "1")]).unwrap(), 1);
}

#[test]
fn test_memory_store_links() {
    let mut store = InMemoryStore::new();
    store.update_most_recent_link("msft", "https://x/1").unwrap();
    assert_eq!(
        store.most_recent_link("MSFT").unwrap().as_deref(),
        Some("https://x/1")
    );
    assert_eq!(store.most_recent_link("AAPL").unwrap(), None);
    assert_eq!(store.most_recent_links().unwrap().len(), 1);
}

#[test]
fn test_sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/news.db");

    {
        let mut store = SqliteStore::open(&path).unwrap();
        store.ensure_table("BRK-B").unwrap();
        store
            .append_rows("BRK-B", &[headline("BRK-B", "u1"), headline("BRK-B", "u2")])
            .unwrap();
        store.update_most_recent_link("BRK-B", "u2").unwrap();
        store.close().unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert!(store.table_exists("brk-b").unwrap());
    assert_eq!(store.most_recent_link("BRK-B").unwrap().as_deref(), Some("u2"));

    let recent = store.recent_rows("BRK-B", 10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].url, "u2");
    assert_eq!(recent[0].published_at, headline("BRK-B", "u2").published_at);
}

#[test]
fn test_sqlite_tables_are_per_ticker() {
    let mut store = SqliteStore::open(":memory:").unwrap();
    store.ensure_table("AAPL").unwrap();
    store.ensure_table("MSFT").unwrap();
    store.append_rows("AAPL", &[headline("AAPL", "a")]).unwrap();

    assert_eq!(store.tables().unwrap(), vec!["aapl", "msft"]);
    assert_eq!(store.recent_rows("AAPL", 5).unwrap().len(), 1);
    assert!(store.recent_rows("MSFT", 5).unwrap().is_empty());
}
