//! In-memory importer for development and testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{normalize_ticker, Headline, Importer, SchedulerError};

#[derive(Debug, Default)]
struct StaticFeed {
    headlines: HashMap<String, Vec<Headline>>,
    latest: HashMap<String, String>,
    failing: HashSet<String>,
    links_unavailable: bool,
    calls: Vec<String>,
    link_refreshes: usize,
}

/// Importer serving canned headlines.
///
/// Clones share state, so a test can keep a handle while the coordinator
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct StaticImporter {
    feed: Arc<Mutex<StaticFeed>>,
}

impl StaticImporter {
    /// Empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the headlines served for `ticker`.
    pub fn set_headlines(&self, ticker: &str, rows: Vec<Headline>) {
        self.feed
            .lock()
            .headlines
            .insert(normalize_ticker(ticker), rows);
    }

    /// Set the latest link reported for `ticker`.
    pub fn set_latest_link(&self, ticker: &str, url: &str) {
        self.feed
            .lock()
            .latest
            .insert(normalize_ticker(ticker), url.to_string());
    }

    /// Make fetches for `ticker` fail until [`recover`](Self::recover).
    pub fn fail_ticker(&self, ticker: &str) {
        self.feed.lock().failing.insert(normalize_ticker(ticker));
    }

    /// Stop failing fetches for `ticker`.
    pub fn recover(&self, ticker: &str) {
        self.feed.lock().failing.remove(&normalize_ticker(ticker));
    }

    /// Make the latest-link refresh fail.
    pub fn set_links_unavailable(&self, unavailable: bool) {
        self.feed.lock().links_unavailable = unavailable;
    }

    /// Number of latest-link refreshes requested so far.
    pub fn link_refreshes(&self) -> usize {
        self.feed.lock().link_refreshes
    }

    /// Tickers fetched so far, in call order.
    pub fn fetch_calls(&self) -> Vec<String> {
        self.feed.lock().calls.clone()
    }
}

#[async_trait]
impl Importer for StaticImporter {
    async fn fetch(&self, ticker: &str) -> Result<Vec<Headline>, SchedulerError> {
        let ticker = normalize_ticker(ticker);
        let mut feed = self.feed.lock();
        feed.calls.push(ticker.clone());
        if feed.failing.contains(&ticker) {
            return Err(SchedulerError::fetch(ticker, "feed unavailable"));
        }
        Ok(feed.headlines.get(&ticker).cloned().unwrap_or_default())
    }

    async fn latest_links(&self) -> Result<HashMap<String, String>, SchedulerError> {
        let mut feed = self.feed.lock();
        feed.link_refreshes += 1;
        if feed.links_unavailable {
            return Err(SchedulerError::fetch("screener", "feed unavailable"));
        }
        Ok(feed.latest.clone())
    }
}
