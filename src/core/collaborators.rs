//! Contracts for the external collaborators driven by the coordinator.
//!
//! The importer talks to the news feed; the dedupe cache remembers the most
//! recent link seen per ticker; the headline store keeps one table per ticker.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::SchedulerError;

/// One news row as exported by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    /// Headline text.
    pub title: String,
    /// Publisher name.
    pub source: String,
    /// Publication time, when the feed supplied a parseable one.
    pub published_at: Option<NaiveDateTime>,
    /// Article link; used as the row identity.
    pub url: String,
    /// Feed category.
    pub category: String,
    /// Ticker the row was exported for.
    pub ticker: String,
}

/// Fetches candidate headlines from the feed.
#[async_trait]
pub trait Importer: Send + Sync {
    /// Fetch the current headlines for `ticker`, newest first.
    async fn fetch(&self, ticker: &str) -> Result<Vec<Headline>, SchedulerError>;

    /// Latest link the feed reports for every ticker it knows, keyed by
    /// upper-case ticker.
    async fn latest_links(&self) -> Result<HashMap<String, String>, SchedulerError>;
}

/// Durable mapping from ticker to the most recent link already stored.
pub trait DedupeCache: Send {
    /// Stored link for `ticker`.
    fn most_recent_link(&self, ticker: &str) -> Result<Option<String>, SchedulerError>;

    /// Every stored link, keyed by upper-case ticker.
    fn most_recent_links(&self) -> Result<HashMap<String, String>, SchedulerError>;

    /// Record `url` as the most recent link for `ticker`.
    fn update_most_recent_link(&mut self, ticker: &str, url: &str) -> Result<(), SchedulerError>;
}

/// Per-ticker headline tables.
pub trait HeadlineStore: Send {
    /// Whether the table for `ticker` exists.
    fn table_exists(&self, ticker: &str) -> Result<bool, SchedulerError>;

    /// Create the table for `ticker` if needed.
    fn ensure_table(&mut self, ticker: &str) -> Result<(), SchedulerError>;

    /// Append rows; returns how many were written.
    fn append_rows(&mut self, ticker: &str, rows: &[Headline]) -> Result<usize, SchedulerError>;

    /// Up to `limit` of the most recently appended rows.
    fn recent_rows(&self, ticker: &str, limit: usize) -> Result<Vec<Headline>, SchedulerError>;
}
