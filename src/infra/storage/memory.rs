//! In-memory headline tables and dedupe cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{normalize_ticker, DedupeCache, Headline, HeadlineStore, SchedulerError};

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, Vec<Headline>>,
    links: HashMap<String, String>,
    fail_writes: bool,
}

/// In-memory store implementing both [`HeadlineStore`] and [`DedupeCache`].
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows stored for `ticker`, oldest first.
    pub fn rows(&self, ticker: &str) -> Vec<Headline> {
        self.tables
            .lock()
            .rows
            .get(&normalize_ticker(ticker))
            .cloned()
            .unwrap_or_default()
    }

    /// Make appends fail, simulating an unavailable database.
    pub fn set_fail_writes(&self, fail: bool) {
        self.tables.lock().fail_writes = fail;
    }
}

impl HeadlineStore for InMemoryStore {
    fn table_exists(&self, ticker: &str) -> Result<bool, SchedulerError> {
        Ok(self.tables.lock().rows.contains_key(&normalize_ticker(ticker)))
    }

    fn ensure_table(&mut self, ticker: &str) -> Result<(), SchedulerError> {
        self.tables
            .lock()
            .rows
            .entry(normalize_ticker(ticker))
            .or_default();
        Ok(())
    }

    fn append_rows(&mut self, ticker: &str, rows: &[Headline]) -> Result<usize, SchedulerError> {
        let mut tables = self.tables.lock();
        if tables.fail_writes {
            return Err(SchedulerError::Storage("writes disabled".into()));
        }
        tables
            .rows
            .entry(normalize_ticker(ticker))
            .or_default()
            .extend_from_slice(rows);
        Ok(rows.len())
    }

    fn recent_rows(&self, ticker: &str, limit: usize) -> Result<Vec<Headline>, SchedulerError> {
        Ok(self
            .tables
            .lock()
            .rows
            .get(&normalize_ticker(ticker))
            .map(|rows| rows.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

impl DedupeCache for InMemoryStore {
    fn most_recent_link(&self, ticker: &str) -> Result<Option<String>, SchedulerError> {
        Ok(self.tables.lock().links.get(&normalize_ticker(ticker)).cloned())
    }

    fn most_recent_links(&self) -> Result<HashMap<String, String>, SchedulerError> {
        Ok(self.tables.lock().links.clone())
    }

    fn update_most_recent_link(&mut self, ticker: &str, url: &str) -> Result<(), SchedulerError> {
        self.tables
            .lock()
            .links
            .insert(normalize_ticker(ticker), url.to_string());
        Ok(())
    }
}
