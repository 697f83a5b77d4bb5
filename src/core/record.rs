//! Per-ticker scheduling state.

use serde::{Deserialize, Serialize};

/// Scheduling state for one ticker.
///
/// Records live inside a [`FetchQueue`](crate::core::FetchQueue) and are
/// reused across cycles. Two records are equal when their tickers are equal,
/// regardless of counts or skip flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Upper-case ticker symbol.
    pub ticker: String,
    /// Headlines accounted for in the current daily window.
    pub headline_count: u32,
    /// Set when the dedupe cache shows nothing new for this cycle.
    #[serde(default)]
    pub skip: bool,
}

impl ScheduleRecord {
    /// Fresh record with no headlines and the skip flag cleared.
    pub fn new(ticker: impl AsRef<str>) -> Self {
        Self::with_count(ticker, 0)
    }

    /// Record with a known headline count.
    pub fn with_count(ticker: impl AsRef<str>, headline_count: u32) -> Self {
        Self {
            ticker: normalize_ticker(ticker.as_ref()),
            headline_count,
            skip: false,
        }
    }

    /// Builder-style skip flag setter.
    #[must_use]
    pub const fn skipped(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    /// Weight this record adds to a pass budget when selected.
    ///
    /// A zero count still weighs one so a pass cannot select zero-count
    /// records without bound.
    pub const fn contribution(&self) -> u32 {
        if self.headline_count == 0 {
            1
        } else {
            self.headline_count
        }
    }

    /// Case-insensitive ticker comparison.
    pub fn is_ticker(&self, ticker: &str) -> bool {
        self.ticker.eq_ignore_ascii_case(ticker.trim())
    }
}

impl PartialEq for ScheduleRecord {
    fn eq(&self, other: &Self) -> bool {
        self.ticker.eq_ignore_ascii_case(&other.ticker)
    }
}

impl Eq for ScheduleRecord {}

/// Canonical ticker form: trimmed, upper case.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_ascii_uppercase()
}
