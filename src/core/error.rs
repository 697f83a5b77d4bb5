//! Error types for scheduler operations.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Construction parameters are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Bounded queue is at capacity and the caller asked not to wait.
    #[error("queue full: {0}")]
    QueueFull(String),
    /// A blocking queue operation did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Non-blocking dequeue found no records.
    #[error("queue empty")]
    Empty,
    /// A record for this ticker is already queued.
    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
    /// No record for this ticker is queued.
    #[error("unknown ticker: {0}")]
    UnknownTicker(String),
    /// Snapshot file could not be read or written.
    #[error("snapshot io failure at {path}: {source}")]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Snapshot contents could not be decoded.
    #[error("snapshot deserialization failure: {0}")]
    Deserialization(String),
    /// The importer could not fetch or parse a feed.
    #[error("fetch failure for {ticker}: {reason}")]
    Fetch {
        /// Ticker (or feed name) being fetched.
        ticker: String,
        /// Human-readable cause.
        reason: String,
    },
    /// The storage collaborator rejected a read or write.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl SchedulerError {
    /// Build an [`SchedulerError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a [`SchedulerError::Fetch`] for `ticker`.
    pub fn fetch(ticker: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            ticker: ticker.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the caller may retry the operation later.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidConfiguration(_))
    }
}

impl From<rusqlite::Error> for SchedulerError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
