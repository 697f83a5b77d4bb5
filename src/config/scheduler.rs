//! Scheduler, feed and storage configuration structures.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{CoordinatorSettings, DEFAULT_SNAPSHOT_FILE, DEFAULT_THRESHOLD, MAX_THRESHOLD, MIN_THRESHOLD};

/// Which Finviz news export to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// Equity news (`v=3`).
    #[default]
    Stock,
    /// Crypto news (`v=5`).
    Crypto,
}

impl FeedKind {
    /// Export view number for the feed.
    pub const fn view(self) -> u8 {
        match self {
            Self::Stock => 3,
            Self::Crypto => 5,
        }
    }
}

/// News feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Feed root, e.g. `https://elite.finviz.com/`.
    pub base_url: String,
    /// API token; usually supplied through `FINVIZ_API_KEY`.
    pub api_key: String,
    /// News export variant.
    pub kind: FeedKind,
    /// Query string for the screener export carrying `Ticker` and `News URL`.
    pub screener_query: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://elite.finviz.com/".into(),
            api_key: String::new(),
            kind: FeedKind::Stock,
            screener_query: "v=111".into(),
            request_timeout_secs: 30,
        }
    }
}

/// Headline storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file (`:memory:` for an in-memory database).
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("news.db"),
        }
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Percentage of the daily budget a pass may consume (90–100).
    pub threshold: u8,
    /// Headline allowance per cycle.
    pub daily_budget: u32,
    /// Optional queue bound.
    pub capacity: Option<usize>,
    /// Pause between feed requests, in milliseconds.
    pub request_spacing_ms: u64,
    /// Queue snapshot file.
    pub snapshot_path: PathBuf,
    /// Stored rows consulted when filtering duplicates.
    pub recent_rows_limit: usize,
    /// Seconds between cycles in watch mode.
    pub cycle_interval_secs: u64,
    /// Tickers registered at startup.
    pub tickers: Vec<String>,
    /// Feed settings.
    pub feed: FeedConfig,
    /// Storage settings.
    pub storage: StorageConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            daily_budget: 100,
            capacity: None,
            request_spacing_ms: 5_000,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            recent_rows_limit: 100,
            cycle_interval_secs: 3_600,
            tickers: Vec::new(),
            feed: FeedConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Validate feed settings.
    pub fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.base_url).map_err(|e| format!("base_url invalid: {e}"))?;
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".into());
        }
        Ok(())
    }
}

impl SchedulerConfig {
    /// Validate all values.
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&self.threshold) {
            return Err(format!(
                "threshold must be between {MIN_THRESHOLD} and {MAX_THRESHOLD}, got {}",
                self.threshold
            ));
        }
        if self.daily_budget == 0 {
            return Err("daily_budget must be greater than 0".into());
        }
        if self.capacity == Some(0) {
            return Err("capacity must be greater than 0".into());
        }
        if self.cycle_interval_secs == 0 {
            return Err("cycle_interval_secs must be greater than 0".into());
        }
        if self.recent_rows_limit == 0 {
            return Err("recent_rows_limit must be greater than 0".into());
        }
        self.feed.validate().map_err(|e| format!("feed invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Self::from_json_str(&input)
    }

    /// Apply `FINVIZ_API_KEY`, `NEWS_SNAPSHOT_PATH` and `NEWS_DATABASE_PATH`
    /// from the environment when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("FINVIZ_API_KEY").filter(|v| !v.is_empty()) {
            self.feed.api_key = key;
        }
        if let Some(path) = lookup("NEWS_SNAPSHOT_PATH").filter(|v| !v.is_empty()) {
            self.snapshot_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("NEWS_DATABASE_PATH").filter(|v| !v.is_empty()) {
            self.storage.database_path = PathBuf::from(path);
        }
    }

    /// Pause between feed requests.
    pub const fn request_spacing(&self) -> Duration {
        Duration::from_millis(self.request_spacing_ms)
    }

    /// Interval between cycles in watch mode.
    pub const fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    /// Coordinator settings derived from this configuration.
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            daily_budget: self.daily_budget,
            request_spacing: self.request_spacing(),
            snapshot_path: self.snapshot_path.clone(),
            recent_rows_limit: self.recent_rows_limit,
        }
    }
}
