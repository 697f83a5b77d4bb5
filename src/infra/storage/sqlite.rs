//! SQLite-backed headline tables and dedupe cache.
//!
//! Each ticker gets its own table named after the sanitised, lower-case
//! ticker. The dedupe cache lives in `cache_most_recent_link`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::core::{normalize_ticker, DedupeCache, Headline, HeadlineStore, SchedulerError};
use crate::infra::importer::wire::DATE_FORMAT;

const CACHE_TABLE: &str = "cache_most_recent_link";

/// Headline store and dedupe cache sharing one SQLite connection.
///
/// Clones share the connection, so one handle can serve as both the
/// coordinator's cache and its store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`. `:memory:` opens an
    /// in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let path = path.as_ref();
        if path.as_os_str() == ":memory:" {
            return Self::open_in_memory();
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SchedulerError::io(parent, e))?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened headline database");
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SchedulerError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, SchedulerError> {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {CACHE_TABLE} (
                    ticker TEXT PRIMARY KEY,
                    news_url TEXT NOT NULL
                )"
            ),
            (),
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Names of the per-ticker tables.
    pub fn tables(&self) -> Result<Vec<String>, SchedulerError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name != ?1 ORDER BY name",
        )?;
        let names = stmt
            .query_map(params![CACHE_TABLE], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Close the connection if this is the last handle to it.
    pub fn close(self) -> Result<(), SchedulerError> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => mutex.into_inner().close().map_err(|(_, e)| e.into()),
            Err(_) => Ok(()),
        }
    }
}

/// Table name for `ticker`: lower case, anything outside `[a-z0-9_]`
/// replaced by `_`.
pub fn table_name(ticker: &str) -> String {
    normalize_ticker(ticker)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

impl HeadlineStore for SqliteStore {
    fn table_exists(&self, ticker: &str) -> Result<bool, SchedulerError> {
        let exists: i64 = self.conn.lock().query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![table_name(ticker)],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    fn ensure_table(&mut self, ticker: &str) -> Result<(), SchedulerError> {
        let table = table_name(ticker);
        self.conn.lock().execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (
                title TEXT,
                source TEXT,
                date TEXT,
                url TEXT,
                category TEXT,
                ticker TEXT
            );
            CREATE INDEX IF NOT EXISTS \"idx_{table}_url\" ON \"{table}\" (url);"
        ))?;
        Ok(())
    }

    fn append_rows(&mut self, ticker: &str, rows: &[Headline]) -> Result<usize, SchedulerError> {
        let table = table_name(ticker);
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO \"{table}\" (title, source, date, url, category, ticker)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.title,
                    row.source,
                    row.published_at.map(|d| d.format(DATE_FORMAT).to_string()),
                    row.url,
                    row.category,
                    row.ticker,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    fn recent_rows(&self, ticker: &str, limit: usize) -> Result<Vec<Headline>, SchedulerError> {
        let table = table_name(ticker);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT title, source, date, url, category, ticker
             FROM \"{table}\" ORDER BY rowid DESC LIMIT ?1"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], |row| {
                let date: Option<String> = row.get(2)?;
                Ok(Headline {
                    title: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    source: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    published_at: date
                        .and_then(|d| NaiveDateTime::parse_from_str(&d, DATE_FORMAT).ok()),
                    url: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    category: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    ticker: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl DedupeCache for SqliteStore {
    fn most_recent_link(&self, ticker: &str) -> Result<Option<String>, SchedulerError> {
        let link = self
            .conn
            .lock()
            .query_row(
                &format!("SELECT news_url FROM {CACHE_TABLE} WHERE ticker = ?1"),
                params![normalize_ticker(ticker)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(link)
    }

    fn most_recent_links(&self) -> Result<HashMap<String, String>, SchedulerError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT ticker, news_url FROM {CACHE_TABLE}"))?;
        let links = stmt
            .query_map((), |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(links)
    }

    fn update_most_recent_link(&mut self, ticker: &str, url: &str) -> Result<(), SchedulerError> {
        self.conn.lock().execute(
            &format!(
                "INSERT INTO {CACHE_TABLE} (ticker, news_url) VALUES (?1, ?2)
                 ON CONFLICT(ticker) DO UPDATE SET news_url = excluded.news_url"
            ),
            params![normalize_ticker(ticker), url],
        )?;
        Ok(())
    }
}
