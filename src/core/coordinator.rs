//! Cycle orchestration over the fetch queue and its collaborators.
//!
//! One cycle walks `Idle -> LoadingCache -> MarkingSkip -> Selecting ->
//! Fetching -> Persisting -> Idle`. Per-ticker failures never abort a cycle:
//! the ticker keeps its count and is retried next cycle.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::core::record::normalize_ticker;
use crate::core::snapshot::DEFAULT_SNAPSHOT_FILE;
use crate::core::{
    DedupeCache, FetchQueue, Headline, HeadlineStore, Importer, QueueSnapshot, SchedulerError,
};

/// Consecutive snapshot failures after which a cycle reports an error.
pub const MAX_CONSECUTIVE_SAVE_FAILURES: u32 = 3;

/// Where the coordinator is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    /// No cycle running.
    Idle,
    /// Refreshing the feed's latest links.
    LoadingCache,
    /// Recomputing skip flags.
    MarkingSkip,
    /// Running the selection pass.
    Selecting,
    /// Importing and storing headlines.
    Fetching,
    /// Writing the queue snapshot.
    Persisting,
}

/// Knobs the coordinator needs beyond the queue itself.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Total headline allowance per cycle before the threshold is applied.
    pub daily_budget: u32,
    /// Minimum pause between feed requests within one cycle.
    pub request_spacing: Duration,
    /// Snapshot destination.
    pub snapshot_path: PathBuf,
    /// Stored rows consulted when filtering duplicates.
    pub recent_rows_limit: usize,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            daily_budget: 100,
            request_spacing: Duration::from_secs(5),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            recent_rows_limit: 100,
        }
    }
}

/// Outcome of one cycle or ad-hoc run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    /// Tickers processed, in order.
    pub selected: Vec<String>,
    /// Records marked (or found) skipped.
    pub skipped: usize,
    /// Rows stored per successfully processed ticker.
    pub stored: Vec<(String, usize)>,
    /// Tickers whose fetch or storage failed.
    pub failed: Vec<String>,
    /// Snapshots written during the run.
    pub snapshots_written: usize,
}

impl CycleReport {
    /// Rows stored across all tickers.
    pub fn total_stored(&self) -> usize {
        self.stored.iter().map(|(_, n)| n).sum()
    }
}

/// Drives processing cycles for one queue.
pub struct Coordinator<I, C, S> {
    queue: Arc<FetchQueue>,
    importer: I,
    cache: C,
    store: S,
    settings: CoordinatorSettings,
    phase: CyclePhase,
    latest_links: Option<HashMap<String, String>>,
    save_failures: u32,
}

impl<I, C, S> Coordinator<I, C, S>
where
    I: Importer,
    C: DedupeCache,
    S: HeadlineStore,
{
    /// Assemble a coordinator. Fails when the daily budget is zero.
    pub fn new(
        queue: Arc<FetchQueue>,
        importer: I,
        cache: C,
        store: S,
        settings: CoordinatorSettings,
    ) -> Result<Self, SchedulerError> {
        if settings.daily_budget == 0 {
            return Err(SchedulerError::InvalidConfiguration(
                "daily_budget must be greater than 0".into(),
            ));
        }
        Ok(Self {
            queue,
            importer,
            cache,
            store,
            settings,
            phase: CyclePhase::Idle,
            latest_links: None,
            save_failures: 0,
        })
    }

    /// Shared handle to the queue.
    pub const fn queue(&self) -> &Arc<FetchQueue> {
        &self.queue
    }

    /// Current phase.
    pub const fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Active settings.
    pub const fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// The importer collaborator.
    pub const fn importer(&self) -> &I {
        &self.importer
    }

    /// The dedupe cache collaborator.
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// The headline store collaborator.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Drop the loaded latest links so the next run refreshes them.
    pub fn invalidate_cache(&mut self) {
        self.latest_links = None;
    }

    /// Run one full cycle.
    ///
    /// Only repeated snapshot failures surface as an error; everything else is
    /// recorded in the report.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, SchedulerError> {
        self.invalidate_cache();
        let result = self.cycle().await;
        self.phase = CyclePhase::Idle;
        result
    }

    async fn cycle(&mut self) -> Result<CycleReport, SchedulerError> {
        let mut report = CycleReport::default();

        self.phase = CyclePhase::LoadingCache;
        self.ensure_latest_links().await;

        self.phase = CyclePhase::MarkingSkip;
        report.skipped = self.mark_skips();

        self.phase = CyclePhase::Selecting;
        let budget = self.queue.pass_budget(self.settings.daily_budget);
        report.selected = self.queue.run_pass(budget);
        info!(
            budget,
            selected = report.selected.len(),
            skipped = report.skipped,
            "cycle selection complete"
        );

        self.phase = CyclePhase::Fetching;
        let selected = report.selected.clone();
        self.fetch_all(&selected, &mut report).await;

        self.phase = CyclePhase::Persisting;
        self.persist_at_end(&mut report)?;

        info!(
            stored = report.total_stored(),
            failed = report.failed.len(),
            "cycle complete"
        );
        Ok(report)
    }

    /// Process an explicit list of tickers outside the selection pass.
    ///
    /// Tickers currently flagged skip are left alone; unknown tickers are
    /// registered first.
    pub async fn process_tickers<T>(&mut self, tickers: &[T]) -> Result<CycleReport, SchedulerError>
    where
        T: AsRef<str> + Sync,
    {
        let result = self.process_listed(tickers).await;
        self.phase = CyclePhase::Idle;
        result
    }

    async fn process_listed<T>(&mut self, tickers: &[T]) -> Result<CycleReport, SchedulerError>
    where
        T: AsRef<str> + Sync,
    {
        let mut report = CycleReport::default();

        self.phase = CyclePhase::LoadingCache;
        self.ensure_latest_links().await;

        let mut eligible = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let ticker = normalize_ticker(ticker.as_ref());
            match self.queue.skip_flag(&ticker) {
                Some(true) => report.skipped += 1,
                Some(false) => eligible.push(ticker),
                None => match self.queue.register(&ticker) {
                    Ok(_) => eligible.push(ticker),
                    Err(e) => {
                        warn!(%ticker, error = %e, "could not register ticker");
                        report.failed.push(ticker);
                    }
                },
            }
        }
        report.selected.clone_from(&eligible);

        self.phase = CyclePhase::Fetching;
        self.fetch_all(&eligible, &mut report).await;

        self.phase = CyclePhase::Persisting;
        self.persist_at_end(&mut report)?;
        Ok(report)
    }

    /// Zero all headline counts and persist.
    pub fn reset_daily_counts(&mut self) -> Result<usize, SchedulerError> {
        let reset = self.queue.reset_headline_counts();
        self.persist()?;
        info!(records = reset, "daily headline counts reset");
        Ok(reset)
    }

    /// Write a snapshot now.
    pub fn persist(&mut self) -> Result<PathBuf, SchedulerError> {
        match QueueSnapshot::save(&self.queue, &self.settings.snapshot_path) {
            Ok(path) => {
                self.save_failures = 0;
                Ok(path)
            }
            Err(e) => {
                self.save_failures += 1;
                Err(e)
            }
        }
    }

    /// Persist a final snapshot and release the collaborators.
    pub fn close(mut self) -> Result<(), SchedulerError> {
        let path = self.persist()?;
        info!(path = %path.display(), "coordinator closed");
        Ok(())
    }

    async fn ensure_latest_links(&mut self) {
        if self.latest_links.is_some() {
            return;
        }
        let links = match self.importer.latest_links().await {
            Ok(links) => {
                debug!(tickers = links.len(), "latest links refreshed");
                links
            }
            Err(e) => {
                warn!(error = %e, "latest link refresh failed, nothing will be skipped");
                HashMap::new()
            }
        };
        self.latest_links = Some(links);
    }

    fn mark_skips(&self) -> usize {
        let stored = self.cache.most_recent_links().unwrap_or_else(|e| {
            warn!(error = %e, "dedupe cache unreadable, nothing will be skipped");
            HashMap::new()
        });
        let empty = HashMap::new();
        let latest = self.latest_links.as_ref().unwrap_or(&empty);
        self.queue.mark_skips(|record| {
            matches!(
                (latest.get(&record.ticker), stored.get(&record.ticker)),
                (Some(seen), Some(recorded)) if seen == recorded
            )
        })
    }

    async fn fetch_all(&mut self, tickers: &[String], report: &mut CycleReport) {
        for (i, ticker) in tickers.iter().enumerate() {
            if i > 0 && !self.settings.request_spacing.is_zero() {
                tokio::time::sleep(self.settings.request_spacing).await;
            }
            match self.process_ticker(ticker).await {
                Ok(stored) => {
                    report.stored.push((ticker.clone(), stored));
                    if stored > 0 {
                        match self.persist() {
                            Ok(_) => report.snapshots_written += 1,
                            Err(e) => warn!(error = %e, "opportunistic snapshot failed"),
                        }
                    }
                }
                Err(e) => {
                    warn!(%ticker, error = %e, "ticker not advanced this cycle");
                    report.failed.push(ticker.clone());
                }
            }
        }
    }

    async fn process_ticker(&mut self, ticker: &str) -> Result<usize, SchedulerError> {
        if !self.store.table_exists(ticker)? {
            self.store.ensure_table(ticker)?;
        }
        let known: HashSet<String> = self
            .store
            .recent_rows(ticker, self.settings.recent_rows_limit)?
            .into_iter()
            .map(|h| h.url)
            .collect();

        let fetched = self.importer.fetch(ticker).await?;
        let fresh = filter_new(ticker, fetched, known);
        let stored = if fresh.is_empty() {
            0
        } else {
            self.store.append_rows(ticker, &fresh)?
        };
        let added = u32::try_from(stored).unwrap_or(u32::MAX);
        // The rows are already stored; a ticker removed from the queue while
        // it was being fetched is registered again to carry its count.
        let count = self.queue.add_headlines(ticker, added).or_else(|_| {
            warn!(%ticker, "ticker left the queue mid-cycle, registering it again");
            self.queue.register(ticker)?;
            self.queue.add_headlines(ticker, added)
        });
        match count {
            Ok(count) => debug!(%ticker, stored, headline_count = count, "ticker processed"),
            Err(e) => warn!(%ticker, stored, error = %e, "rows stored but headline count not updated"),
        }

        self.record_latest_link(ticker);
        Ok(stored)
    }

    fn record_latest_link(&mut self, ticker: &str) {
        let Some(link) = self
            .latest_links
            .as_ref()
            .and_then(|links| links.get(ticker))
        else {
            return;
        };
        if let Err(e) = self.cache.update_most_recent_link(ticker, link) {
            warn!(%ticker, error = %e, "failed to update dedupe cache");
        }
    }

    fn persist_at_end(&mut self, report: &mut CycleReport) -> Result<(), SchedulerError> {
        match self.persist() {
            Ok(path) => {
                report.snapshots_written += 1;
                debug!(path = %path.display(), "cycle snapshot written");
                Ok(())
            }
            Err(e) if self.save_failures >= MAX_CONSECUTIVE_SAVE_FAILURES => {
                error!(failures = self.save_failures, error = %e, "snapshot keeps failing");
                Err(e)
            }
            Err(e) => {
                warn!(failures = self.save_failures, error = %e, "cycle snapshot failed");
                Ok(())
            }
        }
    }
}

/// Keep rows for `ticker` whose URL is neither already stored nor repeated
/// earlier in the same fetch.
fn filter_new(ticker: &str, rows: Vec<Headline>, mut known: HashSet<String>) -> Vec<Headline> {
    rows.into_iter()
        .filter(|h| h.ticker.eq_ignore_ascii_case(ticker))
        .filter(|h| known.insert(h.url.clone()))
        .collect()
}
