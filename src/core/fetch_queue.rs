//! Thread-safe FIFO of schedule records with round-robin selection.
//!
//! All structural mutation (insertion, removal, rotation) and every snapshot
//! read goes through a single `parking_lot::Mutex`. Two condition variables
//! wake blocked producers and consumers when space or records appear, so
//! bounded queues can block with an optional timeout instead of polling.
//!
//! Selection never blocks: [`FetchQueue::select_eligible`] performs at most
//! one full rotation of the queue per call.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::core::record::{normalize_ticker, ScheduleRecord};
use crate::core::SchedulerError;

/// Lowest accepted threshold percentage.
pub const MIN_THRESHOLD: u8 = 90;
/// Highest accepted threshold percentage.
pub const MAX_THRESHOLD: u8 = 100;
/// Threshold used when none is configured.
pub const DEFAULT_THRESHOLD: u8 = 95;

/// Everything the queue lock guards.
#[derive(Debug, Default)]
struct QueueState {
    records: VecDeque<ScheduleRecord>,
    /// Budget consumed by the current pass.
    cycle_headline_sum: u32,
    /// Tickers already selected in the current pass.
    staged: HashSet<String>,
}

impl QueueState {
    fn contains(&self, ticker: &str) -> bool {
        self.records.iter().any(|r| r.is_ticker(ticker))
    }

    fn begin_pass(&mut self) {
        self.cycle_headline_sum = 0;
        self.staged.clear();
    }

    /// Rotate through at most one full turn of the queue looking for the first
    /// record that is not skipped, not yet staged and under `max_headline_count`.
    /// Every record looked at moves to the tail, so a miss leaves the order as
    /// it was.
    fn select(&mut self, max_headline_count: u32) -> Option<String> {
        if max_headline_count == 0 {
            return None;
        }
        for _ in 0..self.records.len() {
            let record = self.records.pop_front()?;
            let eligible = !record.skip
                && record.headline_count < max_headline_count
                && !self.staged.contains(&record.ticker);
            if eligible {
                self.cycle_headline_sum = self
                    .cycle_headline_sum
                    .saturating_add(record.contribution());
                let ticker = record.ticker.clone();
                self.staged.insert(ticker.clone());
                self.records.push_back(record);
                return Some(ticker);
            }
            self.records.push_back(record);
        }
        None
    }

    fn run_pass(&mut self, budget: u32) -> Vec<String> {
        self.begin_pass();
        let mut selected = Vec::new();
        loop {
            let remaining = budget.saturating_sub(self.cycle_headline_sum);
            if remaining == 0 {
                break;
            }
            match self.select(remaining) {
                Some(ticker) => selected.push(ticker),
                None => break,
            }
        }
        selected
    }

    fn record_mut(&mut self, ticker: &str) -> Result<&mut ScheduleRecord, SchedulerError> {
        self.records
            .iter_mut()
            .find(|r| r.is_ticker(ticker))
            .ok_or_else(|| SchedulerError::UnknownTicker(normalize_ticker(ticker)))
    }
}

/// Bounded or unbounded round-robin queue of [`ScheduleRecord`]s.
///
/// FIFO order is rotation order, not priority. Each ticker appears at most
/// once.
///
/// ```
/// use headline_scheduler::core::{FetchQueue, ScheduleRecord};
///
/// let queue = FetchQueue::unbounded(95).unwrap();
/// queue.try_enqueue(ScheduleRecord::new("AAPL")).unwrap();
/// queue.try_enqueue(ScheduleRecord::with_count("MSFT", 10)).unwrap();
///
/// assert_eq!(queue.run_pass(100), vec!["AAPL".to_string(), "MSFT".to_string()]);
/// assert_eq!(queue.cycle_headline_sum(), 11);
/// ```
#[derive(Debug)]
pub struct FetchQueue {
    capacity: Option<usize>,
    threshold: u8,
    state: Mutex<QueueState>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl FetchQueue {
    /// Create a queue. `capacity` of `None` means unbounded.
    ///
    /// Fails with [`SchedulerError::InvalidConfiguration`] when `threshold`
    /// is outside `90..=100` or `capacity` is `Some(0)`.
    pub fn new(capacity: Option<usize>, threshold: u8) -> Result<Self, SchedulerError> {
        validate_threshold(threshold)?;
        if capacity == Some(0) {
            return Err(SchedulerError::InvalidConfiguration(
                "capacity must be greater than 0".into(),
            ));
        }
        Ok(Self {
            capacity,
            threshold,
            state: Mutex::new(QueueState::default()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        })
    }

    /// Create an unbounded queue.
    pub fn unbounded(threshold: u8) -> Result<Self, SchedulerError> {
        Self::new(None, threshold)
    }

    /// Fixed capacity, if bounded.
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Threshold percentage applied to the daily budget.
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Pass budget for a daily allowance: `ceil(daily_budget * threshold / 100)`.
    ///
    /// The coordinator runs each pass against this threshold-scaled budget
    /// rather than the raw daily budget.
    pub fn pass_budget(&self, daily_budget: u32) -> u32 {
        let scaled = (u64::from(daily_budget) * u64::from(self.threshold)).div_ceil(100);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    /// Number of queued records.
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    /// True iff no records remain.
    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// Insert `record` at the tail.
    ///
    /// When the queue is full, `block == false` fails at once with
    /// [`SchedulerError::QueueFull`]; otherwise the call waits for space, up
    /// to `timeout` if one is given.
    pub fn enqueue(
        &self,
        record: ScheduleRecord,
        block: bool,
        timeout: Option<Duration>,
    ) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        if state.contains(&record.ticker) {
            return Err(SchedulerError::DuplicateTicker(record.ticker));
        }
        if let Some(capacity) = self.capacity {
            if state.records.len() >= capacity {
                if !block {
                    return Err(SchedulerError::QueueFull(format!(
                        "capacity {capacity} reached"
                    )));
                }
                wait_while(&self.not_full, &mut state, timeout, |s| {
                    s.records.len() >= capacity
                })?;
                // Another producer may have queued the same ticker while we slept.
                if state.contains(&record.ticker) {
                    return Err(SchedulerError::DuplicateTicker(record.ticker));
                }
            }
        }
        trace!(ticker = %record.ticker, "enqueue");
        state.records.push_back(record);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Non-blocking [`enqueue`](Self::enqueue).
    pub fn try_enqueue(&self, record: ScheduleRecord) -> Result<(), SchedulerError> {
        self.enqueue(record, false, None)
    }

    /// Enqueue each record in order, stopping at the first failure.
    /// Records inserted before the failure stay queued.
    pub fn bulk_enqueue<I>(
        &self,
        records: I,
        block: bool,
        timeout: Option<Duration>,
    ) -> Result<(), SchedulerError>
    where
        I: IntoIterator<Item = ScheduleRecord>,
    {
        for record in records {
            self.enqueue(record, block, timeout)?;
        }
        Ok(())
    }

    /// Remove and return the head record, ignoring skip and budget rules.
    pub fn dequeue_raw(
        &self,
        block: bool,
        timeout: Option<Duration>,
    ) -> Result<ScheduleRecord, SchedulerError> {
        let mut state = self.state.lock();
        if state.records.is_empty() {
            if !block {
                return Err(SchedulerError::Empty);
            }
            wait_while(&self.not_empty, &mut state, timeout, |s| s.records.is_empty())?;
        }
        let record = state.records.pop_front().ok_or(SchedulerError::Empty)?;
        state.staged.remove(&record.ticker);
        drop(state);
        trace!(ticker = %record.ticker, "dequeue");
        self.not_full.notify_one();
        Ok(record)
    }

    /// Non-blocking [`dequeue_raw`](Self::dequeue_raw).
    pub fn try_dequeue(&self) -> Result<ScheduleRecord, SchedulerError> {
        self.dequeue_raw(false, None)
    }

    /// Point-in-time copy of the records in rotation order.
    pub fn snapshot_view(&self) -> Vec<ScheduleRecord> {
        self.state.lock().records.iter().cloned().collect()
    }

    /// Tickers in rotation order.
    pub fn tickers(&self) -> Vec<String> {
        self.state
            .lock()
            .records
            .iter()
            .map(|r| r.ticker.clone())
            .collect()
    }

    /// Register `ticker` with a fresh record unless it is already queued.
    /// Returns whether a record was added.
    pub fn register(&self, ticker: &str) -> Result<bool, SchedulerError> {
        match self.try_enqueue(ScheduleRecord::new(ticker)) {
            Ok(()) => Ok(true),
            Err(SchedulerError::DuplicateTicker(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Register several tickers; returns how many were new.
    pub fn register_all<I, T>(&self, tickers: I) -> Result<usize, SchedulerError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut added = 0;
        for ticker in tickers {
            if self.register(ticker.as_ref())? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Reset pass accounting: budget consumed and staged tickers.
    pub fn begin_pass(&self) {
        self.state.lock().begin_pass();
    }

    /// Select the next eligible ticker whose count is below `max_headline_count`.
    ///
    /// Skipped, already-staged and over-cap records are rotated to the tail.
    /// The selected record is moved to the tail as well and its contribution
    /// is added to the pass sum. Returns `None` after one full rotation
    /// without a match, leaving the queue order unchanged.
    pub fn select_eligible(&self, max_headline_count: u32) -> Option<String> {
        let selected = self.state.lock().select(max_headline_count);
        if let Some(ticker) = &selected {
            debug!(%ticker, max_headline_count, "selected ticker");
        }
        selected
    }

    /// Run a full selection pass against `budget` and return the tickers
    /// selected, in order. The lock is held for the whole pass.
    pub fn run_pass(&self, budget: u32) -> Vec<String> {
        let mut state = self.state.lock();
        let selected = state.run_pass(budget);
        debug!(
            budget,
            consumed = state.cycle_headline_sum,
            selected = selected.len(),
            "selection pass complete"
        );
        selected
    }

    /// Budget consumed by the current pass.
    pub fn cycle_headline_sum(&self) -> u32 {
        self.state.lock().cycle_headline_sum
    }

    /// Tickers selected in the current pass, sorted.
    pub fn staged_tickers(&self) -> Vec<String> {
        let mut staged: Vec<String> = self.state.lock().staged.iter().cloned().collect();
        staged.sort();
        staged
    }

    /// Recompute every record's skip flag in one locked pass.
    /// Returns the number of records now marked skipped.
    pub fn mark_skips<F>(&self, mut decide: F) -> usize
    where
        F: FnMut(&ScheduleRecord) -> bool,
    {
        let mut state = self.state.lock();
        let mut skipped = 0;
        for record in &mut state.records {
            record.skip = decide(record);
            if record.skip {
                skipped += 1;
            }
        }
        skipped
    }

    /// Set one record's skip flag.
    pub fn set_skip(&self, ticker: &str, skip: bool) -> Result<(), SchedulerError> {
        self.state.lock().record_mut(ticker)?.skip = skip;
        Ok(())
    }

    /// Current skip flag for `ticker`.
    pub fn skip_flag(&self, ticker: &str) -> Option<bool> {
        self.state
            .lock()
            .records
            .iter()
            .find(|r| r.is_ticker(ticker))
            .map(|r| r.skip)
    }

    /// Current headline count for `ticker`.
    pub fn headline_count(&self, ticker: &str) -> Option<u32> {
        self.state
            .lock()
            .records
            .iter()
            .find(|r| r.is_ticker(ticker))
            .map(|r| r.headline_count)
    }

    /// Add `stored` headlines to `ticker`'s count; returns the new count.
    pub fn add_headlines(&self, ticker: &str, stored: u32) -> Result<u32, SchedulerError> {
        let mut state = self.state.lock();
        let record = state.record_mut(ticker)?;
        record.headline_count = record.headline_count.saturating_add(stored);
        Ok(record.headline_count)
    }

    /// Overwrite `ticker`'s headline count.
    pub fn set_headline_count(&self, ticker: &str, count: u32) -> Result<(), SchedulerError> {
        self.state.lock().record_mut(ticker)?.headline_count = count;
        Ok(())
    }

    /// Zero every headline count, starting a new accounting window.
    /// Returns the number of records touched.
    pub fn reset_headline_counts(&self) -> usize {
        let mut state = self.state.lock();
        for record in &mut state.records {
            record.headline_count = 0;
        }
        state.records.len()
    }
}

/// Check a threshold percentage against `90..=100`.
pub fn validate_threshold(threshold: u8) -> Result<(), SchedulerError> {
    if (MIN_THRESHOLD..=MAX_THRESHOLD).contains(&threshold) {
        Ok(())
    } else {
        Err(SchedulerError::InvalidConfiguration(format!(
            "threshold must be between {MIN_THRESHOLD} and {MAX_THRESHOLD} (inclusive), got {threshold}"
        )))
    }
}

/// Wait on `condvar` while `blocked` holds, up to `timeout` if given.
fn wait_while<F>(
    condvar: &Condvar,
    guard: &mut MutexGuard<'_, QueueState>,
    timeout: Option<Duration>,
    mut blocked: F,
) -> Result<(), SchedulerError>
where
    F: FnMut(&QueueState) -> bool,
{
    // A timeout too large to represent as a deadline waits without one.
    let Some(deadline) = timeout.and_then(|t| Instant::now().checked_add(t)) else {
        while blocked(&**guard) {
            condvar.wait(guard);
        }
        return Ok(());
    };
    while blocked(&**guard) {
        if condvar.wait_until(guard, deadline).timed_out() && blocked(&**guard) {
            return Err(SchedulerError::Timeout(timeout.unwrap_or_default()));
        }
    }
    Ok(())
}
