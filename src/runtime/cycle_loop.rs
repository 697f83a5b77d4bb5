//! Periodic cycle driver for long-running processes.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::core::{Coordinator, DedupeCache, HeadlineStore, Importer, SchedulerError};

/// Run a cycle every `interval` until `shutdown` turns `true` or its sender
/// is dropped, resetting headline counts whenever the local date changes.
///
/// The first cycle starts immediately. Returns the coordinator so the caller
/// can [`close`](Coordinator::close) it.
pub async fn run_cycles<I, C, S>(
    coordinator: Coordinator<I, C, S>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
) -> Result<Coordinator<I, C, S>, SchedulerError>
where
    I: Importer,
    C: DedupeCache,
    S: HeadlineStore,
{
    run_cycles_with_clock(coordinator, interval, shutdown, || Local::now().date_naive()).await
}

/// [`run_cycles`] with an injectable notion of "today".
pub async fn run_cycles_with_clock<I, C, S, F>(
    mut coordinator: Coordinator<I, C, S>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut today: F,
) -> Result<Coordinator<I, C, S>, SchedulerError>
where
    I: Importer,
    C: DedupeCache,
    S: HeadlineStore,
    F: FnMut() -> NaiveDate,
{
    if interval.is_zero() {
        return Err(SchedulerError::InvalidConfiguration(
            "cycle interval must be greater than 0".into(),
        ));
    }
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut day = today();
    let mut cycles = 0_u64;

    while !*shutdown.borrow() {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let now = today();
        if now != day {
            info!(%day, %now, "date changed");
            if let Err(e) = coordinator.reset_daily_counts() {
                warn!(error = %e, "daily reset snapshot failed");
            }
            day = now;
        }

        match coordinator.run_cycle().await {
            Ok(report) => {
                cycles += 1;
                info!(
                    cycle = cycles,
                    selected = report.selected.len(),
                    stored = report.total_stored(),
                    failed = report.failed.len(),
                    "cycle finished"
                );
            }
            Err(e) => {
                error!(error = %e, "stopping cycle loop");
                return Err(e);
            }
        }
    }

    info!(cycles, "cycle loop stopped");
    Ok(coordinator)
}
