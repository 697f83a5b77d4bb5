//! # Headline Scheduler
//!
//! Budgeted round-robin scheduling of per-ticker news imports.
//!
//! A fixed set of tickers is polled against a news feed that charges by
//! volume. Each ticker carries a [`ScheduleRecord`](core::ScheduleRecord)
//! counting the headlines it produced today; the [`FetchQueue`](core::FetchQueue)
//! rotates through those records and selects tickers until a pass budget,
//! a percentage of the daily allowance, is consumed. Quiet tickers get polled
//! often, noisy ones rarely, and none starve.
//!
//! ## Pieces
//!
//! - [`core::FetchQueue`]: thread-safe bounded or unbounded FIFO with blocking
//!   enqueue/dequeue, skip marking and the selection pass.
//! - [`core::QueueSnapshot`]: atomic JSON persistence of the queue.
//! - [`core::Coordinator`]: runs a cycle (refresh latest links, mark skips,
//!   select, fetch, store, persist) over pluggable collaborators.
//! - [`infra`]: the Finviz CSV importer and SQLite headline storage, plus
//!   in-memory stand-ins for both.
//! - [`runtime::run_cycles`]: periodic driver with a daily count reset.
//!
//! ```rust,no_run
//! use headline_scheduler::builders::build_finviz_coordinator;
//! use headline_scheduler::config::SchedulerConfig;
//!
//! # async fn demo() -> headline_scheduler::core::AppResult<()> {
//! let mut cfg = SchedulerConfig::from_json_file("scheduler.json")
//!     .map_err(anyhow::Error::msg)?;
//! cfg.apply_env_overrides();
//! let mut coordinator = build_finviz_coordinator(&cfg)?;
//! let report = coordinator.run_cycle().await?;
//! println!("stored {} headlines", report.total_stored());
//! coordinator.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Scheduling records, the fetch queue, snapshots and cycle orchestration.
pub mod core;
/// Configuration models for the scheduler, feed and storage.
pub mod config;
/// Builders to construct the queue and coordinator from configuration.
pub mod builders;
/// Infrastructure adapters for the news feed and headline storage.
pub mod infra;
/// Long-running drivers and status reporting.
pub mod runtime;
/// Shared utilities.
pub mod util;
