//! Builders to construct the fetch queue and coordinator from configuration.

use std::sync::Arc;

use tracing::info;

use crate::config::SchedulerConfig;
use crate::core::{
    Coordinator, DedupeCache, FetchQueue, HeadlineStore, Importer, QueueSnapshot, SchedulerError,
};
use crate::infra::{FinvizImporter, SqliteStore};

/// Coordinator wired to the Finviz feed and a SQLite database.
pub type FinvizCoordinator = Coordinator<FinvizImporter, SqliteStore, SqliteStore>;

fn validated(cfg: &SchedulerConfig) -> Result<(), SchedulerError> {
    cfg.validate()
        .map_err(|e| SchedulerError::InvalidConfiguration(format!("config invalid: {e}")))
}

/// Restore the queue from the configured snapshot (or start empty) and
/// register the configured tickers.
pub fn build_queue(cfg: &SchedulerConfig) -> Result<FetchQueue, SchedulerError> {
    validated(cfg)?;
    let queue = QueueSnapshot::load_or_empty(&cfg.snapshot_path, cfg.capacity, cfg.threshold)?;
    let added = queue.register_all(&cfg.tickers)?;
    info!(
        records = queue.len(),
        added,
        threshold = queue.threshold(),
        "fetch queue ready"
    );
    Ok(queue)
}

/// Build a coordinator over caller-provided collaborators.
pub fn build_coordinator<I, C, S>(
    cfg: &SchedulerConfig,
    importer: I,
    cache: C,
    store: S,
) -> Result<Coordinator<I, C, S>, SchedulerError>
where
    I: Importer,
    C: DedupeCache,
    S: HeadlineStore,
{
    let queue = Arc::new(build_queue(cfg)?);
    Coordinator::new(queue, importer, cache, store, cfg.coordinator_settings())
}

/// Build a coordinator using the Finviz importer and the configured SQLite
/// database for both the dedupe cache and headline tables.
pub fn build_finviz_coordinator(cfg: &SchedulerConfig) -> Result<FinvizCoordinator, SchedulerError> {
    validated(cfg)?;
    let importer = FinvizImporter::new(&cfg.feed)?;
    let store = SqliteStore::open(&cfg.storage.database_path)?;
    build_coordinator(cfg, importer, store.clone(), store)
}
