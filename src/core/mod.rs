//! Scheduling state, the fetch queue, its snapshots and cycle orchestration.

pub mod collaborators;
pub mod coordinator;
pub mod error;
pub mod fetch_queue;
pub mod record;
pub mod snapshot;

pub use collaborators::{DedupeCache, Headline, HeadlineStore, Importer};
pub use coordinator::{Coordinator, CoordinatorSettings, CyclePhase, CycleReport};
pub use error::{AppResult, SchedulerError};
pub use fetch_queue::{
    validate_threshold, FetchQueue, DEFAULT_THRESHOLD, MAX_THRESHOLD, MIN_THRESHOLD,
};
pub use record::{normalize_ticker, ScheduleRecord};
pub use snapshot::{QueueSnapshot, DEFAULT_SNAPSHOT_FILE};
