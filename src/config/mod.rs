//! Configuration models for the scheduler, feed and storage.

pub mod scheduler;

pub use scheduler::{FeedConfig, FeedKind, SchedulerConfig, StorageConfig};
