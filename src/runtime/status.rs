//! Read-only queue status for reporting.

use serde::Serialize;

use crate::core::{FetchQueue, ScheduleRecord};

/// Point-in-time view of a queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    /// Records queued.
    pub len: usize,
    /// Queue bound, if any.
    pub capacity: Option<usize>,
    /// Threshold percentage.
    pub threshold: u8,
    /// Records currently flagged skip.
    pub skipped: usize,
    /// Headlines counted across all records.
    pub total_headlines: u64,
    /// Records in rotation order.
    pub records: Vec<ScheduleRecord>,
}

/// Capture the status of `queue`.
pub fn queue_status(queue: &FetchQueue) -> QueueStatus {
    let records = queue.snapshot_view();
    QueueStatus {
        len: records.len(),
        capacity: queue.capacity(),
        threshold: queue.threshold(),
        skipped: records.iter().filter(|r| r.skip).count(),
        total_headlines: records.iter().map(|r| u64::from(r.headline_count)).sum(),
        records,
    }
}
