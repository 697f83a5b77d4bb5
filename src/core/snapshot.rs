//! Durable JSON snapshots of a [`FetchQueue`].
//!
//! A snapshot captures capacity, threshold and the records in rotation order.
//! Writes go to a uniquely named temp file in the target directory which is
//! synced and then renamed over the destination, so a crash mid-write leaves
//! the previous snapshot intact.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{normalize_ticker, FetchQueue, ScheduleRecord, SchedulerError};

/// Default snapshot file name.
pub const DEFAULT_SNAPSHOT_FILE: &str = "news_queue.json";

/// Serializable queue state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Fixed capacity, `None` for unbounded.
    pub capacity: Option<usize>,
    /// Threshold percentage.
    pub threshold: u8,
    /// Records in rotation order.
    pub records: Vec<ScheduleRecord>,
}

impl QueueSnapshot {
    /// Capture a point-in-time snapshot of `queue`.
    pub fn capture(queue: &FetchQueue) -> Self {
        Self {
            capacity: queue.capacity(),
            threshold: queue.threshold(),
            records: queue.snapshot_view(),
        }
    }

    /// Rebuild a queue, enqueuing records in saved order.
    ///
    /// A saved capacity smaller than the record count is widened so that
    /// rehydration never blocks. Tickers are normalised on the way in; a
    /// record whose ticker repeats an earlier one is dropped.
    pub fn into_queue(self) -> Result<FetchQueue, SchedulerError> {
        let capacity = self.capacity.map(|c| c.max(self.records.len()).max(1));
        let queue = FetchQueue::new(capacity, self.threshold)?;
        for mut record in self.records {
            record.ticker = normalize_ticker(&record.ticker);
            match queue.try_enqueue(record) {
                Ok(()) => {}
                Err(SchedulerError::DuplicateTicker(ticker)) => {
                    warn!(%ticker, "duplicate ticker in snapshot, keeping the first record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(queue)
    }

    /// Write a snapshot of `queue` to `path`, creating parent directories.
    pub fn save(queue: &FetchQueue, path: impl AsRef<Path>) -> Result<PathBuf, SchedulerError> {
        Self::capture(queue).write_to(path)
    }

    /// Write this snapshot to `path` atomically.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<PathBuf, SchedulerError> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| SchedulerError::io(&dir, e))?;

        let file_name = path
            .file_name()
            .map_or_else(|| DEFAULT_SNAPSHOT_FILE.into(), |n| n.to_string_lossy().into_owned());
        let tmp = dir.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        if let Err(e) = self.write_file(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            SchedulerError::io(path, e)
        })?;

        debug!(path = %path.display(), records = self.records.len(), "snapshot written");
        Ok(path.to_path_buf())
    }

    fn write_file(&self, tmp: &Path) -> Result<(), SchedulerError> {
        let file = File::create(tmp).map_err(|e| SchedulerError::io(tmp, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SchedulerError::io(tmp, std::io::Error::other(e)))?;
        writer.flush().map_err(|e| SchedulerError::io(tmp, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| SchedulerError::io(tmp, e))
    }

    /// Read a snapshot from `path` without building a queue.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SchedulerError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| SchedulerError::Deserialization(format!("{}: {e}", path.display())))
    }

    /// Load a queue previously written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<FetchQueue, SchedulerError> {
        let path = path.as_ref();
        let queue = Self::read_from(path)?.into_queue()?;
        info!(path = %path.display(), records = queue.len(), "queue snapshot loaded");
        Ok(queue)
    }

    /// Load a queue, falling back to an empty one with the given limits when
    /// the snapshot is missing or unreadable.
    pub fn load_or_empty(
        path: impl AsRef<Path>,
        capacity: Option<usize>,
        threshold: u8,
    ) -> Result<FetchQueue, SchedulerError> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(queue) => Ok(queue),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "snapshot unavailable, starting with empty queue");
                FetchQueue::new(capacity, threshold)
            }
        }
    }
}
