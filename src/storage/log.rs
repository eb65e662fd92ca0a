//! Log record repository
//!
//! Append-only storage for log entries in a line-delimited JSON file
//! (`log.jsonl`), with an in-memory copy that serves queries. There is no way
//! to update or remove an entry once written.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::audit::{LogEntry, LogQuery, NewLogEntry};
use crate::error::{PartLogError, PartLogResult};
use crate::models::LogEntryId;

use super::file_io::{append_json_lines, read_json_lines};
use super::LogRecords;

/// Repository for log entry persistence
pub struct LogRepository {
    path: PathBuf,
    entries: RwLock<Vec<LogEntry>>,
    next_id: AtomicU64,
}

impl LogRepository {
    /// Create a new log repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Load all entries from disk
    pub fn load(&self) -> PartLogResult<()> {
        let loaded: Vec<LogEntry> = read_json_lines(&self.path)?;

        let max_id = loaded.iter().map(|e| e.id.get()).max().unwrap_or(0);
        // Never hand out an id twice, even if ids were reserved before the load
        self.next_id.fetch_max(max_id + 1, Ordering::SeqCst);

        let mut entries = self.entries.write().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        debug!(path = %self.path.display(), count = loaded.len(), "loaded log entries");
        *entries = loaded;
        Ok(())
    }

    /// Reserve the next entry id
    ///
    /// Ids of entries that are never appended (rolled-back transactions) are
    /// simply skipped.
    pub fn reserve_id(&self) -> LogEntryId {
        LogEntryId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Append already-numbered entries with a single write and flush
    pub fn append_batch(&self, batch: &[LogEntry]) -> PartLogResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut entries = self.entries.write().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if let (Some(last), Some(first)) = (entries.last(), batch.first()) {
            if first.timestamp < last.timestamp {
                warn!(
                    log_id = %first.id,
                    timestamp = %first.timestamp,
                    previous = %last.timestamp,
                    "log entry is older than the previous entry"
                );
            }
        }

        // Disk first: the cache must never hold entries that were not written
        append_json_lines(&self.path, batch)?;
        entries.extend_from_slice(batch);
        Ok(())
    }

    /// Get an entry by ID
    pub fn get(&self, id: LogEntryId) -> PartLogResult<Option<LogEntry>> {
        let entries = self.entries.read().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    /// Count all entries
    pub fn len(&self) -> PartLogResult<usize> {
        let entries = self.entries.read().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(entries.len())
    }

    pub fn is_empty(&self) -> PartLogResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Path to the JSONL file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogRecords for LogRepository {
    fn insert(&self, entry: NewLogEntry) -> PartLogResult<LogEntry> {
        let stored = entry.into_entry(self.reserve_id());
        self.append_batch(std::slice::from_ref(&stored))?;
        Ok(stored)
    }

    fn query(&self, query: &LogQuery) -> PartLogResult<Vec<LogEntry>> {
        let entries = self.entries.read().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(query.apply(entries.iter()))
    }

    fn count(&self, query: &LogQuery) -> PartLogResult<usize> {
        let entries = self.entries.read().map_err(|e| {
            PartLogError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(entries.iter().filter(|e| query.matches(e)).count())
    }
}
