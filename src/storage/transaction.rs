//! Caller-owned transactions over elements and log entries
//!
//! Element changes are applied to the in-memory repository as they happen,
//! while log entries are buffered. Commit persists the elements, then appends
//! the buffered entries in one batch; if either step fails the element state
//! is put back. A rollback drops the buffered entries and restores elements,
//! so a mutation that does not happen leaves no log entry behind.

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::audit::{LogEntry, LogQuery, NewLogEntry};
use crate::error::{PartLogError, PartLogResult};
use crate::models::{Element, Target};

use super::elements::{ElementRepository, ElementSnapshot};
use super::{ElementLookup, LogRecords, Storage};

/// An open transaction on [`Storage`]
pub struct Transaction<'a> {
    storage: &'a Storage,
    snapshot: ElementSnapshot,
    pending: Mutex<Vec<LogEntry>>,
}

impl<'a> Transaction<'a> {
    pub(super) fn begin(storage: &'a Storage) -> PartLogResult<Self> {
        Ok(Self {
            storage,
            snapshot: storage.elements.snapshot()?,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Elements, for mutation inside the transaction
    pub fn elements(&self) -> &ElementRepository {
        &self.storage.elements
    }

    /// Number of log entries waiting for commit
    pub fn pending_entries(&self) -> PartLogResult<usize> {
        Ok(self.lock_pending()?.len())
    }

    fn lock_pending(&self) -> PartLogResult<std::sync::MutexGuard<'_, Vec<LogEntry>>> {
        self.pending
            .lock()
            .map_err(|e| PartLogError::Storage(format!("Failed to acquire transaction lock: {}", e)))
    }

    pub(super) fn commit(self) -> PartLogResult<()> {
        let pending = self
            .pending
            .into_inner()
            .map_err(|e| PartLogError::Storage(format!("Failed to acquire transaction lock: {}", e)))?;

        if let Err(e) = self.storage.elements.save() {
            self.storage.elements.restore(self.snapshot)?;
            return Err(e);
        }

        if let Err(e) = self.storage.log.append_batch(&pending) {
            warn!(error = %e, entries = pending.len(), "log append failed, reverting element changes");
            self.storage.elements.restore(self.snapshot)?;
            if let Err(save_err) = self.storage.elements.save() {
                warn!(error = %save_err, "failed to persist reverted elements");
            }
            return Err(e);
        }

        debug!(entries = pending.len(), "transaction committed");
        Ok(())
    }

    pub(super) fn rollback(self) -> PartLogResult<()> {
        let dropped = self.pending_entries().unwrap_or(0);
        self.storage.elements.restore(self.snapshot)?;
        debug!(dropped, "transaction rolled back");
        Ok(())
    }
}

impl LogRecords for Transaction<'_> {
    fn insert(&self, entry: NewLogEntry) -> PartLogResult<LogEntry> {
        let stored = entry.into_entry(self.storage.log.reserve_id());
        self.lock_pending()?.push(stored.clone());
        Ok(stored)
    }

    /// Committed entries only
    fn query(&self, query: &LogQuery) -> PartLogResult<Vec<LogEntry>> {
        self.storage.log.query(query)
    }

    fn count(&self, query: &LogQuery) -> PartLogResult<usize> {
        self.storage.log.count(query)
    }
}

impl ElementLookup for Transaction<'_> {
    fn find(&self, target: Target) -> PartLogResult<Option<Element>> {
        self.storage.elements.find(target)
    }
}
