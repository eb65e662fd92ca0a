//! Storage layer for partlog
//!
//! Provides the two stores the audit log sits on: an append-only JSONL record
//! store for log entries and a JSON document store for tracked elements, plus
//! the transaction that ties writes to both together.
//!
//! The audit log only sees these through the [`LogRecords`] and
//! [`ElementLookup`] traits, so any backend that can insert, filter and look
//! up by key can stand in.

pub mod elements;
pub mod file_io;
pub mod log;
pub mod transaction;

pub use elements::{ElementRepository, ElementSnapshot};
pub use file_io::{append_json_lines, read_json, read_json_lines, write_json_atomic};
pub use log::LogRepository;
pub use transaction::Transaction;

use tracing::info;

use crate::audit::{LogEntry, LogQuery, NewLogEntry};
use crate::config::paths::PartLogPaths;
use crate::error::PartLogResult;
use crate::models::{Element, Target};

/// Persistence for log entries
///
/// Implementations assign the entry id on insert and evaluate the whole query
/// (filter, order, pagination) themselves. There is no update or
/// delete.
pub trait LogRecords {
    /// Store a new entry and return it with its assigned id
    fn insert(&self, entry: NewLogEntry) -> PartLogResult<LogEntry>;

    /// Entries matching `query`, ordered and paginated
    fn query(&self, query: &LogQuery) -> PartLogResult<Vec<LogEntry>>;

    /// Number of entries matching the filter part of `query`
    fn count(&self, query: &LogQuery) -> PartLogResult<usize>;
}

/// Lookup of live elements by target key
pub trait ElementLookup {
    /// The element, or `None` if it does not exist (any more)
    fn find(&self, target: Target) -> PartLogResult<Option<Element>>;
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: PartLogPaths,
    pub log: LogRepository,
    pub elements: ElementRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: PartLogPaths) -> PartLogResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            log: LogRepository::new(paths.log_file()),
            elements: ElementRepository::new(paths.elements_file()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &PartLogPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> PartLogResult<()> {
        self.elements.load()?;
        self.log.load()?;
        info!(
            elements = self.elements.count()?,
            log_entries = self.log.len()?,
            "storage loaded"
        );
        Ok(())
    }

    /// Run `f` inside a transaction
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`.
    pub fn transaction<T, F>(&self, f: F) -> PartLogResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> PartLogResult<T>,
    {
        let tx = Transaction::begin(self)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback()?;
                Err(e)
            }
        }
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.settings_file().exists()
    }
}
