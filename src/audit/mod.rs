//! Audit logging system for partlog
//!
//! Records every create, edit and delete of a tracked element as an immutable,
//! timestamped log entry, and answers questions about that history: what an
//! element looked like at time T, whether it existed then, and who created or
//! last edited it.
//!
//! # Architecture
//!
//! - `LogEntry` / `LogEvent` / `EventKind`: the entry header plus a tagged
//!   payload per event kind.
//! - `ChangeSet`: per-field old/new values of an edit, used both for display
//!   and for reverting edits.
//! - `LogQuery`: filter/order/page criteria evaluated by the record store.
//! - `AuditLog`: the operations, over any `LogRecords` + `ElementLookup`.
//!
//! # Example
//!
//! ```rust,ignore
//! use partlog::audit::{AuditLog, LogEvent, SortOrder};
//!
//! storage.transaction(|tx| {
//!     let log = AuditLog::new(tx, tx);
//!     log.record_event(LogEvent::created(), Some(target), user.clone(), now)?;
//!     Ok(())
//! })?;
//!
//! let log = AuditLog::new(&storage.log, &storage.elements);
//! let history = log.history(target, SortOrder::Descending, Some(20), None)?;
//! ```

mod diff;
mod entry;
mod query;
mod store;

pub use diff::{format_value, nested_changes, ChangeSet, FieldChange};
pub use entry::{EventKind, LogEntry, LogEvent, LogLevel, NewLogEntry, SecurityEventType};
pub use query::{LogQuery, SortOrder};
pub use store::AuditLog;
