//! partlog - audit log and time-travel history for Part-DB elements
//!
//! This library records who created, edited and deleted inventory elements
//! (parts, categories, storage locations, ...) and answers history questions
//! from that log: the history of one element, who created or last edited it,
//! whether it existed at a point in time, and what it looked like back then.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Identifiers, target types, users and tracked elements
//! - `audit`: Log entries, change sets, queries and the audit log itself
//! - `storage`: JSON / JSONL file storage and transactions
//! - `services`: Element mutations and time travel
//! - `display`: Terminal tables and detail views
//! - `export`: CSV, JSON and YAML history export
//! - `cli`: Command handlers for the `partlog` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use partlog::audit::{AuditLog, SortOrder};
//! use partlog::config::PartLogPaths;
//! use partlog::models::{Target, TargetType};
//! use partlog::storage::Storage;
//!
//! let storage = Storage::new(PartLogPaths::new()?)?;
//! storage.load_all()?;
//!
//! let log = AuditLog::new(&storage.log, &storage.elements);
//! let history = log.history(Target::new(TargetType::Part, 42), SortOrder::Descending, Some(20), None)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{PartLogError, PartLogResult};
