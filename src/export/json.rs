//! JSON Export functionality
//!
//! Exports log entries with schema versioning.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::LogEntry;
use crate::error::{PartLogError, PartLogResult};
use crate::models::Target;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Exported history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// Element whose history was exported, `None` for the whole log
    pub target: Option<Target>,

    /// Entries, oldest first
    pub entries: Vec<LogEntry>,
}

impl HistoryExport {
    pub fn new(target: Option<Target>, entries: Vec<LogEntry>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            target,
            entries,
        }
    }
}

/// Export entries to JSON
pub fn export_history_json<W: Write>(
    export: &HistoryExport,
    writer: &mut W,
    pretty: bool,
) -> PartLogResult<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, export)
    } else {
        serde_json::to_writer(&mut *writer, export)
    }
    .map_err(|e| PartLogError::Export(e.to_string()))?;

    writeln!(writer).map_err(|e| PartLogError::Export(e.to_string()))?;
    Ok(())
}
