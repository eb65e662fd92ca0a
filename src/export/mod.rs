//! Export module for partlog
//!
//! Writes log entries, either one element's history or the whole log, in
//! multiple formats:
//! - CSV: one row per entry (spreadsheet-compatible)
//! - JSON: full entries with export metadata
//! - YAML: the JSON document, human-readable

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_history_csv;
pub use json::{export_history_json, HistoryExport, EXPORT_SCHEMA_VERSION};
pub use yaml::export_history_yaml;

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::audit::{AuditLog, LogEntry, SortOrder};
use crate::error::{PartLogError, PartLogResult};
use crate::models::Target;

/// Export format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One row per entry
    Csv,
    /// Full entries, machine-readable
    #[default]
    Json,
    /// Full entries, human-readable
    Yaml,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = PartLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(PartLogError::InvalidArgument(format!(
                "unknown export format '{}'",
                other
            ))),
        }
    }
}

/// Entries to export, oldest first: the history of `target`, or every entry
pub fn collect_entries(log: &AuditLog<'_>, target: Option<Target>) -> PartLogResult<Vec<LogEntry>> {
    match target {
        Some(target) => log.history(target, SortOrder::Ascending, None, None),
        None => log.all_history(SortOrder::Ascending, None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("yml".parse::<ExportFormat>().unwrap(), ExportFormat::Yaml);
        assert!("xml".parse::<ExportFormat>().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_format_serde() {
        let json = serde_json::to_string(&ExportFormat::Yaml).unwrap();
        assert_eq!(json, "\"yaml\"");
        assert_eq!(ExportFormat::default(), ExportFormat::Json);
    }
}
