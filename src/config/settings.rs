//! User settings for partlog
//!
//! Preferences for history views, exports and diagnostic logging, persisted
//! as `config.json` in the base directory.

use serde::{Deserialize, Serialize};

use super::paths::PartLogPaths;
use crate::audit::SortOrder;
use crate::error::PartLogError;
use crate::export::ExportFormat;

/// User settings for partlog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Number of entries shown per history page when no limit is given
    #[serde(default = "default_history_page_size")]
    pub history_page_size: usize,

    /// Order of history views when none is given
    #[serde(default)]
    pub default_order: SortOrder,

    /// `tracing` filter directive used when neither `PARTLOG_LOG` nor a
    /// verbosity flag is given
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Format used by `export` when none is given
    #[serde(default)]
    pub default_export_format: ExportFormat,
}

fn default_schema_version() -> u32 {
    1
}

fn default_history_page_size() -> usize {
    50
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            history_page_size: default_history_page_size(),
            default_order: SortOrder::default(),
            log_filter: default_log_filter(),
            default_export_format: ExportFormat::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or default settings if the file doesn't exist
    pub fn load_or_create(paths: &PartLogPaths) -> Result<Self, PartLogError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Not persisted until the caller saves
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| PartLogError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| PartLogError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings no view could work with
    pub fn validate(&self) -> Result<(), PartLogError> {
        if self.history_page_size == 0 {
            return Err(PartLogError::Config(
                "history_page_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Save settings to disk
    pub fn save(&self, paths: &PartLogPaths) -> Result<(), PartLogError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| PartLogError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| PartLogError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
