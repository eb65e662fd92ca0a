//! Path management for partlog
//!
//! ## Path Resolution Order
//!
//! 1. `PARTLOG_DATA_DIR` environment variable (if set)
//! 2. The platform config directory for `partlog`
//!    (`~/.config/partlog` on Linux, `~/Library/Application Support/org.Part-DB.partlog`
//!    on macOS, `%APPDATA%\Part-DB\partlog\config` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::PartLogError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "PARTLOG_DATA_DIR";

/// Manages all paths used by partlog
#[derive(Debug, Clone)]
pub struct PartLogPaths {
    base_dir: PathBuf,
}

impl PartLogPaths {
    /// Resolve the base directory from the environment or the platform default
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, PartLogError> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create PartLogPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the export directory (`<base>/exports/`)
    pub fn export_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the append-only log (`data/log.jsonl`)
    pub fn log_file(&self) -> PathBuf {
        self.data_dir().join("log.jsonl")
    }

    /// Get the path to elements.json
    pub fn elements_file(&self) -> PathBuf {
        self.data_dir().join("elements.json")
    }

    /// Ensure the base, data and export directories exist
    pub fn ensure_directories(&self) -> Result<(), PartLogError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| PartLogError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| PartLogError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.export_dir())
            .map_err(|e| PartLogError::Io(format!("Failed to create export directory: {}", e)))?;

        Ok(())
    }

    /// Check if partlog has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, PartLogError> {
    ProjectDirs::from("org", "Part-DB", "partlog")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| PartLogError::Config("Could not determine a home directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PartLogPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.export_dir(), temp_dir.path().join("exports"));
    }

    #[test]
    fn test_env_var_override() {
        let temp_dir = TempDir::new().unwrap();

        std::env::set_var(DATA_DIR_ENV, temp_dir.path());
        let paths = PartLogPaths::new().unwrap();
        std::env::remove_var(DATA_DIR_ENV);

        assert_eq!(paths.base_dir(), temp_dir.path());
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PartLogPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(paths.export_dir().exists());
        assert!(!paths.is_initialized());
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PartLogPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.log_file(),
            temp_dir.path().join("data").join("log.jsonl")
        );
        assert_eq!(
            paths.elements_file(),
            temp_dir.path().join("data").join("elements.json")
        );
    }
}
