//! Configuration module for partlog
//!
//! - Path resolution for settings and data files
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::PartLogPaths;
pub use settings::Settings;
