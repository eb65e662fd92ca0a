//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod element;
pub mod export;
pub mod log;

pub use element::{handle_element_command, ElementCommands};
pub use export::{handle_export_command, ExportArgs};
pub use log::{handle_log_command, LogCommands};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::error::{PartLogError, PartLogResult};
use crate::models::{Target, TargetType, UserRef};

/// Parse a timestamp given as RFC 3339 or as unix seconds
pub fn parse_timestamp(s: &str) -> PartLogResult<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<i64>() {
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| PartLogError::InvalidArgument(format!("timestamp out of range: {}", s)));
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            PartLogError::InvalidArgument(format!(
                "invalid timestamp '{}': {} (use RFC 3339 or unix seconds)",
                s, e
            ))
        })
}

/// The given timestamp, or now
pub fn timestamp_or_now(s: Option<&str>) -> PartLogResult<DateTime<Utc>> {
    match s {
        Some(s) => parse_timestamp(s),
        None => Ok(Utc::now()),
    }
}

/// Parse an optional `ID:NAME` user
pub fn parse_user(s: Option<&str>) -> PartLogResult<Option<UserRef>> {
    s.map(str::parse).transpose()
}

/// Build a target from a type name and an id
pub fn parse_target(target_type: &str, id: u64) -> PartLogResult<Target> {
    Ok(Target::new(target_type.parse::<TargetType>()?, id))
}

/// Parse `key=value` pairs; values are read as JSON, falling back to a plain string
pub fn parse_fields(pairs: &[String]) -> PartLogResult<Map<String, Value>> {
    let mut fields = Map::new();

    for pair in pairs {
        let (key, raw) = pair.split_once('=').ok_or_else(|| {
            PartLogError::InvalidArgument(format!("expected key=value, got '{}'", pair))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(PartLogError::InvalidArgument(format!(
                "empty field name in '{}'",
                pair
            )));
        }

        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(key.to_string(), value);
    }

    Ok(fields)
}
