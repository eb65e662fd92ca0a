//! Log entry display formatting
//!
//! History tables for element and global views, plus the detail view of a
//! single entry.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::audit::LogEntry;

/// Shown instead of an empty table
pub const NO_ENTRIES: &str = "No log entries found.\n";

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Time (UTC)")]
    timestamp: String,
    #[tabled(rename = "Event")]
    kind: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

impl From<&LogEntry> for EntryRow {
    fn from(entry: &LogEntry) -> Self {
        Self {
            id: entry.id.get(),
            timestamp: entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: entry.kind().to_string(),
            target: entry
                .target
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
            user: entry
                .user
                .as_ref()
                .map(|u| u.username.clone())
                .unwrap_or_else(|| "-".to_string()),
            summary: truncate(&entry.event.summary(), 60),
        }
    }
}

/// Format entries as a table
pub fn format_history_table(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return NO_ENTRIES.to_string();
    }

    let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    format!("{}\n", table)
}

/// Format entries one per line, for piping
pub fn format_history_lines(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return NO_ENTRIES.to_string();
    }

    let mut output = String::new();
    for entry in entries {
        output.push_str(&entry.format_human_readable());
        output.push('\n');
    }
    output
}

/// Format a single entry with its full payload
pub fn format_entry_details(entry: &LogEntry) -> String {
    let mut output = String::new();

    output.push_str(&format!("Entry:     {}\n", entry.id));
    output.push_str(&format!("Time:      {}\n", entry.timestamp.to_rfc3339()));
    output.push_str(&format!("Level:     {}\n", entry.level));
    output.push_str(&format!("Event:     {}\n", entry.kind()));

    match &entry.target {
        Some(target) => output.push_str(&format!("Target:    {}\n", target)),
        None => output.push_str("Target:    (none)\n"),
    }

    match &entry.user {
        Some(user) => output.push_str(&format!("User:      {}\n", user)),
        None => output.push_str("User:      (anonymous)\n"),
    }

    match entry.changes() {
        Some(changes) if !changes.is_empty() => {
            output.push_str("Changes:\n");
            for line in changes.detailed_lines() {
                output.push_str(&format!("  {}\n", line));
            }
        }
        _ => output.push_str(&format!("Details:   {}\n", entry.event.summary())),
    }

    output
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{ChangeSet, LogEvent, NewLogEntry};
    use crate::models::{LogEntryId, Target, TargetType, UserRef};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn edited() -> LogEntry {
        NewLogEntry::new(
            LogEvent::edited(ChangeSet::new().with("quantity", Some(json!(5)), Some(json!(7)))),
            Utc.timestamp_opt(200, 0).unwrap(),
        )
        .target(Target::new(TargetType::Part, 42))
        .user(Some(UserRef::new(1, "alice")))
        .into_entry(LogEntryId::new(3))
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(format_history_table(&[]), "No log entries found.\n");
        assert_eq!(format_history_lines(&[]), "No log entries found.\n");
    }

    #[test]
    fn test_history_table() {
        let table = format_history_table(&[edited()]);
        assert!(table.contains("Event"));
        assert!(table.contains("edited"));
        assert!(table.contains("part #42"));
        assert!(table.contains("alice"));
        assert!(table.contains("quantity: 5 -> 7"));
    }

    #[test]
    fn test_entry_details() {
        let details = format_entry_details(&edited());
        assert!(details.contains("Entry:     log-3"));
        assert!(details.contains("Changes:"));
        assert!(details.contains("quantity"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
