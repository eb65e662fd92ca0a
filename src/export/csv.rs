//! CSV Export functionality
//!
//! One row per log entry. Event payloads are flattened into the `summary`
//! column; use JSON or YAML to keep them intact.

use std::io::Write;

use crate::audit::LogEntry;
use crate::error::{PartLogError, PartLogResult};

const HEADER: [&str; 8] = [
    "id",
    "timestamp",
    "level",
    "kind",
    "target_type",
    "target_id",
    "user",
    "summary",
];

/// Export entries to CSV
pub fn export_history_csv<W: Write>(entries: &[LogEntry], writer: W) -> PartLogResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER).map_err(export_error)?;

    for entry in entries {
        let (target_type, target_id) = match entry.target {
            Some(target) => (
                target.target_type.as_str().to_string(),
                target.id.get().to_string(),
            ),
            None => (String::new(), String::new()),
        };
        let user = entry
            .user
            .as_ref()
            .map(|u| format!("{}:{}", u.id.get(), u.username))
            .unwrap_or_default();

        csv_writer
            .write_record([
                entry.id.get().to_string(),
                entry.timestamp.to_rfc3339(),
                entry.level.to_string(),
                entry.kind().as_str().to_string(),
                target_type,
                target_id,
                user,
                entry.event.summary(),
            ])
            .map_err(export_error)?;
    }

    csv_writer.flush().map_err(|e| PartLogError::Export(e.to_string()))?;
    Ok(())
}

fn export_error(err: csv::Error) -> PartLogError {
    PartLogError::Export(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{ChangeSet, LogEvent, NewLogEntry};
    use crate::models::{LogEntryId, Target, TargetType, UserRef};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn entries() -> Vec<LogEntry> {
        let part = Target::new(TargetType::Part, 42);
        let alice = Some(UserRef::new(1, "alice"));
        vec![
            NewLogEntry::new(LogEvent::created(), Utc.timestamp_opt(100, 0).unwrap())
                .target(part)
                .user(alice.clone())
                .into_entry(LogEntryId::new(1)),
            NewLogEntry::new(
                LogEvent::edited(ChangeSet::new().with("memo", Some(json!("a, b")), Some(json!("c")))),
                Utc.timestamp_opt(200, 0).unwrap(),
            )
            .target(part)
            .user(alice)
            .into_entry(LogEntryId::new(2)),
            NewLogEntry::new(
                LogEvent::UserLogin {
                    ip: "10.0.0.1".into(),
                },
                Utc.timestamp_opt(300, 0).unwrap(),
            )
            .into_entry(LogEntryId::new(3)),
        ]
    }

    #[test]
    fn test_csv_export() {
        let mut output = Vec::new();
        export_history_csv(&entries(), &mut output).unwrap();
        let csv = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "id,timestamp,level,kind,target_type,target_id,user,summary"
        );
        assert!(lines[1].starts_with("1,1970-01-01T00:01:40+00:00,info,created,part,42,1:alice,"));
        // Comma inside the summary is quoted
        assert!(lines[2].contains("\"memo: "));
        assert!(lines[3].contains(",user_login,,,"));
    }

    #[test]
    fn test_csv_export_empty() {
        let mut output = Vec::new();
        export_history_csv(&[], &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,timestamp,level,kind,target_type,target_id,user,summary\n"
        );
    }
}
