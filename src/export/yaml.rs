//! YAML Export functionality

use std::io::Write;

use crate::error::{PartLogError, PartLogResult};
use crate::export::json::HistoryExport;

/// Export entries to YAML, preceded by a comment header
pub fn export_history_yaml<W: Write>(export: &HistoryExport, writer: &mut W) -> PartLogResult<()> {
    let scope = match export.target {
        Some(target) => format!("history of {}", target),
        None => "full log".to_string(),
    };

    writeln!(writer, "# partlog export: {}", scope).map_err(export_error)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_error)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(export_error)?;
    writeln!(writer, "# Entries: {}", export.entries.len()).map_err(export_error)?;
    writeln!(writer).map_err(export_error)?;

    serde_yaml::to_writer(writer, export).map_err(|e| PartLogError::Export(e.to_string()))?;

    Ok(())
}

fn export_error(err: std::io::Error) -> PartLogError {
    PartLogError::Export(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{ChangeSet, LogEvent, NewLogEntry};
    use crate::models::{LogEntryId, Target, TargetType};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_yaml_export() {
        let part = Target::new(TargetType::Part, 42);
        let entry = NewLogEntry::new(
            LogEvent::edited(ChangeSet::new().with("quantity", Some(json!(5)), Some(json!(7)))),
            Utc.timestamp_opt(200, 0).unwrap(),
        )
        .target(part)
        .into_entry(LogEntryId::new(1));
        let export = HistoryExport::new(Some(part), vec![entry]);

        let mut output = Vec::new();
        export_history_yaml(&export, &mut output).unwrap();
        let yaml = String::from_utf8(output).unwrap();

        assert!(yaml.starts_with("# partlog export: history of part #42"));
        assert!(yaml.contains("schema_version:"));
        assert!(yaml.contains("1.0.0"));
        assert!(yaml.contains("quantity"));

        let parsed: HistoryExport = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.entries, export.entries);
    }
}
