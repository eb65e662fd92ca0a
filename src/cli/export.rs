//! CLI command for history export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Args;

use super::parse_target;
use crate::audit::{AuditLog, LogEntry};
use crate::config::Settings;
use crate::error::{PartLogError, PartLogResult};
use crate::export::{
    collect_entries, export_history_csv, export_history_json, export_history_yaml, ExportFormat,
    HistoryExport,
};
use crate::models::Target;
use crate::storage::Storage;

/// Export arguments
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output format (default from settings)
    #[arg(value_enum)]
    pub format: Option<ExportFormat>,

    /// Export the history of elements of this type only (with --id)
    #[arg(short = 't', long = "type", requires = "id")]
    pub target_type: Option<String>,

    /// Element id (with --type)
    #[arg(long, requires = "target_type")]
    pub id: Option<u64>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Handle an export command
pub fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExportArgs,
) -> PartLogResult<()> {
    let format = cmd.format.unwrap_or(settings.default_export_format);
    let target = match (cmd.target_type.as_deref(), cmd.id) {
        (Some(target_type), Some(id)) => Some(parse_target(target_type, id)?),
        _ => None,
    };

    let log = AuditLog::new(&storage.log, &storage.elements);
    let entries = collect_entries(&log, target)?;
    let count = entries.len();

    match &cmd.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                PartLogError::Export(format!("Failed to create file {}: {}", path.display(), e))
            })?;
            let mut writer = BufWriter::new(file);
            write_export(format, target, entries, &mut writer, cmd.pretty)?;
            writer
                .flush()
                .map_err(|e| PartLogError::Export(e.to_string()))?;
            eprintln!("Exported {} entries to: {}", count, path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            write_export(format, target, entries, &mut writer, cmd.pretty)?;
        }
    }

    Ok(())
}

fn write_export<W: Write>(
    format: ExportFormat,
    target: Option<Target>,
    entries: Vec<LogEntry>,
    writer: &mut W,
    pretty: bool,
) -> PartLogResult<()> {
    match format {
        ExportFormat::Csv => export_history_csv(&entries, writer),
        ExportFormat::Json => {
            export_history_json(&HistoryExport::new(target, entries), writer, pretty)
        }
        ExportFormat::Yaml => export_history_yaml(&HistoryExport::new(target, entries), writer),
    }
}
