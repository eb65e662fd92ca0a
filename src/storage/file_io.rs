//! File I/O utilities
//!
//! Whole-document JSON files are written atomically (temp file, fsync,
//! rename). Line-delimited JSON files are append-only and flushed per batch.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::PartLogError;

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, PartLogError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| PartLogError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| PartLogError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), PartLogError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PartLogError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Same directory as the target, so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| PartLogError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| PartLogError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| PartLogError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| PartLogError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        PartLogError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// Append records to a JSONL file, one JSON object per line, with a single flush
pub fn append_json_lines<T, P>(path: P, records: &[T]) -> Result<(), PartLogError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if records.is_empty() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PartLogError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Serialize everything first so a bad record cannot leave a partial batch
    let mut buffer = String::new();
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| PartLogError::Storage(format!("Failed to serialize record: {}", e)))?;
        buffer.push_str(&line);
        buffer.push('\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| PartLogError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    file.write_all(buffer.as_bytes())
        .map_err(|e| PartLogError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

    file.flush()
        .map_err(|e| PartLogError::Storage(format!("Failed to flush {}: {}", path.display(), e)))?;

    Ok(())
}

/// Read every record of a JSONL file; a missing file reads as empty
///
/// Blank lines are skipped. A line that does not parse fails the whole read
/// and names its line number.
pub fn read_json_lines<T, P>(path: P) -> Result<Vec<T>, PartLogError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .map_err(|e| PartLogError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut records = Vec::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            PartLogError::Storage(format!(
                "Failed to read {} line {}: {}",
                path.display(),
                line_num + 1,
                e
            ))
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str(&line).map_err(|e| {
            PartLogError::Storage(format!(
                "Failed to parse {} line {}: {}",
                path.display(),
                line_num + 1,
                e
            ))
        })?;
        records.push(record);
    }

    Ok(records)
}
