//! CSV rollup functionality for archiving WAL logs.
//!
//! This module implements atomic WAL-to-CSV conversion with proper error
//! handling to prevent data loss.

use crate::{LogPayload, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    habit_id: String,
    timestamp: String,
    logical_date: String,
    value: f64,
    intensity: f64,
    note: Option<String>,
}

impl From<&LogPayload> for CsvRow {
    fn from(log: &LogPayload) -> Self {
        CsvRow {
            id: log.id.to_string(),
            habit_id: log.habit_id.clone(),
            timestamp: log.timestamp.to_rfc3339(),
            logical_date: log.logical_date.to_string(),
            value: log.value,
            intensity: log.intensity,
            note: log.note.clone(),
        }
    }
}

/// Roll up WAL logs into CSV and archive the WAL atomically
///
/// This function:
/// 1. Reads all logs from the WAL
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to .processed
/// 5. Returns the number of logs processed
///
/// # Safety
/// - CSV is fsynced before the WAL is renamed
/// - WAL is renamed (not deleted) to allow manual recovery if needed
/// - Processed WAL files can be cleaned up with `cleanup_processed_wals`
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let logs = crate::sink::read_logs(wal_path)?;

    if logs.is_empty() {
        tracing::info!("No logs in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only when the file is freshly created
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for log in &logs {
        let row = CsvRow::from(log);
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} logs to CSV", logs.len());

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(logs.len())
}

/// Clean up old processed WAL files
///
/// This removes all .wal.processed files in the given directory.
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed WAL: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}
