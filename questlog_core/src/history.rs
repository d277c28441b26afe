//! Log history loading and full stats recomputation.
//!
//! The WAL plus the CSV archive together hold the authoritative log
//! history. This module loads both (deduplicating on log id, WAL wins) and
//! can rebuild the whole stats book by replaying logs through the reducer
//! in submission order. That replay is the reconciliation path the
//! aggregate-only reducer deliberately doesn't attempt: backfills into past
//! gaps are resolved correctly here because the full history is available.

use crate::{calendar, reducer, HabitCatalog, LogPayload, Result, StatsBook};
use chrono::{DateTime, Local, TimeZone, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// CSV row format for reading archived logs
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    habit_id: String,
    timestamp: String,
    logical_date: String,
    value: f64,
    intensity: Option<f64>,
    note: Option<String>,
}

impl TryFrom<CsvRow> for LogPayload {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| crate::Error::Other(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        let logical_date = row
            .logical_date
            .parse()
            .map_err(|e| crate::Error::Other(format!("Invalid logical date: {}", e)))?;

        Ok(LogPayload {
            id,
            timestamp,
            logical_date,
            habit_id: row.habit_id,
            value: row.value,
            intensity: row.intensity.unwrap_or(1.0),
            note: row.note,
        })
    }
}

/// Load the full log history from both WAL and CSV
///
/// Returns logs sorted by timestamp (oldest first), the order the reducer
/// expects. Deduplicates logs that appear in both files on their id.
pub fn load_logs(wal_path: &Path, csv_path: &Path) -> Result<Vec<LogPayload>> {
    let mut logs = Vec::new();
    let mut seen_ids = HashSet::new();

    // WAL first: it is the fresher copy of any duplicated id
    if wal_path.exists() {
        for log in crate::sink::read_logs(wal_path)? {
            seen_ids.insert(log.id);
            logs.push(log);
        }
        tracing::debug!("Loaded {} logs from WAL", logs.len());
    }

    if csv_path.exists() {
        let csv_logs = load_logs_from_csv(csv_path)?;
        let mut csv_count = 0;
        for log in csv_logs {
            if !seen_ids.contains(&log.id) {
                seen_ids.insert(log.id);
                logs.push(log);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} logs from CSV", csv_count);
    }

    logs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    tracing::info!("Loaded {} total logs from history", logs.len());

    Ok(logs)
}

fn load_logs_from_csv(path: &Path) -> Result<Vec<LogPayload>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut logs = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match LogPayload::try_from(row) {
                Ok(log) => logs.push(log),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(logs)
}

/// Rebuild the stats book by replaying logs through the reducer
///
/// "Today" for each log is derived from that log's own timestamp, which
/// reproduces what the live engine saw when the log was first applied.
/// Logs referencing habits missing from the catalog are skipped with a
/// warning so a deleted definition can't poison the rebuild.
pub fn recompute_stats(
    catalog: &HabitCatalog,
    logs: &[LogPayload],
    offset_hours: i64,
) -> StatsBook {
    recompute_stats_in(catalog, logs, offset_hours, &Local)
}

/// Rebuild against an explicit time zone (see `calendar::logical_date_in`)
pub fn recompute_stats_in<Tz: TimeZone>(
    catalog: &HabitCatalog,
    logs: &[LogPayload],
    offset_hours: i64,
    tz: &Tz,
) -> StatsBook {
    let mut book = StatsBook::default();

    for log in logs {
        let habit = match catalog.get(&log.habit_id) {
            Some(habit) => habit,
            None => {
                tracing::warn!("Skipping log {} for unknown habit '{}'", log.id, log.habit_id);
                continue;
            }
        };

        let today = calendar::logical_date_in(Some(log.timestamp), offset_hours, tz);
        let current = book.get_or_default(&log.habit_id);
        let result = reducer::reduce(&current, habit, log, today);
        book.insert(log.habit_id.clone(), result.stats);
    }

    tracing::info!("Recomputed stats for {} habits", book.stats.len());

    book
}
