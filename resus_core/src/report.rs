//! Report generation and export.
//!
//! Renders the session as a plain-text resuscitation record and, as an
//! alternative, a CSV event log. The in-memory log is newest-first and is
//! reversed here so exports read chronologically.
//!
//! File writes are atomic: content goes to a locked temp file in the
//! target directory, is synced, then renamed over the destination.

use crate::state::ResusSession;
use crate::types::{LogCategory, LogEntry};
use crate::{Error, Result};
use chrono::{DateTime, Local, Utc};
use fs2::FileExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Format elapsed seconds as `m:ss`
pub fn format_offset(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn format_absolute(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Report filename for the given date: `ACLS_Report_<ISO-date>.txt`
pub fn report_filename(date: DateTime<Utc>) -> String {
    format!("ACLS_Report_{}.txt", date.format("%Y-%m-%d"))
}

/// Render the full text report
///
/// Summary counts follow the record wording: shocks by log category,
/// epinephrine/amiodarone by action-name substring.
pub fn render_report(session: &ResusSession) -> Result<String> {
    let logs = session.log();
    if logs.is_empty() {
        return Err(Error::EmptyLog);
    }

    let state = session.state();
    let start = state
        .started_at
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".into());
    let duration = format_offset(state.elapsed_seconds);

    let epi_count = logs.iter().filter(|l| l.action.contains("Epi")).count();
    let amio_count = logs.iter().filter(|l| l.action.contains("Amio")).count();
    let shock_count = logs
        .iter()
        .filter(|l| l.category == LogCategory::Shock)
        .count();

    let mut content = String::new();
    content.push_str("ACLS RESUSCITATION RECORD\n");
    content.push_str("=========================\n");
    content.push_str(&format!("Date/Time: {}\n", start));
    content.push_str(&format!("Duration:  {}\n", duration));
    content.push_str("-------------------------\n");
    content.push_str("SUMMARY:\n");
    content.push_str(&format!("  - Shocks Delivered: {}\n", shock_count));
    content.push_str(&format!("  - Epinephrine Doses: {}\n", epi_count));
    content.push_str(&format!("  - Amiodarone Doses: {}\n", amio_count));
    content.push_str("=========================\n\n");
    content.push_str("EVENT LOG:\n");
    content.push_str("Time (Offset) | Time (Abs) | Action\n");
    content.push_str("------------------------------------------------\n");

    // Stored newest-first; the report reads oldest-first
    for entry in logs.iter().rev() {
        content.push_str(&format!(
            "[{}]      [{}]   {} ({})\n",
            format_offset(entry.time_offset),
            format_absolute(entry.timestamp),
            entry.action,
            entry.action_cn,
        ));
    }

    Ok(content)
}

/// Write the text report into `dir`, returning the written path
pub fn write_report(session: &ResusSession, dir: &Path) -> Result<PathBuf> {
    let content = render_report(session)?;
    let path = dir.join(report_filename(Utc::now()));
    write_atomic(&path, content.as_bytes())?;
    tracing::info!("Wrote report to {:?}", path);
    Ok(path)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "report path missing parent")
    })?)?;

    temp.as_file().lock_exclusive()?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        writer.write_all(bytes)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// A row in the CSV event-log export
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    time_offset: u32,
    timestamp: String,
    category: &'static str,
    action: String,
    action_cn: String,
}

impl From<&LogEntry> for CsvRow {
    fn from(entry: &LogEntry) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            time_offset: entry.time_offset,
            timestamp: entry.timestamp.to_rfc3339(),
            category: entry.category.as_str(),
            action: entry.action.clone(),
            action_cn: entry.action_cn.clone(),
        }
    }
}

/// Export the event log as CSV (chronological), returning the row count
pub fn write_log_csv(session: &ResusSession, path: &Path) -> Result<usize> {
    let logs = session.log();
    if logs.is_empty() {
        return Err(Error::EmptyLog);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for entry in logs.iter().rev() {
        writer.serialize(CsvRow::from(entry))?;
    }
    writer.flush()?;

    tracing::info!("Exported {} log rows to {:?}", logs.len(), path);
    Ok(logs.len())
}
