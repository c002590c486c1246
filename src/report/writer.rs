//! Report writers
//!
//! The report lands in the analyzed folder as
//! `music_analysis_<YYYYmmdd_HHMMSS>.<ext>`. It is written even when there are no
//! rows, so every run leaves an audit trail.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::row::ReportRow;
use crate::error::ReportError;

/// File name prefix of every report
pub const REPORT_PREFIX: &str = "music_analysis_";

/// Sink for the rows of one run
pub trait ReportWriter {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    /// Write all rows to `path`, replacing any existing file
    fn write(&self, path: &Path, rows: &[ReportRow]) -> Result<(), ReportError>;
}

/// CSV report with an explicit header row
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportWriter;

impl ReportWriter for CsvReportWriter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write(&self, path: &Path, rows: &[ReportRow]) -> Result<(), ReportError> {
        // Header written by hand so an empty report still has one
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(ReportRow::HEADERS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Pretty-printed JSON array of rows
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportWriter;

impl ReportWriter for JsonReportWriter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write(&self, path: &Path, rows: &[ReportRow]) -> Result<(), ReportError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, rows)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Report format selectable from the CLI or rules file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Comma-separated values
    #[default]
    Csv,
    /// JSON array
    Json,
}

impl ReportFormat {
    /// Writer for this format
    pub fn writer(&self) -> Box<dyn ReportWriter + Send + Sync> {
        match self {
            ReportFormat::Csv => Box::new(CsvReportWriter),
            ReportFormat::Json => Box::new(JsonReportWriter),
        }
    }
}

/// `music_analysis_<YYYYmmdd_HHMMSS>.<extension>`
pub fn report_file_name(timestamp: &DateTime<Local>, extension: &str) -> String {
    format!(
        "{}{}.{}",
        REPORT_PREFIX,
        timestamp.format("%Y%m%d_%H%M%S"),
        extension
    )
}

/// Write `rows` into `folder` with a timestamped name
///
/// Returns the path of the written report.
pub fn write_report(
    folder: &Path,
    rows: &[ReportRow],
    writer: &dyn ReportWriter,
) -> Result<PathBuf, ReportError> {
    let path = folder.join(report_file_name(&Local::now(), writer.extension()));
    writer.write(&path, rows)?;
    log::info!("Report saved: {} ({} rows)", path.display(), rows.len());
    Ok(path)
}
