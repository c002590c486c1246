//! One report row per processed file

use serde::{Deserialize, Serialize};

use crate::analysis::result::DetectedKey;
use crate::naming::notation::{render, NotationKind};
use crate::naming::planner::RenamePlan;

/// Flat before/after record of one file
///
/// Optional fields are empty in the CSV (null in JSON) when the value is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// File name before processing
    pub original_name: String,
    /// File name after processing (the original name if nothing was renamed)
    pub final_name: String,
    /// Detected key, Classic notation
    pub key_classic: Option<String>,
    /// Detected key, Camelot notation
    pub key_camelot: Option<String>,
    /// Rounded tempo
    pub bpm: Option<u32>,
    /// Whether the file was renamed
    pub changed: bool,
    /// What went wrong, if anything
    pub error: Option<String>,
    /// Correlation of the winning key profile
    pub correlation: Option<f32>,
    /// Key confidence bucket
    pub confidence: Option<String>,
    /// Decoded duration
    pub duration_seconds: Option<f32>,
    /// File size in MiB
    pub size_mb: Option<f64>,
    /// Local time the row was produced (`%Y-%m-%d %H:%M:%S`)
    pub processed_at: String,
}

impl ReportRow {
    /// Column names, in serialization order
    pub const HEADERS: [&'static str; 12] = [
        "original_name",
        "final_name",
        "key_classic",
        "key_camelot",
        "bpm",
        "changed",
        "error",
        "correlation",
        "confidence",
        "duration_seconds",
        "size_mb",
        "processed_at",
    ];
}

/// Assemble the report row of one file
///
/// `key` is `None` when key analysis failed. File metadata (`duration_seconds`,
/// `size_mb`, `processed_at`) is left for the caller to fill in.
pub fn build_report_row(
    plan: &RenamePlan,
    key: Option<&DetectedKey>,
    bpm: Option<u32>,
    error: Option<&str>,
) -> ReportRow {
    ReportRow {
        original_name: plan.original_name.clone(),
        final_name: plan.final_name.clone(),
        key_classic: key.map(|k| render(k.key, NotationKind::Classic)),
        key_camelot: key.map(|k| render(k.key, NotationKind::Camelot)),
        bpm,
        changed: plan.changed,
        error: error.filter(|e| !e.is_empty()).map(str::to_string),
        correlation: key.map(|k| k.correlation),
        confidence: key.map(|k| k.confidence().label().to_string()),
        duration_seconds: None,
        size_mb: None,
        processed_at: String::new(),
    }
}
