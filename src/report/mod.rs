//! Audit report
//!
//! One row per processed file, written as CSV or JSON into the analyzed folder,
//! plus the end-of-run summary.

pub mod row;
pub mod summary;
pub mod writer;

pub use row::{build_report_row, ReportRow};
pub use summary::{BatchSummary, BpmStats};
pub use writer::{
    report_file_name, write_report, CsvReportWriter, JsonReportWriter, ReportFormat, ReportWriter,
    REPORT_PREFIX,
};
