//! Error types for analysis, renaming and reporting
//!
//! Every per-file failure is expressed as a [`FileError`] so the batch processor can
//! record it in the report and move on to the next file. Only [`ReportError`] (and an
//! unreadable input folder) can end a run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while analyzing decoded audio
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Signal too short, silent or atonal to be profiled
    #[error("Insufficient signal: {0}")]
    InsufficientSignal(String),

    /// Processing error during analysis
    #[error("Processing error: {0}")]
    ProcessingError(String),

    /// Numerical error (zero variance, NaN, etc.)
    #[error("Numerical error: {0}")]
    NumericalError(String),
}

/// Audio decoding failures
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file could not be opened
    #[error("cannot open {path}: {source}")]
    Open {
        /// File that failed to open
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Container or codec not understood by the decoder
    #[error("unsupported audio format: {0}")]
    Unsupported(String),

    /// Corrupt stream or decoder failure
    #[error("decode failed: {0}")]
    Corrupt(String),

    /// The stream decoded to zero samples
    #[error("no audio samples decoded")]
    Empty,
}

/// An existing filename token is not a key marker in any supported notation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized key token: {token:?}")]
pub struct NotationParseError {
    /// The token that failed to parse
    pub token: String,
}

impl NotationParseError {
    pub(crate) fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

/// Metadata tag write failures
#[derive(Debug, Error)]
pub enum TagWriteError {
    /// Format has no writable tag container
    #[error("format not supported for metadata: {0}")]
    Unsupported(String),

    /// Tag library reported an error
    #[error("tag write failed: {0}")]
    Write(String),
}

/// Per-file failure recorded in the report row
#[derive(Debug, Error)]
pub enum FileError {
    /// Audio could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Audio decoded but could not be analyzed
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// The planned rename could not be applied
    #[error("rename failed ({} -> {}): {source}", from.display(), to.display())]
    RenameIo {
        /// Current path
        from: PathBuf,
        /// Target path
        to: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Title tag could not be written
    #[error("tag write error: {0}")]
    TagWrite(#[from] TagWriteError),
}

/// Report writing failures (fatal for the run)
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report file I/O
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rules file loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Rules file could not be read
    #[error("cannot read rules file {path}: {source}")]
    Read {
        /// Rules file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Rules file is not valid YAML for [`crate::config::UserRules`]
    #[error("invalid rules file {path}: {source}")]
    Parse {
        /// Rules file path
        path: PathBuf,
        /// YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// A `old:new` replacement pair could not be parsed
    #[error("invalid replacement pair {0:?}, expected old:new")]
    Replacement(String),
}

/// Failures that end a batch run
#[derive(Debug, Error)]
pub enum BatchError {
    /// The input folder could not be listed
    #[error("cannot scan folder {path}: {source}")]
    Scan {
        /// Folder being scanned
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The report could not be written
    #[error(transparent)]
    Report(#[from] ReportError),
}
