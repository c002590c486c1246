//! Batch processing of a music folder
//!
//! - Collaborator traits (decoder, tempo estimator, tag writer, renamer)
//! - Folder scan, per-file pipeline and report

pub mod collaborators;
pub mod processor;

pub use collaborators::{
    AudioDecoder, FileRenamer, FsRenamer, LoftyTagWriter, OnsetTempoEstimator, SymphoniaDecoder,
    TagWriter, TempoEstimator,
};
pub use processor::{
    analyze_file, collision_free_target, is_supported, scan_folder, BatchOptions, BatchOutcome,
    BatchProcessor, FileAnalysis, SUPPORTED_EXTENSIONS,
};
