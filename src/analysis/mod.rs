//! Analysis result types
//!
//! Keys, detected-key scores and the per-track analysis record shared by the
//! feature extractors, the rename planner and the report.

pub mod result;

pub use result::{DetectedKey, Key, KeyConfidence, Mode, TrackAnalysis, NOTE_NAMES};
