//! # Harmonic Renamer
//!
//! Key and BPM analysis for DJ music folders, with Camelot-aware, idempotent file
//! renaming.
//!
//! ## Features
//!
//! - **Key Detection**: Chroma extraction with Krumhansl-Schmuckler template matching
//!   (24 profiles, deterministic major-preferring tie-break)
//! - **BPM Detection**: Energy-flux onset envelope with FFT autocorrelation and octave
//!   correction
//! - **Notation**: Classic (`Am`) and Camelot (`11A`) key names, converted both ways
//! - **Renaming**: `"<Key> - <BPM> BPM - <Title>"` prefixes that are recognized on the
//!   next run instead of being added again
//! - **Reporting**: One CSV or JSON row per file, written even when every file failed
//!
//! ## Quick Start
//!
//! ```no_run
//! use harmonic_renamer::{analyze_audio, AnalysisConfig};
//!
//! // Load audio samples (mono, f32, normalized)
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 44100;
//!
//! let track = analyze_audio(&samples, sample_rate, &AnalysisConfig::default())?;
//!
//! println!("BPM: {:?}", track.bpm);
//! println!("Key: {:?}", track.key.map(|k| k.key.name()));
//! # Ok::<(), harmonic_renamer::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Decode → Preprocessing → Tempo + Chroma/Key → Rename plan → Rename/Tag → Report
//! ```
//!
//! The signal stages live in [`preprocessing`] and [`features`], file naming in
//! [`naming`], and the folder pipeline in [`batch`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod naming;
pub mod preprocessing;
pub mod report;

// Re-export main types
pub use analysis::result::{DetectedKey, Key, KeyConfidence, Mode, TrackAnalysis};
pub use batch::{BatchOptions, BatchOutcome, BatchProcessor};
pub use config::{AnalysisConfig, UserRules};
pub use error::{
    AnalysisError, BatchError, ConfigError, DecodeError, FileError, NotationParseError,
    ReportError, TagWriteError,
};
pub use naming::{plan_rename, KeyNotation, NotationKind, RenamePlan};
pub use report::{BatchSummary, ReportFormat, ReportRow};

use features::chroma::compute_chroma_profile;
use features::key::{detect_key, KeyTemplates};
use features::period::estimate_tempo;
use preprocessing::normalization::{normalize, NormalizationMethod};
use preprocessing::silence::{detect_and_trim, SilenceDetector};

/// Normalize and trim a mono signal before analysis
///
/// Peak-normalizes to `-config.normalization_headroom_db` dBFS and cuts leading and
/// trailing silence below `config.min_amplitude_db`.
///
/// # Errors
///
/// `AnalysisError::InsufficientSignal` for empty or entirely silent input.
pub fn preprocess(
    mut samples: Vec<f32>,
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<Vec<f32>, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }

    let loudness = normalize(
        &mut samples,
        NormalizationMethod::Peak,
        config.normalization_headroom_db,
    )?;
    log::debug!(
        "Normalized: peak {:.1} dB, gain {:+.1} dB",
        loudness.peak_db,
        loudness.gain_db
    );

    let detector = SilenceDetector {
        threshold_db: config.min_amplitude_db,
        ..SilenceDetector::default()
    };
    let (trimmed, silence_regions) = detect_and_trim(&samples, sample_rate, &detector)?;

    log::debug!(
        "Trimmed {} -> {} samples, {} silent regions",
        samples.len(),
        trimmed.len(),
        silence_regions.len()
    );

    Ok(trimmed)
}

/// Estimate the key of a preprocessed mono signal
///
/// # Errors
///
/// `AnalysisError` if the signal is too short, atonal, or has a flat chroma profile.
pub fn detect_track_key(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<DetectedKey, AnalysisError> {
    let chroma = compute_chroma_profile(samples, sample_rate, config)?;
    detect_key(&chroma, KeyTemplates::shared(config.template_set))
}

/// Main analysis function
///
/// Preprocesses the signal, then estimates tempo and key.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `TrackAnalysis` with both the tempo and the key set
///
/// # Errors
///
/// Returns `AnalysisError` if preprocessing, tempo estimation or key detection fails.
pub fn analyze_audio(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<TrackAnalysis, AnalysisError> {
    log::debug!(
        "Starting audio analysis: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );

    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
    }

    let duration_seconds = samples.len() as f32 / sample_rate.max(1) as f32;
    let processed = preprocess(samples.to_vec(), sample_rate, config)?;

    let tempo = estimate_tempo(&processed, sample_rate, config)?;
    let key = detect_track_key(&processed, sample_rate, config)?;

    log::debug!("Analysis complete: {:.2} BPM, key {}", tempo.bpm, key.key);

    Ok(TrackAnalysis {
        bpm: Some(tempo.bpm),
        key: Some(key),
        duration_seconds,
        sample_rate,
    })
}
