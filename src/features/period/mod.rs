//! Period estimation
//!
//! Converts the energy-flux onset envelope into a tempo:
//! - Autocorrelation of the envelope (FFT accelerated, tempo prior)
//! - Octave correction into the DJ range

pub mod autocorrelation;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::onset::{energy_flux_envelope, pick_onsets};

pub use autocorrelation::estimate_bpm_from_autocorrelation;

/// Fewer onsets than this cannot establish a pulse
pub const MIN_ONSETS: usize = 4;

/// Onset picking threshold relative to the loudest flux peak
const ONSET_THRESHOLD_DB: f32 = -30.0;

/// Below this the estimate is doubled
const OCTAVE_LOW_BPM: f32 = 70.0;

/// Above this the estimate is halved
const OCTAVE_HIGH_BPM: f32 = 200.0;

/// BPM candidate with confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmCandidate {
    /// BPM estimate
    pub bpm: f32,

    /// Confidence score (0.0-1.0)
    pub confidence: f32,
}

/// Final BPM estimate
#[derive(Debug, Clone, PartialEq)]
pub struct BpmEstimate {
    /// BPM after octave correction
    pub bpm: f32,

    /// Confidence of the winning autocorrelation peak
    pub confidence: f32,

    /// Number of onsets the envelope produced
    pub onset_count: usize,

    /// Remaining candidates, best first, before octave correction
    pub candidates: Vec<BpmCandidate>,
}

/// Estimate the tempo of a mono signal
///
/// # Errors
///
/// `AnalysisError::InsufficientSignal` when the signal has fewer than [`MIN_ONSETS`]
/// onsets or no periodicity inside `[config.min_bpm, config.max_bpm]`.
pub fn estimate_tempo(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<BpmEstimate, AnalysisError> {
    let hop_size = config.onset_hop_size;
    let envelope = energy_flux_envelope(samples, config.onset_frame_size, hop_size)?;

    let onset_count = pick_onsets(&envelope, hop_size, ONSET_THRESHOLD_DB).len();
    if onset_count < MIN_ONSETS {
        return Err(AnalysisError::InsufficientSignal(format!(
            "{} onsets detected, need at least {} for a tempo",
            onset_count, MIN_ONSETS
        )));
    }

    let candidates = estimate_bpm_from_autocorrelation(
        &envelope,
        sample_rate,
        hop_size,
        config.min_bpm,
        config.max_bpm,
    )?;

    let best = candidates.first().copied().ok_or_else(|| {
        AnalysisError::InsufficientSignal("No periodicity found in onset envelope".to_string())
    })?;

    let bpm = correct_octave(best.bpm);
    log::debug!(
        "Tempo: {:.2} BPM (raw {:.2}, confidence {:.3}, {} onsets)",
        bpm,
        best.bpm,
        best.confidence,
        onset_count
    );

    Ok(BpmEstimate {
        bpm,
        confidence: best.confidence,
        onset_count,
        candidates,
    })
}

/// Fold a tempo into the 70-200 BPM range DJs expect
///
/// Half-time readings are doubled and double-time readings halved, repeatedly if
/// needed. Non-positive or non-finite input is returned unchanged.
pub fn correct_octave(bpm: f32) -> f32 {
    if !bpm.is_finite() || bpm <= 0.0 {
        return bpm;
    }

    let mut bpm = bpm;
    while bpm < OCTAVE_LOW_BPM {
        bpm *= 2.0;
    }
    while bpm > OCTAVE_HIGH_BPM {
        bpm /= 2.0;
    }
    bpm
}
