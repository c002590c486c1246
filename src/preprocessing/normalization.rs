//! Audio normalization utilities
//!
//! Supports two methods:
//! - Peak normalization (fast, default)
//! - RMS normalization
//!
//! # Example
//!
//! ```
//! use harmonic_renamer::preprocessing::normalization::{normalize, NormalizationMethod};
//!
//! let mut samples = vec![0.25f32; 44100];
//! let metadata = normalize(&mut samples, NormalizationMethod::Peak, 1.0)?;
//! assert!(metadata.gain_db > 0.0);
//! # Ok::<(), harmonic_renamer::AnalysisError>(())
//! ```

use crate::error::AnalysisError;

/// Normalization method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationMethod {
    /// Simple peak normalization (scales max peak to 0 dBFS minus headroom)
    Peak,
    /// RMS-based normalization (scales RMS to -20 dBFS minus headroom, peak-limited)
    Rms,
}

/// Loudness metadata returned from normalization
#[derive(Debug, Clone)]
pub struct LoudnessMetadata {
    /// Peak level in dB (before normalization)
    pub peak_db: f32,
    /// RMS level in dB (before normalization)
    pub rms_db: f32,
    /// Gain applied in dB
    pub gain_db: f32,
}

/// Numerical stability epsilon for divisions
const EPSILON: f32 = 1e-10;

/// RMS target before headroom
const RMS_TARGET_DB: f32 = -20.0;

/// Normalize samples in place
///
/// # Errors
///
/// Returns `AnalysisError::InsufficientSignal` for empty or all-zero input.
pub fn normalize(
    samples: &mut [f32],
    method: NormalizationMethod,
    headroom_db: f32,
) -> Result<LoudnessMetadata, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::InsufficientSignal(
            "Empty audio samples".to_string(),
        ));
    }

    let peak = samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
    let rms = (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt();

    if peak <= EPSILON {
        return Err(AnalysisError::InsufficientSignal(
            "Audio is digital silence".to_string(),
        ));
    }

    let peak_db = amplitude_to_db(peak);
    let rms_db = amplitude_to_db(rms);
    let ceiling_db = -headroom_db.max(0.0);

    let gain_db = match method {
        NormalizationMethod::Peak => ceiling_db - peak_db,
        // Never push peaks past the ceiling
        NormalizationMethod::Rms => (RMS_TARGET_DB - headroom_db - rms_db).min(ceiling_db - peak_db),
    };

    let gain = db_to_amplitude(gain_db);
    for s in samples.iter_mut() {
        *s *= gain;
    }

    log::debug!(
        "Normalized ({:?}): peak={:.1} dB rms={:.1} dB gain={:+.1} dB",
        method,
        peak_db,
        rms_db,
        gain_db
    );

    Ok(LoudnessMetadata {
        peak_db,
        rms_db,
        gain_db,
    })
}

/// Convert linear amplitude to dBFS
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.max(EPSILON).log10()
}

/// Convert dBFS to linear amplitude
pub fn db_to_amplitude(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}
