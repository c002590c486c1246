//! Energy flux onset detection
//!
//! Algorithm:
//! 1. Divide audio into overlapping frames (frame_size, hop_size)
//! 2. Compute RMS energy per frame
//! 3. Compute energy derivative (flux): E_flux[n] = max(0, E[n] - E[n-1])
//! 4. Apply threshold and peak-pick to find onsets
//!
//! The flux curve itself is the onset envelope fed to the tempo estimator.
//!
//! # Reference
//!
//! Bello, J. P., Daudet, L., Abdallah, S., Duxbury, C., Davies, M., & Sandler, M. B. (2005).
//! A Tutorial on Onset Detection in Music Signals.
//! *IEEE Transactions on Speech and Audio Processing*, 13(5), 1035-1047.

use crate::error::AnalysisError;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Frame-wise energy flux (onset strength envelope)
///
/// Element `i` measures the energy rise between frame `i` and frame `i + 1`, so it
/// belongs to sample position `(i + 1) * hop_size`.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for zero frame or hop size.
pub fn energy_flux_envelope(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<f32>, AnalysisError> {
    if frame_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Frame size must be > 0".to_string(),
        ));
    }

    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Hop size must be > 0".to_string(),
        ));
    }

    if samples.len() < frame_size {
        log::warn!(
            "Frame size ({}) larger than audio length ({}), returning empty envelope",
            frame_size,
            samples.len()
        );
        return Ok(Vec::new());
    }

    let num_frames = (samples.len() - frame_size) / hop_size + 1;
    if num_frames < 2 {
        return Ok(Vec::new());
    }

    let frame_energies: Vec<f32> = (0..num_frames)
        .map(|i| {
            let frame = &samples[i * hop_size..i * hop_size + frame_size];
            (frame.iter().map(|&x| x * x).sum::<f32>() / frame_size as f32).sqrt()
        })
        .collect();

    Ok(frame_energies
        .windows(2)
        .map(|w| (w[1] - w[0]).max(0.0))
        .collect())
}

/// Peak-pick an energy flux envelope
///
/// # Arguments
///
/// * `envelope` - Output of [`energy_flux_envelope`]
/// * `hop_size` - Hop size the envelope was computed with
/// * `threshold_db` - Threshold in dB relative to maximum flux (typically -20 to -30 dB)
///
/// # Returns
///
/// Onset positions in samples, sorted, at least half a hop apart
pub fn pick_onsets(envelope: &[f32], hop_size: usize, threshold_db: f32) -> Vec<usize> {
    if envelope.len() < 2 {
        return Vec::new();
    }

    let max_flux = envelope.iter().copied().fold(0.0f32, f32::max);
    if max_flux <= EPSILON {
        log::debug!("All energy flux values are zero, no onsets detected");
        return Vec::new();
    }

    // threshold_linear = max_flux * 10^(threshold_db / 20)
    let threshold = max_flux * 10.0_f32.powf(threshold_db / 20.0);

    let last = envelope.len() - 1;
    let mut onsets: Vec<usize> = (0..envelope.len())
        .filter(|&i| {
            let flux = envelope[i];
            let rises = i == 0 || flux > envelope[i - 1];
            // >= on the right handles plateaus
            let holds = i == last || flux >= envelope[i + 1];
            flux > threshold && rises && holds
        })
        .map(|i| (i + 1) * hop_size)
        .collect();

    onsets.dedup_by(|next, prev| *next < *prev + hop_size / 2);

    log::debug!(
        "Energy flux: max={:.6}, threshold={:.6} ({:.1} dB), {} onsets",
        max_flux,
        threshold,
        threshold_db,
        onsets.len()
    );

    onsets
}

/// Detect onsets using energy flux method
///
/// # Arguments
///
/// * `samples` - Audio samples (mono, normalized to [-1.0, 1.0])
/// * `frame_size` - Frame size for analysis (typically 1024-2048)
/// * `hop_size` - Hop size between frames (typically 512)
/// * `threshold_db` - Threshold in dB relative to maximum flux
///
/// # Returns
///
/// Vector of onset times in samples, sorted by time
pub fn detect_energy_flux_onsets(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
    threshold_db: f32,
) -> Result<Vec<usize>, AnalysisError> {
    let envelope = energy_flux_envelope(samples, frame_size, hop_size)?;
    Ok(pick_onsets(&envelope, hop_size, threshold_db))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Generate a synthetic kick pattern at specified BPM
    /// Creates 4-on-floor pattern (kick every beat)
    pub(crate) fn generate_kick_pattern(
        duration_seconds: f32,
        bpm: f32,
        sample_rate: f32,
        kick_duration_ms: f32,
    ) -> Vec<f32> {
        let num_samples = (duration_seconds * sample_rate) as usize;
        let mut samples = vec![0.0f32; num_samples];

        let beat_interval = 60.0 / bpm * sample_rate;
        let kick_samples = (kick_duration_ms / 1000.0 * sample_rate) as usize;

        let mut beat = 0usize;
        loop {
            let pos = (beat as f32 * beat_interval).round() as usize;
            if pos >= num_samples {
                break;
            }
            let end = (pos + kick_samples).min(num_samples);
            for (i, s) in samples[pos..end].iter_mut().enumerate() {
                let t = i as f32 / kick_samples as f32;
                *s = (-t * 5.0).exp() * 0.8;
            }
            beat += 1;
        }

        samples
    }

    #[test]
    fn test_energy_flux_step() {
        let mut samples = vec![0.0f32; 44100];
        for s in samples[5000..].iter_mut() {
            *s = 0.5;
        }

        let onsets = detect_energy_flux_onsets(&samples, 2048, 512, -30.0).unwrap();

        assert!(!onsets.is_empty(), "Should detect the step");
        assert!(
            onsets[0] >= 3000 && onsets[0] <= 8000,
            "Onset should be near step at sample 5000, got {}",
            onsets[0]
        );
    }

    #[test]
    fn test_energy_flux_kick_pattern_120_bpm() {
        let sample_rate = 44100.0;
        let samples = generate_kick_pattern(4.0, 120.0, sample_rate, 150.0);

        let onsets = detect_energy_flux_onsets(&samples, 2048, 512, -30.0).unwrap();

        assert!(
            onsets.len() >= 6 && onsets.len() <= 20,
            "Expected 6-20 onsets for 120 BPM 4-on-floor, got {}",
            onsets.len()
        );
    }

    #[test]
    fn test_envelope_length() {
        let samples = vec![0.1f32; 512 * 10 + 1024];
        let envelope = energy_flux_envelope(&samples, 1024, 512).unwrap();
        assert_eq!(envelope.len(), 10);
    }

    #[test]
    fn test_energy_flux_silent_audio() {
        let samples = vec![0.0f32; 44100];
        let onsets = detect_energy_flux_onsets(&samples, 2048, 512, -20.0).unwrap();
        assert!(onsets.is_empty(), "Silent audio should produce no onsets");
    }

    #[test]
    fn test_energy_flux_too_short_audio() {
        let samples = vec![0.5f32; 1000];
        let onsets = detect_energy_flux_onsets(&samples, 2048, 512, -20.0).unwrap();
        assert!(onsets.is_empty());
    }

    #[test]
    fn test_energy_flux_invalid_parameters() {
        let samples = vec![0.5f32; 44100];
        assert!(detect_energy_flux_onsets(&samples, 0, 512, -20.0).is_err());
        assert!(detect_energy_flux_onsets(&samples, 2048, 0, -20.0).is_err());
    }
}
