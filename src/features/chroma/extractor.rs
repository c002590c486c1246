//! Chroma vector extraction
//!
//! Converts an FFT magnitude spectrogram to 12-element chroma vectors.
//!
//! Algorithm:
//! 1. Hann-windowed STFT (frame_size, hop_size)
//! 2. Map every bin inside `[min_frequency, max_frequency]` to a pitch class,
//!    `pc = 12 * log2(f / center_frequency) + 9` (A = 9), optionally spread to the
//!    neighbouring classes with a Gaussian of `soft_mapping_sigma` semitones
//! 3. Accumulate bin magnitudes per pitch class and L2-normalize each frame
//! 4. Average voiced frames into one profile for key detection

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::normalization::{l2_normalize, sharpen_chroma};
use super::{ChromaVector, N_PITCH_CLASSES};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Soft-mapping weights below this are dropped
const MIN_SOFT_WEIGHT: f32 = 1e-3;

/// Extract chroma vectors from audio samples
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Frame/hop sizes, frequency range and mapping options
///
/// # Returns
///
/// One L2-normalized chroma vector per frame that carried energy. Silent frames are
/// skipped.
///
/// # Errors
///
/// `AnalysisError::InsufficientSignal` when the signal is shorter than one frame.
pub fn extract_chroma(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<Vec<ChromaVector>, AnalysisError> {
    let frame_size = config.frame_size;
    let hop_size = config.hop_size;

    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate: 0".to_string(),
        ));
    }

    if frame_size < 2 || hop_size == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid STFT parameters: frame={}, hop={}",
            frame_size, hop_size
        )));
    }

    if samples.len() < frame_size {
        return Err(AnalysisError::InsufficientSignal(format!(
            "{} samples is shorter than one {}-sample analysis frame",
            samples.len(),
            frame_size
        )));
    }

    log::debug!(
        "Extracting chroma: {} samples at {} Hz (frame={}, hop={})",
        samples.len(),
        sample_rate,
        frame_size,
        hop_size
    );

    let bin_map = build_bin_map(frame_size, sample_rate, config);
    if bin_map.is_empty() {
        return Err(AnalysisError::InvalidInput(format!(
            "No FFT bins between {:.1} Hz and {:.1} Hz",
            config.min_frequency, config.max_frequency
        )));
    }

    let window = hann_window(frame_size);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];

    let num_frames = (samples.len() - frame_size) / hop_size + 1;
    let mut chroma_vectors = Vec::with_capacity(num_frames);

    for frame_idx in 0..num_frames {
        let start = frame_idx * hop_size;
        let frame = &samples[start..start + frame_size];

        for ((slot, &s), &w) in buffer.iter_mut().zip(frame).zip(&window) {
            *slot = Complex::new(s * w, 0.0);
        }
        fft.process(&mut buffer);

        let mut chroma = [0.0f32; N_PITCH_CLASSES];
        for entry in &bin_map {
            let magnitude = buffer[entry.bin].norm();
            for &(pc, weight) in &entry.weights {
                chroma[pc] += weight * magnitude;
            }
        }

        if l2_normalize(&mut chroma) {
            chroma_vectors.push(ChromaVector::new(chroma)?);
        }
    }

    log::debug!(
        "Extracted {} voiced chroma frames out of {}",
        chroma_vectors.len(),
        num_frames
    );

    Ok(chroma_vectors)
}

/// Summarize a whole signal as one chroma profile
///
/// Takes a centred excerpt of at most `config.key_excerpt_seconds`, extracts per-frame
/// chroma and averages it. Optional sharpening is applied to the average.
///
/// # Errors
///
/// `AnalysisError::InsufficientSignal` when the excerpt is too short, silent, or
/// produces no pitched energy.
pub fn compute_chroma_profile(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<ChromaVector, AnalysisError> {
    let excerpt = centred_excerpt(samples, sample_rate, config.key_excerpt_seconds);
    let frames = extract_chroma(excerpt, sample_rate, config)?;

    if frames.is_empty() {
        return Err(AnalysisError::InsufficientSignal(
            "No pitched energy found in excerpt".to_string(),
        ));
    }

    let mut mean = [0.0f32; N_PITCH_CLASSES];
    for chroma in &frames {
        for (acc, &v) in mean.iter_mut().zip(chroma.as_slice()) {
            *acc += v;
        }
    }
    let n = frames.len() as f32;
    for v in mean.iter_mut() {
        *v /= n;
    }

    if mean.iter().sum::<f32>() <= EPSILON {
        return Err(AnalysisError::InsufficientSignal(
            "Chroma profile has no energy".to_string(),
        ));
    }

    let profile = sharpen_chroma(&mean, config.chroma_sharpening_power);
    ChromaVector::from_slice(&profile)
}

/// Centred window of at most `seconds` (the whole signal if shorter)
fn centred_excerpt(samples: &[f32], sample_rate: u32, seconds: f32) -> &[f32] {
    if seconds <= 0.0 {
        return samples;
    }
    let max_len = (seconds * sample_rate as f32) as usize;
    if samples.len() <= max_len {
        return samples;
    }
    let start = (samples.len() - max_len) / 2;
    &samples[start..start + max_len]
}

/// Pitch-class weights for one FFT bin
struct BinMapping {
    bin: usize,
    weights: Vec<(usize, f32)>,
}

/// Precompute the bin → pitch-class mapping for one frame size
fn build_bin_map(frame_size: usize, sample_rate: u32, config: &AnalysisConfig) -> Vec<BinMapping> {
    let bin_hz = sample_rate as f32 / frame_size as f32;
    let nyquist = sample_rate as f32 / 2.0;
    let max_frequency = config.max_frequency.min(nyquist);

    (1..frame_size / 2)
        .filter_map(|bin| {
            let freq = bin as f32 * bin_hz;
            if freq < config.min_frequency || freq > max_frequency {
                return None;
            }

            let semitone = 12.0 * (freq / config.center_frequency).log2() + 9.0;
            let weights = if config.soft_chroma_mapping && config.soft_mapping_sigma > 0.0 {
                soft_weights(semitone, config.soft_mapping_sigma)
            } else {
                let pc = semitone.round().rem_euclid(12.0) as usize % N_PITCH_CLASSES;
                vec![(pc, 1.0)]
            };

            Some(BinMapping { bin, weights })
        })
        .collect()
}

/// Gaussian spread of one fractional semitone position over the 12 classes
fn soft_weights(semitone: f32, sigma: f32) -> Vec<(usize, f32)> {
    let position = semitone.rem_euclid(12.0);
    let mut weights: Vec<(usize, f32)> = (0..N_PITCH_CLASSES)
        .filter_map(|pc| {
            let raw = (position - pc as f32).abs();
            let distance = raw.min(12.0 - raw);
            let w = (-(distance * distance) / (2.0 * sigma * sigma)).exp();
            (w >= MIN_SOFT_WEIGHT).then_some((pc, w))
        })
        .collect();

    let total: f32 = weights.iter().map(|(_, w)| w).sum();
    if total > EPSILON {
        for (_, w) in weights.iter_mut() {
            *w /= total;
        }
    }
    weights
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            0.5 - 0.5 * phase.cos()
        })
        .collect()
}
