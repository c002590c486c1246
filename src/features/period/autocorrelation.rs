//! Autocorrelation-based BPM estimation
//!
//! Finds periodicity in the onset envelope using FFT-accelerated autocorrelation.
//!
//! # Algorithm
//!
//! 1. Smooth the onset envelope and remove its mean
//! 2. Compute autocorrelation using FFT acceleration: `ACF = IFFT(|FFT(signal)|²)`,
//!    normalized by the overlap length of each lag
//! 3. Weight each lag by a log-normal tempo prior centred at 120 BPM
//! 4. Find peaks in the lag window of `[min_bpm, max_bpm]`
//! 5. Refine the peak lag by parabolic interpolation and convert:
//!    `BPM = (60 * sample_rate) / (lag * hop_size)`
//!
//! # Reference
//!
//! Ellis, D. P. W., & Pikrakis, A. (2006). Real-time Beat Induction.
//! *Proceedings of the International Conference on Music Information Retrieval*.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::BpmCandidate;
use crate::error::AnalysisError;

const EPSILON: f32 = 1e-10;

/// Centre of the tempo prior
const PRIOR_CENTER_BPM: f32 = 120.0;

/// Width of the tempo prior in octaves
const PRIOR_OCTAVES: f32 = 1.0;

/// Half-width of the triangular smoothing kernel, in frames
const SMOOTHING_RADIUS: usize = 2;

/// Estimate BPM candidates from an onset strength envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength per hop
/// * `sample_rate` - Sample rate in Hz
/// * `hop_size` - Hop size of the envelope (samples per frame)
/// * `min_bpm` - Minimum BPM to consider
/// * `max_bpm` - Maximum BPM to consider
///
/// # Returns
///
/// BPM candidates ranked by confidence (highest first). Empty when the envelope has
/// no periodicity inside the range.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate or hop size, or an
/// inverted BPM range.
pub fn estimate_bpm_from_autocorrelation(
    envelope: &[f32],
    sample_rate: u32,
    hop_size: usize,
    min_bpm: f32,
    max_bpm: f32,
) -> Result<Vec<BpmCandidate>, AnalysisError> {
    log::debug!(
        "Estimating BPM from autocorrelation: {} frames, {} Hz, hop={}, range=[{:.1}, {:.1}] BPM",
        envelope.len(),
        sample_rate,
        hop_size,
        min_bpm,
        max_bpm
    );

    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate: 0".to_string(),
        ));
    }

    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid hop size: 0".to_string(),
        ));
    }

    if min_bpm <= 0.0 || max_bpm <= 0.0 || min_bpm >= max_bpm {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid BPM range: [{:.1}, {:.1}]",
            min_bpm, max_bpm
        )));
    }

    let frames_per_minute = 60.0 * sample_rate as f32 / hop_size as f32;
    let lag_min = ((frames_per_minute / max_bpm).floor() as usize).max(1);
    let lag_max = (frames_per_minute / min_bpm).ceil() as usize;

    // Need a few periods of the slowest tempo to see any repetition
    if envelope.len() < 2 * lag_max {
        log::warn!(
            "Envelope too short for autocorrelation: {} frames, need {}",
            envelope.len(),
            2 * lag_max
        );
        return Ok(vec![]);
    }

    let signal = prepare_signal(envelope);
    let acf = compute_autocorrelation_fft(&signal);

    let zero_lag = acf[0];
    if zero_lag <= EPSILON {
        return Ok(vec![]);
    }

    // Prior-weighted ACF over the whole lag window (+1 on each side for interpolation)
    let lo = lag_min.saturating_sub(1).max(1);
    let hi = (lag_max + 1).min(acf.len() - 1);
    let weighted: Vec<f32> = (lo..=hi)
        .map(|lag| {
            let bpm = frames_per_minute / lag as f32;
            acf[lag] / zero_lag * tempo_prior(bpm)
        })
        .collect();

    let mut candidates = Vec::new();
    for i in 1..weighted.len() - 1 {
        let value = weighted[i];
        if value <= 0.0 || value <= weighted[i - 1] || value < weighted[i + 1] {
            continue;
        }

        let lag = (lo + i) as f32 + parabolic_offset(weighted[i - 1], value, weighted[i + 1]);
        let bpm = frames_per_minute / lag;
        if bpm < min_bpm || bpm > max_bpm {
            continue;
        }

        candidates.push(BpmCandidate {
            bpm,
            confidence: value.min(1.0),
        });
    }

    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    log::debug!(
        "Autocorrelation found {} BPM candidates (best: {:?})",
        candidates.len(),
        candidates.first()
    );

    Ok(candidates)
}

/// Triangular smoothing followed by mean removal
fn prepare_signal(envelope: &[f32]) -> Vec<f32> {
    let n = envelope.len();
    let r = SMOOTHING_RADIUS as isize;
    let smoothed: Vec<f32> = (0..n as isize)
        .map(|i| {
            let mut acc = 0.0f32;
            let mut norm = 0.0f32;
            for k in -r..=r {
                let j = i + k;
                if j >= 0 && (j as usize) < n {
                    let w = (r + 1 - k.abs()) as f32;
                    acc += w * envelope[j as usize];
                    norm += w;
                }
            }
            acc / norm
        })
        .collect();

    let mean = smoothed.iter().sum::<f32>() / n as f32;
    smoothed.into_iter().map(|x| x - mean).collect()
}

/// Log-normal preference for tempi near [`PRIOR_CENTER_BPM`]
fn tempo_prior(bpm: f32) -> f32 {
    let octaves = (bpm / PRIOR_CENTER_BPM).log2() / PRIOR_OCTAVES;
    (-0.5 * octaves * octaves).exp()
}

/// Vertex offset of the parabola through three equally spaced points, in `-0.5..=0.5`
fn parabolic_offset(left: f32, centre: f32, right: f32) -> f32 {
    let denom = left - 2.0 * centre + right;
    if denom.abs() <= EPSILON {
        return 0.0;
    }
    (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
}

/// Compute autocorrelation using FFT acceleration
///
/// Uses the identity ACF = IFFT(|FFT(signal)|²). Each lag is divided by its overlap
/// length `n - lag` so long lags are not penalized.
fn compute_autocorrelation_fft(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();

    // Zero-pad to avoid circular wrap-around
    let fft_size = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    for x in buffer.iter_mut() {
        *x = *x * x.conj();
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut buffer);

    let scale = 1.0 / fft_size as f32;
    buffer[..n]
        .iter()
        .enumerate()
        .map(|(lag, x)| x.re * scale / (n - lag) as f32)
        .collect()
}
