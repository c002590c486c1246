//! Silence detection and trimming utilities

use crate::error::AnalysisError;

/// Silence detection configuration
#[derive(Debug, Clone)]
pub struct SilenceDetector {
    /// Threshold in dB (default: -40.0)
    pub threshold_db: f32,

    /// Minimum duration in milliseconds for a silent region to be reported (default: 500)
    pub min_duration_ms: u32,

    /// Frame size for analysis (default: 2048)
    pub frame_size: usize,
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            min_duration_ms: 500,
            frame_size: 2048,
        }
    }
}

/// Detect and trim silence from audio
///
/// Leading and trailing silent frames are cut. Every silent run longer than
/// `min_duration_ms` is reported, including the trimmed ends.
///
/// # Arguments
///
/// * `samples` - Audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `detector` - Silence detection configuration
///
/// # Returns
///
/// Trimmed samples and silence map (`(start, end)` sample ranges in the input)
///
/// # Errors
///
/// `AnalysisError::InsufficientSignal` when every frame is below the threshold.
pub fn detect_and_trim(
    samples: &[f32],
    sample_rate: u32,
    detector: &SilenceDetector,
) -> Result<(Vec<f32>, Vec<(usize, usize)>), AnalysisError> {
    if detector.frame_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Frame size must be > 0".to_string(),
        ));
    }

    if samples.is_empty() {
        return Err(AnalysisError::InsufficientSignal(
            "Empty audio samples".to_string(),
        ));
    }

    log::debug!(
        "Detecting silence in {} samples (threshold {:.1} dB)",
        samples.len(),
        detector.threshold_db
    );

    let threshold = 10.0f32.powf(detector.threshold_db / 20.0);
    let loud: Vec<bool> = samples
        .chunks(detector.frame_size)
        .map(|frame| {
            let rms = (frame.iter().map(|&x| x * x).sum::<f32>() / frame.len() as f32).sqrt();
            rms >= threshold
        })
        .collect();

    let first = loud.iter().position(|&l| l);
    let last = loud.iter().rposition(|&l| l);

    let (first, last) = match (first, last) {
        (Some(f), Some(l)) => (f, l),
        _ => {
            return Err(AnalysisError::InsufficientSignal(
                "Audio is entirely silent".to_string(),
            ))
        }
    };

    let min_frames = ((detector.min_duration_ms as f32 / 1000.0) * sample_rate as f32
        / detector.frame_size as f32)
        .ceil()
        .max(1.0) as usize;

    let mut regions = Vec::new();
    let mut run_start: Option<usize> = None;
    for (i, &is_loud) in loud.iter().enumerate().chain(std::iter::once((loud.len(), &true))) {
        match (is_loud, run_start) {
            (false, None) => run_start = Some(i),
            (true, Some(start)) => {
                if i - start >= min_frames {
                    let end = (i * detector.frame_size).min(samples.len());
                    regions.push((start * detector.frame_size, end));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    let start = first * detector.frame_size;
    let end = ((last + 1) * detector.frame_size).min(samples.len());

    log::debug!(
        "Trimmed to samples {}..{} ({} silent regions)",
        start,
        end,
        regions.len()
    );

    Ok((samples[start..end].to_vec(), regions))
}
