//! Channel mixing utilities (multichannel to mono conversion)

use crate::error::AnalysisError;

/// Channel mixing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMixMode {
    /// Simple average of all channels
    Mono,
    /// Keep the louder channel (by RMS)
    Dominant,
    /// First channel only
    Left,
    /// Second channel only (first channel for mono input)
    Right,
}

/// Fold interleaved samples to mono
///
/// # Arguments
///
/// * `interleaved` - Interleaved samples (`frame0_ch0, frame0_ch1, ...`)
/// * `channels` - Channel count (must be > 0)
/// * `mode` - Mixing mode
///
/// # Returns
///
/// Mono samples, one per frame. A trailing partial frame is dropped.
pub fn downmix(
    interleaved: &[f32],
    channels: usize,
    mode: ChannelMixMode,
) -> Result<Vec<f32>, AnalysisError> {
    if channels == 0 {
        return Err(AnalysisError::InvalidInput(
            "Channel count must be > 0".to_string(),
        ));
    }

    if channels == 1 {
        return Ok(interleaved.to_vec());
    }

    log::debug!(
        "Downmixing {} frames of {} channels using {:?}",
        interleaved.len() / channels,
        channels,
        mode
    );

    let frames = interleaved.chunks_exact(channels);

    let mono = match mode {
        ChannelMixMode::Mono => frames
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect(),
        ChannelMixMode::Left => frames.map(|frame| frame[0]).collect(),
        ChannelMixMode::Right => frames.map(|frame| frame[1]).collect(),
        ChannelMixMode::Dominant => {
            let loudest = dominant_channel(interleaved, channels);
            frames.map(|frame| frame[loudest]).collect()
        }
    };

    Ok(mono)
}

/// Index of the channel with the highest energy
fn dominant_channel(interleaved: &[f32], channels: usize) -> usize {
    let mut energy = vec![0.0f64; channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, &s) in frame.iter().enumerate() {
            energy[ch] += (s as f64) * (s as f64);
        }
    }

    energy
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(ch, _)| ch)
        .unwrap_or(0)
}
