//! Audio decoding using Symphonia
//!
//! Probes the container, decodes the first audio track to interleaved `f32` and folds
//! it to mono. Corrupt packets are skipped; a stream that yields no samples at all is
//! an error.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::DecodeError;
use crate::preprocessing::channel_mixer::{downmix, ChannelMixMode};

/// Decoded mono PCM
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono samples in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source stream
    pub channels: usize,
}

impl DecodedAudio {
    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode an audio file to mono PCM
///
/// # Arguments
///
/// * `path` - Path to audio file
/// * `mix` - How to fold multichannel audio to mono
///
/// # Errors
///
/// * `DecodeError::Open` if the file cannot be opened
/// * `DecodeError::Unsupported` if no demuxer or codec recognizes the stream
/// * `DecodeError::Corrupt` on unrecoverable read or decode failures
/// * `DecodeError::Empty` if nothing decodes
pub fn decode_audio(path: &Path, mix: ChannelMixMode) -> Result<DecodedAudio, DecodeError> {
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(map_probe_error)?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::Unsupported("no supported audio tracks found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(map_probe_error)?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::Corrupt(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                if sample_rate == 0 {
                    sample_rate = spec.rate;
                }
                if channels == 0 {
                    channels = spec.channels.count();
                }

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packet, keep going
                skipped_packets += 1;
                log::debug!("Skipping corrupt packet in {}: {}", path.display(), e);
            }
            Err(e) => return Err(DecodeError::Corrupt(e.to_string())),
        }
    }

    if skipped_packets > 0 {
        log::warn!(
            "{}: skipped {} corrupt packets",
            path.display(),
            skipped_packets
        );
    }

    if interleaved.is_empty() || sample_rate == 0 || channels == 0 {
        return Err(DecodeError::Empty);
    }

    let samples = downmix(&interleaved, channels, mix)
        .map_err(|e| DecodeError::Corrupt(e.to_string()))?;

    log::debug!(
        "Decoded {}: {} frames, {} Hz, {} channels",
        path.display(),
        samples.len(),
        sample_rate,
        channels
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

fn map_probe_error(e: SymphoniaError) -> DecodeError {
    match e {
        SymphoniaError::Unsupported(what) => DecodeError::Unsupported(what.to_string()),
        other => DecodeError::Corrupt(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_stereo_wav(path: &Path, sample_rate: u32, seconds: f32) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let n = (seconds * sample_rate as f32) as usize;
        for i in 0..n {
            let s = (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin();
            writer.write_sample((s * 16000.0) as i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_stereo_wav(&path, 22050, 1.0);

        let audio = decode_audio(&path, ChannelMixMode::Mono).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.samples.len(), 22050);
        assert!((audio.duration_seconds() - 1.0).abs() < 1e-3);

        // Right channel is silent, so the mono average peaks near half scale
        let peak = audio.samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!(peak > 0.2 && peak < 0.3, "peak {}", peak);
    }

    #[test]
    fn test_decode_left_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_stereo_wav(&path, 22050, 0.5);

        let audio = decode_audio(&path, ChannelMixMode::Left).unwrap();
        let peak = audio.samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!(peak > 0.45, "peak {}", peak);
    }

    #[test]
    fn test_missing_file() {
        let err = decode_audio(Path::new("/nonexistent/track.mp3"), ChannelMixMode::Mono)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Open { .. }));
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"this is not an audio stream at all").unwrap();

        assert!(decode_audio(&path, ChannelMixMode::Mono).is_err());
    }
}
