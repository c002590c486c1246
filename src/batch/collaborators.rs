//! Boundaries to the outside world
//!
//! Decoding, tempo estimation, tag writing and renaming sit behind traits so the
//! batch processor can be driven with fakes in tests. Each trait has one default
//! implementation backed by a real library.

use std::path::Path;

use lofty::config::WriteOptions;
use lofty::error::ErrorKind;
use lofty::prelude::*;
use lofty::tag::Tag;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, DecodeError, TagWriteError};
use crate::features::period::estimate_tempo;
use crate::io::decoder::{decode_audio, DecodedAudio};
use crate::preprocessing::channel_mixer::ChannelMixMode;

/// Turns a file into mono PCM
pub trait AudioDecoder: Send + Sync {
    /// Decode `path`
    fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError>;
}

/// Estimates the tempo of mono PCM
pub trait TempoEstimator: Send + Sync {
    /// Unrounded BPM
    fn estimate(&self, samples: &[f32], sample_rate: u32) -> Result<f32, AnalysisError>;
}

/// Writes the Title tag of an audio file
pub trait TagWriter: Send + Sync {
    /// Set the title, creating a tag if the file has none
    fn write_title(&self, path: &Path, title: &str) -> Result<(), TagWriteError>;
}

/// Moves a file to a new name
pub trait FileRenamer: Send + Sync {
    /// Rename `from` to `to`
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()>;
}

/// Symphonia-backed decoder
#[derive(Debug, Clone, Copy)]
pub struct SymphoniaDecoder {
    /// How multichannel audio is folded to mono
    pub mix: ChannelMixMode,
}

impl Default for SymphoniaDecoder {
    fn default() -> Self {
        Self {
            mix: ChannelMixMode::Mono,
        }
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError> {
        decode_audio(path, self.mix)
    }
}

/// Energy-flux autocorrelation tempo estimator
#[derive(Debug, Clone, Default)]
pub struct OnsetTempoEstimator {
    config: AnalysisConfig,
}

impl OnsetTempoEstimator {
    /// Estimator using the onset and BPM range settings of `config`
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

impl TempoEstimator for OnsetTempoEstimator {
    fn estimate(&self, samples: &[f32], sample_rate: u32) -> Result<f32, AnalysisError> {
        estimate_tempo(samples, sample_rate, &self.config).map(|estimate| estimate.bpm)
    }
}

/// Lofty-backed tag writer
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagWriter;

impl TagWriter for LoftyTagWriter {
    fn write_title(&self, path: &Path, title: &str) -> Result<(), TagWriteError> {
        let mut tagged = lofty::read_from_path(path).map_err(|e| match e.kind() {
            ErrorKind::UnknownFormat | ErrorKind::UnsupportedTag => {
                TagWriteError::Unsupported(e.to_string())
            }
            _ => TagWriteError::Write(e.to_string()),
        })?;

        if tagged.primary_tag().is_none() && tagged.first_tag().is_none() {
            let tag_type = tagged.primary_tag_type();
            tagged.insert_tag(Tag::new(tag_type));
        }

        let tag = if tagged.primary_tag().is_some() {
            tagged.primary_tag_mut()
        } else {
            tagged.first_tag_mut()
        }
        .ok_or_else(|| TagWriteError::Unsupported(path.display().to_string()))?;

        tag.set_title(title.to_string());
        tag.save_to_path(path, WriteOptions::default())
            .map_err(|e| TagWriteError::Write(e.to_string()))?;

        log::debug!("Title tag of {} set to {:?}", path.display(), title);
        Ok(())
    }
}

/// `std::fs::rename`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRenamer;

impl FileRenamer for FsRenamer {
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        std::fs::rename(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_renamer() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.mp3");
        let to = dir.path().join("b.mp3");
        std::fs::write(&from, b"x").unwrap();

        FsRenamer.rename(&from, &to).unwrap();
        assert!(!from.exists());
        assert!(to.exists());
    }

    #[test]
    fn test_tag_writer_rejects_non_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.mp3");
        std::fs::write(&path, b"plain text, not audio").unwrap();

        assert!(LoftyTagWriter.write_title(&path, "Title").is_err());
    }

    #[test]
    fn test_decoder_reports_missing_file() {
        let err = SymphoniaDecoder::default()
            .decode(Path::new("/nonexistent/a.wav"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Open { .. }));
    }
}
