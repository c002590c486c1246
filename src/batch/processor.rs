//! Folder batch processing
//!
//! Every supported audio file in a folder is decoded, analyzed, planned, renamed,
//! tagged and reported. A failing file only ever produces an error note in its own
//! report row. The run itself fails only when the folder cannot be listed or the
//! report cannot be written.
//!
//! Analysis is pure and may run on a rayon pool. Renames and tag writes run
//! afterwards, one file at a time in sorted order, so collision suffixes are
//! deterministic.

use std::path::{Path, PathBuf};

use chrono::Local;
use rayon::prelude::*;
use walkdir::WalkDir;

use super::collaborators::{
    AudioDecoder, FileRenamer, FsRenamer, LoftyTagWriter, OnsetTempoEstimator, SymphoniaDecoder,
    TagWriter, TempoEstimator,
};
use crate::analysis::result::TrackAnalysis;
use crate::config::{AnalysisConfig, UserRules};
use crate::error::{BatchError, FileError};
use crate::naming::planner::{plan_rename, round_bpm, RenamePlan};
use crate::report::row::{build_report_row, ReportRow};
use crate::report::summary::BatchSummary;
use crate::report::writer::{write_report, ReportFormat, ReportWriter};
use crate::{detect_track_key, preprocess};

/// Audio file extensions picked up by a scan (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "ogg", "m4a", "aac"];

/// Run-level switches that are not renaming rules
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Descend into subfolders
    pub recursive: bool,
    /// Worker threads for the analysis phase (1 = sequential)
    pub jobs: usize,
    /// Report file format
    pub report_format: ReportFormat,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            jobs: 1,
            report_format: ReportFormat::Csv,
        }
    }
}

/// What one file's analysis produced, possibly partially
#[derive(Debug)]
pub struct FileAnalysis {
    /// Decoded-track results; `None` if decoding or preprocessing failed
    pub track: Option<TrackAnalysis>,
    /// Everything that went wrong for this file
    pub errors: Vec<FileError>,
}

/// Result of a completed run
#[derive(Debug)]
pub struct BatchOutcome {
    /// One row per scanned file, in scan order
    pub rows: Vec<ReportRow>,
    /// Where the report was written
    pub report_path: PathBuf,
    /// Totals
    pub summary: BatchSummary,
}

/// List supported audio files in `folder`, sorted
///
/// # Errors
///
/// `BatchError::Scan` if `folder` is not a readable directory. Unreadable entries
/// below it are skipped with a warning.
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>, BatchError> {
    let scan_error = |source| BatchError::Scan {
        path: folder.to_path_buf(),
        source,
    };

    if !folder.is_dir() {
        return Err(scan_error(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "not a directory",
        )));
    }

    let mut files: Vec<PathBuf> = if recursive {
        WalkDir::new(folder)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_supported(path))
            .collect()
    } else {
        std::fs::read_dir(folder)
            .map_err(scan_error)?
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file() && is_supported(path))
            .collect()
    };

    files.sort();
    files.dedup();

    log::info!("Found {} audio files in {}", files.len(), folder.display());
    Ok(files)
}

/// Whether `path` has one of [`SUPPORTED_EXTENSIONS`]
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// First free `name`, `stem_1.ext`, `stem_2.ext`, ... in `dir`
///
/// `current` (the file being renamed) never counts as a collision.
pub fn collision_free_target(dir: &Path, file_name: &str, current: &Path) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() || candidate == current {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };

    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{}_{}.{}", stem, n, ext)),
            None => dir.join(format!("{}_{}", stem, n)),
        })
        .find(|path| !path.exists() || path == current)
        .unwrap_or(candidate)
}

/// Decode and analyze one file
///
/// Decode and preprocessing failures leave `track` empty. Tempo and key are
/// estimated independently, so one can succeed when the other fails.
pub fn analyze_file(
    path: &Path,
    decoder: &dyn AudioDecoder,
    tempo: &dyn TempoEstimator,
    config: &AnalysisConfig,
) -> FileAnalysis {
    let mut errors = Vec::new();

    let decoded = match decoder.decode(path) {
        Ok(decoded) => decoded,
        Err(e) => {
            return FileAnalysis {
                track: None,
                errors: vec![FileError::Decode(e)],
            }
        }
    };

    let duration_seconds = decoded.duration_seconds();
    let sample_rate = decoded.sample_rate;

    let samples = match preprocess(decoded.samples, sample_rate, config) {
        Ok(samples) => samples,
        Err(e) => {
            return FileAnalysis {
                track: Some(TrackAnalysis {
                    bpm: None,
                    key: None,
                    duration_seconds,
                    sample_rate,
                }),
                errors: vec![FileError::Analysis(e)],
            }
        }
    };

    let bpm = tempo
        .estimate(&samples, sample_rate)
        .map_err(|e| errors.push(FileError::Analysis(e)))
        .ok();

    let key = detect_track_key(&samples, sample_rate, config)
        .map_err(|e| errors.push(FileError::Analysis(e)))
        .ok();

    FileAnalysis {
        track: Some(TrackAnalysis {
            bpm,
            key,
            duration_seconds,
            sample_rate,
        }),
        errors,
    }
}

/// Runs the whole pipeline over a folder
pub struct BatchProcessor {
    config: AnalysisConfig,
    rules: UserRules,
    options: BatchOptions,
    decoder: Box<dyn AudioDecoder>,
    tempo: Box<dyn TempoEstimator>,
    tags: Box<dyn TagWriter>,
    renamer: Box<dyn FileRenamer>,
    report: Box<dyn ReportWriter + Send + Sync>,
}

impl BatchProcessor {
    /// Processor with the default collaborators
    pub fn new(config: AnalysisConfig, rules: UserRules, options: BatchOptions) -> Self {
        Self {
            decoder: Box::new(SymphoniaDecoder {
                mix: config.channel_mix,
            }),
            tempo: Box::new(OnsetTempoEstimator::new(config.clone())),
            tags: Box::new(LoftyTagWriter),
            renamer: Box::new(FsRenamer),
            report: options.report_format.writer(),
            config,
            rules,
            options,
        }
    }

    /// Replace the audio decoder
    pub fn with_decoder(mut self, decoder: Box<dyn AudioDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replace the tempo estimator
    pub fn with_tempo_estimator(mut self, tempo: Box<dyn TempoEstimator>) -> Self {
        self.tempo = tempo;
        self
    }

    /// Replace the tag writer
    pub fn with_tag_writer(mut self, tags: Box<dyn TagWriter>) -> Self {
        self.tags = tags;
        self
    }

    /// Replace the renamer
    pub fn with_renamer(mut self, renamer: Box<dyn FileRenamer>) -> Self {
        self.renamer = renamer;
        self
    }

    /// Replace the report writer
    pub fn with_report_writer(mut self, report: Box<dyn ReportWriter + Send + Sync>) -> Self {
        self.report = report;
        self
    }

    /// Scan, process and report one folder
    ///
    /// # Errors
    ///
    /// Only an unreadable folder or a failed report write. Per-file problems end up
    /// in the rows.
    pub fn run(&self, folder: &Path) -> Result<BatchOutcome, BatchError> {
        let files = scan_folder(folder, self.options.recursive)?;
        let rows = self.process_files(&files);

        let report_path = write_report(folder, &rows, self.report.as_ref())?;
        let summary = BatchSummary::from_rows(&rows);
        summary.log();

        Ok(BatchOutcome {
            rows,
            report_path,
            summary,
        })
    }

    /// Process files in the given order and return their rows
    pub fn process_files(&self, files: &[PathBuf]) -> Vec<ReportRow> {
        let analyses = self.analyze_all(files);

        files
            .iter()
            .zip(analyses)
            .enumerate()
            .map(|(i, (path, analysis))| {
                log::info!(
                    "[{}/{}] {}",
                    i + 1,
                    files.len(),
                    path.file_name().unwrap_or_default().to_string_lossy()
                );
                self.apply(path, analysis)
            })
            .collect()
    }

    fn analyze_all(&self, files: &[PathBuf]) -> Vec<FileAnalysis> {
        let analyze = |path: &PathBuf| {
            analyze_file(path, self.decoder.as_ref(), self.tempo.as_ref(), &self.config)
        };

        if self.options.jobs <= 1 {
            return files.iter().map(analyze).collect();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .build()
        {
            Ok(pool) => pool.install(|| files.par_iter().map(analyze).collect()),
            Err(e) => {
                log::warn!("Thread pool unavailable ({}), analyzing sequentially", e);
                files.iter().map(analyze).collect()
            }
        }
    }

    /// Plan, rename, tag and report one analyzed file
    fn apply(&self, path: &Path, analysis: FileAnalysis) -> ReportRow {
        let FileAnalysis { track, mut errors } = analysis;
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let key = track.as_ref().and_then(|t| t.key.as_ref());
        let bpm = track.as_ref().and_then(|t| t.bpm);

        let mut plan = match &track {
            Some(_) => plan_rename(&original_name, key, bpm, &self.rules),
            None => RenamePlan::unchanged(&original_name),
        };

        let mut final_path = path.to_path_buf();
        let mut renamed_ok = true;

        if plan.changed {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let target = collision_free_target(dir, &plan.final_name, path);

            match self.renamer.rename(path, &target) {
                Ok(()) => {
                    log::info!("  Renamed to {}", target.display());
                    plan.final_name = target
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| plan.final_name.clone());
                    plan.changed = plan.final_name != plan.original_name;
                    final_path = target;
                }
                Err(source) => {
                    renamed_ok = false;
                    errors.push(FileError::RenameIo {
                        from: path.to_path_buf(),
                        to: target,
                        source,
                    });
                    plan.final_name = original_name.clone();
                    plan.changed = false;
                }
            }
        }

        let analyzed = key.is_some() && bpm.and_then(round_bpm).is_some();
        if self.rules.rename_enabled && self.rules.write_tags && analyzed && renamed_ok {
            if let Err(e) = self.tags.write_title(&final_path, plan.final_stem()) {
                errors.push(FileError::TagWrite(e));
            }
        }

        for e in &errors {
            log::warn!("  {}: {}", original_name, e);
        }

        let error_note = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        let mut row = build_report_row(&plan, key, bpm.and_then(round_bpm), Some(&error_note));
        row.duration_seconds = track.as_ref().map(|t| t.duration_seconds);
        row.size_mb = std::fs::metadata(&final_path)
            .ok()
            .map(|m| m.len() as f64 / (1024.0 * 1024.0));
        row.processed_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::Key;
    use crate::error::{AnalysisError, DecodeError, TagWriteError};
    use crate::io::decoder::DecodedAudio;
    use crate::naming::notation::NotationKind;
    use std::sync::Mutex;

    /// Decodes every file to the same buffer; names containing "broken" fail
    struct FakeDecoder {
        audio: DecodedAudio,
    }

    impl AudioDecoder for FakeDecoder {
        fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError> {
            if path.to_string_lossy().contains("broken") {
                return Err(DecodeError::Corrupt("bad header".to_string()));
            }
            Ok(self.audio.clone())
        }
    }

    struct FixedTempo(f32);

    impl TempoEstimator for FixedTempo {
        fn estimate(&self, _: &[f32], _: u32) -> Result<f32, AnalysisError> {
            Ok(self.0)
        }
    }

    #[derive(Default)]
    struct RecordingTags(Mutex<Vec<(PathBuf, String)>>);

    impl TagWriter for RecordingTags {
        fn write_title(&self, path: &Path, title: &str) -> Result<(), TagWriteError> {
            self.0
                .lock()
                .unwrap()
                .push((path.to_path_buf(), title.to_string()));
            Ok(())
        }
    }

    struct FailingTags;

    impl TagWriter for FailingTags {
        fn write_title(&self, _: &Path, _: &str) -> Result<(), TagWriteError> {
            Err(TagWriteError::Unsupported("test".to_string()))
        }
    }

    struct FailingRenamer;

    impl FileRenamer for FailingRenamer {
        fn rename(&self, _: &Path, _: &Path) -> std::io::Result<()> {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            ))
        }
    }

    /// A-minor triad, 10 s at 22.05 kHz
    fn a_minor_audio() -> DecodedAudio {
        let sr = 22050u32;
        let samples = (0..sr as usize * 10)
            .map(|i| {
                let t = i as f32 / sr as f32;
                [220.0f32, 261.63, 329.63]
                    .iter()
                    .map(|f| (2.0 * std::f32::consts::PI * f * t).sin())
                    .sum::<f32>()
                    * 0.2
            })
            .collect();
        DecodedAudio {
            samples,
            sample_rate: sr,
            channels: 1,
        }
    }

    fn processor(rules: UserRules) -> BatchProcessor {
        BatchProcessor::new(AnalysisConfig::default(), rules, BatchOptions::default())
            .with_decoder(Box::new(FakeDecoder {
                audio: a_minor_audio(),
            }))
            .with_tempo_estimator(Box::new(FixedTempo(127.6)))
            .with_tag_writer(Box::new(RecordingTags::default()))
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"audio").unwrap();
        path
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.MP3");
        touch(dir.path(), "a.wav");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "music_analysis_20240101_000000.csv");
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "c.flac");

        let flat = scan_folder(dir.path(), false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.wav", "b.MP3"]);

        let deep = scan_folder(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_scan_missing_folder() {
        assert!(matches!(
            scan_folder(Path::new("/nonexistent/music"), false),
            Err(BatchError::Scan { .. })
        ));
    }

    #[test]
    fn test_collision_free_target() {
        let dir = tempfile::tempdir().unwrap();
        let current = touch(dir.path(), "x.mp3");
        touch(dir.path(), "Am - 128 BPM - Track.mp3");
        touch(dir.path(), "Am - 128 BPM - Track_1.mp3");

        let target = collision_free_target(dir.path(), "Am - 128 BPM - Track.mp3", &current);
        assert_eq!(target, dir.path().join("Am - 128 BPM - Track_2.mp3"));

        let free = collision_free_target(dir.path(), "Free.mp3", &current);
        assert_eq!(free, dir.path().join("Free.mp3"));

        let itself = collision_free_target(dir.path(), "x.mp3", &current);
        assert_eq!(itself, current);
    }

    #[test]
    fn test_failed_file_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let broken = touch(dir.path(), "a broken.mp3");
        let good = touch(dir.path(), "b good.mp3");

        let rows = processor(UserRules::default()).process_files(&[broken.clone(), good]);
        assert_eq!(rows.len(), 2);

        assert!(rows[0].error.as_deref().unwrap().contains("bad header"));
        assert!(!rows[0].changed);
        assert_eq!(rows[0].final_name, "a broken.mp3");
        assert!(broken.exists());

        assert!(rows[1].error.is_none(), "{:?}", rows[1].error);
        assert!(rows[1].changed);
        assert_eq!(rows[1].key_classic.as_deref(), Some("Am"));
        assert_eq!(rows[1].bpm, Some(128));
        assert_eq!(rows[1].final_name, "Am - 128 BPM - b good.mp3");
        assert!(dir.path().join("Am - 128 BPM - b good.mp3").exists());
    }

    #[test]
    fn test_rename_failure_keeps_original_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "Track.mp3");

        let rows = processor(UserRules::default())
            .with_renamer(Box::new(FailingRenamer))
            .process_files(&[file.clone()]);

        assert_eq!(rows[0].final_name, "Track.mp3");
        assert!(!rows[0].changed);
        assert!(rows[0].error.as_deref().unwrap().contains("rename failed"));
        assert!(file.exists());
    }

    #[test]
    fn test_tag_failure_is_recorded_but_rename_stands() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "Track.mp3");

        let rows = processor(UserRules::default())
            .with_tag_writer(Box::new(FailingTags))
            .process_files(&[file]);

        assert!(rows[0].changed);
        assert!(rows[0].error.as_deref().unwrap().contains("tag write"));
    }

    #[test]
    fn test_duplicate_targets_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "Track [HD].mp3");
        let b = touch(dir.path(), "Track.mp3");

        let rules = UserRules {
            remove_terms: vec!["[HD]".to_string()],
            ..UserRules::default()
        };
        let rows = processor(rules).process_files(&[a, b]);

        assert_eq!(rows[0].final_name, "Am - 128 BPM - Track.mp3");
        assert_eq!(rows[1].final_name, "Am - 128 BPM - Track_1.mp3");
    }

    #[test]
    fn test_rename_disabled_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "Track.mp3");

        let rules = UserRules {
            rename_enabled: false,
            target_notation: NotationKind::Camelot,
            ..UserRules::default()
        };
        let rows = processor(rules).process_files(&[file.clone()]);

        assert!(!rows[0].changed);
        assert_eq!(rows[0].key_camelot.as_deref(), Some("11A"));
        assert!(file.exists());
    }

    #[test]
    fn test_parallel_analysis_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<PathBuf> = (0..4)
            .map(|i| touch(dir.path(), &format!("broken {}.mp3", i)))
            .collect();

        let options = BatchOptions {
            jobs: 3,
            ..BatchOptions::default()
        };
        let rows = BatchProcessor::new(AnalysisConfig::default(), UserRules::default(), options)
            .with_decoder(Box::new(FakeDecoder {
                audio: a_minor_audio(),
            }))
            .process_files(&files);

        assert_eq!(rows.len(), 4);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.original_name, format!("broken {}.mp3", i));
            assert!(row.error.is_some());
        }
    }

    #[test]
    fn test_analyze_file_keeps_partial_results() {
        struct NoTempo;
        impl TempoEstimator for NoTempo {
            fn estimate(&self, _: &[f32], _: u32) -> Result<f32, AnalysisError> {
                Err(AnalysisError::InsufficientSignal("no beat".to_string()))
            }
        }

        let decoder = FakeDecoder {
            audio: a_minor_audio(),
        };
        let analysis = analyze_file(
            Path::new("pad.wav"),
            &decoder,
            &NoTempo,
            &AnalysisConfig::default(),
        );

        let track = analysis.track.unwrap();
        assert!(track.bpm.is_none());
        assert_eq!(track.key.unwrap().key, Key::Minor(9));
        assert_eq!(analysis.errors.len(), 1);
    }
}
