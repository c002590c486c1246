//! Configuration: analysis parameters and user renaming rules
//!
//! [`AnalysisConfig`] tunes the DSP stages. [`UserRules`] is what the operator chooses
//! for a run (cleaning rules, notation, whether to rename). It can be assembled from CLI
//! flags or loaded from a YAML file and stays read-only for the whole batch.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::features::key::TemplateSet;
use crate::naming::notation::NotationKind;
use crate::preprocessing::channel_mixer::ChannelMixMode;

/// Analysis configuration parameters
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    // Preprocessing
    /// Silence detection threshold in dB (default: -40.0)
    /// Frames with RMS below this threshold are considered silent
    pub min_amplitude_db: f32,

    /// Headroom kept by peak normalization in dB (default: 1.0)
    pub normalization_headroom_db: f32,

    /// How multichannel audio is folded to mono (default: Mono)
    pub channel_mix: ChannelMixMode,

    // BPM detection
    /// Minimum BPM to consider (default: 60.0)
    pub min_bpm: f32,

    /// Maximum BPM to consider (default: 200.0)
    pub max_bpm: f32,

    /// Frame size for the onset envelope (default: 1024)
    pub onset_frame_size: usize,

    /// Hop size for the onset envelope (default: 512)
    pub onset_hop_size: usize,

    // Key detection
    /// Length of the centred excerpt used for key detection (default: 60 s)
    pub key_excerpt_seconds: f32,

    /// Frame size for chroma STFT (default: 4096)
    pub frame_size: usize,

    /// Hop size for chroma STFT (default: 2048)
    pub hop_size: usize,

    /// Tuning reference for A4 (default: 440.0 Hz)
    pub center_frequency: f32,

    /// Lowest frequency folded into chroma (default: 55 Hz, A1)
    pub min_frequency: f32,

    /// Highest frequency folded into chroma (default: 5000 Hz)
    pub max_frequency: f32,

    /// Enable soft chroma mapping (default: true)
    /// Soft mapping spreads frequency bins to neighboring semitones for robustness
    pub soft_chroma_mapping: bool,

    /// Soft mapping standard deviation in semitones (default: 0.5)
    pub soft_mapping_sigma: f32,

    /// Chroma sharpening power (default: 1.0 = no sharpening)
    pub chroma_sharpening_power: f32,

    /// Key profiles to correlate against (default: Krumhansl-Kessler)
    pub template_set: TemplateSet,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_amplitude_db: -40.0,
            normalization_headroom_db: 1.0,
            channel_mix: ChannelMixMode::Mono,
            min_bpm: 60.0,
            max_bpm: 200.0,
            onset_frame_size: 1024,
            onset_hop_size: 512,
            key_excerpt_seconds: 60.0,
            frame_size: 4096,
            hop_size: 2048,
            center_frequency: 440.0,
            min_frequency: 55.0,
            max_frequency: 5000.0,
            soft_chroma_mapping: true,
            soft_mapping_sigma: 0.5,
            chroma_sharpening_power: 1.0,
            template_set: TemplateSet::KrumhanslKessler,
        }
    }
}

/// Operator-supplied renaming rules for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRules {
    /// Literal substrings removed from the stem, in order
    pub remove_terms: Vec<String>,

    /// Literal `(old, new)` substitutions applied after removal, in order
    pub char_replacements: Vec<(String, String)>,

    /// Notation used for the key token
    pub target_notation: NotationKind,

    /// When false, files are analyzed and reported but never renamed or tagged
    pub rename_enabled: bool,

    /// Match `remove_terms` ignoring ASCII/Unicode case (default: false)
    pub case_insensitive_removal: bool,

    /// Write the final stem into the Title tag (default: true)
    pub write_tags: bool,
}

impl Default for UserRules {
    fn default() -> Self {
        Self {
            remove_terms: Vec::new(),
            char_replacements: Vec::new(),
            target_notation: NotationKind::Classic,
            rename_enabled: true,
            case_insensitive_removal: false,
            write_tags: true,
        }
    }
}

impl UserRules {
    /// Load rules from a YAML file
    ///
    /// Missing fields fall back to [`UserRules::default`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading rules from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let rules: UserRules =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        log::debug!(
            "Loaded rules: {} removal terms, {} replacements, notation={:?}",
            rules.remove_terms.len(),
            rules.char_replacements.len(),
            rules.target_notation
        );

        Ok(rules)
    }
}

/// Split a comma-separated removal list (`"Official Video, [HD]"`)
///
/// Entries are trimmed; empty entries are dropped.
pub fn parse_remove_terms(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse comma-separated `old:new` pairs (`"_: ,-:|"`)
///
/// Only the first `:` splits a pair, so `new` may itself contain colons. The `old`
/// side must be non-empty. Whitespace inside a pair is significant (`"_: "` replaces
/// underscores with spaces), only leading whitespace before `old` is ignored.
pub fn parse_replacements(text: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut pairs = Vec::new();

    for raw in text.split(',') {
        let entry = raw.trim_start();
        if entry.trim().is_empty() {
            continue;
        }

        let (old, new) = entry
            .split_once(':')
            .ok_or_else(|| ConfigError::Replacement(entry.to_string()))?;

        if old.is_empty() {
            return Err(ConfigError::Replacement(entry.to_string()));
        }

        pairs.push((old.to_string(), new.to_string()));
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = UserRules::default();
        assert!(rules.rename_enabled);
        assert!(rules.write_tags);
        assert!(!rules.case_insensitive_removal);
        assert_eq!(rules.target_notation, NotationKind::Classic);
    }

    #[test]
    fn test_parse_remove_terms() {
        assert_eq!(
            parse_remove_terms("Official Video, [HD] ,,"),
            vec!["Official Video".to_string(), "[HD]".to_string()]
        );
        assert!(parse_remove_terms("").is_empty());
    }

    #[test]
    fn test_parse_replacements() {
        let pairs = parse_replacements("_: ,-:|").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("_".to_string(), " ".to_string()),
                ("-".to_string(), "|".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_replacements_rejects_missing_colon() {
        assert!(parse_replacements("abc").is_err());
        assert!(parse_replacements(":x").is_err());
    }

    #[test]
    fn test_rules_from_yaml() {
        let yaml = "remove_terms: [\"Official Video\"]\n\
                    char_replacements: [[\"_\", \" \"]]\n\
                    target_notation: camelot\n";
        let rules: UserRules = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules.remove_terms, vec!["Official Video".to_string()]);
        assert_eq!(rules.char_replacements, vec![("_".to_string(), " ".to_string())]);
        assert_eq!(rules.target_notation, NotationKind::Camelot);
        assert!(rules.rename_enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let err = UserRules::load(Path::new("/nonexistent/rules.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
