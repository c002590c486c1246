//! Analysis result types

use serde::{Deserialize, Serialize};

/// Pitch-class names, sharps only, index 0 = C
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Major or minor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    /// Major (Camelot `B`)
    Major,
    /// Minor (Camelot `A`)
    Minor,
}

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Build a key from a root (taken mod 12) and a mode
    pub fn new(root: u32, mode: Mode) -> Self {
        match mode {
            Mode::Major => Key::Major(root % 12),
            Mode::Minor => Key::Minor(root % 12),
        }
    }

    /// Root pitch class, 0 = C
    pub fn root(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// Mode of the key
    pub fn mode(&self) -> Mode {
        match self {
            Key::Major(_) => Mode::Major,
            Key::Minor(_) => Mode::Minor,
        }
    }

    /// Get key name in musical notation (e.g., "C", "Am", "F#", "D#m")
    ///
    /// # Example
    ///
    /// ```
    /// use harmonic_renamer::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C");
    /// assert_eq!(Key::Major(6).name(), "F#");
    /// assert_eq!(Key::Minor(9).name(), "Am");
    /// assert_eq!(Key::Minor(1).name(), "C#m");
    /// ```
    pub fn name(&self) -> String {
        let note = NOTE_NAMES[self.root() as usize];
        match self.mode() {
            Mode::Major => note.to_string(),
            Mode::Minor => format!("{}m", note),
        }
    }

    /// All 24 keys, majors first, each mode ordered by root
    pub fn all() -> impl Iterator<Item = Key> {
        (0..12)
            .map(Key::Major)
            .chain((0..12).map(Key::Minor))
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Coarse confidence bucket for a key correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyConfidence {
    /// Correlation above 0.8
    High,
    /// Correlation above 0.5
    Medium,
    /// Anything lower
    Low,
}

impl KeyConfidence {
    /// Bucket a Pearson correlation
    pub fn from_correlation(correlation: f32) -> Self {
        if correlation > 0.8 {
            KeyConfidence::High
        } else if correlation > 0.5 {
            KeyConfidence::Medium
        } else {
            KeyConfidence::Low
        }
    }

    /// Label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            KeyConfidence::High => "High",
            KeyConfidence::Medium => "Medium",
            KeyConfidence::Low => "Low",
        }
    }
}

/// Result of classifying one chroma vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedKey {
    /// Winning key
    pub key: Key,

    /// Pearson correlation of the winning profile (-1.0..=1.0)
    pub correlation: f32,

    /// Gap between the winner and the runner-up correlation
    ///
    /// Small values mean the track sits between two keys.
    pub clarity: f32,

    /// All 24 correlations, highest first
    pub all_scores: Vec<(Key, f32)>,
}

impl DetectedKey {
    /// Confidence bucket of the winning correlation
    pub fn confidence(&self) -> KeyConfidence {
        KeyConfidence::from_correlation(self.correlation)
    }

    /// Top `n` candidates
    pub fn top_keys(&self, n: usize) -> &[(Key, f32)] {
        &self.all_scores[..n.min(self.all_scores.len())]
    }
}

/// Everything learned about one decoded track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackAnalysis {
    /// Raw tempo estimate (rounded later by the rename planner)
    pub bpm: Option<f32>,

    /// Key estimate
    pub key: Option<DetectedKey>,

    /// Decoded duration in seconds
    pub duration_seconds: f32,

    /// Sample rate of the decoded stream
    pub sample_rate: u32,
}
