//! Key profiles
//!
//! Defines tonal profiles for 24 keys (12 major + 12 minor). Each profile is the
//! canonical major or minor template rotated so that its tonic lands on the key's root.
//! Profiles are built once per template set and shared for the life of the process.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::analysis::result::{Key, Mode};
use crate::features::chroma::N_PITCH_CLASSES;

/// Krumhansl (1990) probe-tone ratings, C major
const KRUMHANSL_MAJOR: [f32; N_PITCH_CLASSES] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl (1990) probe-tone ratings, C minor
const KRUMHANSL_MINOR: [f32; N_PITCH_CLASSES] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Temperley (1999) profiles, C major
const TEMPERLEY_MAJOR: [f32; N_PITCH_CLASSES] = [
    5.0, 2.0, 3.5, 2.0, 4.5, 4.0, 2.0, 4.5, 2.0, 3.5, 1.5, 4.0,
];

/// Temperley (1999) profiles, C minor
const TEMPERLEY_MINOR: [f32; N_PITCH_CLASSES] = [
    5.0, 2.0, 3.5, 4.5, 2.0, 4.0, 2.0, 4.5, 3.5, 2.0, 1.5, 4.0,
];

/// Which published template pair to correlate against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSet {
    /// Krumhansl-Kessler probe-tone profiles
    #[default]
    KrumhanslKessler,
    /// Temperley's corpus-derived profiles
    Temperley,
}

impl TemplateSet {
    fn canonical(&self) -> (&'static [f32; N_PITCH_CLASSES], &'static [f32; N_PITCH_CLASSES]) {
        match self {
            TemplateSet::KrumhanslKessler => (&KRUMHANSL_MAJOR, &KRUMHANSL_MINOR),
            TemplateSet::Temperley => (&TEMPERLEY_MAJOR, &TEMPERLEY_MINOR),
        }
    }
}

/// A reference pitch-class template tagged with its key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyProfile {
    /// Key this template represents
    pub key: Key,
    /// Template weights, index 0 = C
    pub weights: [f32; N_PITCH_CLASSES],
}

impl KeyProfile {
    /// Rotate a C-rooted template up to `key`'s root
    fn rotated(key: Key, canonical: &[f32; N_PITCH_CLASSES]) -> Self {
        let root = key.root() as usize;
        let mut weights = [0.0f32; N_PITCH_CLASSES];
        for (pc, w) in weights.iter_mut().enumerate() {
            *w = canonical[(pc + N_PITCH_CLASSES - root) % N_PITCH_CLASSES];
        }
        Self { key, weights }
    }
}

/// Key templates for all 24 keys
#[derive(Debug, Clone)]
pub struct KeyTemplates {
    /// Template set these profiles come from
    pub set: TemplateSet,
    /// Major profiles, C, C#, ..., B
    pub major: [KeyProfile; 12],
    /// Minor profiles, C, C#, ..., B
    pub minor: [KeyProfile; 12],
}

impl KeyTemplates {
    /// Build the 24 profiles of a template set
    pub fn new_with_template_set(set: TemplateSet) -> Self {
        let (major, minor) = set.canonical();
        Self {
            set,
            major: std::array::from_fn(|root| KeyProfile::rotated(Key::Major(root as u32), major)),
            minor: std::array::from_fn(|root| KeyProfile::rotated(Key::Minor(root as u32), minor)),
        }
    }

    /// Shared, immutable profiles for a template set
    pub fn shared(set: TemplateSet) -> &'static KeyTemplates {
        static KRUMHANSL: OnceLock<KeyTemplates> = OnceLock::new();
        static TEMPERLEY: OnceLock<KeyTemplates> = OnceLock::new();

        let cell = match set {
            TemplateSet::KrumhanslKessler => &KRUMHANSL,
            TemplateSet::Temperley => &TEMPERLEY,
        };
        cell.get_or_init(|| KeyTemplates::new_with_template_set(set))
    }

    /// Profile for a key
    pub fn profile(&self, key: Key) -> &KeyProfile {
        let root = key.root() as usize;
        match key.mode() {
            Mode::Major => &self.major[root],
            Mode::Minor => &self.minor[root],
        }
    }

    /// All 24 profiles, majors first
    pub fn iter(&self) -> impl Iterator<Item = &KeyProfile> {
        self.major.iter().chain(self.minor.iter())
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new_with_template_set(TemplateSet::default())
    }
}
