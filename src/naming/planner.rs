//! Rename planning
//!
//! Turns {original file name, detected key, tempo, user rules} into the final file
//! name. Planning is pure: nothing here touches the disk.
//!
//! An existing leading `"<Key> - <BPM> BPM - "` prefix is recognized before any
//! cleaning, so user removal terms and replacements only ever edit the title part
//! and cannot break a prefix written by an earlier run.

use std::path::Path;

use serde::Serialize;

use super::cleaning::{apply_replacements, normalize_separators, remove_terms, sanitize};
use super::filename_parser::{parse_existing_tags, remove_stray_bpm_tokens, ExistingTags};
use super::notation::render;
use crate::analysis::result::DetectedKey;
use crate::config::UserRules;

/// Fractions above this round the tempo up
const BPM_ROUND_UP_FRACTION: f32 = 0.1;

/// Float slack so a written `x.10` still rounds down
///
/// Covers the f32 spacing below 256 BPM (at most 1.53e-5) and nothing more, so
/// `127.10005` already rounds up.
const BPM_ROUND_TOLERANCE: f32 = 1.6e-5;

/// Largest tempo the prefix pattern can read back
const MAX_BPM_TOKEN: u32 = 9999;

/// Outcome of planning one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePlan {
    /// File name as found on disk
    pub original_name: String,

    /// Stem after removal terms, replacements and sanitizing
    pub cleaned_stem: String,

    /// Key rendered in the target notation
    pub detected_key_token: Option<String>,

    /// `"<N> BPM"`
    pub bpm_token: Option<String>,

    /// File name to rename to (equal to `original_name` when nothing changes)
    pub final_name: String,

    /// `final_name != original_name`
    pub changed: bool,
}

impl RenamePlan {
    /// A plan that leaves the file alone
    pub fn unchanged(original_name: &str) -> Self {
        let (stem, _) = split_extension(original_name);
        Self {
            original_name: original_name.to_string(),
            cleaned_stem: stem.to_string(),
            detected_key_token: None,
            bpm_token: None,
            final_name: original_name.to_string(),
            changed: false,
        }
    }

    /// Stem of the final name
    pub fn final_stem(&self) -> &str {
        split_extension(&self.final_name).0
    }
}

/// Round a tempo for display
///
/// A fractional part strictly greater than 0.1 rounds up, anything else rounds down:
/// 127.05 → 127, 127.10 → 127, 127.15 → 128. Returns `None` for non-finite or
/// non-positive input and for tempos that round outside `1..=9999`, which a
/// filename prefix could not carry.
pub fn round_bpm(bpm: f32) -> Option<u32> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return None;
    }

    let whole = bpm.floor();
    let fraction = bpm - whole;
    let rounded = if fraction > BPM_ROUND_UP_FRACTION + BPM_ROUND_TOLERANCE {
        whole + 1.0
    } else {
        whole
    };
    let rounded = rounded as u32;
    (1..=MAX_BPM_TOKEN).contains(&rounded).then_some(rounded)
}

/// Apply removal terms, replacements and sanitizing to a stem
pub fn clean_stem(stem: &str, rules: &UserRules) -> String {
    let removed = normalize_separators(&remove_terms(
        stem,
        &rules.remove_terms,
        rules.case_insensitive_removal,
    ));
    let replaced = apply_replacements(&removed, &rules.char_replacements);
    normalize_separators(&sanitize(&replaced))
}

/// Plan the new name of one file
///
/// With no key, no tempo, or renaming disabled the plan is the identity
/// (`changed == false`).
///
/// # Example
///
/// ```
/// use harmonic_renamer::naming::planner::plan_rename;
/// use harmonic_renamer::{DetectedKey, Key, UserRules};
///
/// let key = DetectedKey { key: Key::Minor(9), correlation: 0.9, clarity: 0.2, all_scores: vec![] };
/// let plan = plan_rename("My Track.mp3", Some(&key), Some(127.9), &UserRules::default());
/// assert_eq!(plan.final_name, "Am - 128 BPM - My Track.mp3");
/// assert!(plan.changed);
/// ```
pub fn plan_rename(
    original_name: &str,
    key: Option<&DetectedKey>,
    bpm: Option<f32>,
    rules: &UserRules,
) -> RenamePlan {
    let (stem, extension) = split_extension(original_name);
    let target = rules.target_notation;

    let raw_tags = parse_existing_tags(stem, target);
    let (cleaned_stem, tags) = if raw_tags.has_prefix() {
        let remainder = clean_stem(&raw_tags.remainder, rules);
        let cleaned = reattach_prefix(stem, &raw_tags, &remainder);
        (
            cleaned,
            ExistingTags {
                remainder,
                ..raw_tags
            },
        )
    } else {
        let cleaned = clean_stem(stem, rules);
        let tags = parse_existing_tags(&cleaned, target);
        (cleaned, tags)
    };

    let key_token = key.map(|k| render(k.key, target));
    let rounded = bpm.and_then(round_bpm);
    let bpm_token = rounded.map(|b| format!("{} BPM", b));

    let (Some(detected), Some(bpm_value), Some(token)) = (key, rounded, key_token.as_deref())
    else {
        log::debug!(
            "{}: key or tempo unavailable, keeping the name",
            original_name
        );
        return RenamePlan {
            cleaned_stem,
            detected_key_token: key_token,
            bpm_token,
            ..RenamePlan::unchanged(original_name)
        };
    };

    if !rules.rename_enabled {
        return RenamePlan {
            cleaned_stem,
            detected_key_token: key_token,
            bpm_token,
            ..RenamePlan::unchanged(original_name)
        };
    }

    let prefix_is_current = tags.has_correct_key_token
        && tags.existing_key.map(|k| k.key()) == Some(detected.key)
        && tags.existing_bpm == Some(bpm_value);

    let new_stem = if prefix_is_current {
        cleaned_stem.clone()
    } else {
        if let Some(old) = &tags.existing_key_token {
            log::debug!("{}: replacing key token {:?} with {:?}", original_name, old, token);
        }
        let title = normalize_separators(&remove_stray_bpm_tokens(&tags.remainder));
        compose_stem(token, bpm_value, &title)
    };

    let final_name = match extension {
        Some(ext) => format!("{}.{}", new_stem, ext),
        None => new_stem,
    };

    RenamePlan {
        original_name: original_name.to_string(),
        cleaned_stem,
        detected_key_token: key_token,
        bpm_token,
        changed: final_name != original_name,
        final_name,
    }
}

/// `"<Key> - <BPM> BPM - <title>"`, or without the trailing separator if the title is empty
fn compose_stem(key_token: &str, bpm: u32, title: &str) -> String {
    if title.is_empty() {
        format!("{} - {} BPM", key_token, bpm)
    } else {
        format!("{} - {} BPM - {}", key_token, bpm, title)
    }
}

/// Put a cleaned title back behind the prefix as it was written
fn reattach_prefix(stem: &str, tags: &ExistingTags, cleaned_remainder: &str) -> String {
    if cleaned_remainder == tags.remainder {
        return stem.to_string();
    }

    let prefix = &stem[..stem.len() - tags.remainder.len()];
    if cleaned_remainder.is_empty() {
        prefix
            .trim_end_matches(|c: char| c.is_whitespace() || c == '-')
            .to_string()
    } else {
        format!("{}{}", prefix, cleaned_remainder)
    }
}

/// Split `"name.ext"` into `("name", Some("ext"))`
///
/// A leading dot (`".hidden"`) is part of the stem.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(_), Some(ext)) => match ext.to_str() {
            Some(ext) => (&name[..name.len() - ext.len() - 1], Some(ext)),
            None => (name, None),
        },
        _ => (name, None),
    }
}
