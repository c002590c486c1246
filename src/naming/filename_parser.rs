//! Detection of an existing `"<Key> - <BPM> BPM - "` prefix
//!
//! Only the leading position of the stem is inspected. A key token is recognized
//! only when the BPM token follows it, so a title that merely starts with a word
//! like `"Am"` or `"Be"` is never mistaken for a key marker.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::notation::{parse_key_token, KeyNotation, NotationKind};

/// `<Key> - <BPM> BPM - ` or `<BPM> BPM - ` at the very start of the stem
static PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?P<key>[0-9]{1,2}[AaBb]|[A-Ga-g][#b]?m?)\s*-\s*)?(?P<bpm>[0-9]{1,4})\s*(?i:bpm)(?:\s*-\s*|\s*$)",
    )
    .unwrap_or_else(|e| panic!("invalid prefix pattern: {e}"))
});

/// A clearly delimited `<BPM> BPM` token anywhere in the stem
static STRAY_BPM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[0-9]{1,4}\s*bpm\b")
        .unwrap_or_else(|e| panic!("invalid BPM token pattern: {e}"))
});

/// What the start of a stem already says about key and tempo
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingTags {
    /// A key token is present and written in the target notation
    pub has_correct_key_token: bool,

    /// A `<N> BPM` token is present in the prefix
    pub has_correct_bpm_token: bool,

    /// Key token exactly as written in the stem
    pub existing_key_token: Option<String>,

    /// Parsed key token (either notation)
    pub existing_key: Option<KeyNotation>,

    /// BPM value of the prefix
    pub existing_bpm: Option<u32>,

    /// The stem with the recognized prefix removed (the whole stem if none)
    pub remainder: String,
}

impl ExistingTags {
    /// Whether any prefix was recognized
    pub fn has_prefix(&self) -> bool {
        self.existing_bpm.is_some()
    }
}

/// Inspect the leading position of `stem` for a key/BPM prefix
///
/// `target` decides whether a recognized key token counts as correct.
pub fn parse_existing_tags(stem: &str, target: NotationKind) -> ExistingTags {
    let Some(caps) = PREFIX.captures(stem) else {
        return ExistingTags {
            remainder: stem.to_string(),
            ..ExistingTags::default()
        };
    };

    let existing_bpm = caps.name("bpm").and_then(|m| m.as_str().parse::<u32>().ok());

    let existing_key = match caps.name("key") {
        Some(token) => match parse_key_token(token.as_str()) {
            Ok(notation) => Some((token.as_str().to_string(), notation)),
            Err(e) => {
                // Looked like a key but is not one; leave the stem untouched
                log::debug!("Ignoring prefix of {:?}: {}", stem, e);
                return ExistingTags {
                    remainder: stem.to_string(),
                    ..ExistingTags::default()
                };
            }
        },
        None => None,
    };

    let remainder = stem[caps.get(0).map_or(0, |m| m.end())..].to_string();

    ExistingTags {
        has_correct_key_token: existing_key
            .as_ref()
            .is_some_and(|(_, notation)| notation.kind() == target),
        has_correct_bpm_token: existing_bpm.is_some(),
        existing_key_token: existing_key.as_ref().map(|(token, _)| token.clone()),
        existing_key: existing_key.map(|(_, notation)| notation),
        existing_bpm,
        remainder,
    }
}

/// Byte ranges of `<N> BPM` tokens anywhere in `text`
pub fn find_stray_bpm_tokens(text: &str) -> Vec<Range<usize>> {
    STRAY_BPM.find_iter(text).map(|m| m.range()).collect()
}

/// `text` with every `<N> BPM` token cut out
pub fn remove_stray_bpm_tokens(text: &str) -> String {
    STRAY_BPM.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::Key;

    #[test]
    fn test_classic_prefix_in_classic_target() {
        let tags = parse_existing_tags("Am - 128 BPM - Track", NotationKind::Classic);
        assert!(tags.has_correct_key_token);
        assert!(tags.has_correct_bpm_token);
        assert_eq!(tags.existing_key_token.as_deref(), Some("Am"));
        assert_eq!(tags.existing_key.map(|k| k.key()), Some(Key::Minor(9)));
        assert_eq!(tags.existing_bpm, Some(128));
        assert_eq!(tags.remainder, "Track");
    }

    #[test]
    fn test_classic_prefix_in_camelot_target_is_present_but_wrong() {
        let tags = parse_existing_tags("Cm - 128 BPM - Track", NotationKind::Camelot);
        assert!(!tags.has_correct_key_token);
        assert!(tags.has_correct_bpm_token);
        assert_eq!(tags.existing_key_token.as_deref(), Some("Cm"));
        assert_eq!(tags.remainder, "Track");
    }

    #[test]
    fn test_camelot_prefix() {
        let tags = parse_existing_tags("8A - 124 bpm - Track", NotationKind::Camelot);
        assert!(tags.has_correct_key_token);
        assert_eq!(tags.existing_bpm, Some(124));
        assert_eq!(tags.remainder, "Track");
    }

    #[test]
    fn test_bpm_only_prefix() {
        let tags = parse_existing_tags("128 BPM - Track", NotationKind::Classic);
        assert!(!tags.has_correct_key_token);
        assert!(tags.existing_key.is_none());
        assert!(tags.has_correct_bpm_token);
        assert_eq!(tags.remainder, "Track");
    }

    #[test]
    fn test_prefix_without_title() {
        let tags = parse_existing_tags("F#m - 95 BPM", NotationKind::Classic);
        assert!(tags.has_correct_key_token);
        assert_eq!(tags.remainder, "");
    }

    #[test]
    fn test_key_like_words_are_not_keys() {
        for stem in ["Am I Dreaming", "Be Mine - Remix", "Cmon - Track", "Track in Am"] {
            let tags = parse_existing_tags(stem, NotationKind::Classic);
            assert!(!tags.has_prefix(), "{:?}", stem);
            assert!(tags.existing_key_token.is_none(), "{:?}", stem);
            assert_eq!(tags.remainder, stem);
        }
    }

    #[test]
    fn test_prefix_must_be_leading() {
        let tags = parse_existing_tags("Track - Am - 128 BPM", NotationKind::Classic);
        assert!(!tags.has_prefix());
    }

    #[test]
    fn test_invalid_camelot_number_is_not_a_prefix() {
        let tags = parse_existing_tags("13B - 128 BPM - Track", NotationKind::Camelot);
        assert!(!tags.has_prefix());
        assert_eq!(tags.remainder, "13B - 128 BPM - Track");
    }

    #[test]
    fn test_find_stray_bpm_tokens() {
        let text = "Track (128 BPM Edit) 90bpm";
        let ranges = find_stray_bpm_tokens(text);
        assert_eq!(ranges.len(), 2);
        assert_eq!(&text[ranges[0].clone()], "128 BPM");
        assert_eq!(&text[ranges[1].clone()], "90bpm");
        assert!(find_stray_bpm_tokens("BPMania 12800BPM").is_empty());
    }

    #[test]
    fn test_one_and_four_digit_tempos() {
        let tags = parse_existing_tags("Am - 8 BPM - Track", NotationKind::Classic);
        assert!(tags.has_correct_key_token);
        assert!(tags.has_correct_bpm_token);
        assert_eq!(tags.existing_bpm, Some(8));
        assert_eq!(tags.remainder, "Track");

        let tags = parse_existing_tags("1000 BPM - Track", NotationKind::Classic);
        assert!(tags.has_correct_bpm_token);
        assert_eq!(tags.existing_bpm, Some(1000));
        assert_eq!(tags.remainder, "Track");

        let text = "Track 5 BPM 1000bpm";
        let ranges = find_stray_bpm_tokens(text);
        assert_eq!(ranges.len(), 2);
        assert_eq!(&text[ranges[0].clone()], "5 BPM");
        assert_eq!(&text[ranges[1].clone()], "1000bpm");
    }

    #[test]
    fn test_remove_stray_bpm_tokens() {
        assert_eq!(remove_stray_bpm_tokens("Track 128 BPM Mix"), "Track  Mix");
    }
}
