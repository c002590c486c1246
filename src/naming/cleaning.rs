//! Text cleaning for filename stems
//!
//! User removal terms and replacements are literal, never patterns. After each
//! step the stem is tidied so removed text leaves no double spaces, empty brackets
//! or dangling separators behind.

use std::sync::LazyLock;

use regex::{NoExpand, Regex, RegexBuilder};

/// Characters most filesystems reject in a file name
const INVALID_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static EMPTY_BRACKETS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*\)|\[\s*\]|\{\s*\}")
        .unwrap_or_else(|e| panic!("invalid bracket pattern: {e}"))
});

static REPEATED_DASHES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*-(?:\s*-)+\s*").unwrap_or_else(|e| panic!("invalid dash pattern: {e}"))
});

static PADDED_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([(\[{])\s+").unwrap_or_else(|e| panic!("invalid bracket pattern: {e}"))
});

static PADDED_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+([)\]}])").unwrap_or_else(|e| panic!("invalid bracket pattern: {e}"))
});

/// Remove each term from `text`, in order
///
/// Terms are literal substrings. With `case_insensitive`, `"official video"` also
/// removes `"Official Video"`. Empty terms are skipped.
pub fn remove_terms(text: &str, terms: &[String], case_insensitive: bool) -> String {
    let mut out = text.to_string();

    for term in terms.iter().filter(|t| !t.is_empty()) {
        out = if case_insensitive {
            match RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
            {
                Ok(re) => re.replace_all(&out, "").into_owned(),
                Err(e) => {
                    log::warn!("Falling back to exact match for {:?}: {}", term, e);
                    out.replace(term.as_str(), "")
                }
            }
        } else {
            out.replace(term.as_str(), "")
        };
    }

    out
}

/// Apply `(old, new)` substitutions in order
///
/// Pairs with an empty `old` are skipped.
pub fn apply_replacements(text: &str, replacements: &[(String, String)]) -> String {
    replacements
        .iter()
        .filter(|(old, _)| !old.is_empty())
        .fold(text.to_string(), |acc, (old, new)| acc.replace(old.as_str(), new))
}

/// Replace filesystem-invalid characters and control characters with `-`
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// Tidy a stem after text was cut out of it
///
/// Drops emptied `()`, `[]` and `{}`, pulls bracket contents tight, collapses
/// whitespace and repeated ` - ` separators, and trims whitespace and `-` from
/// both ends.
pub fn normalize_separators(text: &str) -> String {
    let mut out = collapse_whitespace(text);

    // Nested empties like "[()]" need more than one pass
    loop {
        let next = EMPTY_BRACKETS.replace_all(&out, "").into_owned();
        if next == out {
            break;
        }
        out = next;
    }

    out = PADDED_OPEN.replace_all(&out, "$1").into_owned();
    out = PADDED_CLOSE.replace_all(&out, "$1").into_owned();
    out = REPEATED_DASHES.replace_all(&out, NoExpand(" - ")).into_owned();
    out = collapse_whitespace(&out);

    out.trim_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_remove_terms_leaves_no_debris() {
        let removed = remove_terms(
            "Track (Official Video) [HD]",
            &terms(&["Official Video", "[HD]"]),
            false,
        );
        assert_eq!(normalize_separators(&removed), "Track");
    }

    #[test]
    fn test_remove_terms_in_order() {
        // "ab" disappears first, so "bc" no longer matches
        assert_eq!(remove_terms("abc", &terms(&["ab", "bc"]), false), "c");
        assert_eq!(remove_terms("abc", &terms(&["bc", "ab"]), false), "a");
    }

    #[test]
    fn test_remove_terms_is_case_sensitive_by_default() {
        let list = terms(&["official video"]);
        assert_eq!(
            remove_terms("Track Official Video", &list, false),
            "Track Official Video"
        );
        assert_eq!(
            normalize_separators(&remove_terms("Track Official Video", &list, true)),
            "Track"
        );
    }

    #[test]
    fn test_remove_terms_is_literal() {
        assert_eq!(remove_terms("Track (.*)", &terms(&[".*"]), true), "Track ()");
        assert_eq!(remove_terms("a.b", &terms(&["."]), false), "ab");
    }

    #[test]
    fn test_apply_replacements() {
        let pairs = vec![("_".to_string(), " ".to_string())];
        assert_eq!(apply_replacements("My_Song", &pairs), "My Song");

        let chained = vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string()),
        ];
        assert_eq!(apply_replacements("a", &chained), "c");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("AC/DC: Back?"), "AC-DC- Back-");
        assert_eq!(sanitize("Plain Name"), "Plain Name");
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize_separators("  Artist -  - Title  "), "Artist - Title");
        assert_eq!(normalize_separators("- Title -"), "Title");
        assert_eq!(normalize_separators("Track ( Extended Mix )"), "Track (Extended Mix)");
        assert_eq!(normalize_separators("Track [()] Mix"), "Track Mix");
        assert_eq!(normalize_separators("Jay-Z - Song"), "Jay-Z - Song");
    }
}
