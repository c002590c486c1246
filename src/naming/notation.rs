//! Key notation: Classic letter names and Camelot wheel codes
//!
//! Camelot codes number keys around the circle of fifths: roots a fifth apart get
//! adjacent numbers, with `A` for minor and `B` for major. A minor key carries the
//! number of the major key on the same root (`C` = 8B, `Cm` = 8A, `Am` = 11A), the
//! assignment existing libraries were tagged with. The two tables below are the only
//! place the assignment lives; every conversion goes through them.

use serde::{Deserialize, Serialize};

use crate::analysis::result::{Key, Mode};
use crate::error::NotationParseError;

/// Camelot number per major root (0 = C, 1 = C#, ...)
///
/// C=8, G=9, D=10, A=11, E=12, B=1, F#=2, Db=3, Ab=4, Eb=5, Bb=6, F=7
const CAMELOT_MAJOR: [u8; 12] = [8, 3, 10, 5, 12, 7, 2, 9, 4, 11, 6, 1];

/// Camelot number per minor root, shared with the major key on the same root
///
/// Cm=8, Gm=9, Dm=10, Am=11, Em=12, Bm=1, F#m=2, C#m=3, G#m=4, D#m=5, A#m=6, Fm=7
const CAMELOT_MINOR: [u8; 12] = CAMELOT_MAJOR;

/// Which notation filenames are written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotationKind {
    /// Letter names: `C`, `F#`, `Am`, `D#m`
    #[default]
    Classic,
    /// Camelot wheel codes: `8B`, `2B`, `8A`, `2A`
    Camelot,
}

/// A position on the Camelot wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CamelotCode {
    number: u8,
    mode: Mode,
}

impl CamelotCode {
    /// `number` must be in `1..=12`
    pub fn new(number: u8, mode: Mode) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self { number, mode })
    }

    /// Wheel number, 1-12
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Mode the letter encodes
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// `A` for minor, `B` for major
    pub fn letter(&self) -> char {
        match self.mode {
            Mode::Minor => 'A',
            Mode::Major => 'B',
        }
    }
}

impl std::fmt::Display for CamelotCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.number, self.letter())
    }
}

/// A key as written in one of the two notations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyNotation {
    /// Letter name
    Classic(Key),
    /// Wheel code
    Camelot(CamelotCode),
}

impl KeyNotation {
    /// Render `key` in `kind`
    pub fn of(key: Key, kind: NotationKind) -> Self {
        match kind {
            NotationKind::Classic => KeyNotation::Classic(key),
            NotationKind::Camelot => KeyNotation::Camelot(to_camelot(key)),
        }
    }

    /// Underlying key
    pub fn key(&self) -> Key {
        match self {
            KeyNotation::Classic(key) => *key,
            KeyNotation::Camelot(code) => from_camelot(*code),
        }
    }

    /// Which notation this is written in
    pub fn kind(&self) -> NotationKind {
        match self {
            KeyNotation::Classic(_) => NotationKind::Classic,
            KeyNotation::Camelot(_) => NotationKind::Camelot,
        }
    }
}

impl std::fmt::Display for KeyNotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyNotation::Classic(key) => write!(f, "{}", key.name()),
            KeyNotation::Camelot(code) => write!(f, "{}", code),
        }
    }
}

/// Camelot code of a key
pub fn to_camelot(key: Key) -> CamelotCode {
    let root = key.root() as usize;
    let number = match key.mode() {
        Mode::Major => CAMELOT_MAJOR[root],
        Mode::Minor => CAMELOT_MINOR[root],
    };
    CamelotCode {
        number,
        mode: key.mode(),
    }
}

/// Key at a Camelot position
pub fn from_camelot(code: CamelotCode) -> Key {
    let table = match code.mode {
        Mode::Major => &CAMELOT_MAJOR,
        Mode::Minor => &CAMELOT_MINOR,
    };
    // Both tables are permutations of 1..=12, so the position always exists
    let root = table
        .iter()
        .position(|&n| n == code.number)
        .unwrap_or_default();
    Key::new(root as u32, code.mode)
}

/// Key text in the requested notation (`"Am"` or `"8A"`)
pub fn render(key: Key, kind: NotationKind) -> String {
    KeyNotation::of(key, kind).to_string()
}

/// Parse a Classic key name
///
/// Accepts a letter `A`-`G` (either case), an optional `#` or `b`, and an optional
/// trailing `m` for minor: `C`, `F#`, `Db`, `Am`, `C#m`, `Ebm`.
///
/// # Errors
///
/// `NotationParseError` for anything else.
pub fn parse_classic(token: &str) -> Result<Key, NotationParseError> {
    let mut chars = token.chars().peekable();

    let base_root: u32 = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(NotationParseError::new(token)),
    };

    let root = match chars.peek() {
        Some('#') => {
            chars.next();
            (base_root + 1) % 12
        }
        Some('b') => {
            chars.next();
            (base_root + 11) % 12
        }
        _ => base_root,
    };

    let mode = match chars.next() {
        None => Mode::Major,
        Some('m') => Mode::Minor,
        Some(_) => return Err(NotationParseError::new(token)),
    };

    if chars.next().is_some() {
        return Err(NotationParseError::new(token));
    }

    Ok(Key::new(root, mode))
}

/// Parse a Camelot code, `1A` to `12B` (letter case-insensitive)
///
/// # Errors
///
/// `NotationParseError` for anything else.
pub fn parse_camelot(token: &str) -> Result<CamelotCode, NotationParseError> {
    let split = token
        .char_indices()
        .last()
        .map(|(i, _)| i)
        .ok_or_else(|| NotationParseError::new(token))?;
    let (digits, letter) = token.split_at(split);

    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(NotationParseError::new(token));
    }

    let mode = match letter {
        "A" | "a" => Mode::Minor,
        "B" | "b" => Mode::Major,
        _ => return Err(NotationParseError::new(token)),
    };

    digits
        .parse::<u8>()
        .ok()
        .and_then(|number| CamelotCode::new(number, mode))
        .ok_or_else(|| NotationParseError::new(token))
}

/// Parse a key token written in either notation
///
/// # Errors
///
/// `NotationParseError` when the token is neither a Camelot code nor a Classic name.
pub fn parse_key_token(token: &str) -> Result<KeyNotation, NotationParseError> {
    let token = token.trim();
    if token.starts_with(|c: char| c.is_ascii_digit()) {
        parse_camelot(token).map(KeyNotation::Camelot)
    } else {
        parse_classic(token).map(KeyNotation::Classic)
    }
}
