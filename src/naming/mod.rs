//! File naming
//!
//! Everything between a detected key/tempo and the final file name:
//! - Key notation (Classic ⇄ Camelot)
//! - Detection of an existing `"<Key> - <BPM> BPM - "` prefix
//! - Stem cleaning (removal terms, replacements, sanitizing)
//! - Rename planning

pub mod cleaning;
pub mod filename_parser;
pub mod notation;
pub mod planner;

pub use filename_parser::{parse_existing_tags, ExistingTags};
pub use notation::{
    from_camelot, parse_camelot, parse_classic, parse_key_token, render, to_camelot, CamelotCode,
    KeyNotation, NotationKind,
};
pub use planner::{plan_rename, round_bpm, RenamePlan};
