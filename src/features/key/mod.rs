//! Key detection modules
//!
//! Detect musical key using:
//! - Krumhansl-Kessler (or Temperley) templates (24 keys)
//! - Pearson correlation template matching with a major-preferring tie-break
//! - Key clarity scoring

pub mod detector;
pub mod key_clarity;
pub mod templates;

pub use detector::{detect_key, pearson_correlation, select_best, KEY_TIE_EPSILON};
pub use key_clarity::compute_key_clarity;
pub use templates::{KeyProfile, KeyTemplates, TemplateSet};
