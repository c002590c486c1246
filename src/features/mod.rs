//! Feature extraction modules
//!
//! This module contains the signal-level algorithms:
//! - Chroma extraction (pitch-class profiles)
//! - Key detection (template correlation)
//! - Onset detection (energy flux envelope)
//! - Period estimation (BPM detection)

pub mod chroma;
pub mod key;
pub mod onset;
pub mod period;
