//! Audio preprocessing modules
//!
//! This module contains utilities for preparing audio for analysis:
//! - Channel mixing (multichannel to mono)
//! - Normalization (peak, RMS)
//! - Silence detection and trimming

pub mod channel_mixer;
pub mod normalization;
pub mod silence;
