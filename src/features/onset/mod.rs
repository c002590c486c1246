//! Onset detection
//!
//! Energy flux onset envelope and peak picking. The envelope drives tempo estimation;
//! the picked onsets tell whether a track has any rhythmic content at all.

pub mod energy_flux;

pub use energy_flux::{detect_energy_flux_onsets, energy_flux_envelope, pick_onsets};
