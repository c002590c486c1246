//! Chroma extraction modules
//!
//! Extract pitch-class distribution (12 semitones) from audio:
//! - Chroma vector computation
//! - Normalization strategies

pub mod extractor;
pub mod normalization;

pub use extractor::{compute_chroma_profile, extract_chroma};

use crate::error::AnalysisError;

/// Number of pitch classes
pub const N_PITCH_CLASSES: usize = 12;

/// Relative energy per pitch class, index 0 = C, index i = i semitones above C
///
/// Values are non-negative and finite. Only their relative size matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromaVector([f32; N_PITCH_CLASSES]);

impl ChromaVector {
    /// Wrap 12 energies
    ///
    /// # Errors
    ///
    /// `AnalysisError::InvalidInput` for negative or non-finite values.
    pub fn new(values: [f32; N_PITCH_CLASSES]) -> Result<Self, AnalysisError> {
        if let Some((i, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(AnalysisError::InvalidInput(format!(
                "Chroma bin {} is {}, expected a finite non-negative energy",
                i, v
            )));
        }
        Ok(Self(values))
    }

    /// Build from a slice that must hold exactly 12 values
    pub fn from_slice(values: &[f32]) -> Result<Self, AnalysisError> {
        let array: [f32; N_PITCH_CLASSES] = values.try_into().map_err(|_| {
            AnalysisError::InvalidInput(format!(
                "Chroma vectors must have 12 elements, got {}",
                values.len()
            ))
        })?;
        Self::new(array)
    }

    /// Energies as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Energies as an array
    pub fn values(&self) -> [f32; N_PITCH_CLASSES] {
        self.0
    }

    /// Pitch class with the most energy
    pub fn dominant_pitch_class(&self) -> usize {
        self.0
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Sum of all energies
    pub fn total_energy(&self) -> f32 {
        self.0.iter().sum()
    }
}

impl std::ops::Index<usize> for ChromaVector {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        assert!(ChromaVector::from_slice(&[0.0; 10]).is_err());
        assert!(ChromaVector::from_slice(&[0.0; 12]).is_ok());
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        let mut values = [0.1f32; 12];
        values[3] = -0.1;
        assert!(ChromaVector::new(values).is_err());
        values[3] = f32::NAN;
        assert!(ChromaVector::new(values).is_err());
    }

    #[test]
    fn test_dominant_pitch_class() {
        let mut values = [0.1f32; 12];
        values[9] = 1.0;
        let chroma = ChromaVector::new(values).unwrap();
        assert_eq!(chroma.dominant_pitch_class(), 9);
        assert_eq!(chroma[9], 1.0);
    }
}
