//! Key clarity scoring
//!
//! Estimates how clearly one key stands out from the rest.

use crate::analysis::result::Key;

/// Compute key clarity from key scores
///
/// # Arguments
///
/// * `winner` - Key chosen by the detector
/// * `scores` - All 24 key scores
///
/// # Returns
///
/// Correlation gap between the winner and the best other key, clamped to `0.0..=2.0`.
/// Near zero means the track sits between two keys (often relative major/minor).
pub fn compute_key_clarity(winner: Key, scores: &[(Key, f32)]) -> f32 {
    let winner_score = scores
        .iter()
        .find(|(k, _)| *k == winner)
        .map(|(_, s)| *s);
    let runner_up = scores
        .iter()
        .filter(|(k, _)| *k != winner)
        .map(|(_, s)| *s)
        .fold(f32::NEG_INFINITY, f32::max);

    match winner_score {
        Some(w) if runner_up.is_finite() => (w - runner_up).clamp(0.0, 2.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clarity_gap() {
        let scores = vec![(Key::Major(0), 0.9), (Key::Minor(9), 0.7), (Key::Major(7), 0.2)];
        let clarity = compute_key_clarity(Key::Major(0), &scores);
        assert!((clarity - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_clarity_tied_winner_is_zero() {
        let scores = vec![(Key::Minor(9), 0.90005), (Key::Major(0), 0.9)];
        assert_eq!(compute_key_clarity(Key::Major(0), &scores), 0.0);
    }

    #[test]
    fn test_clarity_single_score() {
        assert_eq!(compute_key_clarity(Key::Major(0), &[(Key::Major(0), 1.0)]), 0.0);
    }
}
