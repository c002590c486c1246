//! Key detection algorithm
//!
//! Correlates a chroma profile against the 24 key profiles (Pearson correlation) and
//! picks the best match. This is the Krumhansl-Schmuckler key-finding method.
//!
//! # Reference
//!
//! Krumhansl, C. L. (1990). *Cognitive Foundations of Musical Pitch*. Oxford University
//! Press.

use super::key_clarity::compute_key_clarity;
use super::templates::KeyTemplates;
use crate::analysis::result::{DetectedKey, Key};
use crate::error::AnalysisError;
use crate::features::chroma::ChromaVector;

/// Candidates whose correlation is within this distance of the best are tied
///
/// Ties resolve to the major mode, then to the lowest root.
pub const KEY_TIE_EPSILON: f32 = 1e-4;

/// Variance below which a vector is considered flat
const MIN_VARIANCE: f64 = 1e-12;

/// Detect musical key from a chroma profile
///
/// # Arguments
///
/// * `chroma` - Averaged chroma profile of the track
/// * `templates` - Key templates (24 profiles)
///
/// # Returns
///
/// Detected key with its correlation, clarity and all 24 scores ranked.
///
/// # Errors
///
/// Returns `AnalysisError::NumericalError` if the chroma is flat (zero variance), since
/// a correlation is undefined for it.
///
/// # Example
///
/// ```
/// use harmonic_renamer::features::chroma::ChromaVector;
/// use harmonic_renamer::features::key::{detect_key, KeyTemplates};
/// use harmonic_renamer::Key;
///
/// let templates = KeyTemplates::default();
/// let chroma = ChromaVector::new(templates.profile(Key::Minor(9)).weights)?;
/// let detected = detect_key(&chroma, &templates)?;
/// assert_eq!(detected.key, Key::Minor(9));
/// # Ok::<(), harmonic_renamer::AnalysisError>(())
/// ```
pub fn detect_key(
    chroma: &ChromaVector,
    templates: &KeyTemplates,
) -> Result<DetectedKey, AnalysisError> {
    log::debug!("Detecting key from chroma {:?}", chroma.as_slice());

    if variance(chroma.as_slice()) < MIN_VARIANCE {
        return Err(AnalysisError::NumericalError(
            "Chroma profile is flat, key is undefined".to_string(),
        ));
    }

    let scores: Vec<(Key, f32)> = templates
        .iter()
        .map(|profile| {
            (
                profile.key,
                pearson_correlation(chroma.as_slice(), &profile.weights),
            )
        })
        .collect();

    let (key, correlation) = select_best(&scores, KEY_TIE_EPSILON).ok_or_else(|| {
        AnalysisError::NumericalError("No finite key correlation".to_string())
    })?;

    let mut all_scores = scores;
    all_scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let clarity = compute_key_clarity(key, &all_scores);

    log::debug!(
        "Detected key: {} (r={:.4}, clarity={:.4}, runner-up: {:?})",
        key,
        correlation,
        clarity,
        all_scores.iter().find(|(k, _)| *k != key)
    );

    Ok(DetectedKey {
        key,
        correlation,
        clarity,
        all_scores,
    })
}

/// Pick the highest score, resolving near-ties deterministically
///
/// Every candidate within `epsilon` of the maximum is tied. Among tied candidates the
/// major mode wins, then the lowest root. Non-finite scores are ignored.
pub fn select_best(scores: &[(Key, f32)], epsilon: f32) -> Option<(Key, f32)> {
    let max = scores
        .iter()
        .map(|(_, s)| *s)
        .filter(|s| s.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);

    if !max.is_finite() {
        return None;
    }

    scores
        .iter()
        .filter(|(_, s)| s.is_finite() && max - *s <= epsilon)
        .min_by_key(|(k, _)| (k.mode(), k.root()))
        .copied()
}

/// Pearson correlation coefficient of two equally long vectors
///
/// Returns 0.0 when either vector has zero variance.
pub fn pearson_correlation(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let mean_a = a[..n].iter().map(|&x| x as f64).sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().map(|&x| x as f64).sum::<f64>() / n as f64;

    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (&x, &y) in a[..n].iter().zip(&b[..n]) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom < MIN_VARIANCE {
        return 0.0;
    }

    (cov / denom).clamp(-1.0, 1.0) as f32
}

fn variance(values: &[f32]) -> f64 {
    let n = values.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean = values.iter().map(|&x| x as f64).sum::<f64>() / n;
    values.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::Mode;
    use crate::features::key::TemplateSet;
    use approx::assert_relative_eq;

    #[test]
    fn test_every_profile_classifies_as_itself() {
        let templates = KeyTemplates::default();
        for profile in templates.iter() {
            let chroma = ChromaVector::new(profile.weights).unwrap();
            let detected = detect_key(&chroma, &templates).unwrap();

            assert_eq!(detected.key, profile.key);
            assert_relative_eq!(detected.correlation, 1.0, epsilon = 1e-5);
            assert_eq!(detected.all_scores.len(), 24);
            for (key, score) in &detected.all_scores {
                if *key != profile.key {
                    assert!(
                        *score < detected.correlation,
                        "{} scored {} against {} profile",
                        key,
                        score,
                        profile.key
                    );
                }
            }
        }
    }

    #[test]
    fn test_temperley_profiles_classify_as_themselves() {
        let templates = KeyTemplates::new_with_template_set(TemplateSet::Temperley);
        for profile in templates.iter() {
            let chroma = ChromaVector::new(profile.weights).unwrap();
            assert_eq!(detect_key(&chroma, &templates).unwrap().key, profile.key);
        }
    }

    #[test]
    fn test_detect_key_triad() {
        let templates = KeyTemplates::default();

        // C major scale weighted towards the tonic triad
        let mut values = [0.0f32; 12];
        for (pc, w) in [(0, 1.0), (2, 0.4), (4, 0.8), (5, 0.4), (7, 0.9), (9, 0.4), (11, 0.3)] {
            values[pc] = w;
        }
        let chroma = ChromaVector::new(values).unwrap();
        let detected = detect_key(&chroma, &templates).unwrap();

        assert_eq!(detected.key, Key::Major(0));
        assert!(detected.clarity > 0.0);
        assert_eq!(detected.top_keys(3)[0].0, Key::Major(0));
    }

    #[test]
    fn test_flat_chroma_is_an_error() {
        let templates = KeyTemplates::default();
        let chroma = ChromaVector::new([0.5; 12]).unwrap();
        assert!(matches!(
            detect_key(&chroma, &templates),
            Err(AnalysisError::NumericalError(_))
        ));
    }

    #[test]
    fn test_tie_prefers_major() {
        let scores = vec![
            (Key::Minor(9), 0.90005),
            (Key::Major(0), 0.9),
            (Key::Major(7), 0.5),
        ];
        let (key, _) = select_best(&scores, KEY_TIE_EPSILON).unwrap();
        assert_eq!(key, Key::Major(0));
        assert_eq!(key.mode(), Mode::Major);
    }

    #[test]
    fn test_tie_among_majors_prefers_lowest_root() {
        let scores = vec![(Key::Major(7), 0.8), (Key::Major(2), 0.8)];
        assert_eq!(select_best(&scores, KEY_TIE_EPSILON).unwrap().0, Key::Major(2));
    }

    #[test]
    fn test_clear_winner_beats_mode_preference() {
        let scores = vec![(Key::Minor(9), 0.95), (Key::Major(0), 0.9)];
        assert_eq!(select_best(&scores, KEY_TIE_EPSILON).unwrap().0, Key::Minor(9));
    }

    #[test]
    fn test_select_best_ignores_nan() {
        let scores = vec![(Key::Major(0), f32::NAN), (Key::Minor(0), 0.2)];
        assert_eq!(select_best(&scores, KEY_TIE_EPSILON).unwrap().0, Key::Minor(0));
        assert!(select_best(&[(Key::Major(0), f32::NAN)], KEY_TIE_EPSILON).is_none());
    }

    #[test]
    fn test_pearson_correlation() {
        let a = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(pearson_correlation(&a, &a), 1.0, epsilon = 1e-6);
        let b = [4.0, 3.0, 2.0, 1.0];
        assert_relative_eq!(pearson_correlation(&a, &b), -1.0, epsilon = 1e-6);
        assert_eq!(pearson_correlation(&a, &[1.0; 4]), 0.0);
    }
}
