//! Chroma normalization strategies

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// L2-normalize a chroma vector in place
///
/// Returns false (and leaves the vector untouched) when its norm is ~0.
pub fn l2_normalize(chroma: &mut [f32]) -> bool {
    let norm = chroma.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm <= EPSILON {
        return false;
    }
    for x in chroma.iter_mut() {
        *x /= norm;
    }
    true
}

/// Sharpen chroma vector to emphasize prominent semitones
///
/// # Arguments
///
/// * `chroma` - 12-element chroma vector
/// * `power` - Sharpening power (e.g., 1.5 or 2.0); 1.0 is a no-op
///
/// # Returns
///
/// Sharpened chroma vector (L2 normalized)
pub fn sharpen_chroma(chroma: &[f32], power: f32) -> Vec<f32> {
    if (power - 1.0).abs() <= f32::EPSILON {
        return chroma.to_vec();
    }

    log::debug!("Sharpening chroma with power {}", power);

    let mut sharpened: Vec<f32> = chroma.iter().map(|&x| x.max(0.0).powf(power)).collect();
    l2_normalize(&mut sharpened);
    sharpened
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        assert!(l2_normalize(&mut v));
        assert_relative_eq!(v[0], 0.6);
        assert_relative_eq!(v[1], 0.8);
    }

    #[test]
    fn test_l2_normalize_zero() {
        let mut v = vec![0.0; 12];
        assert!(!l2_normalize(&mut v));
    }

    #[test]
    fn test_sharpen_emphasizes_peak() {
        let chroma = vec![1.0, 0.5, 0.25];
        let sharpened = sharpen_chroma(&chroma, 2.0);
        assert!(sharpened[0] / sharpened[1] > chroma[0] / chroma[1]);
    }

    #[test]
    fn test_sharpen_identity() {
        let chroma = vec![1.0, 0.5, 0.25];
        assert_eq!(sharpen_chroma(&chroma, 1.0), chroma);
    }
}
