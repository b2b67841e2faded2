//! Error estimates for normalized correlation data.
//!
//! Both formulas assume `count` independent samples of a process whose
//! normalized correlation is `g`.

/// Standard error of the correlation estimate: `sqrt((1 + g²) / (2n))`.
pub fn corr_error(g: f64, count: u64) -> f64 {
    if count == 0 {
        return f64::INFINITY;
    }
    ((1.0 + g * g) / (2.0 * count as f64)).sqrt()
}

/// Standard error of the structure-function estimate: `sqrt((1 - g)² / n)`.
pub fn diff_error(g: f64, count: u64) -> f64 {
    if count == 0 {
        return f64::INFINITY;
    }
    ((1.0 - g) * (1.0 - g) / count as f64).sqrt()
}

/// Inverse-variance combination of [`corr_error`] and [`diff_error`].
pub fn weighted_error(g: f64, count: u64) -> f64 {
    if count == 0 {
        return f64::INFINITY;
    }
    let a = corr_error(g, count);
    let b = diff_error(g, count);
    if a == 0.0 || b == 0.0 {
        return 0.0;
    }
    (1.0 / (1.0 / (a * a) + 1.0 / (b * b))).sqrt()
}

/// Model errors along a merged axis: `(corr_error, diff_error)` per lag.
pub fn error_curves(model: &[f64], counts: &[u64]) -> (Vec<f64>, Vec<f64>) {
    model
        .iter()
        .zip(counts)
        .map(|(&g, &n)| (corr_error(g, n), diff_error(g, n)))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_values() {
        assert_relative_eq!(corr_error(1.0, 100), 0.1);
        assert_relative_eq!(corr_error(0.0, 50), 0.1);
        assert_relative_eq!(diff_error(0.0, 100), 0.1);
        assert_eq!(diff_error(1.0, 100), 0.0);
    }

    #[test]
    fn test_zero_count_is_infinite() {
        assert!(corr_error(0.5, 0).is_infinite());
        assert!(diff_error(0.5, 0).is_infinite());
        assert!(weighted_error(0.5, 0).is_infinite());
    }

    #[test]
    fn test_weighted_is_below_both() {
        for g in [0.1, 0.5, 0.9] {
            let w = weighted_error(g, 100);
            assert!(w <= corr_error(g, 100));
            assert!(w <= diff_error(g, 100));
        }
        assert_eq!(weighted_error(1.0, 10), 0.0);
    }

    #[test]
    fn test_error_curves() {
        let (e1, e2) = error_curves(&[1.0, 0.0], &[100, 0]);
        assert_relative_eq!(e1[0], 0.1);
        assert_eq!(e2[0], 0.0);
        assert!(e1[1].is_infinite());
    }
}
