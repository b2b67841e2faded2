//! Normalization and merging on deterministic signals
//!
//! A pure phasor with identical channels has an exactly known correlation,
//! `cos(ω·τ)`, under every normalization mode. These tests drive it through
//! the whole stack: accumulate, finalize, normalize, merge.
//!
//! Run with:
//! ```bash
//! cargo test -p multitau --test normalization_tests
//! ```

#[path = "helpers/mod.rs"]
mod helpers;

use approx::assert_abs_diff_eq;
use helpers::tolerances::*;
use helpers::{accumulate, bits, config, phasor_pairs, pipeline, PHASOR_OMEGA};
use multitau::prelude::*;
use multitau::{multi_count, normalize_multi, VariancePolicy};

// =============================================================================
// Exact curves
// =============================================================================

/// Every mode reproduces the phasor correlation on every merged lag.
#[test]
fn test_phasor_curve_in_all_modes() {
    let pairs = phasor_pairs(2, 3, 32);
    for mode in 0..8u8 {
        let output = pipeline(config((2, 3), 16, BinningMode::Decimate), mode)
            .run(pairs.clone())
            .unwrap();
        let merged = &output.merged;
        assert_eq!(merged.shape(), (2, 3));

        for pixel in 0..merged.pixels() {
            let curve = merged.curve(pixel);
            for (&lag, &value) in merged.lags().iter().zip(curve) {
                if value.is_nan() {
                    continue;
                }
                assert_abs_diff_eq!(value, (PHASOR_OMEGA * lag).cos(), epsilon = FLOAT_EPSILON);
            }
            // the fast part is always populated
            assert!(curve[..16].iter().all(|v| v.is_finite()), "mode {} pixel {}", mode, pixel);
        }
    }
}

/// The difference estimator gives the same phasor correlation, scaled or
/// not, since the phasor has unit variance.
#[test]
fn test_phasor_difference_estimate_in_all_modes() {
    let pairs = phasor_pairs(2, 3, 32);
    for mode in NormMode::all() {
        for scale in [true, false] {
            let output = Pipeline::builder()
                .accumulator(config((2, 3), 16, BinningMode::Decimate))
                .mode(mode)
                .scale(scale)
                .estimator(Estimator::Difference)
                .build()
                .unwrap()
                .run(pairs.clone())
                .unwrap();
            let merged = &output.merged;
            for pixel in 0..merged.pixels() {
                let curve = merged.curve(pixel);
                for (&lag, &value) in merged.lags().iter().zip(curve) {
                    if value.is_nan() {
                        continue;
                    }
                    assert_abs_diff_eq!(value, (PHASOR_OMEGA * lag).cos(), epsilon = FLOAT_EPSILON);
                }
                assert!(curve[..16].iter().all(|v| v.is_finite()), "{} scale {}", mode, scale);
            }
        }
    }
}

/// Slow levels extend the lag axis logarithmically past the fast part.
#[test]
fn test_merged_axis_is_increasing_and_log_spaced() {
    let output = pipeline(config((1, 1), 8, BinningMode::Decimate), 3)
        .run(phasor_pairs(1, 1, 64))
        .unwrap();
    let lags = output.merged.lags();

    assert!(lags.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(&lags[..8], &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    // 512 frames: the last level reaches lags of hundreds of ticks
    assert!(*lags.last().unwrap() >= 256.0);
    assert!(lags.len() < 64);
}

/// Normalizing the same snapshot twice gives bit-identical results.
#[test]
fn test_normalization_is_deterministic() {
    let snapshot = accumulate(config((2, 2), 8, BinningMode::Average), &phasor_pairs(2, 2, 16)).finalize();
    for mode in NormMode::all() {
        let options = NormalizeOptions::default().with_mode(mode);
        let a = normalize_multi(&snapshot, &options).unwrap().merge().unwrap();
        let b = normalize_multi(&snapshot, &options).unwrap().merge().unwrap();
        assert_eq!(bits(a.values()), bits(b.values()), "{}", mode);
        assert_eq!(a.lags(), b.lags());
    }
}

// =============================================================================
// Degenerate data
// =============================================================================

/// Constant frames have zero variance: NaN by default, an error on request.
#[test]
fn test_constant_frames_are_degenerate() {
    let pairs: Vec<FramePair> = (0..32)
        .map(|t| FramePair::same(Frame::from_fn(1, 2, |_, _| Complex64::new(3.0, 0.0)), t))
        .collect();
    let snapshot = accumulate(config((1, 2), 4, BinningMode::Average), &pairs).finalize();

    let nan = normalize_multi(&snapshot, &NormalizeOptions::default()).unwrap();
    assert!(nan.fast.values().iter().all(|v| v.is_nan()));

    let fail = NormalizeOptions::default().with_policy(VariancePolicy::Fail);
    assert!(matches!(
        normalize_multi(&snapshot, &fail),
        Err(multitau::core::Error::DegenerateVariance { .. })
    ));

    // without scaling the background-subtracted covariance is zero
    let unscaled = NormalizeOptions::default().scaled(false);
    let merged = normalize_multi(&snapshot, &unscaled).unwrap().merge().unwrap();
    assert!(merged.curve(0)[..4].iter().all(|&v| v.abs() < FLOAT_EPSILON));
}

// =============================================================================
// Counts
// =============================================================================

/// Counts line up with the merged data. The analytic fast count is the
/// number of independent pairs; the table sees both orderings of a pair.
#[test]
fn test_counts_match_merged_axis() {
    let cfg = config((1, 1), 8, BinningMode::Decimate);
    let snapshot = accumulate(cfg.clone(), &phasor_pairs(1, 1, 16)).finalize();
    let merged = normalize_multi(&snapshot, &NormalizeOptions::default()).unwrap().merge().unwrap();
    let counts = multi_count(snapshot.frames, cfg.period, cfg.level_size, cfg.binning, cfg.max_levels).merge();

    assert_eq!(counts.lags, merged.lags());
    assert_eq!(counts.counts[0], snapshot.fast.count(0));
    for lag in 1..8 {
        assert_eq!(counts.counts[lag], 128 - lag as u64);
        assert_eq!(snapshot.fast.count(lag), 2 * counts.counts[lag]);
    }
}

/// Averaging counts every binned pair once per frame it stands for.
#[test]
fn test_average_counts_exceed_decimate_counts() {
    let decimate = multi_count(1024, 1, 8, BinningMode::Decimate, None).merge();
    let average = multi_count(1024, 1, 8, BinningMode::Average, None).merge();
    assert_eq!(decimate.lags, average.lags);
    assert_eq!(&decimate.counts[..8], &average.counts[..8]);
    for (d, a) in decimate.counts.iter().zip(&average.counts).skip(8) {
        assert!(a >= d);
    }
}
