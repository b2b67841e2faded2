//! Simulated dual-camera Brownian motion against its analytic model
//!
//! Randomly triggered cameras sample lags below the trigger period, the
//! fast correlator resolves them and the slow levels carry the curve out
//! to long lags. Averaged over trials, every merged curve must follow
//! `exp(-D·k²·τ)`.
//!
//! Run with:
//! ```bash
//! cargo test -p multitau --test brownian_tests --release
//! ```

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::tolerances::*;
use multitau::prelude::*;
use multitau::{error_curves, TrialSet};

const PERIOD: u64 = 4;
const PAIRS: usize = 1024;
const TRIALS: usize = 8;
/// Row of the cropped frame; a single column, so also the pixel index.
const KI: usize = 2;

fn video() -> BrownianConfig {
    BrownianConfig::default()
        .shape(32, 32)
        .particles(50)
        .diffusion(0.2)
        .crop(4, 0)
}

fn modes() -> Vec<NormMode> {
    [2u8, 3, 6].iter().map(|&m| NormMode::try_from(m).unwrap()).collect()
}

fn run(binning: BinningMode) -> TrialSet {
    let (t1, t2) = random_times(PAIRS, PERIOD, 11);
    let factory = BrownianFactory::new(video(), t1, t2).unwrap();
    let config = AccumulatorConfig::builder()
        .shape(9, 1)
        .period(PERIOD)
        .level_size(16)
        .binning(binning)
        .build()
        .unwrap();
    Pipeline::builder()
        .accumulator(config)
        .threads(4)
        .build()
        .unwrap()
        .run_trials(&factory, TRIALS, &modes())
        .unwrap()
}

fn model(set: &TrialSet) -> Vec<f64> {
    let config = video();
    set.lags().iter().map(|&lag| config.model(KI as i64, 0, lag)).collect()
}

fn check_tracks_model(set: &TrialSet) {
    let model = model(set);
    // the curve has decayed to noise after four correlation times
    let horizon = 4.0 / video().decay_rate(KI as i64, 0);

    for mode in modes() {
        let mean = set.mean(KI, mode).unwrap();
        let deviation = set.mean_deviation(KI, mode, &model).unwrap();
        let mut checked = 0;
        for ((&lag, &m), &d) in set.lags().iter().zip(&mean).zip(&deviation) {
            if lag > horizon || m.is_nan() {
                continue;
            }
            assert!(
                d < MODEL_EPSILON,
                "{}: lag {} mean {} model {}",
                mode,
                lag,
                m,
                (-video().decay_rate(KI as i64, 0) * lag).exp()
            );
            checked += 1;
        }
        // fast lags plus at least one slow level
        assert!(checked > 64, "{}: only {} lags checked", mode, checked);
    }
}

#[test]
fn test_decimated_levels_track_model() {
    let set = run(BinningMode::Decimate);
    assert_eq!(set.trials(), TRIALS);
    assert_eq!(set.shape(), (9, 1));
    check_tracks_model(&set);
}

#[test]
fn test_averaged_levels_track_model() {
    check_tracks_model(&run(BinningMode::Average));
}

/// Noiseless cameras firing together see the same image, so the zero-lag
/// value is one up to the difference of the two channel backgrounds.
#[test]
fn test_zero_lag_is_one() {
    let set = run(BinningMode::Average);
    let compensated = NormMode::try_from(3).unwrap();
    for trial in 0..TRIALS {
        let curve = set.merged(trial, compensated).unwrap().curve(KI);
        assert!((curve[0] - 1.0).abs() < ZERO_LAG_EPSILON, "trial {}: {}", trial, curve[0]);
    }
    let mean = set.mean(KI, NormMode::try_from(2).unwrap()).unwrap();
    assert!((mean[0] - 1.0).abs() < ZERO_LAG_EPSILON);
}

/// Scatter between trials is of the order the counting model predicts
/// for the independent samples of each trial.
#[test]
fn test_trial_scatter_is_bounded() {
    let set = run(BinningMode::Decimate);
    let model = model(&set);
    let mode = NormMode::try_from(3).unwrap();
    let rms = set.rms_deviation(KI, mode, &model).unwrap();
    let (corr, _) = error_curves(&model, &set.counts().counts);

    // one correlation time holds this many frame pairs
    let per_time = (1.0 / video().decay_rate(KI as i64, 0) / PERIOD as f64).ceil();
    for (lag, (r, e)) in rms.iter().zip(&corr).enumerate().take(64) {
        assert!(*r < 4.0 * e * per_time.sqrt() + 0.05, "lag {}: rms {} error {}", lag, r, e);
    }
}

/// Averaging trials pulls the curve towards the model.
#[test]
fn test_trial_average_beats_single_trial() {
    let set = run(BinningMode::Decimate);
    let model = model(&set);
    let mode = NormMode::try_from(3).unwrap();
    let horizon = 4.0 / video().decay_rate(KI as i64, 0);

    let single = set.merged(0, mode).unwrap().curve(KI).to_vec();
    let average = set.mean(KI, mode).unwrap();
    let mean_abs = |curve: &[f64]| {
        let within: Vec<f64> = set
            .lags()
            .iter()
            .zip(curve)
            .zip(&model)
            .filter(|((lag, v), _)| **lag <= horizon && v.is_finite())
            .map(|((_, v), g)| (v - g).abs())
            .collect();
        within.iter().sum::<f64>() / within.len() as f64
    };
    assert!(mean_abs(&average) < mean_abs(&single));
}
