//! Test helpers and fixtures for multitau integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-9): Analytically exact inputs
//! - `ZERO_LAG_EPSILON` (0.1): Zero lag of noiseless simulations
//! - `MODEL_EPSILON` (0.15): Trial-averaged simulations against the model

#![allow(dead_code)]

pub mod tolerances;

use multitau::prelude::*;
use std::f64::consts::PI;

/// Angular frequency of [`phasor_pairs`]: one turn every 8 ticks.
pub const PHASOR_OMEGA: f64 = 2.0 * PI / 8.0;

/// Pure phasor `exp(i·ω·t)` on every pixel, both channels identical,
/// one pair per tick. Whole turns only, so the background is zero and
/// the variance is one.
pub fn phasor_pairs(rows: usize, cols: usize, turns: usize) -> Vec<FramePair> {
    (0..(8 * turns) as i64)
        .map(|t| {
            let frame = Frame::from_fn(rows, cols, |_, _| Complex64::from_polar(1.0, PHASOR_OMEGA * t as f64));
            FramePair::same(frame, t)
        })
        .collect()
}

/// Accumulator configuration with the given shape, level size and binning.
pub fn config(shape: (usize, usize), level_size: usize, binning: BinningMode) -> AccumulatorConfig {
    AccumulatorConfig::builder()
        .shape(shape.0, shape.1)
        .level_size(level_size)
        .binning(binning)
        .build()
        .expect("Failed to create accumulator config")
}

/// Pipeline over `config` normalizing with `mode`.
pub fn pipeline(config: AccumulatorConfig, mode: u8) -> Pipeline {
    Pipeline::builder()
        .accumulator(config)
        .mode(NormMode::try_from(mode).expect("Invalid mode"))
        .build()
        .expect("Failed to create pipeline")
}

/// Feed `pairs` into a fresh accumulator without finalizing.
pub fn accumulate(config: AccumulatorConfig, pairs: &[FramePair]) -> MultiTauAccumulator {
    let mut acc = MultiTauAccumulator::new(config).expect("Failed to create accumulator");
    for pair in pairs {
        acc.update(pair).expect("Update failed");
    }
    acc
}

/// Bit patterns of a float slice, so NaN compares equal to NaN.
pub fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}
