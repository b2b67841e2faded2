//! Tolerance constants for correlation testing.
//!
//! Exact inputs (pure phasors, identical channels) only pick up rounding
//! error. Simulated data carries statistical error that shrinks with the
//! number of frames and trials.

/// Floating point rounding errors on analytically exact inputs.
pub const FLOAT_EPSILON: f64 = 1e-9;

/// Zero-lag value of noiseless simulated data.
/// Only a subset of pairs lands on lag 0, so this is statistical too.
pub const ZERO_LAG_EPSILON: f64 = 0.1;

/// Deviation of a trial-averaged simulated curve from the model.
pub const MODEL_EPSILON: f64 = 0.15;
