//! Acquisition timestamps.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random dual-camera triggering.
///
/// In period `k` one camera fires at `k·period`, the other at
/// `k·period + r` with `r` uniform in `[0, period)`; which camera is
/// delayed is chosen at random. Within every period the two channels
/// therefore sample all lags below `period`.
pub fn random_times(count: usize, period: u64, seed: u64) -> (Vec<i64>, Vec<i64>) {
    let period = period.max(1) as i64;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut t1 = Vec::with_capacity(count);
    let mut t2 = Vec::with_capacity(count);
    for k in 0..count as i64 {
        let base = k * period;
        let delayed = base + rng.gen_range(0..period);
        if rng.gen_bool(0.5) {
            t1.push(base);
            t2.push(delayed);
        } else {
            t1.push(delayed);
            t2.push(base);
        }
    }
    (t1, t2)
}

/// Both cameras fire together at every multiple of `period`.
pub fn regular_times(count: usize, period: u64) -> (Vec<i64>, Vec<i64>) {
    let period = period.max(1) as i64;
    let t: Vec<i64> = (0..count as i64).map(|k| k * period).collect();
    (t.clone(), t)
}
