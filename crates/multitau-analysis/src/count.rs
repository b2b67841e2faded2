//! Analytic effective counts of a multi-tau run.
//!
//! Used for error estimates without running the accumulator: for a stream
//! of `frames` pairs, one per `period` ticks, how many independent pairs
//! contribute to each lag.

use crate::merge::LagCounts;
use multitau_core::{expected_level_count, BinningMode};

/// Effective counts of the fast part and of every slow level.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MultiCount {
    pub fast: LagCounts,
    pub slow: Vec<LagCounts>,
}

impl MultiCount {
    /// [`log_merge_count`](crate::log_merge_count) of these counts.
    pub fn merge(&self) -> LagCounts {
        crate::merge::log_merge_count(&self.fast, &self.slow)
    }
}

/// Effective counts for a finalized run of `frames` pairs.
///
/// Fast lag `τ` has `frames - ceil(τ / period)` pairs. Slow level `ℓ`,
/// lag index `j`, has `floor(frames / 2^ℓ) - j` pairs, each worth `2^ℓ`
/// frames under [`BinningMode::Average`]. Negative counts saturate at 0.
pub fn multi_count(
    frames: u64,
    period: u64,
    level_size: usize,
    binning: BinningMode,
    max_levels: Option<usize>,
) -> MultiCount {
    let period = period.max(1);
    let fast_lags = level_size as u64 * period;
    let fast = LagCounts {
        lags: (0..fast_lags).map(|tau| tau as f64).collect(),
        counts: (0..fast_lags)
            .map(|tau| frames.saturating_sub(tau.div_ceil(period)))
            .collect(),
    };

    let levels = expected_level_count(frames, true, max_levels);
    let slow = (0..levels)
        .map(|level| {
            let binned = frames >> level;
            let weight = match binning {
                BinningMode::Average => 1u64 << level,
                BinningMode::Decimate | BinningMode::Random => 1,
            };
            let step = period << level;
            LagCounts {
                lags: (0..level_size as u64).map(|j| (j * step) as f64).collect(),
                counts: (0..level_size as u64)
                    .map(|j| binned.saturating_sub(j) * weight)
                    .collect(),
            }
        })
        .collect();

    MultiCount { fast, slow }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_counts() {
        let counts = multi_count(100, 4, 4, BinningMode::Decimate, None);
        assert_eq!(counts.fast.lags.len(), 16);
        assert_eq!(counts.fast.counts[0], 100);
        assert_eq!(counts.fast.counts[1], 99);
        assert_eq!(counts.fast.counts[4], 99);
        assert_eq!(counts.fast.counts[5], 98);
    }

    #[test]
    fn test_slow_counts_by_binning() {
        let decimate = multi_count(64, 1, 4, BinningMode::Decimate, None);
        let average = multi_count(64, 1, 4, BinningMode::Average, None);
        assert_eq!(decimate.slow.len(), 7);
        assert_eq!(decimate.slow[2].counts, vec![16, 15, 14, 13]);
        assert_eq!(average.slow[2].counts, vec![64, 60, 56, 52]);
        assert_eq!(average.slow[2].lags, vec![0.0, 4.0, 8.0, 12.0]);
    }

    #[test]
    fn test_counts_saturate() {
        let counts = multi_count(3, 1, 8, BinningMode::Average, Some(2));
        assert_eq!(counts.slow.len(), 2);
        assert_eq!(counts.fast.counts[7], 0);
        assert_eq!(counts.slow[1].counts[3], 0);
    }

    #[test]
    fn test_empty_run() {
        let counts = multi_count(0, 1, 16, BinningMode::Average, None);
        assert!(counts.slow.is_empty());
        assert!(counts.fast.counts.iter().all(|&c| c == 0));
        assert_eq!(counts.merge().lags.len(), 16);
    }
}
