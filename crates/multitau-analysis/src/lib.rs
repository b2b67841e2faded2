//! # Multitau Analysis
//!
//! Turns multi-tau correlation snapshots into curves.
//!
//! This crate provides:
//! - **Normalization**: 8 modes combining baseline, scaling and blending choices,
//!   with a correlation or a difference estimator
//! - **Log merging**: fast part and slow levels on one increasing lag axis
//! - **Effective counts**: analytic pair counts merged like the data
//! - **Error estimates**: correlation and structure-function error models
//! - **Sector masks**: `|k|` rings and angular sectors for averaging
//! - **Live correlation**: background accumulation with lock-free snapshots (feature `live`)
//!
//! ## Example
//!
//! ```rust
//! use multitau_analysis::{multi_count, normalize_multi, KMap, NormMode, NormalizeOptions, SectorMask};
//! use multitau_core::{AccumulatorConfig, BinningMode, Complex64, Frame, FramePair, MultiTauAccumulator};
//!
//! let config = AccumulatorConfig::builder().shape(5, 3).level_size(8).build().unwrap();
//! let mut acc = MultiTauAccumulator::new(config).unwrap();
//! for t in 0..128 {
//!     let frame = Frame::from_fn(5, 3, |i, j| Complex64::from_polar(1.0, 0.1 * (t * (i + j + 1)) as f64));
//!     acc.update(&FramePair::same(frame, t as i64)).unwrap();
//! }
//!
//! let options = NormalizeOptions::default().with_mode(NormMode::try_from(6).unwrap());
//! let merged = normalize_multi(&acc.finalize(), &options).unwrap().merge().unwrap();
//!
//! // Average the |k| = 1 ring
//! let kmap = KMap::new(5, 3, (64, 64)).unwrap();
//! let mask = SectorMask::new(&kmap, 1, 0.0, 180.0, 1.0);
//! let curve = merged.average(&mask).unwrap();
//!
//! // Matching effective counts
//! let counts = multi_count(128, 1, 8, BinningMode::Average, None).merge();
//! assert_eq!(counts.lags, merged.lags());
//! assert_eq!(curve.len(), counts.counts.len());
//! ```

pub mod count;
pub mod estimate;
pub mod mask;
pub mod merge;
pub mod norm;
pub mod normalize;

#[cfg(feature = "cache")]
pub mod cache;
#[cfg(feature = "live")]
pub mod live;

#[cfg(feature = "live")]
mod handle;

pub use count::{multi_count, MultiCount};
pub use estimate::{corr_error, diff_error, error_curves, weighted_error};
pub use mask::{KMap, SectorMask};
pub use merge::{log_merge, log_merge_count, LagCounts, Merged};
pub use norm::{Baseline, Blend, NormMode, Scaling};
pub use normalize::{
    normalize, normalize_multi, Estimator, MultiNormalized, NormalizeOptions, NormalizedTable,
    VariancePolicy,
};

#[cfg(feature = "cache")]
pub use cache::{CurveCache, CurveKey};
#[cfg(feature = "live")]
pub use handle::CorrelationHandle;
#[cfg(feature = "live")]
pub use live::{run_correlation_thread, LiveCorrelationState};
