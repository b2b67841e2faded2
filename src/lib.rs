//! # Multitau - Streaming Multi-Tau Cross-Correlation
//!
//! Cross-correlation of two synchronized camera streams of Fourier-space
//! frames, as used in cross-differential dynamic microscopy.
//!
//! ## Architecture
//!
//! Multitau is an umbrella crate that coordinates:
//! - **multitau-core** - Frames, configuration, the streaming multi-tau accumulator and its snapshots
//! - **multitau-analysis** - Normalization, log merging, effective counts, error models, sector masks, live correlation
//! - **multitau-sim** - Frame sources: seeded Brownian simulation, in-memory arrays, acquisition timing
//!
//! ## Quick Start
//!
//! ```rust
//! use multitau::prelude::*;
//!
//! let (t1, t2) = random_times(256, 4, 7);
//! let video = BrownianConfig::default().shape(32, 32).particles(30).crop(8, 0);
//! let factory = BrownianFactory::new(video.clone(), t1, t2)?;
//!
//! let pipeline = Pipeline::builder()
//!     .accumulator(
//!         AccumulatorConfig::builder()
//!             .shape(17, 1)
//!             .period(4)
//!             .level_size(16)
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let output = pipeline.run(factory.create(0))?;
//! let curve = output.merged.curve(4);
//! assert_eq!(curve.len(), output.merged.lags().len());
//! assert!((curve[0] - 1.0).abs() < 0.5);
//! # Ok::<(), multitau::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Everything enabled (`full`)
//! - `live` - Background correlation thread with lock-free snapshots
//! - `cache` - LRU cache of merged curves
//! - `serialization` - serde support for configs, snapshots and results

/// Re-export of multitau-core for direct access
pub use multitau_core as core;

/// Normalization, merging and estimates
pub use multitau_analysis as analysis;

/// Frame sources and simulation
pub use multitau_sim as sim;

// Core types
pub use multitau_core::{
    expected_level_count,
    AccumulatorConfig,
    AccumulatorConfigBuilder,
    BackgroundMode,
    BinningMode,
    Complex64,
    ConfigurationError,
    CorrelationTable,
    Frame,
    FramePair,
    FrameStats,
    LagMoments,
    MultiTauAccumulator,
    Snapshot,
    Warning,
};

// Analysis
pub use multitau_analysis::{
    corr_error, diff_error, error_curves, log_merge, log_merge_count, multi_count, normalize, normalize_multi,
    weighted_error, Baseline, Blend, Estimator, KMap, LagCounts, Merged, MultiCount, MultiNormalized, NormMode,
    NormalizeOptions, NormalizedTable, Scaling, SectorMask, VariancePolicy,
};

#[cfg(feature = "live")]
pub use multitau_analysis::{run_correlation_thread, CorrelationHandle, LiveCorrelationState};

mod builder;
mod error;
mod pipeline;

pub use builder::PipelineBuilder;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineOutput, TrialSet};

/// Convenience prelude for common imports
pub mod prelude {
    // Pipeline
    pub use crate::{Pipeline, PipelineBuilder, PipelineOutput, TrialSet};

    // Essential types
    pub use crate::core::{AccumulatorConfig, BinningMode, Complex64, Frame, FramePair, MultiTauAccumulator};

    // Normalization and averaging
    pub use crate::analysis::{Estimator, KMap, NormMode, NormalizeOptions, SectorMask};

    // Sources
    pub use crate::sim::{random_times, BrownianConfig, BrownianFactory, SourceFactory};

    // Live
    #[cfg(feature = "live")]
    pub use crate::analysis::{run_correlation_thread, CorrelationHandle, LiveCorrelationState};
}
