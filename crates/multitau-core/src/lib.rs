//! # Multitau Core
//!
//! Streaming multi-tau cross-correlation for differential dynamic microscopy.
//!
//! Frames are 2-D arrays of complex wavevector amplitudes, typically the
//! cropped Fourier transforms of two synchronized cameras. The
//! [`MultiTauAccumulator`] ingests them one pair at a time and keeps
//! unnormalized correlation sums:
//! - **Fast part**: every lag below `level_size · period` ticks, at full time resolution
//! - **Slow levels**: `level_size` lags per level, level `ℓ` spaced `period · 2^ℓ` ticks apart
//!
//! Irregular timestamps are supported; the fast part uses exact lags and
//! the slow levels group frames by `floor(min(t1, t2) / period)`.
//!
//! ## Example
//!
//! ```rust
//! use multitau_core::{AccumulatorConfig, BinningMode, Frame, FramePair, MultiTauAccumulator};
//! use multitau_core::Complex64;
//!
//! let config = AccumulatorConfig::builder()
//!     .shape(4, 3)
//!     .level_size(8)
//!     .binning(BinningMode::Average)
//!     .build()
//!     .unwrap();
//! let mut acc = MultiTauAccumulator::new(config).unwrap();
//!
//! for t in 0..100 {
//!     let frame = Frame::from_fn(4, 3, |i, j| Complex64::new((t * i + j) as f64, 0.0));
//!     acc.update(&FramePair::same(frame, t as i64)).unwrap();
//! }
//!
//! let snapshot = acc.finalize();
//! assert_eq!(snapshot.fast.lags(), 8);
//! assert_eq!(snapshot.fast.count(0), 100);
//! ```

pub mod accumulator;
pub mod config;
pub mod error;
pub mod frame;
pub mod stats;
pub mod table;

mod fast;
mod level;
#[cfg(feature = "serialization")]
mod serde_complex;

pub use accumulator::{expected_level_count, MultiTauAccumulator};
pub use config::{AccumulatorConfig, AccumulatorConfigBuilder, BackgroundMode, BinningMode};
pub use error::{ConfigurationError, Error, Result, Warning};
pub use frame::{Frame, FramePair};
pub use rustfft::num_complex::Complex64;
pub use stats::FrameStats;
pub use table::{CorrelationTable, LagMoments, Snapshot};
