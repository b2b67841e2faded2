//! # Multitau Sim
//!
//! Frame sources for the multi-tau correlator.
//!
//! - [`FrameSource`]: a lazy sequence of [`FramePair`](multitau_core::FramePair)s
//! - [`SourceFactory`]: restarts a source by creating a fresh one from a seed
//! - [`BrownianSimulation`]: seeded two-camera video of diffusing particles
//! - [`ArraySource`]: pre-computed pairs held in memory
//!
//! ## Example
//!
//! ```rust
//! use multitau_sim::{random_times, BrownianConfig, BrownianFactory, SourceFactory};
//!
//! let (t1, t2) = random_times(64, 8, 0);
//! let config = BrownianConfig::default().shape(32, 32).particles(20).crop(8, 0);
//! let factory = BrownianFactory::new(config, t1, t2).unwrap();
//!
//! let pairs: Vec<_> = factory.create(0).collect();
//! assert_eq!(pairs.len(), 64);
//! assert_eq!(pairs[0].frame1.shape(), (17, 1));
//! ```

pub mod brownian;
pub mod error;
pub mod source;
pub mod times;

pub use brownian::{BrownianConfig, BrownianFactory, BrownianSimulation};
pub use error::{Error, Result};
pub use source::{ArrayFactory, ArraySource, FrameSource, SourceFactory};
pub use times::{random_times, regular_times};
