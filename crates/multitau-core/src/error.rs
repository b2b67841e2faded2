//! Error types for multitau-core.

use thiserror::Error;

/// Fatal setup errors: bad parameters, mismatched shapes, unknown modes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Invalid level size: {0}. Must be at least 2")]
    LevelSize(usize),

    #[error("Invalid period: {0}. Must be at least 1")]
    Period(u64),

    #[error("Frame shape {rows}x{cols} has a zero dimension")]
    EmptyShape { rows: usize, cols: usize },

    #[error("max_levels must be at least 1 when set")]
    MaxLevels,

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid normalization mode: {0}. Must be between 0 and 7")]
    InvalidMode(u8),

    #[error("Mask selects no wavevectors")]
    EmptyMask,

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Error type for multitau-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Timestamp went backwards on channel {channel}: {previous} -> {current}")]
    UnorderedTimestamp {
        channel: u8,
        previous: i64,
        current: i64,
    },

    #[error("Accumulator is finalized and accepts no more frames")]
    Finalized,

    #[error("Degenerate variance at pixel {pixel}, lag index {lag}")]
    DegenerateVariance { pixel: usize, lag: usize },
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Non-fatal conditions recorded while accumulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Warning {
    /// Finalization flushed a bin holding fewer samples than its capacity.
    /// Counts at the next level carry wider error bars.
    StarvedLevel {
        level: usize,
        samples: usize,
        capacity: usize,
    },
}

impl core::fmt::Display for Warning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Warning::StarvedLevel {
                level,
                samples,
                capacity,
            } => write!(
                f,
                "level {} flushed with {}/{} samples",
                level, samples, capacity
            ),
        }
    }
}
