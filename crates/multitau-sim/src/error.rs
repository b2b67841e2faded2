//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid simulation parameter.
    #[error("Invalid simulation parameter: {0}")]
    InvalidParameter(String),

    /// Channel time arrays of different length.
    #[error("Time arrays differ in length: {t1} vs {t2}")]
    TimesLength { t1: usize, t2: usize },

    /// A frame pair starts before the previous pair ended.
    #[error("Frame pair {index} starts at {start}, before the previous pair ended at {previous_end}")]
    UnorderedTimes {
        index: usize,
        start: i64,
        previous_end: i64,
    },

    /// Error from the correlation core.
    #[error(transparent)]
    Core(#[from] multitau_core::Error),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
