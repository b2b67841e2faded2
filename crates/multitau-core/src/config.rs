//! Accumulator configuration.

use crate::error::{ConfigurationError, Result};
use crate::stats::FrameStats;

/// How two entries of a level are combined into one entry of the next level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BinningMode {
    /// No averaging; the first present entry moves on.
    Decimate,
    /// Mean of the present entries.
    #[default]
    Average,
    /// A randomly selected present entry.
    Random,
}

impl BinningMode {
    /// Integer code used by analysis scripts: 0, 1 or 2.
    pub fn code(self) -> u8 {
        match self {
            BinningMode::Decimate => 0,
            BinningMode::Average => 1,
            BinningMode::Random => 2,
        }
    }
}

impl TryFrom<u8> for BinningMode {
    type Error = ConfigurationError;

    fn try_from(code: u8) -> core::result::Result<Self, Self::Error> {
        match code {
            0 => Ok(BinningMode::Decimate),
            1 => Ok(BinningMode::Average),
            2 => Ok(BinningMode::Random),
            other => Err(ConfigurationError::Invalid(format!(
                "binning mode {} (expected 0, 1 or 2)",
                other
            ))),
        }
    }
}

/// Where the background and variance reported with a snapshot come from.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BackgroundMode {
    /// Running per-pixel mean and variance of the ingested frames.
    #[default]
    Auto,
    /// Externally measured statistics.
    Provided(FrameStats),
}

/// Configuration for [`MultiTauAccumulator`](crate::MultiTauAccumulator).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AccumulatorConfig {
    /// `(rows, cols)` of every frame.
    pub shape: (usize, usize),
    /// Lags per level.
    pub level_size: usize,
    /// Ticks per nominal acquisition period.
    pub period: u64,
    pub binning: BinningMode,
    /// Upper bound on the number of slow levels.
    pub max_levels: Option<usize>,
    pub background: BackgroundMode,
    /// Seed of the per-instance generator used by [`BinningMode::Random`].
    pub seed: u64,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            shape: (1, 1),
            level_size: 16,
            period: 1,
            binning: BinningMode::Average,
            max_levels: None,
            background: BackgroundMode::Auto,
            seed: 0,
        }
    }
}

impl AccumulatorConfig {
    pub fn builder() -> AccumulatorConfigBuilder {
        AccumulatorConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        let (rows, cols) = self.shape;
        if rows == 0 || cols == 0 {
            return Err(ConfigurationError::EmptyShape { rows, cols }.into());
        }
        if self.level_size < 2 {
            return Err(ConfigurationError::LevelSize(self.level_size).into());
        }
        if self.period == 0 {
            return Err(ConfigurationError::Period(self.period).into());
        }
        if self.max_levels == Some(0) {
            return Err(ConfigurationError::MaxLevels.into());
        }
        if let BackgroundMode::Provided(stats) = &self.background {
            if stats.shape() != self.shape {
                return Err(ConfigurationError::ShapeMismatch {
                    expected: self.shape,
                    actual: stats.shape(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Largest lag (exclusive, in ticks) covered by the fast correlator.
    pub fn crossover_lag(&self) -> u64 {
        self.level_size as u64 * self.period
    }
}

/// Builder for [`AccumulatorConfig`].
///
/// # Example
///
/// ```
/// use multitau_core::{AccumulatorConfig, BinningMode};
///
/// let config = AccumulatorConfig::builder()
///     .shape(51, 1)
///     .level_size(16)
///     .period(32)
///     .binning(BinningMode::Decimate)
///     .build()
///     .unwrap();
/// assert_eq!(config.crossover_lag(), 512);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AccumulatorConfigBuilder {
    config: AccumulatorConfig,
}

impl AccumulatorConfigBuilder {
    pub fn shape(mut self, rows: usize, cols: usize) -> Self {
        self.config.shape = (rows, cols);
        self
    }

    /// Default: 16
    pub fn level_size(mut self, level_size: usize) -> Self {
        self.config.level_size = level_size;
        self
    }

    /// Default: 1
    pub fn period(mut self, period: u64) -> Self {
        self.config.period = period;
        self
    }

    /// Default: [`BinningMode::Average`]
    pub fn binning(mut self, binning: BinningMode) -> Self {
        self.config.binning = binning;
        self
    }

    pub fn max_levels(mut self, max_levels: usize) -> Self {
        self.config.max_levels = Some(max_levels);
        self
    }

    /// Use externally measured background and variance instead of running estimates.
    pub fn background(mut self, stats: FrameStats) -> Self {
        self.config.background = BackgroundMode::Provided(stats);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn build(self) -> Result<AccumulatorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config() {
        let config = AccumulatorConfig::default();
        assert_eq!(config.level_size, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_level_size_below_two_rejected() {
        let result = AccumulatorConfig::builder().shape(4, 4).level_size(1).build();
        assert_eq!(
            result.unwrap_err(),
            Error::Configuration(ConfigurationError::LevelSize(1))
        );
    }

    #[test]
    fn test_zero_period_and_shape_rejected() {
        assert!(AccumulatorConfig::builder().period(0).build().is_err());
        assert!(AccumulatorConfig::builder().shape(0, 3).build().is_err());
        assert!(AccumulatorConfig::builder().max_levels(0).build().is_err());
    }

    #[test]
    fn test_provided_background_shape_checked() {
        let stats = FrameStats::zeros((2, 2));
        let result = AccumulatorConfig::builder()
            .shape(3, 3)
            .background(stats)
            .build();
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn test_binning_codes() {
        for code in 0..3u8 {
            assert_eq!(BinningMode::try_from(code).unwrap().code(), code);
        }
        assert!(BinningMode::try_from(3).is_err());
    }
}
