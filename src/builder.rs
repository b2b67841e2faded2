//! Builder for configuring and constructing a `Pipeline`.

use crate::{Pipeline, Result};
use multitau_analysis::{Estimator, NormMode, NormalizeOptions, VariancePolicy};
use multitau_core::{AccumulatorConfig, ConfigurationError};

/// The accumulator configuration is required; normalization defaults to
/// [`NormalizeOptions::default()`].
///
/// # Example
///
/// ```
/// use multitau::prelude::*;
///
/// let pipeline = Pipeline::builder()
///     .accumulator(AccumulatorConfig::builder().shape(33, 1).period(8).build()?)
///     .mode(NormMode::try_from(6)?)
///     .threads(2)
///     .build()?;
///
/// assert_eq!(pipeline.norm().mode.bits(), 6);
/// # Ok::<(), multitau::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    accumulator: Option<AccumulatorConfig>,
    norm: NormalizeOptions,
    threads: Option<usize>,
}

impl PipelineBuilder {
    pub fn accumulator(mut self, config: AccumulatorConfig) -> Self {
        self.accumulator = Some(config);
        self
    }

    pub fn norm(mut self, options: NormalizeOptions) -> Self {
        self.norm = options;
        self
    }

    /// Default: mode 3
    pub fn mode(mut self, mode: NormMode) -> Self {
        self.norm.mode = mode;
        self
    }

    /// Default: true
    pub fn scale(mut self, scale: bool) -> Self {
        self.norm.scale = scale;
        self
    }

    /// Default: [`VariancePolicy::Nan`]
    pub fn variance_policy(mut self, policy: VariancePolicy) -> Self {
        self.norm.policy = policy;
        self
    }

    /// Default: [`Estimator::Correlation`]
    pub fn estimator(mut self, estimator: Estimator) -> Self {
        self.norm.estimator = estimator;
        self
    }

    /// Worker threads for [`Pipeline::run_trials`]. Default: rayon's global pool.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        let accumulator = self.accumulator.ok_or_else(|| {
            ConfigurationError::Invalid("pipeline needs an accumulator configuration".to_string())
        })?;
        accumulator.validate()?;
        if !(self.norm.epsilon.is_finite() && self.norm.epsilon >= 0.0) {
            return Err(ConfigurationError::Invalid(format!(
                "variance epsilon {} must be finite and non-negative",
                self.norm.epsilon
            ))
            .into());
        }
        if self.threads == Some(0) {
            return Err(ConfigurationError::Invalid("threads must be at least 1".to_string()).into());
        }
        Ok(Pipeline::new(accumulator, self.norm, self.threads))
    }
}
