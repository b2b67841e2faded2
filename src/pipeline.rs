//! Source to merged curves: accumulate, finalize, normalize, merge.

use crate::builder::PipelineBuilder;
use crate::Result;
use multitau_analysis::{multi_count, normalize_multi, LagCounts, Merged, MultiNormalized, NormMode, NormalizeOptions};
use multitau_core::{AccumulatorConfig, ConfigurationError, FramePair, MultiTauAccumulator, Snapshot};
use multitau_sim::SourceFactory;
use rayon::prelude::*;
use std::sync::Arc;

/// Offline correlation pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    accumulator: AccumulatorConfig,
    norm: NormalizeOptions,
    threads: Option<usize>,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub snapshot: Arc<Snapshot>,
    pub normalized: MultiNormalized,
    pub merged: Merged,
}

impl PipelineOutput {
    /// Analytic effective counts on the merged lag axis.
    pub fn counts(&self, config: &AccumulatorConfig) -> LagCounts {
        multi_count(
            self.snapshot.frames,
            config.period,
            config.level_size,
            config.binning,
            config.max_levels,
        )
        .merge()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub(crate) fn new(accumulator: AccumulatorConfig, norm: NormalizeOptions, threads: Option<usize>) -> Self {
        Self {
            accumulator,
            norm,
            threads,
        }
    }

    pub fn accumulator_config(&self) -> &AccumulatorConfig {
        &self.accumulator
    }

    pub fn norm(&self) -> &NormalizeOptions {
        &self.norm
    }

    /// Correlate every pair of `source` and return the merged result.
    pub fn run<I>(&self, source: I) -> Result<PipelineOutput>
    where
        I: IntoIterator<Item = FramePair>,
    {
        let snapshot = self.accumulate(source, self.accumulator.seed)?;
        let normalized = normalize_multi(&snapshot, &self.norm)?;
        let merged = normalized.merge()?;
        Ok(PipelineOutput {
            snapshot,
            normalized,
            merged,
        })
    }

    /// Run `trials` independent trials in parallel and normalize each one
    /// under every mode in `modes`.
    ///
    /// Trial `i` reads `factory.create(i)`. Its accumulator is seeded with
    /// the configured seed plus `i`.
    pub fn run_trials<F>(&self, factory: &F, trials: usize, modes: &[NormMode]) -> Result<TrialSet>
    where
        F: SourceFactory,
    {
        if modes.is_empty() {
            return Err(ConfigurationError::Invalid("no normalization modes".to_string()).into());
        }
        let shape = factory.shape();
        if shape != self.accumulator.shape {
            return Err(ConfigurationError::ShapeMismatch {
                expected: self.accumulator.shape,
                actual: shape,
            }
            .into());
        }

        tracing::info!(
            "Running {} trials of {} frame pairs, {} modes",
            trials,
            factory.len_hint().map_or("?".to_string(), |n| n.to_string()),
            modes.len()
        );

        let run = || -> Result<Vec<(u64, Vec<Merged>)>> {
            (0..trials)
                .into_par_iter()
                .map(|trial| self.run_trial(factory, trial, modes))
                .collect()
        };
        let results = match self.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?
                .install(run)?,
            None => run()?,
        };

        TrialSet::new(modes.to_vec(), results, &self.accumulator)
    }

    fn run_trial<F>(&self, factory: &F, trial: usize, modes: &[NormMode]) -> Result<(u64, Vec<Merged>)>
    where
        F: SourceFactory,
    {
        let snapshot = self.accumulate(
            factory.create(trial as u64),
            self.accumulator.seed.wrapping_add(trial as u64),
        )?;
        let curves = modes
            .iter()
            .map(|&mode| -> Result<Merged> {
                let options = NormalizeOptions { mode, ..self.norm };
                Ok(normalize_multi(&snapshot, &options)?.merge()?)
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::info!("Trial {} done ({} frames)", trial, snapshot.frames);
        Ok((snapshot.frames, curves))
    }

    fn accumulate<I>(&self, source: I, seed: u64) -> Result<Arc<Snapshot>>
    where
        I: IntoIterator<Item = FramePair>,
    {
        let config = AccumulatorConfig {
            seed,
            ..self.accumulator.clone()
        };
        let mut accumulator = MultiTauAccumulator::new(config)?;
        for pair in source {
            accumulator.update(&pair)?;
        }
        Ok(accumulator.finalize())
    }
}

/// Merged curves of repeated trials, per trial and normalization mode.
#[derive(Debug, Clone)]
pub struct TrialSet {
    modes: Vec<NormMode>,
    lags: Vec<f64>,
    shape: (usize, usize),
    /// `[trial][mode]`
    curves: Vec<Vec<Merged>>,
    counts: LagCounts,
}

impl TrialSet {
    fn new(modes: Vec<NormMode>, results: Vec<(u64, Vec<Merged>)>, config: &AccumulatorConfig) -> Result<Self> {
        let Some((frames, first)) = results.first() else {
            return Err(ConfigurationError::Invalid("no trials".to_string()).into());
        };
        let lags = first[0].lags().to_vec();
        if results
            .iter()
            .flat_map(|(_, curves)| curves)
            .any(|m| m.lags() != lags.as_slice())
        {
            return Err(ConfigurationError::Invalid("trials produced different lag axes".to_string()).into());
        }
        let counts = multi_count(*frames, config.period, config.level_size, config.binning, config.max_levels)
            .merge();
        Ok(Self {
            modes,
            lags,
            shape: config.shape,
            curves: results.into_iter().map(|(_, curves)| curves).collect(),
            counts,
        })
    }

    pub fn trials(&self) -> usize {
        self.curves.len()
    }

    pub fn modes(&self) -> &[NormMode] {
        &self.modes
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Merged lag axis shared by all trials.
    pub fn lags(&self) -> &[f64] {
        &self.lags
    }

    /// Analytic effective counts on the merged axis.
    pub fn counts(&self) -> &LagCounts {
        &self.counts
    }

    /// Merged curves of `trial` under `mode`.
    pub fn merged(&self, trial: usize, mode: NormMode) -> Result<&Merged> {
        let index = self.mode_index(mode)?;
        let curves = self.curves.get(trial).ok_or_else(|| {
            ConfigurationError::Invalid(format!("trial {} of {}", trial, self.curves.len()))
        })?;
        Ok(&curves[index])
    }

    /// Mean over trials of the curve of `pixel` under `mode`.
    pub fn mean(&self, pixel: usize, mode: NormMode) -> Result<Vec<f64>> {
        let index = self.mode_index(mode)?;
        self.check_pixel(pixel)?;
        let mut mean = vec![0.0; self.lags.len()];
        for curves in &self.curves {
            for (m, v) in mean.iter_mut().zip(curves[index].curve(pixel)) {
                *m += v;
            }
        }
        let n = self.curves.len() as f64;
        Ok(mean.into_iter().map(|m| m / n).collect())
    }

    /// Root mean square deviation over trials of the curve of `pixel`
    /// under `mode` from `model`, per lag.
    pub fn rms_deviation(&self, pixel: usize, mode: NormMode, model: &[f64]) -> Result<Vec<f64>> {
        let index = self.mode_index(mode)?;
        self.check_pixel(pixel)?;
        self.check_model(model)?;
        let mut sum = vec![0.0; self.lags.len()];
        for curves in &self.curves {
            for ((s, v), g) in sum.iter_mut().zip(curves[index].curve(pixel)).zip(model) {
                *s += (v - g) * (v - g);
            }
        }
        let n = self.curves.len() as f64;
        Ok(sum.into_iter().map(|s| (s / n).sqrt()).collect())
    }

    /// Absolute deviation of the trial mean from `model`, per lag.
    pub fn mean_deviation(&self, pixel: usize, mode: NormMode, model: &[f64]) -> Result<Vec<f64>> {
        self.check_model(model)?;
        Ok(self
            .mean(pixel, mode)?
            .into_iter()
            .zip(model)
            .map(|(m, g)| (m - g).abs())
            .collect())
    }

    fn mode_index(&self, mode: NormMode) -> Result<usize> {
        self.modes.iter().position(|&m| m == mode).ok_or_else(|| {
            ConfigurationError::Invalid(format!("{} was not computed", mode)).into()
        })
    }

    fn check_pixel(&self, pixel: usize) -> Result<()> {
        let pixels = self.shape.0 * self.shape.1;
        if pixel >= pixels {
            return Err(ConfigurationError::Invalid(format!("pixel {} of {}", pixel, pixels)).into());
        }
        Ok(())
    }

    fn check_model(&self, model: &[f64]) -> Result<()> {
        if model.len() != self.lags.len() {
            return Err(ConfigurationError::Invalid(format!(
                "model has {} values for {} lags",
                model.len(),
                self.lags.len()
            ))
            .into());
        }
        Ok(())
    }
}
