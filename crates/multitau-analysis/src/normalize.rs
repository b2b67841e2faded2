//! Normalization of raw correlation sums.
//!
//! Turns the sums of a [`CorrelationTable`] into a real-valued correlation
//! function per wavevector. See [`NormMode`] for the available modes.

use crate::norm::{Baseline, Blend, NormMode, Scaling};
use multitau_core::{
    Complex64, ConfigurationError, CorrelationTable, Error, FrameStats, LagMoments, Result,
    Snapshot,
};

/// What to do when a value needs a variance that is (numerically) zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum VariancePolicy {
    /// Abort with [`Error::DegenerateVariance`].
    Fail,
    /// Report NaN for the affected value.
    #[default]
    Nan,
}

/// Which estimate of the correlation [`normalize`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Estimator {
    /// The baseline-corrected cross-correlation, optionally blended with
    /// the difference estimate (see [`Blend`]).
    #[default]
    Correlation,
    /// Half the summed variances minus half the mean squared difference
    /// `|x1 - x2|²`. Ignores the baseline and blend of the mode; its
    /// scaling still picks the variance term.
    Difference,
}

/// Options for [`normalize`] and [`normalize_multi`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NormalizeOptions {
    pub mode: NormMode,
    /// Divide by the variance term so the ideal zero-lag value is 1.
    pub scale: bool,
    pub policy: VariancePolicy,
    /// Variance terms at or below this are degenerate.
    pub epsilon: f64,
    #[cfg_attr(feature = "serialization", serde(default))]
    pub estimator: Estimator,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            mode: NormMode::default(),
            scale: true,
            policy: VariancePolicy::Nan,
            epsilon: 1e-12,
            estimator: Estimator::Correlation,
        }
    }
}

impl NormalizeOptions {
    pub fn with_mode(mut self, mode: NormMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn scaled(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_policy(mut self, policy: VariancePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_estimator(mut self, estimator: Estimator) -> Self {
        self.estimator = estimator;
        self
    }
}

/// Normalized correlation of one table: a lag axis and, per pixel, one
/// real value per lag. NaN where nothing was accumulated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NormalizedTable {
    shape: (usize, usize),
    lags: Vec<f64>,
    values: Vec<f64>,
}

impl NormalizedTable {
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn pixels(&self) -> usize {
        self.shape.0 * self.shape.1
    }

    /// Lag of every index, in ticks.
    pub fn lags(&self) -> &[f64] {
        &self.lags
    }

    /// All values, pixel-major.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Correlation curve of `pixel`.
    pub fn curve(&self, pixel: usize) -> &[f64] {
        let n = self.lags.len();
        &self.values[pixel * n..(pixel + 1) * n]
    }

    pub fn value(&self, pixel: usize, lag: usize) -> f64 {
        self.values[pixel * self.lags.len() + lag]
    }
}

/// Normalized fast part and slow levels of one snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MultiNormalized {
    pub fast: NormalizedTable,
    pub slow: Vec<NormalizedTable>,
}

/// Normalize one correlation table against `stats`.
pub fn normalize(
    table: &CorrelationTable,
    stats: &FrameStats,
    options: &NormalizeOptions,
) -> Result<NormalizedTable> {
    if table.shape() != stats.shape() {
        return Err(ConfigurationError::ShapeMismatch {
            expected: table.shape(),
            actual: stats.shape(),
        }
        .into());
    }

    let lags = table.lags();
    let mut values = Vec::with_capacity(table.pixels() * lags);
    let mut degenerate = 0usize;

    for pixel in 0..table.pixels() {
        let global = Global {
            b1: stats.background(0)[pixel],
            b2: stats.background(1)[pixel],
            v1: stats.variance(0)[pixel],
            v2: stats.variance(1)[pixel],
        };
        for lag in 0..lags {
            let value = match table.moments(pixel, lag) {
                None => f64::NAN,
                Some(m) => match normalize_value(&m, &global, options) {
                    Some(v) => v,
                    None => match options.policy {
                        VariancePolicy::Fail => {
                            return Err(Error::DegenerateVariance { pixel, lag })
                        }
                        VariancePolicy::Nan => {
                            degenerate += 1;
                            f64::NAN
                        }
                    },
                },
            };
            values.push(value);
        }
    }

    if degenerate > 0 {
        tracing::warn!(
            "{} values with degenerate variance set to NaN (lag step {})",
            degenerate,
            table.lag_step()
        );
    }

    Ok(NormalizedTable {
        shape: table.shape(),
        lags: table.lag_axis(),
        values,
    })
}

/// Normalize the fast part and every slow level of `snapshot`.
pub fn normalize_multi(snapshot: &Snapshot, options: &NormalizeOptions) -> Result<MultiNormalized> {
    let fast = normalize(&snapshot.fast, &snapshot.stats, options)?;
    let slow = snapshot
        .slow
        .iter()
        .map(|table| normalize(table, &snapshot.stats, options))
        .collect::<Result<Vec<_>>>()?;
    Ok(MultiNormalized { fast, slow })
}

/// Background and variance of one pixel.
struct Global {
    b1: Complex64,
    b2: Complex64,
    v1: f64,
    v2: f64,
}

/// `None` when the variance term is needed but degenerate.
fn normalize_value(m: &LagMoments, g: &Global, options: &NormalizeOptions) -> Option<f64> {
    let mode = options.mode;

    if options.estimator == Estimator::Difference {
        let cd = difference_term(m, g);
        if !options.scale {
            return Some(cd);
        }
        return variance_term(m, g, mode.scaling, options.epsilon).map(|v| cd / v);
    }

    let mut c = match mode.baseline {
        Baseline::Background => m.corr - g.b1 * g.b2.conj(),
        Baseline::Subtracted => {
            m.corr - m.mean1 * g.b2.conj() - g.b1 * m.mean2.conj() + g.b1 * g.b2.conj()
        }
    };

    if !mode.uses_variance(options.scale) {
        return Some(c.re);
    }

    let variance = variance_term(m, g, mode.scaling, options.epsilon)?;

    if mode.blend == Blend::Weighted {
        let cd = difference_term(m, g);
        let gamma = (c.re / variance).clamp(0.0, 1.0);
        let w = weight(gamma);
        c = c * w + Complex64::new(cd * (1.0 - w), 0.0);
    }

    Some(if options.scale { c.re / variance } else { c.re })
}

/// The variance the value is scaled by; `None` if it is degenerate.
fn variance_term(m: &LagMoments, g: &Global, scaling: Scaling, epsilon: f64) -> Option<f64> {
    let variance = match scaling {
        Scaling::Variance => (g.v1 * g.v2).sqrt(),
        Scaling::Compensated => {
            let p1 = power_around(m.power1, m.mean1, g.b1);
            let p2 = power_around(m.power2, m.mean2, g.b2);
            (p1 * p2).sqrt()
        }
    };
    if variance.is_nan() || variance <= epsilon {
        None
    } else {
        Some(variance)
    }
}

/// Correlation estimated from the mean squared difference of the
/// background-free channels.
fn difference_term(m: &LagMoments, g: &Global) -> f64 {
    let delta = g.b1 - g.b2;
    let d = m.power1 + m.power2
        - 2.0 * m.corr.re
        - 2.0 * ((m.mean1 - m.mean2) * delta.conj()).re
        + delta.norm_sqr();
    0.5 * (g.v1 + g.v2) - 0.5 * d
}

/// Mean `|x - b|²` from the per-lag moments.
fn power_around(power: f64, mean: Complex64, background: Complex64) -> f64 {
    (power - 2.0 * (mean * background.conj()).re + background.norm_sqr()).max(0.0)
}

/// Weight of the correlation estimate given the normalized correlation `g`.
pub(crate) fn weight(g: f64) -> f64 {
    let corr = 0.5 * (1.0 + g * g);
    let diff = (1.0 - g) * (1.0 - g);
    diff / (corr + diff)
}
