//! Merging of the fast part and the slow levels onto one lag axis.
//!
//! The fast part is kept whole; each slow level then contributes only the
//! lags beyond everything kept before it. With an even `level_size` this
//! keeps indices `level_size/2 .. level_size` of every slow level above
//! the first, giving an approximately log-spaced axis.

use crate::mask::SectorMask;
use crate::normalize::{MultiNormalized, NormalizedTable};
use multitau_core::{ConfigurationError, Result};

/// Correlation curves of every pixel on a merged, strictly increasing
/// lag axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Merged {
    shape: (usize, usize),
    lags: Vec<f64>,
    values: Vec<f64>,
}

impl Merged {
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn pixels(&self) -> usize {
        self.shape.0 * self.shape.1
    }

    /// Lag axis, in ticks.
    pub fn lags(&self) -> &[f64] {
        &self.lags
    }

    /// All values, pixel-major.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn curve(&self, pixel: usize) -> &[f64] {
        let n = self.lags.len();
        &self.values[pixel * n..(pixel + 1) * n]
    }

    /// Mean curve over the pixels selected by `mask`, ignoring NaN values.
    /// Lags at which every selected value is NaN stay NaN.
    pub fn average(&self, mask: &SectorMask) -> Result<Vec<f64>> {
        if mask.shape() != self.shape {
            return Err(ConfigurationError::ShapeMismatch {
                expected: self.shape,
                actual: mask.shape(),
            }
            .into());
        }
        if mask.is_empty() {
            return Err(ConfigurationError::EmptyMask.into());
        }

        let n = self.lags.len();
        let mut sum = vec![0.0; n];
        let mut count = vec![0usize; n];
        for pixel in mask.pixels() {
            for (lag, &value) in self.curve(pixel).iter().enumerate() {
                if !value.is_nan() {
                    sum[lag] += value;
                    count[lag] += 1;
                }
            }
        }
        Ok(sum
            .into_iter()
            .zip(count)
            .map(|(s, c)| if c == 0 { f64::NAN } else { s / c as f64 })
            .collect())
    }
}

/// Effective counts on a lag axis.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct LagCounts {
    pub lags: Vec<f64>,
    pub counts: Vec<u64>,
}

/// `(table, index)` of every kept entry, in merged order.
fn merge_plan<'a>(fast: &'a [f64], slow: impl IntoIterator<Item = &'a [f64]>) -> Vec<(usize, usize)> {
    let mut plan: Vec<(usize, usize)> = (0..fast.len()).map(|i| (0, i)).collect();
    let mut last = fast.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    for (level, lags) in slow.into_iter().enumerate() {
        for (i, &lag) in lags.iter().enumerate() {
            if lag > last {
                plan.push((level + 1, i));
                last = lag;
            }
        }
    }
    plan
}

/// Merge normalized fast and slow data onto one lag axis.
///
/// # Example
///
/// ```
/// use multitau_analysis::{log_merge, normalize_multi, NormalizeOptions};
/// use multitau_core::{AccumulatorConfig, Frame, FramePair, MultiTauAccumulator};
///
/// let config = AccumulatorConfig::builder().shape(1, 1).level_size(4).build().unwrap();
/// let mut acc = MultiTauAccumulator::new(config).unwrap();
/// for t in 0..64 {
///     acc.update(&FramePair::same(Frame::zeros(1, 1), t)).unwrap();
/// }
/// let multi = normalize_multi(&acc.finalize(), &NormalizeOptions::default()).unwrap();
/// let merged = log_merge(&multi.fast, &multi.slow).unwrap();
/// assert_eq!(&merged.lags()[..7], &[0.0, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0]);
/// ```
pub fn log_merge(fast: &NormalizedTable, slow: &[NormalizedTable]) -> Result<Merged> {
    let shape = fast.shape();
    if let Some(other) = slow.iter().find(|t| t.shape() != shape) {
        return Err(ConfigurationError::ShapeMismatch {
            expected: shape,
            actual: other.shape(),
        }
        .into());
    }

    let plan = merge_plan(fast.lags(), slow.iter().map(|t| t.lags()));
    let table = move |k: usize| if k == 0 { fast } else { &slow[k - 1] };

    let lags = plan.iter().map(|&(k, i)| table(k).lags()[i]).collect();
    let pixels = shape.0 * shape.1;
    let mut values = Vec::with_capacity(pixels * plan.len());
    for pixel in 0..pixels {
        values.extend(plan.iter().map(|&(k, i)| table(k).value(pixel, i)));
    }

    Ok(Merged {
        shape,
        lags,
        values,
    })
}

/// Merge effective counts with the same rule as [`log_merge`].
pub fn log_merge_count(fast: &LagCounts, slow: &[LagCounts]) -> LagCounts {
    let plan = merge_plan(&fast.lags, slow.iter().map(|c| c.lags.as_slice()));
    let table = move |k: usize| if k == 0 { fast } else { &slow[k - 1] };
    LagCounts {
        lags: plan.iter().map(|&(k, i)| table(k).lags[i]).collect(),
        counts: plan.iter().map(|&(k, i)| table(k).counts[i]).collect(),
    }
}

impl MultiNormalized {
    /// [`log_merge`] of this fast part and its slow levels.
    pub fn merge(&self) -> Result<Merged> {
        log_merge(&self.fast, &self.slow)
    }
}
