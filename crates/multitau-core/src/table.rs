//! Raw correlation sums and accumulator snapshots.

use crate::error::Warning;
use crate::frame::Frame;
use crate::stats::FrameStats;
use rustfft::num_complex::Complex64;

/// Unnormalized correlation sums of one resolution tier.
///
/// Per pixel and lag index: `Σ x1·conj(x2)`, `Σ x1`, `Σ x2`, `Σ |x1|²`,
/// `Σ |x2|²`. Per lag index: the number of frame pairs summed, shared by
/// all pixels. Values are only meaningful where the count is non-zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "CorrelationTableRaw")
)]
pub struct CorrelationTable {
    shape: (usize, usize),
    lags: usize,
    lag_step: u64,
    #[cfg_attr(feature = "serialization", serde(with = "crate::serde_complex"))]
    corr: Vec<Complex64>,
    #[cfg_attr(feature = "serialization", serde(with = "crate::serde_complex"))]
    sum1: Vec<Complex64>,
    #[cfg_attr(feature = "serialization", serde(with = "crate::serde_complex"))]
    sum2: Vec<Complex64>,
    sq1: Vec<f64>,
    sq2: Vec<f64>,
    count: Vec<u64>,
}

#[cfg(feature = "serialization")]
#[derive(serde::Deserialize)]
struct CorrelationTableRaw {
    shape: (usize, usize),
    lags: usize,
    lag_step: u64,
    #[serde(with = "crate::serde_complex")]
    corr: Vec<Complex64>,
    #[serde(with = "crate::serde_complex")]
    sum1: Vec<Complex64>,
    #[serde(with = "crate::serde_complex")]
    sum2: Vec<Complex64>,
    sq1: Vec<f64>,
    sq2: Vec<f64>,
    count: Vec<u64>,
}

#[cfg(feature = "serialization")]
impl TryFrom<CorrelationTableRaw> for CorrelationTable {
    type Error = crate::error::Error;

    fn try_from(raw: CorrelationTableRaw) -> crate::error::Result<Self> {
        use crate::error::ConfigurationError;

        let (rows, cols) = raw.shape;
        if rows == 0 || cols == 0 {
            return Err(ConfigurationError::EmptyShape { rows, cols }.into());
        }
        if raw.lags == 0 || raw.lag_step == 0 {
            return Err(ConfigurationError::Invalid(format!(
                "table needs lags and a lag step, got {} lags of {} ticks",
                raw.lags, raw.lag_step
            ))
            .into());
        }
        let n = rows * cols * raw.lags;
        let lengths = [
            raw.corr.len(),
            raw.sum1.len(),
            raw.sum2.len(),
            raw.sq1.len(),
            raw.sq2.len(),
        ];
        if lengths.iter().any(|&len| len != n) || raw.count.len() != raw.lags {
            return Err(ConfigurationError::Invalid(format!(
                "table sums {:?} and {} counts do not match shape {:?} with {} lags",
                lengths,
                raw.count.len(),
                raw.shape,
                raw.lags
            ))
            .into());
        }
        Ok(Self {
            shape: raw.shape,
            lags: raw.lags,
            lag_step: raw.lag_step,
            corr: raw.corr,
            sum1: raw.sum1,
            sum2: raw.sum2,
            sq1: raw.sq1,
            sq2: raw.sq2,
            count: raw.count,
        })
    }
}

/// Per-lag means of one pixel, derived from the sums of a [`CorrelationTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagMoments {
    pub count: u64,
    /// Mean of `x1·conj(x2)`.
    pub corr: Complex64,
    pub mean1: Complex64,
    pub mean2: Complex64,
    /// Mean of `|x1|²`.
    pub power1: f64,
    /// Mean of `|x2|²`.
    pub power2: f64,
}

impl CorrelationTable {
    /// Empty table with `lags` lag indices spaced `lag_step` ticks apart.
    pub fn new(shape: (usize, usize), lags: usize, lag_step: u64) -> Self {
        let n = shape.0 * shape.1 * lags;
        Self {
            shape,
            lags,
            lag_step,
            corr: vec![Complex64::new(0.0, 0.0); n],
            sum1: vec![Complex64::new(0.0, 0.0); n],
            sum2: vec![Complex64::new(0.0, 0.0); n],
            sq1: vec![0.0; n],
            sq2: vec![0.0; n],
            count: vec![0; lags],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn pixels(&self) -> usize {
        self.shape.0 * self.shape.1
    }

    /// Number of lag indices.
    pub fn lags(&self) -> usize {
        self.lags
    }

    /// Ticks between consecutive lag indices.
    pub fn lag_step(&self) -> u64 {
        self.lag_step
    }

    /// Lag of every index, in ticks.
    pub fn lag_axis(&self) -> Vec<f64> {
        (0..self.lags)
            .map(|i| (i as u64 * self.lag_step) as f64)
            .collect()
    }

    pub fn counts(&self) -> &[u64] {
        &self.count
    }

    pub fn count(&self, lag: usize) -> u64 {
        self.count[lag]
    }

    /// Raw correlation sum of `pixel` at `lag`.
    pub fn corr_sum(&self, pixel: usize, lag: usize) -> Complex64 {
        self.corr[pixel * self.lags + lag]
    }

    /// Means at `(pixel, lag)`; `None` where nothing was accumulated.
    pub fn moments(&self, pixel: usize, lag: usize) -> Option<LagMoments> {
        let count = self.count[lag];
        if count == 0 {
            return None;
        }
        let n = count as f64;
        let idx = pixel * self.lags + lag;
        Some(LagMoments {
            count,
            corr: self.corr[idx] / n,
            mean1: self.sum1[idx] / n,
            mean2: self.sum2[idx] / n,
            power1: self.sq1[idx] / n,
            power2: self.sq2[idx] / n,
        })
    }

    /// Add the pair `(x1, x2)` at lag index `lag`.
    pub(crate) fn accumulate(&mut self, lag: usize, x1: &Frame, x2: &Frame) {
        for (pixel, (a, b)) in x1.as_slice().iter().zip(x2.as_slice()).enumerate() {
            let idx = pixel * self.lags + lag;
            self.corr[idx] += a * b.conj();
            self.sum1[idx] += a;
            self.sum2[idx] += b;
            self.sq1[idx] += a.norm_sqr();
            self.sq2[idx] += b.norm_sqr();
        }
        self.count[lag] += 1;
    }
}

/// Read-only view of an accumulator at one point of the stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Snapshot {
    /// Linear correlator at full time resolution.
    pub fast: CorrelationTable,
    /// Slow levels, finest first.
    pub slow: Vec<CorrelationTable>,
    pub stats: FrameStats,
    /// Frame pairs ingested.
    pub frames: u64,
    pub warnings: Vec<Warning>,
    pub finalized: bool,
    pub level_size: usize,
    pub period: u64,
}

impl Snapshot {
    pub fn shape(&self) -> (usize, usize) {
        self.fast.shape()
    }

    /// Number of slow levels.
    pub fn level_count(&self) -> usize {
        self.slow.len()
    }

    /// Largest lag (exclusive, in ticks) covered by the fast correlator.
    pub fn crossover_lag(&self) -> u64 {
        self.level_size as u64 * self.period
    }
}
