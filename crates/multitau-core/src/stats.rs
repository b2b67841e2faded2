//! Per-pixel background and variance, for both channels.

use crate::error::{ConfigurationError, Result};
use crate::frame::Frame;
use rustfft::num_complex::Complex64;

/// Background (mean) and variance of every wavevector, per channel.
///
/// Index 0 is channel 1, index 1 is channel 2.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "FrameStatsRaw")
)]
pub struct FrameStats {
    shape: (usize, usize),
    #[cfg_attr(feature = "serialization", serde(with = "crate::serde_complex::pair"))]
    background: [Vec<Complex64>; 2],
    variance: [Vec<f64>; 2],
}

#[cfg(feature = "serialization")]
#[derive(serde::Deserialize)]
struct FrameStatsRaw {
    shape: (usize, usize),
    #[serde(with = "crate::serde_complex::pair")]
    background: [Vec<Complex64>; 2],
    variance: [Vec<f64>; 2],
}

#[cfg(feature = "serialization")]
impl TryFrom<FrameStatsRaw> for FrameStats {
    type Error = crate::error::Error;

    fn try_from(raw: FrameStatsRaw) -> Result<Self> {
        FrameStats::new(raw.shape, raw.background, raw.variance)
    }
}

impl FrameStats {
    pub fn new(
        shape: (usize, usize),
        background: [Vec<Complex64>; 2],
        variance: [Vec<f64>; 2],
    ) -> Result<Self> {
        let n = shape.0 * shape.1;
        let lengths = [
            background[0].len(),
            background[1].len(),
            variance[0].len(),
            variance[1].len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(ConfigurationError::Invalid(format!(
                "statistics lengths {:?} do not match shape {:?}",
                lengths, shape
            ))
            .into());
        }
        Ok(Self {
            shape,
            background,
            variance,
        })
    }

    /// Same statistics for both channels.
    pub fn symmetric(shape: (usize, usize), background: Vec<Complex64>, variance: Vec<f64>) -> Result<Self> {
        Self::new(
            shape,
            [background.clone(), background],
            [variance.clone(), variance],
        )
    }

    /// Zero background, zero variance.
    pub fn zeros(shape: (usize, usize)) -> Self {
        let n = shape.0 * shape.1;
        Self {
            shape,
            background: [vec![Complex64::new(0.0, 0.0); n], vec![Complex64::new(0.0, 0.0); n]],
            variance: [vec![0.0; n], vec![0.0; n]],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Background of channel `0` or `1`.
    pub fn background(&self, channel: usize) -> &[Complex64] {
        &self.background[channel]
    }

    /// Variance of channel `0` or `1`.
    pub fn variance(&self, channel: usize) -> &[f64] {
        &self.variance[channel]
    }
}

/// Running sums of `x` and `|x|²` per pixel, per channel.
#[derive(Debug, Clone)]
pub(crate) struct RunningStats {
    shape: (usize, usize),
    sum: [Vec<Complex64>; 2],
    sum_sq: [Vec<f64>; 2],
    count: u64,
}

impl RunningStats {
    pub(crate) fn new(shape: (usize, usize)) -> Self {
        let n = shape.0 * shape.1;
        Self {
            shape,
            sum: [vec![Complex64::new(0.0, 0.0); n], vec![Complex64::new(0.0, 0.0); n]],
            sum_sq: [vec![0.0; n], vec![0.0; n]],
            count: 0,
        }
    }

    pub(crate) fn add(&mut self, frame1: &Frame, frame2: &Frame) {
        for (channel, frame) in [frame1, frame2].into_iter().enumerate() {
            for ((s, q), x) in self.sum[channel]
                .iter_mut()
                .zip(self.sum_sq[channel].iter_mut())
                .zip(frame.as_slice())
            {
                *s += x;
                *q += x.norm_sqr();
            }
        }
        self.count += 1;
    }

    /// Background = running mean, variance = mean `|x|²` minus `|background|²`.
    pub(crate) fn to_stats(&self) -> FrameStats {
        if self.count == 0 {
            return FrameStats::zeros(self.shape);
        }
        let n = self.count as f64;
        let mut background: [Vec<Complex64>; 2] = [Vec::new(), Vec::new()];
        let mut variance: [Vec<f64>; 2] = [Vec::new(), Vec::new()];
        for channel in 0..2 {
            background[channel] = self.sum[channel].iter().map(|s| s / n).collect();
            variance[channel] = self.sum_sq[channel]
                .iter()
                .zip(&background[channel])
                .map(|(q, b)| (q / n - b.norm_sqr()).max(0.0))
                .collect();
        }
        FrameStats {
            shape: self.shape,
            background,
            variance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_running_mean_and_variance() {
        let mut stats = RunningStats::new((1, 1));
        for v in [1.0, 3.0] {
            let frame = Frame::from_fn(1, 1, |_, _| Complex64::new(v, 0.0));
            stats.add(&frame, &frame);
        }
        let out = stats.to_stats();
        assert_relative_eq!(out.background(0)[0].re, 2.0);
        assert_relative_eq!(out.variance(1)[0], 1.0);
    }

    #[test]
    fn test_empty_stats_are_zero() {
        let out = RunningStats::new((2, 2)).to_stats();
        assert!(out.variance(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = FrameStats::symmetric((2, 2), vec![Complex64::new(0.0, 0.0); 3], vec![1.0; 4]);
        assert!(result.is_err());
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn test_deserialize_checks_lengths() {
        let stats = FrameStats::symmetric((1, 2), vec![Complex64::new(1.0, 2.0); 2], vec![0.5; 2]).unwrap();
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(serde_json::from_str::<FrameStats>(&json).unwrap(), stats);

        let truncated = r#"{"shape":[1,2],"background":[[[1.0,2.0]],[[1.0,2.0],[1.0,2.0]]],"variance":[[0.5,0.5],[0.5,0.5]]}"#;
        assert!(serde_json::from_str::<FrameStats>(truncated).is_err());
    }
}
