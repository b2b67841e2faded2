//! Frequency-domain frames and synchronized frame pairs.

use crate::error::{ConfigurationError, Result};
use rustfft::num_complex::Complex64;

/// A 2D array of complex wavevector amplitudes, row-major.
///
/// Cropped rfft2 layout: row `i` is wavevector `i` for `i <= rows / 2`
/// and `i - rows` otherwise; column `j` is the non-negative wavevector `j`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "FrameRaw")
)]
pub struct Frame {
    rows: usize,
    cols: usize,
    #[cfg_attr(feature = "serialization", serde(with = "crate::serde_complex"))]
    data: Vec<Complex64>,
}

/// Unchecked serialized form of a [`Frame`].
#[cfg(feature = "serialization")]
#[derive(serde::Deserialize)]
struct FrameRaw {
    rows: usize,
    cols: usize,
    #[serde(with = "crate::serde_complex")]
    data: Vec<Complex64>,
}

#[cfg(feature = "serialization")]
impl TryFrom<FrameRaw> for Frame {
    type Error = crate::error::Error;

    fn try_from(raw: FrameRaw) -> Result<Self> {
        Frame::new(raw.rows, raw.cols, raw.data)
    }
}

impl Frame {
    /// Wrap row-major data. Fails when `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<Complex64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(ConfigurationError::EmptyShape { rows, cols }.into());
        }
        if data.len() != rows * cols {
            return Err(ConfigurationError::Invalid(format!(
                "frame data has {} values, shape {}x{} needs {}",
                data.len(),
                rows,
                cols,
                rows * cols
            ))
            .into());
        }
        Ok(Self { rows, cols, data })
    }

    /// A frame of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Complex64::new(0.0, 0.0); rows * cols],
        }
    }

    /// Build a frame from a function of `(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Complex64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of pixels (wavevectors).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Complex64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<Complex64> {
        self.data
    }

    /// Element-wise `self += other`. Shapes must already agree.
    pub(crate) fn add_assign(&mut self, other: &Frame) {
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        for a in &mut self.data {
            *a *= factor;
        }
    }
}

/// One synchronized acquisition: a frame from each camera with its timestamp.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct FramePair {
    pub frame1: Frame,
    pub frame2: Frame,
    /// Channel 1 timestamp in acquisition ticks.
    pub t1: i64,
    /// Channel 2 timestamp in acquisition ticks.
    pub t2: i64,
}

impl FramePair {
    pub fn new(frame1: Frame, frame2: Frame, t1: i64, t2: i64) -> Self {
        Self {
            frame1,
            frame2,
            t1,
            t2,
        }
    }

    /// Pair a frame with itself at a single timestamp (auto-correlation input).
    pub fn same(frame: Frame, t: i64) -> Self {
        Self {
            frame2: frame.clone(),
            frame1: frame,
            t1: t,
            t2: t,
        }
    }
}
