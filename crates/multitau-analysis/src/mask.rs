//! Wavevector maps and sector masks on the cropped rfft2 grid.
//!
//! Rows hold wavevectors in FFT order (`0, 1, .., kimax, -kimax, .., -1`),
//! columns the non-negative wavevectors `0..=kjmax`.

use multitau_core::{ConfigurationError, Result};

/// `|k|` and angle of every pixel of a cropped frame.
#[derive(Debug, Clone, PartialEq)]
pub struct KMap {
    shape: (usize, usize),
    k: Vec<f64>,
    angle: Vec<f64>,
}

impl KMap {
    /// Map for a `rows × cols` crop of the transform of `full_shape` images.
    ///
    /// `|k|` is in units of the smallest wavevector step; the angle is in
    /// degrees from the column axis, within `[-90, 90]`.
    pub fn new(rows: usize, cols: usize, full_shape: (usize, usize)) -> Result<Self> {
        let (height, width) = full_shape;
        if rows == 0 || cols == 0 {
            return Err(ConfigurationError::EmptyShape { rows, cols }.into());
        }
        if height == 0 || width == 0 {
            return Err(ConfigurationError::EmptyShape {
                rows: height,
                cols: width,
            }
            .into());
        }

        let unit = height.max(width) as f64;
        let scale_i = unit / height as f64;
        let scale_j = unit / width as f64;
        let mut k = Vec::with_capacity(rows * cols);
        let mut angle = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            let ki = signed_row(row, rows) as f64 * scale_i;
            for col in 0..cols {
                let kj = col as f64 * scale_j;
                k.push(ki.hypot(kj));
                angle.push(ki.atan2(kj).to_degrees());
            }
        }
        Ok(Self {
            shape: (rows, cols),
            k,
            angle,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn k(&self) -> &[f64] {
        &self.k
    }

    pub fn angle(&self) -> &[f64] {
        &self.angle
    }
}

/// Wavevector of row `row` in FFT order.
pub fn signed_row(row: usize, rows: usize) -> i64 {
    if row <= rows / 2 {
        row as i64
    } else {
        row as i64 - rows as i64
    }
}

/// Pixels of one `|k|` ring restricted to an angular sector.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorMask {
    shape: (usize, usize),
    selected: Vec<bool>,
}

impl SectorMask {
    /// Select pixels with `round(|k| / kstep) == k` whose angle lies within
    /// `sector / 2` degrees of `angle`. Angles are compared modulo 180°.
    pub fn new(kmap: &KMap, k: usize, angle: f64, sector: f64, kstep: f64) -> Self {
        let half = 0.5 * sector;
        let selected = kmap
            .k
            .iter()
            .zip(&kmap.angle)
            .map(|(&kk, &a)| {
                let ring = (kk / kstep).round();
                let diff = (a - angle + 90.0).rem_euclid(180.0) - 90.0;
                ring == k as f64 && diff.abs() <= half
            })
            .collect();
        Self {
            shape: kmap.shape,
            selected,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn is_empty(&self) -> bool {
        !self.selected.iter().any(|&s| s)
    }

    /// Number of selected pixels.
    pub fn count(&self) -> usize {
        self.selected.iter().filter(|&&s| s).count()
    }

    pub fn contains(&self, pixel: usize) -> bool {
        self.selected.get(pixel).copied().unwrap_or(false)
    }

    /// Indices of the selected pixels, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i))
    }

    /// Mean `|k|` of the selected pixels.
    pub fn mean_k(&self, kmap: &KMap) -> Option<f64> {
        let n = self.count();
        (n > 0).then(|| self.pixels().map(|p| kmap.k[p]).sum::<f64>() / n as f64)
    }
}
