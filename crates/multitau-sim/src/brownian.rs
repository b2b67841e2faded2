//! Two-camera Brownian motion simulator.
//!
//! Particles diffuse on a periodic `height × width` field. Both cameras
//! image the same particles as Gaussian spots and add their own
//! independent noise. Every image is transformed with a 2D FFT and
//! cropped to the `kimax`/`kjmax` window of the rfft2 layout.

use crate::error::{Error, Result};
use crate::source::{FrameSource, SourceFactory};
use multitau_core::{Complex64, Frame, FramePair};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, StandardNormal};
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BrownianConfig {
    /// `(height, width)` of the simulated images.
    pub shape: (usize, usize),
    pub particles: usize,
    /// Diffusion constant in pixel² per tick.
    pub diffusion: f64,
    /// Peak brightness of one particle.
    pub intensity: f64,
    /// Spot radius in pixels.
    pub sigma: f64,
    /// Standard deviation of each camera's pixel noise.
    pub noise: f64,
    pub kimax: usize,
    pub kjmax: usize,
}

impl Default for BrownianConfig {
    fn default() -> Self {
        Self {
            shape: (64, 64),
            particles: 100,
            diffusion: 0.01,
            intensity: 10.0,
            sigma: 1.0,
            noise: 0.0,
            kimax: 16,
            kjmax: 16,
        }
    }
}

impl BrownianConfig {
    /// Default: (64, 64)
    pub fn shape(mut self, height: usize, width: usize) -> Self {
        self.shape = (height, width);
        self
    }

    /// Default: 100
    pub fn particles(mut self, particles: usize) -> Self {
        self.particles = particles;
        self
    }

    /// Default: 0.01
    pub fn diffusion(mut self, diffusion: f64) -> Self {
        self.diffusion = diffusion;
        self
    }

    /// Default: 10.0
    pub fn intensity(mut self, intensity: f64) -> Self {
        self.intensity = intensity;
        self
    }

    /// Default: 1.0
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Default: 0.0
    pub fn noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    /// Default: (16, 16)
    pub fn crop(mut self, kimax: usize, kjmax: usize) -> Self {
        self.kimax = kimax;
        self.kjmax = kjmax;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let (height, width) = self.shape;
        if height == 0 || width == 0 {
            return Err(Error::InvalidParameter(format!(
                "image shape {}x{} has a zero dimension",
                height, width
            )));
        }
        if 2 * self.kimax + 1 > height || self.kjmax > width / 2 {
            return Err(Error::InvalidParameter(format!(
                "crop kimax={}, kjmax={} exceeds image {}x{}",
                self.kimax, self.kjmax, height, width
            )));
        }
        if self.particles == 0 {
            return Err(Error::InvalidParameter("no particles".to_string()));
        }
        if !(self.diffusion.is_finite() && self.diffusion >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "diffusion {} must be finite and non-negative",
                self.diffusion
            )));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "sigma {} must be positive",
                self.sigma
            )));
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "noise {} must be finite and non-negative",
                self.noise
            )));
        }
        Ok(())
    }

    /// `(rows, cols)` of the cropped frames.
    pub fn frame_shape(&self) -> (usize, usize) {
        (2 * self.kimax + 1, self.kjmax + 1)
    }

    /// Decay rate (per tick) of wavevector `(i, j)`.
    pub fn decay_rate(&self, i: i64, j: i64) -> f64 {
        let ki = 2.0 * PI * i as f64 / self.shape.0 as f64;
        let kj = 2.0 * PI * j as f64 / self.shape.1 as f64;
        self.diffusion * (ki * ki + kj * kj)
    }

    /// Model correlation `exp(-rate · lag)` of wavevector `(i, j)`.
    pub fn model(&self, i: i64, j: i64, lag: f64) -> f64 {
        (-self.decay_rate(i, j) * lag).exp()
    }
}

/// Pixel noise of `config`; `None` for noiseless cameras.
fn noise_distribution(config: &BrownianConfig) -> Result<Option<Normal<f64>>> {
    if config.noise == 0.0 {
        return Ok(None);
    }
    Normal::new(0.0, config.noise)
        .map(Some)
        .map_err(|e| Error::InvalidParameter(format!("noise {}: {}", config.noise, e)))
}

/// Renders particle images and takes their cropped transforms.
struct Renderer {
    height: usize,
    width: usize,
    rows: usize,
    cols: usize,
    kimax: usize,
    sigma: f64,
    intensity: f64,
    radius: i64,
    noise: Option<Normal<f64>>,
    row_fft: Arc<dyn Fft<f64>>,
    col_fft: Arc<dyn Fft<f64>>,
    image: Vec<Complex64>,
    column: Vec<Complex64>,
    cropped: Vec<Complex64>,
}

impl Renderer {
    fn new(config: &BrownianConfig, noise: Option<Normal<f64>>) -> Self {
        let (height, width) = config.shape;
        let (rows, cols) = config.frame_shape();
        let mut planner = FftPlanner::new();
        Self {
            height,
            width,
            rows,
            cols,
            kimax: config.kimax,
            sigma: config.sigma,
            intensity: config.intensity,
            radius: (4.0 * config.sigma).ceil() as i64,
            noise,
            row_fft: planner.plan_fft_forward(width),
            col_fft: planner.plan_fft_forward(height),
            image: vec![Complex64::new(0.0, 0.0); height * width],
            column: vec![Complex64::new(0.0, 0.0); height],
            cropped: vec![Complex64::new(0.0, 0.0); rows * cols],
        }
    }

    fn render(&mut self, positions: &[(f64, f64)], rng: &mut StdRng) -> Frame {
        self.image.fill(Complex64::new(0.0, 0.0));
        let norm = -0.5 / (self.sigma * self.sigma);
        let (h, w) = (self.height as i64, self.width as i64);

        for &(y, x) in positions {
            let (cy, cx) = (y.floor() as i64, x.floor() as i64);
            for dy in -self.radius..=self.radius {
                let py = cy + dy;
                let wy = self.intensity * ((py as f64 - y).powi(2) * norm).exp();
                let row = py.rem_euclid(h) as usize * self.width;
                for dx in -self.radius..=self.radius {
                    let px = cx + dx;
                    let wx = ((px as f64 - x).powi(2) * norm).exp();
                    self.image[row + px.rem_euclid(w) as usize].re += wy * wx;
                }
            }
        }

        if let Some(noise) = self.noise {
            for value in &mut self.image {
                value.re += noise.sample(rng);
            }
        }

        // all rows at once, then only the kept columns
        self.row_fft.process(&mut self.image);
        for col in 0..self.cols {
            for (row, value) in self.column.iter_mut().enumerate() {
                *value = self.image[row * self.width + col];
            }
            self.col_fft.process(&mut self.column);
            for out_row in 0..self.rows {
                let src = if out_row <= self.kimax {
                    out_row
                } else {
                    self.height - (self.rows - out_row)
                };
                self.cropped[out_row * self.cols + col] = self.column[src];
            }
        }

        let cropped = &self.cropped;
        let cols = self.cols;
        Frame::from_fn(self.rows, self.cols, |i, j| cropped[i * cols + j])
    }
}

/// Simulated dual-camera video, yielding cropped transforms of both
/// cameras at the requested timestamps.
pub struct BrownianSimulation {
    config: BrownianConfig,
    t1: Arc<[i64]>,
    t2: Arc<[i64]>,
    index: usize,
    time: i64,
    positions: Vec<(f64, f64)>,
    rng: StdRng,
    camera_rngs: [StdRng; 2],
    renderer: Renderer,
}

impl BrownianSimulation {
    /// Simulation sampled at `t1` (camera 1) and `t2` (camera 2).
    ///
    /// Pair `k` must not start before pair `k - 1` ended.
    pub fn new(config: BrownianConfig, t1: Vec<i64>, t2: Vec<i64>, seed: u64) -> Result<Self> {
        config.validate()?;
        check_times(&t1, &t2)?;
        let noise = noise_distribution(&config)?;
        Ok(Self::start(config, noise, t1.into(), t2.into(), seed))
    }

    fn start(
        config: BrownianConfig,
        noise: Option<Normal<f64>>,
        t1: Arc<[i64]>,
        t2: Arc<[i64]>,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let (height, width) = config.shape;
        let positions = (0..config.particles)
            .map(|_| {
                (
                    rng.gen_range(0.0..height as f64),
                    rng.gen_range(0.0..width as f64),
                )
            })
            .collect();
        let camera_rngs = [
            StdRng::seed_from_u64(rng.gen()),
            StdRng::seed_from_u64(rng.gen()),
        ];
        let time = t1.first().zip(t2.first()).map_or(0, |(a, b)| *a.min(b));
        tracing::debug!(
            "Starting Brownian simulation: {} particles, {} pairs, seed {}",
            config.particles,
            t1.len(),
            seed
        );
        Self {
            renderer: Renderer::new(&config, noise),
            config,
            t1,
            t2,
            index: 0,
            time,
            positions,
            rng,
            camera_rngs,
        }
    }

    pub fn config(&self) -> &BrownianConfig {
        &self.config
    }

    fn advance(&mut self, to: i64) {
        let dt = to - self.time;
        if dt <= 0 {
            return;
        }
        let step = (2.0 * self.config.diffusion * dt as f64).sqrt();
        let (height, width) = (self.config.shape.0 as f64, self.config.shape.1 as f64);
        for (y, x) in &mut self.positions {
            let dy: f64 = self.rng.sample(StandardNormal);
            let dx: f64 = self.rng.sample(StandardNormal);
            *y = (*y + step * dy).rem_euclid(height);
            *x = (*x + step * dx).rem_euclid(width);
        }
        self.time = to;
    }

    fn capture(&mut self, camera: usize, at: i64) -> Frame {
        self.advance(at);
        self.renderer
            .render(&self.positions, &mut self.camera_rngs[camera])
    }
}

impl Iterator for BrownianSimulation {
    type Item = FramePair;

    fn next(&mut self) -> Option<FramePair> {
        let (a, b) = (*self.t1.get(self.index)?, *self.t2.get(self.index)?);
        self.index += 1;
        let (frame1, frame2) = if a <= b {
            let f1 = self.capture(0, a);
            (f1, self.capture(1, b))
        } else {
            let f2 = self.capture(1, b);
            (self.capture(0, a), f2)
        };
        Some(FramePair::new(frame1, frame2, a, b))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.t1.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl FrameSource for BrownianSimulation {
    fn shape(&self) -> (usize, usize) {
        self.config.frame_shape()
    }
}

/// Creates independent [`BrownianSimulation`]s sharing one configuration
/// and one set of timestamps.
#[derive(Debug, Clone)]
pub struct BrownianFactory {
    config: BrownianConfig,
    noise: Option<Normal<f64>>,
    t1: Arc<[i64]>,
    t2: Arc<[i64]>,
}

impl BrownianFactory {
    pub fn new(config: BrownianConfig, t1: Vec<i64>, t2: Vec<i64>) -> Result<Self> {
        config.validate()?;
        check_times(&t1, &t2)?;
        Ok(Self {
            noise: noise_distribution(&config)?,
            config,
            t1: t1.into(),
            t2: t2.into(),
        })
    }

    pub fn config(&self) -> &BrownianConfig {
        &self.config
    }
}

impl SourceFactory for BrownianFactory {
    type Source = BrownianSimulation;

    fn create(&self, seed: u64) -> BrownianSimulation {
        BrownianSimulation::start(
            self.config.clone(),
            self.noise,
            Arc::clone(&self.t1),
            Arc::clone(&self.t2),
            seed,
        )
    }

    fn shape(&self) -> (usize, usize) {
        self.config.frame_shape()
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.t1.len())
    }
}

fn check_times(t1: &[i64], t2: &[i64]) -> Result<()> {
    if t1.len() != t2.len() {
        return Err(Error::TimesLength {
            t1: t1.len(),
            t2: t2.len(),
        });
    }
    let mut previous_end = i64::MIN;
    for (index, (&a, &b)) in t1.iter().zip(t2).enumerate() {
        let start = a.min(b);
        if start < previous_end {
            return Err(Error::UnorderedTimes {
                index,
                start,
                previous_end,
            });
        }
        previous_end = a.max(b);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::times::{random_times, regular_times};
    use approx::assert_relative_eq;

    fn small() -> BrownianConfig {
        BrownianConfig::default()
            .shape(16, 16)
            .particles(5)
            .crop(3, 2)
    }

    #[test]
    fn test_frame_shape_and_count() {
        let (t1, t2) = random_times(10, 4, 0);
        let sim = BrownianSimulation::new(small(), t1, t2, 1).unwrap();
        assert_eq!(sim.shape(), (7, 3));
        let pairs: Vec<FramePair> = sim.collect();
        assert_eq!(pairs.len(), 10);
        assert!(pairs.iter().all(|p| p.frame1.shape() == (7, 3)));
    }

    #[test]
    fn test_same_seed_same_frames() {
        let (t1, t2) = random_times(5, 4, 0);
        let factory = BrownianFactory::new(small().noise(0.5), t1, t2).unwrap();
        let a: Vec<FramePair> = factory.create(7).collect();
        let b: Vec<FramePair> = factory.create(7).collect();
        let c: Vec<FramePair> = factory.create(8).collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_wavevector_is_total_intensity() {
        let (t1, t2) = regular_times(3, 1);
        let config = small().sigma(0.7).intensity(2.0);
        let mut sim = BrownianSimulation::new(config, t1, t2, 3).unwrap();
        let pair = sim.next().unwrap();
        // integral of a sampled 2D Gaussian on a periodic grid
        let per_particle = 2.0 * 2.0 * PI * 0.7 * 0.7;
        assert_relative_eq!(pair.frame1.as_slice()[0].re, 5.0 * per_particle, max_relative = 1e-3);
        // no noise: both cameras see the same image at equal times
        assert_eq!(pair.frame1, pair.frame2);
    }

    #[test]
    fn test_independent_camera_noise() {
        let (t1, t2) = regular_times(1, 1);
        let mut sim = BrownianSimulation::new(small().noise(1.0), t1, t2, 3).unwrap();
        let pair = sim.next().unwrap();
        assert_ne!(pair.frame1, pair.frame2);
    }

    #[test]
    fn test_noise_distribution() {
        assert!(noise_distribution(&small()).unwrap().is_none());
        let normal = noise_distribution(&small().noise(2.0)).unwrap().unwrap();
        assert_relative_eq!(normal.mean(), 0.0);
        assert_relative_eq!(normal.std_dev(), 2.0);
    }

    /// Each axis moves by `sqrt(2·D·dt)` in the root mean square.
    #[test]
    fn test_step_variance_follows_diffusion() {
        let config = BrownianConfig::default()
            .shape(256, 256)
            .particles(4000)
            .diffusion(0.5)
            .crop(3, 2);
        let (t1, t2) = regular_times(1, 1);
        let mut sim = BrownianSimulation::new(config, t1, t2, 11).unwrap();
        let before = sim.positions.clone();
        sim.advance(sim.time + 4);

        let wrap = |d: f64| (d + 128.0).rem_euclid(256.0) - 128.0;
        let msd = before
            .iter()
            .zip(&sim.positions)
            .map(|(a, b)| wrap(b.0 - a.0).powi(2) + wrap(b.1 - a.1).powi(2))
            .sum::<f64>()
            / (2.0 * before.len() as f64);
        assert_relative_eq!(msd, 2.0 * 0.5 * 4.0, max_relative = 0.1);
    }

    #[test]
    fn test_decay_rate() {
        let config = BrownianConfig::default().shape(64, 32).diffusion(0.5);
        assert_relative_eq!(config.decay_rate(16, 0), 0.5 * (PI / 2.0).powi(2));
        assert_relative_eq!(config.decay_rate(0, 8), 0.5 * (PI / 2.0).powi(2));
        assert_relative_eq!(config.model(0, 0, 100.0), 1.0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(small().crop(8, 2).validate().is_err());
        assert!(small().sigma(0.0).validate().is_err());
        assert!(small().particles(0).validate().is_err());
        assert!(small().diffusion(f64::NAN).validate().is_err());
        assert_eq!(
            BrownianSimulation::new(small(), vec![0, 1], vec![0], 0).err(),
            Some(Error::TimesLength { t1: 2, t2: 1 })
        );
        assert!(matches!(
            BrownianFactory::new(small(), vec![0, 5], vec![6, 5]),
            Err(Error::UnorderedTimes { index: 1, .. })
        ));
    }
}
