//! Streaming multi-tau cross-correlation accumulator.

use crate::config::{AccumulatorConfig, BackgroundMode};
use crate::error::{ConfigurationError, Error, Result, Warning};
use crate::fast::FastCorrelator;
use crate::frame::{Frame, FramePair};
use crate::level::{Entry, Level, SlotBuffer};
use crate::stats::RunningStats;
use crate::table::Snapshot;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Incremental multi-tau correlator for pairs of frequency-domain frames.
///
/// Short lags (below [`crossover_lag`](Self::crossover_lag)) are correlated
/// exactly at full time resolution; longer lags are covered by slow levels
/// of dyadically coarser resolution. The accumulator owns all of its state,
/// including the generator behind [`BinningMode::Random`](crate::BinningMode::Random),
/// so independent instances can run on separate threads.
///
/// # Example
///
/// ```
/// use multitau_core::{AccumulatorConfig, Frame, FramePair, MultiTauAccumulator};
/// use rustfft::num_complex::Complex64;
///
/// let config = AccumulatorConfig::builder().shape(2, 2).level_size(4).build().unwrap();
/// let mut acc = MultiTauAccumulator::new(config).unwrap();
/// for t in 0..32 {
///     let frame = Frame::from_fn(2, 2, |i, j| Complex64::new((t + i + j) as f64, 0.0));
///     acc.update(&FramePair::same(frame, t as i64)).unwrap();
/// }
/// let snapshot = acc.finalize();
/// assert_eq!(snapshot.frames, 32);
/// assert_eq!(snapshot.level_count(), 6);
/// ```
#[derive(Debug)]
pub struct MultiTauAccumulator {
    config: AccumulatorConfig,
    fast: FastCorrelator,
    levels: Vec<Level>,
    slots: SlotBuffer,
    stats: RunningStats,
    rng: StdRng,
    frames: u64,
    last_times: Option<(i64, i64)>,
    warnings: Vec<Warning>,
    finalized: Option<Arc<Snapshot>>,
}

impl MultiTauAccumulator {
    pub fn new(config: AccumulatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fast: FastCorrelator::new(config.shape, config.crossover_lag()),
            levels: Vec::new(),
            slots: SlotBuffer::default(),
            stats: RunningStats::new(config.shape),
            rng: StdRng::seed_from_u64(config.seed),
            frames: 0,
            last_times: None,
            warnings: Vec::new(),
            finalized: None,
            config,
        })
    }

    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// Frame pairs ingested so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of slow levels created so far.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// First lag (in ticks) served by the slow levels.
    pub fn crossover_lag(&self) -> u64 {
        self.config.crossover_lag()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Ingest one synchronized frame pair.
    pub fn update(&mut self, pair: &FramePair) -> Result<()> {
        self.update_frames(&pair.frame1, &pair.frame2, pair.t1, pair.t2)
    }

    /// Ingest `frame1` taken at `t1` and `frame2` taken at `t2`.
    pub fn update_frames(&mut self, frame1: &Frame, frame2: &Frame, t1: i64, t2: i64) -> Result<()> {
        if self.finalized.is_some() {
            return Err(Error::Finalized);
        }
        for frame in [frame1, frame2] {
            if frame.shape() != self.config.shape {
                return Err(ConfigurationError::ShapeMismatch {
                    expected: self.config.shape,
                    actual: frame.shape(),
                }
                .into());
            }
        }
        if let Some((p1, p2)) = self.last_times {
            for (channel, previous, current) in [(1, p1, t1), (2, p2, t2)] {
                if current < previous {
                    return Err(Error::UnorderedTimestamp {
                        channel,
                        previous,
                        current,
                    });
                }
            }
        }
        self.last_times = Some((t1, t2));

        self.fast.update(frame1, t1, frame2, t2);
        if self.config.background == BackgroundMode::Auto {
            self.stats.add(frame1, frame2);
        }

        let slot = t1.min(t2).div_euclid(self.config.period as i64);
        if let Some(closed) = self.slots.add(slot, frame1, frame2) {
            self.push_entry(0, closed.entry);
            self.skip_slots(closed.skipped);
        }

        self.frames += 1;
        Ok(())
    }

    /// Current state as a snapshot.
    ///
    /// A pure read: the open time slot and half-filled bins are not
    /// included until [`finalize`](Self::finalize).
    pub fn snapshot(&self) -> Snapshot {
        if let Some(done) = &self.finalized {
            return (**done).clone();
        }
        self.build_snapshot(false)
    }

    /// Flush partial bins and freeze the accumulator.
    ///
    /// Idempotent: every call returns the same snapshot. Further
    /// [`update`](Self::update) calls fail with [`Error::Finalized`].
    pub fn finalize(&mut self) -> Arc<Snapshot> {
        if let Some(done) = &self.finalized {
            return Arc::clone(done);
        }

        if self.slots.is_open() {
            let entry = self.slots.take();
            self.push_entry(0, entry);
        }

        // Only levels that already feed a coarser level are flushed; the
        // coarsest level has nowhere to send its remainder.
        let mut level = 0;
        while level + 1 < self.levels.len() {
            if let Some(binned) = self.levels[level].flush(self.config.binning, &mut self.rng) {
                let warning = Warning::StarvedLevel {
                    level,
                    samples: 1,
                    capacity: 2,
                };
                tracing::warn!("Flushing partial bin: {}", warning);
                self.warnings.push(warning);
                self.push_entry(level + 1, binned);
            }
            level += 1;
        }

        let snapshot = Arc::new(self.build_snapshot(true));
        tracing::debug!(
            "Finalized after {} frames with {} slow levels",
            self.frames,
            self.levels.len()
        );
        self.finalized = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Feed `entry` into `level`, cascading completed bins upward.
    fn push_entry(&mut self, level: usize, entry: Option<Entry>) {
        let mut level = level;
        let mut entry = entry;
        loop {
            if !self.ensure_level(level) {
                return;
            }
            match self.levels[level].push(entry, self.config.binning, &mut self.rng) {
                Some(binned) => {
                    entry = binned;
                    level += 1;
                }
                None => return,
            }
        }
    }

    /// Feed `missing` empty level-0 slots through the tree. Each level
    /// halves the run, so a gap costs one step per level.
    fn skip_slots(&mut self, missing: u64) {
        if missing > self.config.level_size as u64 {
            tracing::debug!("Skipping {} empty slots", missing);
        }
        let mut level = 0;
        let mut missing = missing;
        while missing > 0 {
            if !self.ensure_level(level) {
                return;
            }
            let (head, rest) = self.levels[level].skip(missing, self.config.binning, &mut self.rng);
            if let Some(head) = head {
                self.push_entry(level + 1, head);
            }
            missing = rest;
            level += 1;
        }
    }

    /// Create `level` if it is the next one; false once `max_levels` is reached.
    fn ensure_level(&mut self, level: usize) -> bool {
        if level < self.levels.len() {
            return true;
        }
        if self.config.max_levels.is_some_and(|max| level >= max) {
            return false;
        }
        let lag_step = self.config.period << level;
        tracing::debug!("Creating level {} (lag step {} ticks)", level, lag_step);
        self.levels
            .push(Level::new(self.config.shape, self.config.level_size, lag_step));
        true
    }

    fn build_snapshot(&self, finalized: bool) -> Snapshot {
        let stats = match &self.config.background {
            BackgroundMode::Auto => self.stats.to_stats(),
            BackgroundMode::Provided(stats) => stats.clone(),
        };
        Snapshot {
            fast: self.fast.table().clone(),
            slow: self.levels.iter().map(|l| l.table().clone()).collect(),
            stats,
            frames: self.frames,
            warnings: self.warnings.clone(),
            finalized,
            level_size: self.config.level_size,
            period: self.config.period,
        }
    }
}

/// Slow levels expected after `slots` level-0 slots.
///
/// Mid-stream this is `1 + floor(log2 slots)`; after finalization, which
/// flushes half-filled bins, `1 + ceil(log2 slots)`. Both are capped by
/// `max_levels`.
pub fn expected_level_count(slots: u64, finalized: bool, max_levels: Option<usize>) -> usize {
    if slots == 0 {
        return 0;
    }
    let log2 = if finalized {
        (slots - 1).checked_ilog2().map_or(0, |l| l + 1)
    } else {
        slots.ilog2()
    };
    let levels = 1 + log2 as usize;
    max_levels.map_or(levels, |max| levels.min(max))
}
