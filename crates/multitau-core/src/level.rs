//! Slow levels of the multi-tau tree.
//!
//! Level 0 runs on one entry per `period` ticks; level `ℓ` on one entry per
//! `period · 2^ℓ` ticks. Each entry is correlated against the previous
//! `level_size - 1` entries of its level, and every two entries form one
//! entry of the next level.

use crate::config::BinningMode;
use crate::frame::Frame;
use crate::table::CorrelationTable;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::VecDeque;

/// Both channels of one time slot. `None` at the use sites marks a slot
/// in which nothing was acquired.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub(crate) x1: Frame,
    pub(crate) x2: Frame,
}

impl Entry {
    fn average(mut self, other: &Entry) -> Entry {
        self.x1.add_assign(&other.x1);
        self.x2.add_assign(&other.x2);
        self.x1.scale(0.5);
        self.x2.scale(0.5);
        self
    }
}

/// Combine two consecutive entries into one entry of the next level.
pub(crate) fn bin(
    first: Option<Entry>,
    second: Option<Entry>,
    mode: BinningMode,
    rng: &mut StdRng,
) -> Option<Entry> {
    match (first, second) {
        (None, None) => None,
        (Some(a), None) | (None, Some(a)) => Some(a),
        (Some(a), Some(b)) => match mode {
            BinningMode::Decimate => Some(a),
            BinningMode::Average => Some(a.average(&b)),
            BinningMode::Random => {
                if rng.gen_bool(0.5) {
                    Some(a)
                } else {
                    Some(b)
                }
            }
        },
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Level {
    table: CorrelationTable,
    /// Previous entries, most recent first.
    history: VecDeque<Option<Entry>>,
    /// First half of the bin being filled.
    pending: Option<Option<Entry>>,
    received: u64,
}

impl Level {
    pub(crate) fn new(shape: (usize, usize), level_size: usize, lag_step: u64) -> Self {
        Self {
            table: CorrelationTable::new(shape, level_size, lag_step),
            history: VecDeque::with_capacity(level_size),
            pending: None,
            received: 0,
        }
    }

    pub(crate) fn table(&self) -> &CorrelationTable {
        &self.table
    }

    #[cfg(test)]
    pub(crate) fn received(&self) -> u64 {
        self.received
    }

    #[cfg(test)]
    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Correlate `entry` against this level's history and return a completed
    /// bin for the next level, if `entry` closes one.
    pub(crate) fn push(
        &mut self,
        entry: Option<Entry>,
        mode: BinningMode,
        rng: &mut StdRng,
    ) -> Option<Option<Entry>> {
        self.correlate(&entry);
        self.received += 1;

        self.history.push_front(entry.clone());
        self.history.truncate(self.table.lags() - 1);

        match self.pending.take() {
            None => {
                self.pending = Some(entry);
                None
            }
            Some(first) => Some(bin(first, entry, mode, rng)),
        }
    }

    /// Account for `missing` consecutive empty entries at once.
    ///
    /// Equivalent to pushing `missing` times `None`: returns the bin closed
    /// by the first of them, if one was pending, and the number of empty
    /// bins that follow it. Work is bounded by the history length, not by
    /// `missing`.
    pub(crate) fn skip(
        &mut self,
        missing: u64,
        mode: BinningMode,
        rng: &mut StdRng,
    ) -> (Option<Option<Entry>>, u64) {
        if missing == 0 {
            return (None, 0);
        }
        self.received += missing;

        let keep = self.table.lags() - 1;
        let blanks = missing.min(keep as u64) as usize;
        for _ in 0..blanks {
            self.history.push_front(None);
        }
        self.history.truncate(keep);

        let (head, rest) = match self.pending.take() {
            Some(first) => (Some(bin(first, None, mode, rng)), missing - 1),
            None => (None, missing),
        };
        if rest % 2 == 1 {
            self.pending = Some(None);
        }
        (head, rest / 2)
    }

    /// Take the half-filled bin, completing it with the samples available.
    pub(crate) fn flush(&mut self, mode: BinningMode, rng: &mut StdRng) -> Option<Option<Entry>> {
        self.pending
            .take()
            .map(|first| bin(first, None, mode, rng))
    }

    fn correlate(&mut self, entry: &Option<Entry>) {
        let Some(current) = entry else {
            return;
        };
        self.table.accumulate(0, &current.x1, &current.x2);
        for (i, previous) in self.history.iter().enumerate() {
            if let Some(previous) = previous {
                let lag = i + 1;
                self.table.accumulate(lag, &current.x1, &previous.x2);
                self.table.accumulate(lag, &previous.x1, &current.x2);
            }
        }
    }
}

/// A level-0 slot closed by a pair in a later slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Closed {
    pub(crate) entry: Option<Entry>,
    /// Empty slots between the closed slot and the new one.
    pub(crate) skipped: u64,
}

/// Averages the pairs that fall into one level-0 slot.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlotBuffer {
    slot: Option<i64>,
    sum: Option<Entry>,
    count: u32,
}

impl SlotBuffer {
    /// Add a pair to slot `slot`, returning the previous slot if this call
    /// closes it.
    pub(crate) fn add(&mut self, slot: i64, x1: &Frame, x2: &Frame) -> Option<Closed> {
        let closed = match self.slot {
            Some(current) if slot == current => None,
            Some(current) => {
                let entry = self.take();
                self.slot = Some(slot);
                Some(Closed {
                    entry,
                    skipped: slot.abs_diff(current).saturating_sub(1),
                })
            }
            None => {
                self.slot = Some(slot);
                None
            }
        };
        match &mut self.sum {
            Some(sum) => {
                sum.x1.add_assign(x1);
                sum.x2.add_assign(x2);
            }
            None => {
                self.sum = Some(Entry {
                    x1: x1.clone(),
                    x2: x2.clone(),
                })
            }
        }
        self.count += 1;
        closed
    }

    /// Close the open slot.
    pub(crate) fn take(&mut self) -> Option<Entry> {
        let count = core::mem::take(&mut self.count);
        self.sum.take().map(|mut entry| {
            if count > 1 {
                let factor = 1.0 / count as f64;
                entry.x1.scale(factor);
                entry.x2.scale(factor);
            }
            entry
        })
    }

    pub(crate) fn is_open(&self) -> bool {
        self.sum.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rustfft::num_complex::Complex64;

    fn entry(v: f64) -> Option<Entry> {
        let frame = Frame::from_fn(1, 1, |_, _| Complex64::new(v, 0.0));
        Some(Entry {
            x1: frame.clone(),
            x2: frame,
        })
    }

    fn value(entry: &Option<Entry>) -> f64 {
        entry.as_ref().unwrap().x1.as_slice()[0].re
    }

    #[test]
    fn test_bin_modes() {
        let mut rng = StdRng::seed_from_u64(0);
        let avg = bin(entry(1.0), entry(3.0), BinningMode::Average, &mut rng);
        assert_eq!(value(&avg), 2.0);
        let dec = bin(entry(1.0), entry(3.0), BinningMode::Decimate, &mut rng);
        assert_eq!(value(&dec), 1.0);
        let rnd = bin(entry(1.0), entry(3.0), BinningMode::Random, &mut rng);
        assert!(value(&rnd) == 1.0 || value(&rnd) == 3.0);
        let partial = bin(None, entry(5.0), BinningMode::Average, &mut rng);
        assert_eq!(value(&partial), 5.0);
        assert!(bin(None, None, BinningMode::Average, &mut rng).is_none());
    }

    #[test]
    fn test_level_emits_every_second_entry() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut level = Level::new((1, 1), 4, 1);
        let mut emitted = 0;
        for i in 0..7 {
            if level.push(entry(i as f64), BinningMode::Average, &mut rng).is_some() {
                emitted += 1;
            }
        }
        assert_eq!(emitted, 3);
        assert!(level.has_pending());
        assert_eq!(level.table().counts(), &[7, 12, 10, 8]);
        assert!(level.flush(BinningMode::Average, &mut rng).is_some());
        assert!(!level.has_pending());
    }

    #[test]
    fn test_missing_entries_contribute_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut level = Level::new((1, 1), 3, 1);
        level.push(entry(1.0), BinningMode::Average, &mut rng);
        level.push(None, BinningMode::Average, &mut rng);
        level.push(entry(1.0), BinningMode::Average, &mut rng);
        assert_eq!(level.table().counts(), &[2, 0, 2]);
        assert_eq!(level.received(), 3);
    }

    #[test]
    fn test_skip_matches_pushing_empty_entries() {
        for prefill in 0..5 {
            for missing in 0..13u64 {
                let mut rng = StdRng::seed_from_u64(0);
                let mut pushed = Level::new((1, 1), 4, 1);
                let mut skipped = Level::new((1, 1), 4, 1);
                for i in 0..prefill {
                    pushed.push(entry(i as f64), BinningMode::Average, &mut rng);
                    skipped.push(entry(i as f64), BinningMode::Average, &mut rng);
                }

                let expected: Vec<Option<Entry>> = (0..missing)
                    .filter_map(|_| pushed.push(None, BinningMode::Average, &mut rng))
                    .collect();
                let (head, nones) = skipped.skip(missing, BinningMode::Average, &mut rng);
                let actual: Vec<Option<Entry>> = head
                    .into_iter()
                    .chain((0..nones).map(|_| None))
                    .collect();

                assert_eq!(actual, expected, "prefill {} missing {}", prefill, missing);
                assert_eq!(skipped.history, pushed.history);
                assert_eq!(skipped.pending, pushed.pending);
                assert_eq!(skipped.received(), pushed.received());
            }
        }
    }

    #[test]
    fn test_slot_buffer_averages_and_counts_gaps() {
        let mut slots = SlotBuffer::default();
        let one = Frame::from_fn(1, 1, |_, _| Complex64::new(1.0, 0.0));
        let three = Frame::from_fn(1, 1, |_, _| Complex64::new(3.0, 0.0));
        assert!(slots.add(0, &one, &one).is_none());
        assert!(slots.add(0, &three, &three).is_none());
        let closed = slots.add(3, &one, &one).unwrap();
        assert_eq!(value(&closed.entry), 2.0);
        assert_eq!(closed.skipped, 2);
        assert_eq!(slots.add(4, &one, &one).unwrap().skipped, 0);
        assert!(slots.is_open());
        assert_eq!(value(&slots.take()), 1.0);
        assert!(!slots.is_open());
    }
}
