//! Linear correlator covering short lags at full time resolution.

use crate::frame::Frame;
use crate::table::CorrelationTable;
use std::collections::VecDeque;

/// Correlates every channel-1 frame with every channel-2 frame whose
/// timestamp lies within `max_lag` ticks, each pair exactly once.
#[derive(Debug, Clone)]
pub(crate) struct FastCorrelator {
    table: CorrelationTable,
    max_lag: u64,
    buffer1: VecDeque<(i64, Frame)>,
    buffer2: VecDeque<(i64, Frame)>,
}

impl FastCorrelator {
    pub(crate) fn new(shape: (usize, usize), max_lag: u64) -> Self {
        Self {
            table: CorrelationTable::new(shape, max_lag as usize, 1),
            max_lag,
            buffer1: VecDeque::new(),
            buffer2: VecDeque::new(),
        }
    }

    pub(crate) fn table(&self) -> &CorrelationTable {
        &self.table
    }

    fn lag_index(&self, a: i64, b: i64) -> Option<usize> {
        let lag = a.abs_diff(b);
        (lag < self.max_lag).then_some(lag as usize)
    }

    pub(crate) fn update(&mut self, x1: &Frame, t1: i64, x2: &Frame, t2: i64) {
        // new x1 against buffered x2 and the new x2
        for (tb, f2) in &self.buffer2 {
            if let Some(lag) = self.lag_index(t1, *tb) {
                self.table.accumulate(lag, x1, f2);
            }
        }
        if let Some(lag) = self.lag_index(t1, t2) {
            self.table.accumulate(lag, x1, x2);
        }
        // buffered x1 against the new x2
        for (ta, f1) in &self.buffer1 {
            if let Some(lag) = self.lag_index(*ta, t2) {
                self.table.accumulate(lag, f1, x2);
            }
        }

        self.buffer1.push_back((t1, x1.clone()));
        self.buffer2.push_back((t2, x2.clone()));

        // Timestamps only grow, so a frame too old for the latest partner
        // timestamp is too old for every later one.
        let max_lag = self.max_lag as i64;
        while self
            .buffer1
            .front()
            .is_some_and(|(ta, _)| *ta <= t2 - max_lag)
        {
            self.buffer1.pop_front();
        }
        while self
            .buffer2
            .front()
            .is_some_and(|(tb, _)| *tb <= t1 - max_lag)
        {
            self.buffer2.pop_front();
        }
    }
}
