//! Correlation handle for convenient API access

use crate::cache::{CurveCache, CurveKey};
use crate::live::LiveCorrelationState;
use crate::mask::SectorMask;
use crate::merge::Merged;
use crate::normalize::{normalize_multi, NormalizeOptions};
use multitau_core::{Result, Snapshot};
use std::sync::{Arc, Mutex};

/// Handle for reading live correlation results.
///
/// Normalizes and merges the latest published snapshot on demand. Results
/// are cached per snapshot, so repeated reads between publishes are cheap.
pub struct CorrelationHandle {
    live: Arc<LiveCorrelationState>,
    options: NormalizeOptions,
    curve_cache: Arc<Mutex<CurveCache>>,
}

impl CorrelationHandle {
    pub fn new(live: Arc<LiveCorrelationState>, options: NormalizeOptions) -> Self {
        Self {
            live,
            options,
            curve_cache: Arc::new(Mutex::new(CurveCache::new(16))),
        }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Change the normalization used by [`merged`](Self::merged).
    pub fn set_options(&mut self, options: NormalizeOptions) {
        self.options = options;
    }

    /// Whether the correlation thread is still accepting frames.
    pub fn is_running(&self) -> bool {
        self.live.is_running()
    }

    /// Signal the correlation thread to stop and finalize.
    pub fn stop(&self) {
        self.live.stop();
    }

    /// Frame pairs ingested so far.
    pub fn frames(&self) -> u64 {
        self.live.frames()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.live.snapshot.load_full()
    }

    /// Latest snapshot, normalized and merged onto one lag axis.
    pub fn merged(&self) -> Result<Arc<Merged>> {
        let snapshot = self.snapshot();
        let key = CurveKey::new(snapshot.frames, snapshot.finalized, &self.options);
        let compute = || normalize_multi(&snapshot, &self.options)?.merge();
        match self.curve_cache.lock() {
            Ok(mut cache) => cache.get_or_try_compute(key, compute),
            // A poisoned cache only loses memoization.
            Err(_) => compute().map(Arc::new),
        }
    }

    /// Lag axis and mask-averaged curve of the latest snapshot.
    pub fn curve(&self, mask: &SectorMask) -> Result<(Vec<f64>, Vec<f64>)> {
        let merged = self.merged()?;
        let values = merged.average(mask)?;
        Ok((merged.lags().to_vec(), values))
    }
}
