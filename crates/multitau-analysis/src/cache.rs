//! LRU cache of merged curves, keyed by snapshot progress and options.

use crate::merge::Merged;
use crate::normalize::{Estimator, NormalizeOptions, VariancePolicy};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Identifies one normalized, merged result of one snapshot. Every option
/// that can change a value, or turn it into an error, is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurveKey {
    pub frames: u64,
    pub finalized: bool,
    pub mode: u8,
    pub scale: bool,
    pub policy: VariancePolicy,
    /// Bit pattern of the variance epsilon.
    pub epsilon: u64,
    pub estimator: Estimator,
}

impl CurveKey {
    pub fn new(frames: u64, finalized: bool, options: &NormalizeOptions) -> Self {
        Self {
            frames,
            finalized,
            mode: options.mode.bits(),
            scale: options.scale,
            policy: options.policy,
            epsilon: options.epsilon.to_bits(),
            estimator: options.estimator,
        }
    }
}

pub struct CurveCache {
    memory_cache: LruCache<CurveKey, Arc<Merged>>,
}

impl CurveCache {
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            memory_cache: LruCache::new(capacity),
        }
    }

    /// Returns the cached curve, or computes and stores it.
    pub fn get_or_try_compute<E, F>(&mut self, key: CurveKey, compute: F) -> Result<Arc<Merged>, E>
    where
        F: FnOnce() -> Result<Merged, E>,
    {
        if let Some(merged) = self.memory_cache.get(&key) {
            return Ok(Arc::clone(merged));
        }
        let merged = Arc::new(compute()?);
        self.memory_cache.put(key, Arc::clone(&merged));
        Ok(merged)
    }

    pub fn get(&mut self, key: &CurveKey) -> Option<Arc<Merged>> {
        self.memory_cache.get(key).cloned()
    }

    pub fn clear(&mut self) {
        self.memory_cache.clear();
    }

    pub fn len(&self) -> usize {
        self.memory_cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory_cache.is_empty()
    }
}
