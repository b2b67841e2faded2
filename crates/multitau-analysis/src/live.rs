//! Live correlation via ring buffer tap.
//!
//! Runs the accumulator on a background thread, reading frame pairs from a
//! SPSC ring buffer fed by the acquisition loop. Snapshots are published
//! via `ArcSwap` for lock-free reads from any thread.

use arc_swap::ArcSwap;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use multitau_core::{FramePair, MultiTauAccumulator, Result, Snapshot};
use ringbuf::{
    traits::{Consumer, Observer},
    HeapCons,
};
use std::sync::Arc;

/// Shared state between the correlation thread and `CorrelationHandle`.
///
/// All fields are lock-free for reads from any thread.
pub struct LiveCorrelationState {
    /// Latest published snapshot.
    pub snapshot: ArcSwap<Snapshot>,
    /// Frame pairs ingested so far.
    frames: AtomicU64,
    /// Set to false to signal the correlation thread to stop.
    running: AtomicBool,
}

impl LiveCorrelationState {
    /// Create state holding `initial` (usually the empty snapshot of a
    /// fresh accumulator).
    pub fn new(initial: Snapshot) -> Self {
        Self {
            frames: AtomicU64::new(initial.frames),
            snapshot: ArcSwap::from_pointee(initial),
            running: AtomicBool::new(true),
        }
    }

    /// Signal the correlation thread to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Check if the correlation thread should keep running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Frame pairs ingested, possibly ahead of the published snapshot.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    fn publish(&self, snapshot: Arc<Snapshot>) {
        tracing::debug!(
            "Publishing snapshot: {} frames, {} levels",
            snapshot.frames,
            snapshot.level_count()
        );
        self.snapshot.store(snapshot);
    }
}

/// Run the live correlation loop.
///
/// Drains frame pairs from `consumer` into `accumulator` and publishes a
/// snapshot every `publish_every` pairs. Once `state.stop()` is called the
/// pairs still queued are ingested, the accumulator is finalized and the
/// final snapshot is published and returned.
///
/// This function blocks until `state.stop()` is called or an update fails.
pub fn run_correlation_thread(
    mut consumer: HeapCons<FramePair>,
    mut accumulator: MultiTauAccumulator,
    state: Arc<LiveCorrelationState>,
    publish_every: u64,
) -> Result<Arc<Snapshot>> {
    let publish_every = publish_every.max(1);
    let mut since_publish = 0u64;

    loop {
        let running = state.is_running();

        if consumer.occupied_len() == 0 {
            if !running {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
            continue;
        }

        while let Some(pair) = consumer.try_pop() {
            if let Err(e) = accumulator.update(&pair) {
                tracing::warn!("Correlation thread stopped: {}", e);
                state.publish(Arc::new(accumulator.snapshot()));
                return Err(e);
            }
            state.frames.store(accumulator.frames(), Ordering::Release);
            since_publish += 1;
            if since_publish >= publish_every {
                since_publish = 0;
                state.publish(Arc::new(accumulator.snapshot()));
            }
        }
    }

    let snapshot = accumulator.finalize();
    state.publish(Arc::clone(&snapshot));
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use multitau_core::{AccumulatorConfig, Complex64, Error, Frame};
    use ringbuf::{traits::Producer, traits::Split, HeapRb};

    fn accumulator() -> MultiTauAccumulator {
        let config = AccumulatorConfig::builder()
            .shape(2, 2)
            .level_size(4)
            .build()
            .unwrap();
        MultiTauAccumulator::new(config).unwrap()
    }

    fn pair(t: i64) -> FramePair {
        FramePair::same(
            Frame::from_fn(2, 2, |i, j| Complex64::new((t as f64 * 0.3).sin() + (i + j) as f64, 0.0)),
            t,
        )
    }

    #[test]
    fn test_live_state_creation() {
        let acc = accumulator();
        let state = LiveCorrelationState::new(acc.snapshot());
        assert!(state.is_running());
        assert_eq!(state.frames(), 0);
        assert!(!state.snapshot.load().finalized);
    }

    #[test]
    fn test_correlation_thread_drains_and_finalizes() {
        let rb = HeapRb::<FramePair>::new(256);
        let (mut prod, cons) = rb.split();

        let acc = accumulator();
        let state = Arc::new(LiveCorrelationState::new(acc.snapshot()));
        let state2 = state.clone();

        for t in 0..100 {
            assert!(prod.try_push(pair(t)).is_ok());
        }

        let handle = std::thread::spawn(move || run_correlation_thread(cons, acc, state2, 10));

        std::thread::sleep(std::time::Duration::from_millis(50));
        state.stop();
        let result = handle.join().unwrap().unwrap();

        assert_eq!(result.frames, 100);
        assert!(result.finalized);
        assert_eq!(state.frames(), 100);
        assert!(Arc::ptr_eq(&result, &state.snapshot.load_full()));
    }

    #[test]
    fn test_stop_before_start_still_drains() {
        let rb = HeapRb::<FramePair>::new(16);
        let (mut prod, cons) = rb.split();
        for t in 0..5 {
            assert!(prod.try_push(pair(t)).is_ok());
        }
        let acc = accumulator();
        let state = Arc::new(LiveCorrelationState::new(acc.snapshot()));
        state.stop();
        let result = run_correlation_thread(cons, acc, state.clone(), 0).unwrap();
        assert_eq!(result.frames, 5);
    }

    #[test]
    fn test_update_error_is_returned() {
        let rb = HeapRb::<FramePair>::new(16);
        let (mut prod, cons) = rb.split();
        assert!(prod.try_push(pair(5)).is_ok());
        assert!(prod.try_push(pair(2)).is_ok());
        let acc = accumulator();
        let state = Arc::new(LiveCorrelationState::new(acc.snapshot()));
        let result = run_correlation_thread(cons, acc, state.clone(), 1);
        assert!(matches!(result, Err(Error::UnorderedTimestamp { .. })));
        assert_eq!(state.snapshot.load().frames, 1);
    }
}
