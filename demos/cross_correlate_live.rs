//! # Live Cross-Correlation
//!
//! Stream simulated frame pairs through a ring buffer into a background
//! correlation thread and watch a ring-averaged curve converge.
//!
//! **Concepts:** Live correlation thread, lock-free snapshots, sector masks
//!
//! ```bash
//! RUST_LOG=debug cargo run --release --example cross_correlate_live
//! ```

use multitau::prelude::*;
use ringbuf::traits::{Producer, Split};
use ringbuf::HeapRb;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const PERIOD: u64 = 8;
const PAIRS: usize = 4096;

fn main() -> multitau::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let video = BrownianConfig::default().shape(64, 64).particles(100).noise(1.0).crop(8, 8);
    let (t1, t2) = random_times(PAIRS, PERIOD, 1);
    let source = BrownianFactory::new(video.clone(), t1, t2)?.create(0);

    let (rows, cols) = video.frame_shape();
    let config = AccumulatorConfig::builder()
        .shape(rows, cols)
        .period(PERIOD)
        .level_size(16)
        .build()?;
    let accumulator = MultiTauAccumulator::new(config)?;

    let (mut producer, consumer) = HeapRb::<FramePair>::new(256).split();
    let state = Arc::new(LiveCorrelationState::new(accumulator.snapshot()));
    let worker_state = state.clone();
    let worker = thread::spawn(move || run_correlation_thread(consumer, accumulator, worker_state, 256));

    let handle = CorrelationHandle::new(state, NormalizeOptions::default());
    let kmap = KMap::new(rows, cols, video.shape)?;
    let mask = SectorMask::new(&kmap, 4, 0.0, 180.0, 1.0);

    for (i, pair) in source.enumerate() {
        let mut pending = pair;
        while let Err(back) = producer.try_push(pending) {
            pending = back;
            thread::sleep(Duration::from_micros(200));
        }
        if (i + 1) % 1024 == 0 {
            let (lags, curve) = handle.curve(&mask)?;
            report(handle.frames(), &lags, &curve);
        }
    }

    handle.stop();
    let snapshot = worker.join().expect("correlation thread panicked")?;
    for warning in &snapshot.warnings {
        tracing::warn!("{}", warning);
    }

    let (lags, curve) = handle.curve(&mask)?;
    println!("final:");
    report(snapshot.frames, &lags, &curve);
    Ok(())
}

fn report(frames: u64, lags: &[f64], curve: &[f64]) {
    let points: Vec<String> = lags
        .iter()
        .zip(curve)
        .step_by(8)
        .map(|(lag, g)| format!("{}:{:.3}", lag, g))
        .collect();
    println!("{:>6} pairs  {}", frames, points.join(" "));
}
