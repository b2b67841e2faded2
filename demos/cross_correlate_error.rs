//! # Cross-Correlation Error
//!
//! Simulate repeated randomly-triggered dual-camera experiments and compare
//! the scatter of the measured curves with the counting error models.
//!
//! **Concepts:** Brownian simulation, trial sets, normalization modes, error estimates
//!
//! ```bash
//! RUST_LOG=info cargo run --release --example cross_correlate_error
//! ```

use multitau::prelude::*;
use multitau::{corr_error, diff_error, weighted_error};
use tracing_subscriber::EnvFilter;

const PERIOD: u64 = 16;
const PAIRS: usize = 1024;
const TRIALS: usize = 16;
const KI: usize = 4;

fn main() -> multitau::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let video = BrownianConfig::default()
        .shape(64, 64)
        .particles(100)
        .diffusion(0.2)
        .noise(2.0)
        .crop(16, 0);
    let (t1, t2) = random_times(PAIRS, PERIOD, 0);
    let factory = BrownianFactory::new(video.clone(), t1, t2)?;

    let (rows, cols) = video.frame_shape();
    let pipeline = Pipeline::builder()
        .accumulator(
            AccumulatorConfig::builder()
                .shape(rows, cols)
                .period(PERIOD)
                .level_size(16)
                .build()?,
        )
        .build()?;

    let modes: Vec<NormMode> = [2u8, 3, 6].iter().map(|&m| NormMode::try_from(m)).collect::<Result<_, _>>()?;
    let set = pipeline.run_trials(&factory, TRIALS, &modes)?;

    let pixel = KI * cols;
    let model: Vec<f64> = set.lags().iter().map(|&lag| video.model(KI as i64, 0, lag)).collect();
    let counts = &set.counts().counts;

    println!("k = {}, {} trials of {} pairs", KI, TRIALS, PAIRS);
    for &mode in &modes {
        let rms = set.rms_deviation(pixel, mode, &model)?;
        println!("\n{}", mode);
        println!("{:>8} {:>8} {:>8} {:>10} {:>10} {:>10}", "lag", "model", "rms", "corr_err", "diff_err", "weighted");
        for (i, &lag) in set.lags().iter().enumerate().step_by(4) {
            let g = model[i];
            println!(
                "{:>8} {:>8.4} {:>8.4} {:>10.4} {:>10.4} {:>10.4}",
                lag,
                g,
                rms[i],
                corr_error(g, counts[i]),
                diff_error(g, counts[i]),
                weighted_error(g, counts[i]),
            );
        }
    }

    Ok(())
}
