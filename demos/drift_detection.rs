//! Drift detection on a synthetic 2-D stream.
//!
//! Demonstrates:
//! - Retraining on every pair of consecutive windows (centers + σ, λ)
//! - Scoring the pair with the freshly trained model
//! - The score jumping when the stream's mean shifts
//!
//! Run: cargo run --example drift_detection

use ndarray::{s, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rulsif::{Config, Rulsif};

const WINDOW: usize = 50;
const STREAM: usize = 600;
const CHANGE_AT: usize = 350;

fn main() -> Result<(), rulsif::Error> {
    println!("=== Drift Detection with Relative Pearson Divergence ===\n");

    let mut rng = StdRng::seed_from_u64(42);
    let calm = Normal::new(0.0, 1.0).unwrap();
    let drifted = Normal::new(2.0, 1.0).unwrap();

    // One observation per column; the mean moves at CHANGE_AT.
    let stream = Array2::from_shape_fn((2, STREAM), |(_, t)| {
        if t < CHANGE_AT {
            calm.sample(&mut rng)
        } else {
            drifted.sample(&mut rng)
        }
    });
    println!(
        "Stream: {STREAM} points, mean shifts 0 → 2 at t = {CHANGE_AT}, window = {WINDOW}\n"
    );

    let config = Config::from_settings([("--alpha", "0.1"), ("--folds", "5")])?;
    let mut model = Rulsif::new(config)?;

    println!("  t    |   σ    |   λ    | PE score |");
    println!("-------|--------|--------|----------|---------------------------");
    let mut t = WINDOW;
    while t + WINDOW <= STREAM {
        let reference = stream.slice(s![.., t - WINDOW..t]);
        let test = stream.slice(s![.., t..t + WINDOW]);

        model.train(reference, test)?;
        let score = model.apply(reference, test)?;
        let (sigma, lambda) = model
            .fitted()
            .map(|f| (f.sigma(), f.lambda()))
            .unwrap_or_default();

        let bar = "#".repeat((score.max(0.0) * 60.0).round() as usize);
        println!("{t:6} | {sigma:6.3} | {lambda:6} | {score:8.4} | {bar}");
        t += WINDOW / 2;
    }

    println!("\nWindows straddling t = {CHANGE_AT} should stand out.");
    Ok(())
}
