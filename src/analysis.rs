//! Sampling error of the Monte Carlo estimator, measured by rerunning it
//! under independent seeds.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{ModelParameters, MonteCarloConfig};
use crate::error::Result;
use crate::monte_carlo::Agent;

/// z-score of a two-sided 95 % normal interval.
const Z_95: f64 = 1.959_963_984_540_054;

/// Spread of an expected-utility estimate across independent runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateSummary {
    pub runs: usize,
    pub mean: f64,
    /// Run-to-run standard deviation (n - 1 denominator); zero for one run.
    pub std_dev: f64,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl EstimateSummary {
    /// Standard error of the mean across runs.
    pub fn std_error(&self) -> f64 {
        self.std_dev / (self.runs as f64).sqrt()
    }

    /// Normal-approximation 95 % interval for the expected utility.
    pub fn confidence_95(&self) -> (f64, f64) {
        let half = Z_95 * self.std_error();
        (self.mean - half, self.mean + half)
    }
}

/// `None` for no runs.
pub fn summarize(estimates: &[f64]) -> Option<EstimateSummary> {
    let runs = estimates.len();
    if runs == 0 {
        return None;
    }
    let mut sorted = estimates.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = runs / 2;
    let median = if runs % 2 == 0 { 0.5 * (sorted[mid - 1] + sorted[mid]) } else { sorted[mid] };
    let mean = sorted.iter().sum::<f64>() / runs as f64;
    let std_dev = if runs > 1 {
        (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (runs - 1) as f64).sqrt()
    } else {
        0.0
    };

    Some(EstimateSummary { runs, mean, std_dev, min: sorted[0], median, max: sorted[runs - 1] })
}

/// `runs` consecutive seeds from `start`, wrapping past `u64::MAX`.
pub fn replication_seeds(start: u64, runs: u64) -> Vec<u64> {
    (0..runs).map(|i| start.wrapping_add(i)).collect()
}

/// One estimate per seed, each with its own `ChaCha20Rng`. Runs in parallel;
/// results follow the order of `seeds`.
pub fn replicate(
    config: &MonteCarloConfig,
    pi: f64,
    mp: &ModelParameters,
    agent: Agent,
    seeds: &[u64],
) -> Result<Vec<f64>> {
    seeds
        .par_iter()
        .map(|&seed| config.estimate(pi, mp, agent, &mut ChaCha20Rng::seed_from_u64(seed)))
        .collect()
}
