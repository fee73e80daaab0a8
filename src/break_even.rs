//! Break-even premium: the premium at which the agent is indifferent between
//! buying coverage `q` and staying uninsured.

use rayon::prelude::*;
use serde::Serialize;

use crate::config::{GridConfig, ModelParameters};
use crate::error::{ModelError, Result, SolveError};
use crate::lottery::{expected_utility_insured_free, expected_utility_uninsured, premium};
use crate::solver::{GoldenSection, Minimum};

/// Largest objective value accepted as indifference.
pub const ACCEPT_OBJECTIVE: f64 = 1e-8;

/// `|EU_insured(q, pi) - EU_uninsured|`; zero exactly at indifference.
pub fn objective(pi: f64, q: f64, mp: &ModelParameters) -> Result<f64> {
    let insured = expected_utility_insured_free(q, mp, pi)?;
    let uninsured = expected_utility_uninsured(mp)?;
    Ok((insured - uninsured).abs())
}

/// [`objective`] at one premium for every coverage in `coverages`, in order.
///
/// The first failing coverage fails the batch as [`ModelError::GridPoint`].
pub fn objective_grid(pi: f64, coverages: &[f64], mp: &ModelParameters) -> Result<Vec<f64>> {
    coverages
        .iter()
        .enumerate()
        .map(|(index, &q)| {
            objective(pi, q, mp).map_err(|e| ModelError::GridPoint {
                index,
                coverage: q,
                source: Box::new(e),
            })
        })
        .collect()
}

/// `n` equally spaced points from `lo` to `hi` inclusive.
pub fn coverage_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { hi } else { lo + step * i as f64 })
                .collect()
        }
    }
}

impl GridConfig {
    pub fn points(&self) -> Vec<f64> {
        coverage_grid(self.lo, self.hi, self.n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakEven {
    pub coverage: f64,
    pub premium: f64,
    /// Fair premium `p * q` for comparison.
    pub fair_premium: f64,
    /// Objective at the solution.
    pub residual: f64,
}

/// Reject a minimum whose objective is above [`ACCEPT_OBJECTIVE`]: the
/// search ended away from indifference.
pub fn accept(best: Minimum) -> std::result::Result<Minimum, SolveError> {
    if best.value > ACCEPT_OBJECTIVE {
        return Err(SolveError::NotConverged {
            x: best.x,
            value: best.value,
            iterations: best.iterations,
        });
    }
    Ok(best)
}

/// Search `[0, q]` for the break-even premium of coverage `q`.
pub fn solve(
    q: f64,
    mp: &ModelParameters,
    minimizer: &GoldenSection,
) -> std::result::Result<BreakEven, SolveError> {
    if q == 0.0 {
        // Nothing bought: any zero premium is indifferent.
        let residual = objective(0.0, q, mp)?;
        return Ok(BreakEven { coverage: q, premium: 0.0, fair_premium: 0.0, residual });
    }
    let best = accept(minimizer.minimize(|pi| objective(pi, q, mp), 0.0, q)?)?;
    Ok(BreakEven { coverage: q, premium: best.x, fair_premium: premium(q, mp), residual: best.value })
}

/// Independent break-even problem per coverage, solved in parallel.
/// Output order matches `coverages`.
pub fn solve_grid(
    coverages: &[f64],
    mp: &ModelParameters,
    minimizer: &GoldenSection,
) -> Vec<std::result::Result<BreakEven, SolveError>> {
    coverages.par_iter().map(|&q| solve(q, mp, minimizer)).collect()
}
