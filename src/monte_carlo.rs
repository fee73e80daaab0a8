//! Expected utility with a continuous loss: losses drawn from Beta(a, b) and
//! the sample mean of utility taken as the estimate.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Beta, Distribution};

use crate::break_even::accept;
use crate::config::{ModelParameters, MonteCarloConfig};
use crate::error::{ModelError, Result, SolveError};
use crate::solver::{GoldenSection, Minimum};
use crate::utility::utility_of_wealth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Agent {
    /// Pays `pi` and is reimbursed a fraction `gamma` of the loss.
    Insured,
    /// Bears the full loss.
    Uninsured,
}

impl From<bool> for Agent {
    fn from(insured: bool) -> Self {
        if insured { Agent::Insured } else { Agent::Uninsured }
    }
}

fn loss_distribution(a: f64, b: f64, n: usize) -> Result<Beta<f64>> {
    if !(a > 0.0) || !a.is_finite() {
        return Err(ModelError::invalid("a", a, "Beta shape must be positive"));
    }
    if !(b > 0.0) || !b.is_finite() {
        return Err(ModelError::invalid("b", b, "Beta shape must be positive"));
    }
    if n < 1 {
        return Err(ModelError::invalid("n", n as f64, "need at least one draw"));
    }
    Beta::new(a, b).map_err(|_| ModelError::invalid("a, b", a.min(b), "rejected by Beta"))
}

/// Mean of `u(wealth(x_i))` over `n` draws `x_i ~ Beta(a, b)`.
fn sample_mean<R, W>(a: f64, b: f64, n: usize, theta: f64, wealth: W, rng: &mut R) -> Result<f64>
where
    R: Rng + ?Sized,
    W: Fn(f64) -> f64,
{
    let dist = loss_distribution(a, b, n)?;
    let mut total = 0.0;
    for _ in 0..n {
        let loss: f64 = dist.sample(rng);
        total += utility_of_wealth(wealth(loss), theta)?;
    }
    Ok(total / n as f64)
}

/// Monte Carlo expected utility of `agent` at premium `pi`.
///
/// Insured wealth is `y - (1 - gamma) * x_i - pi`, uninsured wealth is
/// `y - x_i`. Parameters are checked before any draw is taken.
pub fn estimate<R: Rng + ?Sized>(
    a: f64,
    b: f64,
    n: usize,
    pi: f64,
    mp: &ModelParameters,
    agent: Agent,
    rng: &mut R,
) -> Result<f64> {
    match agent {
        Agent::Insured => estimate_with_coverage(a, b, n, mp.gamma, pi, mp, rng),
        Agent::Uninsured => sample_mean(a, b, n, mp.theta, |x| mp.y - x, rng),
    }
}

/// Insured estimate with an explicit coverage fraction `gamma` in place of `mp.gamma`.
pub fn estimate_with_coverage<R: Rng + ?Sized>(
    a: f64,
    b: f64,
    n: usize,
    gamma: f64,
    pi: f64,
    mp: &ModelParameters,
    rng: &mut R,
) -> Result<f64> {
    if !(0.0..=1.0).contains(&gamma) {
        return Err(ModelError::invalid("gamma", gamma, "must lie in [0, 1]"));
    }
    sample_mean(a, b, n, mp.theta, |x| mp.y - (1.0 - gamma) * x - pi, rng)
}

impl MonteCarloConfig {
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        pi: f64,
        mp: &ModelParameters,
        agent: Agent,
        rng: &mut R,
    ) -> Result<f64> {
        estimate(self.a, self.b, self.draws, pi, mp, agent, rng)
    }
}

/// `|MC_insured(pi) - MC_uninsured|` with both arms drawn from the same
/// seeded stream, so the value is a deterministic function of `pi`.
pub fn break_even_objective(
    pi: f64,
    config: &MonteCarloConfig,
    mp: &ModelParameters,
    seed: u64,
) -> Result<f64> {
    let insured = config.estimate(pi, mp, Agent::Insured, &mut ChaCha20Rng::seed_from_u64(seed))?;
    let uninsured = config.estimate(pi, mp, Agent::Uninsured, &mut ChaCha20Rng::seed_from_u64(seed))?;
    Ok((insured - uninsured).abs())
}

/// Break-even premium of the Monte Carlo model, searched over
/// `[0, y - (1 - gamma)]` where insured wealth stays positive for every loss
/// in (0, 1). Held to the same acceptance rule as the closed-form solve.
pub fn solve_break_even(
    config: &MonteCarloConfig,
    mp: &ModelParameters,
    seed: u64,
    minimizer: &GoldenSection,
) -> std::result::Result<Minimum, SolveError> {
    let cap = mp.y - (1.0 - mp.gamma);
    accept(minimizer.minimize(|pi| break_even_objective(pi, config, mp, seed), 0.0, cap)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }

    fn mp() -> ModelParameters {
        ModelParameters::canonical()
    }

    /// Beta(2, 7), y = 1, theta = -2:
    /// E[-1 / (1 - X)] = -B(2, 6) / B(2, 7) = -(a + b - 1) / (b - 1) = -4/3.
    const BETA_2_7_EXPECTED_UTILITY: f64 = -4.0 / 3.0;

    fn rmse(n: usize, seeds: std::ops::Range<u64>, mp: &ModelParameters) -> f64 {
        let runs = seeds.end - seeds.start;
        let sq: f64 = seeds
            .map(|s| {
                let est = estimate(2.0, 7.0, n, 0.0, mp, Agent::Insured, &mut rng(s)).unwrap();
                (est - BETA_2_7_EXPECTED_UTILITY).powi(2)
            })
            .sum();
        (sq / runs as f64).sqrt()
    }

    #[test]
    fn estimate_converges_to_closed_form_as_draws_grow() {
        let mp = ModelParameters { gamma: 0.0, ..mp() };
        let coarse = rmse(100, 0..30, &mp);
        let fine = rmse(10_000, 100..130, &mp);
        assert!(fine * 3.0 <= coarse, "error did not shrink: N=100 {coarse:.5}, N=10000 {fine:.5}");
        assert!(fine < 0.01, "N=10000 error {fine:.5}");
    }

    #[test]
    fn single_draw_is_finite() {
        let v = estimate(2.0, 7.0, 1, 0.0, &mp(), Agent::Insured, &mut rng(1)).unwrap();
        assert!(v.is_finite());
        let v = estimate(2.0, 7.0, 1, 0.0, &mp(), Agent::Uninsured, &mut rng(1)).unwrap();
        assert!(v.is_finite());
    }

    #[test]
    fn invalid_shape_or_size_is_rejected() {
        let mp = mp();
        for (a, b, n) in [(0.0, 7.0, 10), (2.0, 0.0, 10), (-1.0, 7.0, 10), (2.0, 7.0, 0), (f64::NAN, 7.0, 10)] {
            let err = estimate(a, b, n, 0.0, &mp, Agent::Insured, &mut rng(0)).unwrap_err();
            assert!(matches!(err, ModelError::InvalidParameter { .. }), "({a}, {b}, {n}): {err}");
        }
    }

    #[test]
    fn invalid_shape_names_the_offending_parameter() {
        let err = estimate(2.0, -1.0, 10, 0.0, &mp(), Agent::Uninsured, &mut rng(0)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter { name: "b", .. }), "{err}");
        let err = estimate(-2.0, 7.0, 10, 0.0, &mp(), Agent::Uninsured, &mut rng(0)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter { name: "a", .. }), "{err}");
    }

    #[test]
    fn invalid_parameters_consume_no_entropy() {
        let mut used = rng(5);
        let _ = estimate(0.0, 7.0, 10, 0.0, &mp(), Agent::Insured, &mut used);
        let mut fresh = rng(5);
        assert_eq!(used.random::<u64>(), fresh.random::<u64>());
    }

    #[test]
    fn same_seed_reproduces_estimate() {
        let mp = mp();
        let first = estimate(2.0, 7.0, 500, 0.02, &mp, Agent::Insured, &mut rng(9)).unwrap();
        let second = estimate(2.0, 7.0, 500, 0.02, &mp, Agent::Insured, &mut rng(9)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_coverage_zero_premium_matches_uninsured() {
        let mp = ModelParameters { gamma: 0.0, ..mp() };
        let insured = estimate(2.0, 7.0, 1_000, 0.0, &mp, Agent::Insured, &mut rng(3)).unwrap();
        let uninsured = estimate(2.0, 7.0, 1_000, 0.0, &mp, Agent::Uninsured, &mut rng(3)).unwrap();
        assert!((insured - uninsured).abs() < 1e-12);
    }

    #[test]
    fn full_coverage_removes_all_risk() {
        let mp = mp();
        let v = estimate_with_coverage(2.0, 7.0, 1_000, 1.0, 0.1, &mp, &mut rng(4)).unwrap();
        assert!((v - (-1.0 / 0.9)).abs() < 1e-12);
    }

    #[test]
    fn wealth_exhausted_by_premium_is_a_domain_error() {
        let err = estimate_with_coverage(2.0, 7.0, 10, 1.0, 1.0, &mp(), &mut rng(0)).unwrap_err();
        assert!(matches!(err, ModelError::Domain { .. }));
    }

    #[test]
    fn bool_converts_to_agent() {
        assert_eq!(Agent::from(true), Agent::Insured);
        assert_eq!(Agent::from(false), Agent::Uninsured);
    }

    #[test]
    fn break_even_premium_carries_risk_loading() {
        let config = MonteCarloConfig::canonical();
        let mp = mp();
        let best = solve_break_even(&config, &mp, 42, &GoldenSection::default()).unwrap();
        // Covered expected loss is gamma * a / (a + b) ≈ 0.211; risk aversion adds a loading.
        let fair = mp.gamma * 2.0 / 9.0;
        assert!(best.value < 1e-8, "{best:?}");
        assert!(best.x > fair, "break-even {} <= fair {fair}", best.x);
        assert!(best.x < 0.5);
    }

    #[test]
    fn break_even_search_failure_is_not_reported_as_a_premium() {
        let config = MonteCarloConfig { draws: 200, ..MonteCarloConfig::canonical() };
        let stalled = GoldenSection { tolerance: 1e-12, max_iterations: 2 };
        let err = solve_break_even(&config, &mp(), 42, &stalled).unwrap_err();
        assert!(matches!(err, SolveError::NotConverged { .. }), "{err:?}");
    }
}
