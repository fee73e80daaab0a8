//! Two-state lottery: the loss occurs with probability `p`, otherwise nothing
//! happens. Expected utility of an agent with and without coverage.

use crate::config::ModelParameters;
use crate::error::{Result, SolveError};
use crate::solver::GoldenSection;
use crate::utility::utility_of_wealth;

/// Where the premium for a coverage amount comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PremiumRule {
    /// Actuarially fair: `p * q`.
    Functional,
    /// Premium given directly, independent of `q`.
    Free(f64),
}

impl PremiumRule {
    pub fn premium(&self, q: f64, mp: &ModelParameters) -> f64 {
        match self {
            PremiumRule::Functional => premium(q, mp),
            PremiumRule::Free(pi) => *pi,
        }
    }
}

/// Fair premium for coverage `q`.
pub fn premium(q: f64, mp: &ModelParameters) -> f64 {
    mp.p * q
}

/// `p * u(y - loss + q - pi) + (1 - p) * u(y - pi)`.
pub fn expected_utility_insured(
    loss: f64,
    q: f64,
    mp: &ModelParameters,
    rule: PremiumRule,
) -> Result<f64> {
    let pi = rule.premium(q, mp);
    let with_loss = utility_of_wealth(mp.y - loss + q - pi, mp.theta)?;
    let without_loss = utility_of_wealth(mp.y - pi, mp.theta)?;
    Ok(mp.p * with_loss + (1.0 - mp.p) * without_loss)
}

pub fn expected_utility_insured_functional(loss: f64, q: f64, mp: &ModelParameters) -> Result<f64> {
    expected_utility_insured(loss, q, mp, PremiumRule::Functional)
}

/// Insured expected utility for the model's own loss `mp.x` at premium `pi`.
pub fn expected_utility_insured_free(q: f64, mp: &ModelParameters, pi: f64) -> Result<f64> {
    expected_utility_insured(mp.x, q, mp, PremiumRule::Free(pi))
}

/// `p * u(y - x) + (1 - p) * u(y)`.
pub fn expected_utility_uninsured(mp: &ModelParameters) -> Result<f64> {
    let with_loss = utility_of_wealth(mp.y - mp.x, mp.theta)?;
    let without_loss = utility_of_wealth(mp.y, mp.theta)?;
    Ok(mp.p * with_loss + (1.0 - mp.p) * without_loss)
}

/// Coverage in `[0, loss]` that maximises insured expected utility under the
/// fair premium. A zero loss needs no coverage.
pub fn optimal_coverage(
    loss: f64,
    mp: &ModelParameters,
    minimizer: &GoldenSection,
) -> std::result::Result<f64, SolveError> {
    if loss == 0.0 {
        return Ok(0.0);
    }
    let best = minimizer.minimize(
        |q| expected_utility_insured_functional(loss, q, mp).map(|eu| -eu),
        0.0,
        loss,
    )?;
    Ok(best.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    fn mp() -> ModelParameters {
        ModelParameters::canonical()
    }

    #[test]
    fn zero_coverage_collapses_to_uninsured() {
        let mp = mp();
        let insured = expected_utility_insured_functional(mp.x, 0.0, &mp).unwrap();
        let uninsured = expected_utility_uninsured(&mp).unwrap();
        assert!((insured - uninsured).abs() < 1e-12);
    }

    #[test]
    fn uninsured_matches_hand_computation() {
        // 0.2 * (-1 / 0.4) + 0.8 * (-1 / 1) = -1.3
        let eu = expected_utility_uninsured(&mp()).unwrap();
        assert!((eu + 1.3).abs() < 1e-12, "got {eu}");
    }

    #[test]
    fn fair_insurance_beats_no_insurance_for_risk_averse_agent() {
        let mp = mp();
        let insured = expected_utility_insured_functional(mp.x, 0.02, &mp).unwrap();
        let uninsured = expected_utility_uninsured(&mp).unwrap();
        assert!(insured.is_finite() && insured < 0.0);
        assert!(uninsured.is_finite() && uninsured < 0.0);
        assert!(insured >= uninsured, "insured {insured} < uninsured {uninsured}");
    }

    #[test]
    fn free_premium_at_fair_rate_equals_functional() {
        let mp = mp();
        let q = 0.3;
        let functional = expected_utility_insured_functional(mp.x, q, &mp).unwrap();
        let free = expected_utility_insured_free(q, &mp, premium(q, &mp)).unwrap();
        assert!((functional - free).abs() < 1e-15);
    }

    #[test]
    fn higher_free_premium_lowers_expected_utility() {
        let mp = mp();
        let cheap = expected_utility_insured_free(0.2, &mp, 0.01).unwrap();
        let dear = expected_utility_insured_free(0.2, &mp, 0.1).unwrap();
        assert!(dear < cheap);
    }

    #[test]
    fn premium_exhausting_wealth_is_a_domain_error() {
        let mp = mp();
        let err = expected_utility_insured_free(0.1, &mp, 1.0).unwrap_err();
        assert!(matches!(err, ModelError::Domain { .. }), "{err}");
    }

    #[test]
    fn loss_exceeding_wealth_uninsured_is_a_domain_error() {
        let mp = ModelParameters { x: 1.5, ..mp() };
        assert!(expected_utility_uninsured(&mp).is_err());
    }

    #[test]
    fn full_coverage_is_optimal_at_fair_premium() {
        let mp = mp();
        let q = optimal_coverage(mp.x, &mp, &GoldenSection::default()).unwrap();
        assert!((q - mp.x).abs() < 1e-4, "optimal coverage {q}");
    }

    #[test]
    fn zero_loss_needs_no_coverage() {
        let mp = ModelParameters::new(1.0, 0.2, -2.0, 0.0, 0.95).unwrap();
        let q = optimal_coverage(mp.x, &mp, &GoldenSection::default()).unwrap();
        assert_eq!(q, 0.0);
    }
}
