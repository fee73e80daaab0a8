//! Scalar minimisation for callers of the model: golden-section search from
//! `argmin`, wrapped so that model errors come back typed.

use argmin::core::{CostFunction, Error, Executor};
use argmin::solver::goldensectionsearch::GoldenSectionSearch;
use tracing::debug;

use crate::error::{ModelError, Result, SolveError};

/// Settings for a bracketed golden-section search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoldenSection {
    /// Relative bracket width at which the search stops.
    pub tolerance: f64,
    pub max_iterations: u64,
}

impl Default for GoldenSection {
    fn default() -> Self {
        GoldenSection { tolerance: 1e-11, max_iterations: 200 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    pub x: f64,
    pub value: f64,
    pub iterations: u64,
}

/// A model objective seen as an argmin cost function.
struct ScalarProblem<F> {
    f: F,
}

impl<F> CostFunction for ScalarProblem<F>
where
    F: Fn(f64) -> Result<f64>,
{
    type Param = f64;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, Error> {
        Ok((self.f)(*x)?)
    }
}

impl GoldenSection {
    /// Minimise `f` over `[lo, hi]`, starting from the midpoint. An error
    /// from `f` ends the search and is returned as [`SolveError::Model`].
    pub fn minimize<F>(&self, f: F, lo: f64, hi: f64) -> std::result::Result<Minimum, SolveError>
    where
        F: Fn(f64) -> Result<f64>,
    {
        if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
            return Err(SolveError::InvalidBracket { lo, hi });
        }

        let solver = GoldenSectionSearch::new(lo, hi)
            .and_then(|s| s.with_tolerance(self.tolerance))
            .map_err(solver_error)?;
        let result = Executor::new(ScalarProblem { f }, solver)
            .configure(|state| state.param(0.5 * (lo + hi)).max_iters(self.max_iterations))
            .run()
            .map_err(solver_error)?;

        let state = result.state();
        let x = state
            .best_param
            .ok_or_else(|| SolveError::Solver("search returned no parameter".to_string()))?;
        let value = state.best_cost;
        let iterations = state.iter;
        debug!(lo, hi, x, value, iterations, "golden-section search finished");

        if iterations >= self.max_iterations {
            return Err(SolveError::NotConverged { x, value, iterations });
        }
        Ok(Minimum { x, value, iterations })
    }
}

fn solver_error(err: Error) -> SolveError {
    match err.downcast::<ModelError>() {
        Ok(model) => SolveError::Model(model),
        Err(other) => SolveError::Solver(other.to_string()),
    }
}
