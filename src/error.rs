use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

/// Failures raised by the model functions. Nothing is converted to NaN.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Utility is undefined for this wealth / exponent combination.
    #[error("utility undefined at wealth {wealth} with theta {theta}: {reason}")]
    Domain {
        wealth: f64,
        theta: f64,
        reason: &'static str,
    },

    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A single coverage value of a grid evaluation failed.
    #[error("grid point {index} (q = {coverage}) failed: {source}")]
    GridPoint {
        index: usize,
        coverage: f64,
        #[source]
        source: Box<ModelError>,
    },
}

/// Failures of a scalar minimization run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("invalid bracket [{lo}, {hi}]")]
    InvalidBracket { lo: f64, hi: f64 },

    #[error("no acceptable minimum: best x = {x}, objective = {value} after {iterations} iterations")]
    NotConverged { x: f64, value: f64, iterations: u64 },

    /// Failure reported by the optimiser itself rather than the objective.
    #[error("solver failed: {0}")]
    Solver(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ModelError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        ModelError::InvalidParameter { name, value, reason }
    }
}
