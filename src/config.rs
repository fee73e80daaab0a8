use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Agent and loss parameters. Built once per scenario and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Baseline wealth.
    pub y: f64,
    /// Probability of the loss.
    pub p: f64,
    /// Risk-aversion exponent; utility is `z^(1+theta) / (1+theta)`.
    pub theta: f64,
    /// Fixed loss magnitude of the two-state lottery.
    pub x: f64,
    /// Fraction of a Beta-distributed loss covered by the insurer.
    pub gamma: f64,
}

impl ModelParameters {
    pub fn new(y: f64, p: f64, theta: f64, x: f64, gamma: f64) -> Result<Self> {
        let params = ModelParameters { y, p, theta, x, gamma };
        params.validate()?;
        Ok(params)
    }

    pub fn canonical() -> Self {
        ModelParameters { y: 1.0, p: 0.2, theta: -2.0, x: 0.6, gamma: 0.95 }
    }

    /// Check the invariants `new` enforces; used again after deserialising.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("y", self.y),
            ("p", self.p),
            ("theta", self.theta),
            ("x", self.x),
            ("gamma", self.gamma),
        ] {
            if !value.is_finite() {
                return Err(ModelError::invalid(name, value, "must be finite"));
            }
        }
        if self.y <= 0.0 {
            return Err(ModelError::invalid("y", self.y, "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.p) {
            return Err(ModelError::invalid("p", self.p, "must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ModelError::invalid("gamma", self.gamma, "must lie in [0, 1]"));
        }
        if self.x < 0.0 {
            return Err(ModelError::invalid("x", self.x, "must be non-negative"));
        }
        Ok(())
    }
}

/// Beta(a, b) loss distribution and sample size for one estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub a: f64,
    pub b: f64,
    pub draws: usize,
}

impl MonteCarloConfig {
    pub fn canonical() -> Self {
        MonteCarloConfig { a: 2.0, b: 7.0, draws: 10_000 }
    }
}

/// Equally spaced coverage amounts, endpoints included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub lo: f64,
    pub hi: f64,
    pub n: usize,
}

impl GridConfig {
    pub fn canonical() -> Self {
        GridConfig { lo: 0.01, hi: 0.6, n: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub seed: u64,
    pub params: ModelParameters,
    /// Coverage held fixed for the single break-even problem.
    pub coverage: f64,
    pub grid: GridConfig,
    pub monte_carlo: MonteCarloConfig,
    /// Independent Monte Carlo runs summarised by `analysis`.
    pub replications: u64,
}

impl Scenario {
    pub fn canonical() -> Self {
        Scenario {
            seed: 42,
            params: ModelParameters::canonical(),
            coverage: 0.02,
            grid: GridConfig::canonical(),
            monte_carlo: MonteCarloConfig::canonical(),
            replications: 100,
        }
    }

    /// Load a scenario from a JSON file and validate its parameters.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let scenario: Scenario = serde_json::from_str(&text)?;
        scenario.params.validate()?;
        Ok(scenario)
    }
}
