//! Expected-utility model of an insurance purchase decision: a two-state
//! lottery solved in closed form, the premium that leaves the agent
//! indifferent, and Monte Carlo estimates for Beta-distributed losses.

pub mod analysis;
pub mod break_even;
pub mod config;
pub mod error;
pub mod lottery;
pub mod monte_carlo;
pub mod solver;
pub mod utility;

pub use config::{ModelParameters, MonteCarloConfig, Scenario};
pub use error::{ModelError, Result, SolveError};
pub use monte_carlo::Agent;
pub use utility::utility;
