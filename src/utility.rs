use crate::error::{ModelError, Result};

/// Utility of `wealth` for risk-aversion exponent `theta`:
/// `u(z) = z^(1+theta) / (1+theta)`.
///
/// Fails with [`ModelError::Domain`] when `1 + theta == 0`, when a negative
/// wealth is raised to a non-integer power, or when the power is not finite
/// (zero wealth with a negative exponent).
pub fn utility(wealth: f64, theta: f64) -> Result<f64> {
    let exponent = 1.0 + theta;
    if exponent == 0.0 {
        return Err(ModelError::Domain { wealth, theta, reason: "1 + theta is zero" });
    }
    if wealth < 0.0 && exponent.fract() != 0.0 {
        return Err(ModelError::Domain {
            wealth,
            theta,
            reason: "negative wealth with a non-integer exponent",
        });
    }
    let value = wealth.powf(exponent) / exponent;
    if !value.is_finite() {
        return Err(ModelError::Domain { wealth, theta, reason: "utility is not finite" });
    }
    Ok(value)
}

/// Utility of a realised wealth level in the insurance model, which requires
/// strictly positive wealth after loss and premium.
pub(crate) fn utility_of_wealth(wealth: f64, theta: f64) -> Result<f64> {
    if wealth <= 0.0 || wealth.is_nan() {
        return Err(ModelError::Domain { wealth, theta, reason: "wealth must be positive" });
    }
    utility(wealth, theta)
}
