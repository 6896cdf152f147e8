//! Hill-climbing maximum-likelihood ability estimation.

use serde::{Deserialize, Serialize};

use crate::bank::ItemBank;
use crate::error::SessionError;
use crate::irt::log_likelihood;

/// Coordinate-ascent search on the 4PL response-pattern likelihood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HillClimbingEstimator {
    /// Lowest ability the search will move to.
    pub lower_bound: f64,
    /// Highest ability the search will move to.
    pub upper_bound: f64,
    /// First step size.
    pub initial_step: f64,
    /// The search stops once the step falls below this.
    pub precision: f64,
    /// Hard cap on search rounds.
    pub max_iterations: u32,
}

impl Default for HillClimbingEstimator {
    fn default() -> Self {
        Self {
            lower_bound: -6.0,
            upper_bound: 6.0,
            initial_step: 0.5,
            precision: 1e-6,
            max_iterations: 10_000,
        }
    }
}

impl HillClimbingEstimator {
    /// Estimate ability from the responses so far, starting at `prior`.
    ///
    /// Returns `-inf` when every response is "no" and `+inf` when every
    /// response is "yes"; the maximum-likelihood estimate is unbounded in
    /// both cases. With no responses the prior is returned unchanged.
    pub fn estimate(
        &self,
        bank: &ItemBank,
        administered: &[usize],
        responses: &[bool],
        prior: f64,
    ) -> Result<f64, SessionError> {
        if administered.len() != responses.len() {
            return Err(SessionError::MalformedState(format!(
                "{} administered items but {} responses",
                administered.len(),
                responses.len()
            )));
        }
        if let Some(&index) = administered.iter().find(|&&i| i >= bank.len()) {
            return Err(SessionError::MalformedState(format!(
                "item index {index} is outside the bank of {} items",
                bank.len()
            )));
        }
        if responses.is_empty() {
            return Ok(prior);
        }
        if responses.iter().all(|&r| r) {
            return Ok(f64::INFINITY);
        }
        if responses.iter().all(|&r| !r) {
            return Ok(f64::NEG_INFINITY);
        }

        // A finite prior is always reachable, so the result never has a
        // lower likelihood than the starting point.
        let (start, lower, upper) = if prior.is_finite() {
            (
                prior,
                self.lower_bound.min(prior),
                self.upper_bound.max(prior),
            )
        } else {
            (
                0.0_f64.clamp(self.lower_bound, self.upper_bound),
                self.lower_bound,
                self.upper_bound,
            )
        };

        let ll = |theta: f64| log_likelihood(theta, bank, administered, responses);

        let mut theta = start;
        let mut best = ll(theta);
        let mut step = self.initial_step;
        let mut iterations = 0u32;

        while step >= self.precision && iterations < self.max_iterations {
            iterations += 1;

            let up = (theta + step).min(upper);
            let down = (theta - step).max(lower);
            let ll_up = ll(up);
            let ll_down = ll(down);

            if ll_up > best && ll_up >= ll_down {
                theta = up;
                best = ll_up;
            } else if ll_down > best {
                theta = down;
                best = ll_down;
            } else {
                step /= 2.0;
            }
        }

        tracing::debug!(
            theta,
            log_likelihood = best,
            iterations,
            "hill climbing finished"
        );

        Ok(theta)
    }
}
