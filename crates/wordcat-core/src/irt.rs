//! Four-parameter logistic (4PL) item response model.
//!
//! `P(θ) = c + (d - c) / (1 + exp(-a(θ - b)))`, without the 1.7 scaling
//! constant.

use serde::{Deserialize, Serialize};

use crate::bank::ItemBank;

/// Probabilities are kept inside `[PROB_EPS, 1 - PROB_EPS]` when taking logs.
const PROB_EPS: f64 = 1e-12;

/// Exponent clamp for the logistic term.
const MAX_EXPONENT: f64 = 700.0;

/// Item parameters of the 4PL model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemParams {
    /// Discrimination.
    pub a: f64,
    /// Difficulty.
    pub b: f64,
    /// Lower asymptote (guessing).
    pub c: f64,
    /// Upper asymptote.
    pub d: f64,
}

impl ItemParams {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// Whether every parameter is a finite number.
    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite() && self.d.is_finite()
    }
}

/// Probability of a "yes" response at ability `theta`.
pub fn probability(theta: f64, params: &ItemParams) -> f64 {
    let z = (-params.a * (theta - params.b)).clamp(-MAX_EXPONENT, MAX_EXPONENT);
    params.c + (params.d - params.c) / (1.0 + z.exp())
}

/// Fisher information of one item at ability `theta`.
///
/// `I(θ) = a² (p - c)² (d - p)² / ((d - c)² p (1 - p))`
pub fn information(theta: f64, params: &ItemParams) -> f64 {
    let spread = params.d - params.c;
    if spread <= 0.0 {
        return 0.0;
    }
    let p = probability(theta, params);
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    let num = params.a.powi(2) * (p - params.c).powi(2) * (params.d - p).powi(2);
    num / (spread.powi(2) * p * (1.0 - p))
}

/// Log-likelihood of a response pattern at ability `theta`.
///
/// `administered` and `responses` are parallel; the caller checks lengths.
pub fn log_likelihood(
    theta: f64,
    bank: &ItemBank,
    administered: &[usize],
    responses: &[bool],
) -> f64 {
    administered
        .iter()
        .zip(responses)
        .map(|(&index, &response)| {
            let p = probability(theta, &bank.items()[index].params).clamp(PROB_EPS, 1.0 - PROB_EPS);
            if response {
                p.ln()
            } else {
                (1.0 - p).ln()
            }
        })
        .sum()
}

/// Summed information of the administered items.
pub fn test_information(theta: f64, bank: &ItemBank, administered: &[usize]) -> f64 {
    administered
        .iter()
        .map(|&index| information(theta, &bank.items()[index].params))
        .sum()
}

/// Standard error of the ability estimate, `1 / sqrt(I)`.
///
/// Infinite when `theta` is infinite or the test carries no information.
pub fn standard_error(theta: f64, bank: &ItemBank, administered: &[usize]) -> f64 {
    if !theta.is_finite() {
        return f64::INFINITY;
    }
    let info = test_information(theta, bank, administered);
    if info <= 0.0 {
        f64::INFINITY
    } else {
        1.0 / info.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rasch() -> ItemParams {
        ItemParams::new(1.0, 0.0, 0.0, 1.0)
    }

    #[test]
    fn probability_at_difficulty_is_midpoint() {
        let p = probability(0.0, &rasch());
        assert!((p - 0.5).abs() < 1e-12);

        let four_pl = ItemParams::new(1.5, 1.0, 0.2, 0.9);
        let p = probability(1.0, &four_pl);
        assert!((p - 0.55).abs() < 1e-12, "expected midpoint of c and d, got {p}");
    }

    #[test]
    fn probability_respects_asymptotes() {
        let params = ItemParams::new(2.0, 0.0, 0.1, 0.95);
        assert!((probability(-1e6, &params) - 0.1).abs() < 1e-9);
        assert!((probability(1e6, &params) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn probability_increases_with_ability() {
        let params = ItemParams::new(1.2, 0.3, 0.0, 1.0);
        let lo = probability(-1.0, &params);
        let hi = probability(1.0, &params);
        assert!(hi > lo);
    }

    #[test]
    fn information_matches_two_pl_closed_form() {
        // With c = 0 and d = 1 the 4PL information reduces to a² p (1 - p).
        let params = ItemParams::new(1.7, -0.4, 0.0, 1.0);
        for theta in [-3.0, -1.0, 0.0, 0.5, 2.0] {
            let p = probability(theta, &params);
            let expected = params.a.powi(2) * p * (1.0 - p);
            let got = information(theta, &params);
            assert!((got - expected).abs() < 1e-12, "theta={theta}: {got} vs {expected}");
        }
    }

    #[test]
    fn information_peaks_near_difficulty_for_rasch() {
        let params = rasch();
        let at_b = information(0.0, &params);
        assert!((at_b - 0.25).abs() < 1e-12);
        assert!(information(2.0, &params) < at_b);
        assert!(information(-2.0, &params) < at_b);
    }

    #[test]
    fn information_is_zero_for_degenerate_items() {
        let flat = ItemParams::new(1.0, 0.0, 0.5, 0.5);
        assert_eq!(information(0.0, &flat), 0.0);
        assert!(information(-1e6, &rasch()) < 1e-200);
    }
}
