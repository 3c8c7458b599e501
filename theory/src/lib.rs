//! Closed-form steady-state metrics of an n-channel loss system (Erlang B).
//
//  This crate is deliberately pure: no async, no IO, no shared state.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TheoryError {
    #[error("arrival rate must be finite and positive, got {0}")]
    InvalidArrivalRate(f64),

    #[error("service rate must be finite and positive, got {0}")]
    InvalidServiceRate(f64),

    #[error("a loss system needs at least one channel")]
    NoChannels,
}

/// Offered load `ρ = λ / μ`.
pub fn rho(lambda: f64, mu: f64) -> f64 {
    lambda / mu
}

/// Probability that all channels are idle: `1 / Σ_{i=0..n} ρ^i / i!`.
///
/// Terms are built incrementally (`ρ^i/i! = ρ^(i-1)/(i-1)! * ρ/i`) so large
/// `n` does not overflow a factorial.
pub fn p0(rho: f64, n: usize) -> f64 {
    let mut term = 1.0;
    let mut sum = 1.0;
    for i in 1..=n {
        term *= rho / i as f64;
        sum += term;
    }
    1.0 / sum
}

/// Blocking probability `Pn = ρ^n / n! * P0`.
pub fn erlang_b(rho: f64, n: usize) -> f64 {
    // Stable recurrence: B(0) = 1, B(i) = ρB(i-1) / (i + ρB(i-1)).
    let mut b = 1.0;
    for i in 1..=n {
        b = rho * b / (i as f64 + rho * b);
    }
    b
}

/// Theoretical metrics for one (λ, μ, n) point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theoretical {
    pub rho: f64,
    /// Probability all channels are idle.
    pub p0: f64,
    /// Probability all channels are busy (a request is lost).
    pub pn: f64,
    /// Relative throughput.
    pub q: f64,
    /// Absolute throughput, served requests per unit time.
    pub a: f64,
    /// Mean number of busy channels.
    pub k: f64,
}

impl Theoretical {
    pub fn compute(lambda: f64, mu: f64, channels: usize) -> Result<Self, TheoryError> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(TheoryError::InvalidArrivalRate(lambda));
        }
        if !mu.is_finite() || mu <= 0.0 {
            return Err(TheoryError::InvalidServiceRate(mu));
        }
        if channels == 0 {
            return Err(TheoryError::NoChannels);
        }

        let rho = rho(lambda, mu);
        let p0 = p0(rho, channels);
        let pn = erlang_b(rho, channels);
        let q = 1.0 - pn;

        Ok(Self {
            rho,
            p0,
            pn,
            q,
            a: lambda * q,
            k: rho * q,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn single_channel_unit_load() {
        let t = Theoretical::compute(1.0, 1.0, 1).unwrap();

        assert!((t.p0 - 0.5).abs() < EPS);
        assert!((t.pn - 0.5).abs() < EPS);
        assert!((t.q - 0.5).abs() < EPS);
        assert!((t.a - 0.5).abs() < EPS);
        assert!((t.k - 0.5).abs() < EPS);
    }

    #[test]
    fn absolute_throughput_scales_with_lambda() {
        // ρ = 1 again, but λ = 2
        let t = Theoretical::compute(2.0, 2.0, 1).unwrap();
        assert!((t.a - 1.0).abs() < EPS);
    }

    #[test]
    fn recurrence_matches_factorial_form() {
        let rho: f64 = 2.5;
        let n = 3;
        let factorial = 6.0;

        let direct = rho.powi(n as i32) / factorial * p0(rho, n);
        assert!((erlang_b(rho, n) - direct).abs() < EPS);
    }

    #[test]
    fn three_channel_lab_parameters() {
        // n = 3, λ = 0.5, μ = 0.2 → ρ = 2.5
        let t = Theoretical::compute(0.5, 0.2, 3).unwrap();

        let sum = 1.0 + 2.5 + 2.5 * 2.5 / 2.0 + 2.5 * 2.5 * 2.5 / 6.0;
        assert!((t.rho - 2.5).abs() < EPS);
        assert!((t.p0 - 1.0 / sum).abs() < EPS);
        assert!((t.k - 2.5 * (1.0 - t.pn)).abs() < EPS);
    }

    #[test]
    fn large_channel_count_does_not_overflow() {
        let t = Theoretical::compute(200.0, 1.0, 500).unwrap();

        assert!(t.p0.is_finite());
        assert!(t.pn.is_finite() && t.pn >= 0.0);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(
            Theoretical::compute(0.0, 1.0, 1),
            Err(TheoryError::InvalidArrivalRate(0.0))
        );
        assert_eq!(
            Theoretical::compute(1.0, -1.0, 1),
            Err(TheoryError::InvalidServiceRate(-1.0))
        );
        assert_eq!(
            Theoretical::compute(1.0, 1.0, 0),
            Err(TheoryError::NoChannels)
        );
        assert!(matches!(
            Theoretical::compute(f64::NAN, 1.0, 1),
            Err(TheoryError::InvalidArrivalRate(_))
        ));
    }

    #[test]
    fn is_a_pure_function() {
        let a = Theoretical::compute(3.7, 1.3, 4).unwrap();
        let b = Theoretical::compute(3.7, 1.3, 4).unwrap();
        assert_eq!(a, b);
    }
}
