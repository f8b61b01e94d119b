//! Randomized checks of the count-model and log-domain helpers.

use proptest::prelude::*;
use tt_math::{
    log_factorial, log_gamma, log_sum_exp, normalized_pmf, poisson_log_pmf, poisson_model,
    relative_error_quadrature, thermal_log_pmf, CountModel, Moments,
};

const TOL: f64 = 1e-10;

/// log_gamma truncates its asymptotic series.
const LGAMMA_TOL: f64 = 1e-8;

/// Relative closeness with an absolute floor of `tol`. Infinities compare by
/// sign; NaN matches only NaN.
fn close(a: f64, b: f64, tol: f64) -> bool {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.0),
        (false, false) => (a.is_nan() && b.is_nan()) || a == b,
        _ => false,
    }
}

// Gamma and factorial

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Recurrence: lnΓ(z+1) = lnΓ(z) + ln z.
    #[test]
    fn log_gamma_recurrence(z in 0.1..200.0f64) {
        let lhs = log_gamma(z + 1.0);
        let rhs = log_gamma(z) + z.ln();
        prop_assert!(close(lhs, rhs, LGAMMA_TOL), "lnΓ({})={} vs {}", z + 1.0, lhs, rhs);
    }

    /// log_factorial agrees with an explicit sum of logs for small n.
    #[test]
    fn log_factorial_matches_sum(n in 0u64..60) {
        let direct: f64 = (2..=n).map(|i| (i as f64).ln()).sum();
        prop_assert!(close(log_factorial(n), direct, LGAMMA_TOL));
    }

    /// Order of terms does not matter, and adding a term never lowers the sum.
    #[test]
    fn log_sum_exp_symmetric_and_monotone(a in -100.0..100.0f64, b in -100.0..100.0f64, c in -100.0..100.0f64) {
        let fwd = log_sum_exp(&[a, b, c]);
        let rev = log_sum_exp(&[c, b, a]);
        prop_assert!(close(fwd, rev, TOL), "{fwd} vs {rev}");
        prop_assert!(fwd >= log_sum_exp(&[a, b]) - TOL);
        prop_assert!(fwd >= a.max(b).max(c));
    }
}

// Count model properties

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Poisson recurrence: P(k+1) = P(k) · λ / (k+1).
    #[test]
    fn poisson_recurrence(k in 0u32..200, lambda in 0.01..300.0f64) {
        let k = k as f64;
        let lhs = poisson_log_pmf(k + 1.0, lambda);
        let rhs = poisson_log_pmf(k, lambda) + lambda.ln() - (k + 1.0).ln();
        prop_assert!(close(lhs, rhs, 1e-8), "k={} λ={}: {} vs {}", k, lambda, lhs, rhs);
    }

    /// Thermal recurrence: P(k+1) = P(k) · n̄ / (1 + n̄).
    #[test]
    fn thermal_recurrence(k in 0u32..500, mean in 0.01..100.0f64) {
        let k = k as f64;
        let lhs = thermal_log_pmf(k + 1.0, mean);
        let rhs = thermal_log_pmf(k, mean) + mean.ln() - mean.ln_1p();
        prop_assert!(close(lhs, rhs, 1e-9));
    }

    /// Models never produce NaN or negative values for valid parameters.
    #[test]
    fn models_are_non_negative(k in 0u32..5000, mean in 0.0..2000.0f64, scale in 0.0..1e6f64) {
        for model in [CountModel::Poisson, CountModel::Thermal] {
            let v = model.evaluate(k as f64, mean, scale);
            prop_assert!(v.is_finite() && v >= 0.0, "{} k={} mean={} -> {}", model, k, mean, v);
        }
    }

    /// Poisson mass over a wide support sums to one.
    #[test]
    fn poisson_mass_sums_to_one(lambda in 0.1..50.0f64) {
        let upper = (lambda + 20.0 * lambda.sqrt() + 20.0) as u32;
        let total: f64 = (0..=upper).map(|k| poisson_model(k as f64, lambda, 1.0)).sum();
        prop_assert!(close(total, 1.0, 1e-8), "λ={} total={}", lambda, total);
    }

    /// Normalized pmf is a probability vector.
    #[test]
    fn normalized_pmf_is_distribution(mean in 0.1..30.0f64, len in 1usize..60) {
        let ks: Vec<f64> = (0..len).map(|k| k as f64).collect();
        for model in [CountModel::Poisson, CountModel::Thermal] {
            let p = normalized_pmf(model, &ks, mean);
            let total: f64 = p.iter().sum();
            prop_assert!(close(total, 1.0, 1e-9));
            prop_assert!(p.iter().all(|v| *v >= 0.0));
        }
    }
}

// Moments and error propagation properties

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Variance is non-negative and zero only for constant sequences.
    #[test]
    fn variance_non_negative(counts in prop::collection::vec(0u64..10_000, 1..200)) {
        let m = Moments::from_counts(&counts).unwrap();
        prop_assert!(m.variance >= 0.0);
        let constant = counts.iter().all(|&c| c == counts[0]);
        if constant {
            prop_assert!(m.variance == 0.0);
        }
    }

    /// Shifting every count by a constant leaves the variance unchanged.
    #[test]
    fn variance_shift_invariant(counts in prop::collection::vec(0u64..1000, 1..100), shift in 0u64..1_000_000) {
        let shifted: Vec<u64> = counts.iter().map(|c| c + shift).collect();
        let a = Moments::from_counts(&counts).unwrap();
        let b = Moments::from_counts(&shifted).unwrap();
        prop_assert!(close(a.variance, b.variance, 1e-6));
        prop_assert!(close(a.mean + shift as f64, b.mean, 1e-9));
    }

    /// Adding a count can only increase the quadrature relative error.
    #[test]
    fn quadrature_monotone(counts in prop::collection::vec(1u64..1_000_000, 0..8), extra in 1u64..1_000_000) {
        let base = relative_error_quadrature(&counts).unwrap();
        let mut more = counts.clone();
        more.push(extra);
        let grown = relative_error_quadrature(&more).unwrap();
        prop_assert!(grown >= base);
    }
}
