//! Log-domain helpers for count probabilities.
//!
//! Count probabilities at large `k` under- or overflow long before the
//! quantities of interest do, so everything here works with logarithms.

use std::f64::consts::PI;

/// Below this argument `log_gamma` shifts upward with the recurrence
/// `Γ(z+1) = z·Γ(z)` before applying the asymptotic series.
const STIRLING_MIN: f64 = 15.0;

/// Factorials up to this `n` are summed exactly.
const EXACT_FACTORIAL_MAX: u64 = 32;

/// Stable `ln Σ exp(vᵢ)` in one pass.
///
/// The running maximum is carried alongside the scaled sum, so large
/// positive and large negative terms do not overflow or vanish. Empty input
/// and all-`-inf` input give `-inf`; any NaN gives NaN.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let mut max = f64::NEG_INFINITY;
    let mut scaled = 0.0f64;
    for &v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        if v == f64::INFINITY {
            return f64::INFINITY;
        }
        if v == f64::NEG_INFINITY {
            continue;
        }
        if v <= max {
            scaled += (v - max).exp();
        } else {
            // New maximum: rescale what has been summed so far
            scaled = scaled * (max - v).exp() + 1.0;
            max = v;
        }
    }
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + scaled.ln()
}

/// `ln Γ(z)` for `z > 0`.
///
/// Small arguments are lifted above [`STIRLING_MIN`] with the recurrence,
/// then the Stirling series is summed to the `z⁻⁷` term. Non-integer `z` is
/// fine, so count models can be evaluated at fractional `k`. Non-positive and
/// NaN arguments give NaN.
pub fn log_gamma(z: f64) -> f64 {
    if z.is_nan() || z <= 0.0 {
        return f64::NAN;
    }
    if z.is_infinite() {
        return f64::INFINITY;
    }

    let mut x = z;
    let mut shift = 0.0;
    while x < STIRLING_MIN {
        shift += x.ln();
        x += 1.0;
    }

    let inv = 1.0 / x;
    let inv2 = inv * inv;
    let series = inv
        * (1.0 / 12.0 - inv2 * (1.0 / 360.0 - inv2 * (1.0 / 1260.0 - inv2 / 1680.0)));
    (x - 0.5) * x.ln() - x + 0.5 * (2.0 * PI).ln() + series - shift
}

/// `ln n!`, exact summation for small `n`.
pub fn log_factorial(n: u64) -> f64 {
    if n <= EXACT_FACTORIAL_MAX {
        return (2..=n).map(|i| (i as f64).ln()).sum();
    }
    log_gamma(n as f64 + 1.0)
}
