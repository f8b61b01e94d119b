//! Photon-count distribution models.
//!
//! Two model families describe the number of detections `k` in a fixed
//! counting interval:
//!
//! - **Poisson** (coherent light): `P(k) = λ^k e^(-λ) / k!`
//! - **Bose–Einstein** (thermal light): `P(k) = n̄^k / (1 + n̄)^(k+1)`
//!
//! Both are evaluated in log space. The curve-fitting form multiplies the
//! probability by a free `scale` (the number of bins), matching how the
//! observed count histogram is compared against the model.
//!
//! `k` is taken as `f64` so the models can be evaluated at histogram bin
//! centers; `log_gamma` handles the non-integer factorial.

use super::stable::{log_factorial, log_gamma, log_sum_exp};
use serde::{Deserialize, Serialize};

/// Count distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountModel {
    /// Poisson statistics (Fano factor 1).
    #[default]
    Poisson,
    /// Bose–Einstein / thermal statistics (Fano factor 1 + n̄).
    Thermal,
}

impl CountModel {
    /// Log probability of `k` counts given the model's mean parameter.
    pub fn log_pmf(&self, k: f64, mean: f64) -> f64 {
        match self {
            CountModel::Poisson => poisson_log_pmf(k, mean),
            CountModel::Thermal => thermal_log_pmf(k, mean),
        }
    }

    /// Scaled model value `scale * P(k)`, the form fitted to count histograms.
    pub fn evaluate(&self, k: f64, mean: f64, scale: f64) -> f64 {
        match self {
            CountModel::Poisson => poisson_model(k, mean, scale),
            CountModel::Thermal => thermal_model(k, mean, scale),
        }
    }

    /// Variance implied by the model for a given mean.
    pub fn variance(&self, mean: f64) -> f64 {
        match self {
            CountModel::Poisson => mean,
            CountModel::Thermal => mean * (1.0 + mean),
        }
    }
}

impl std::fmt::Display for CountModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountModel::Poisson => write!(f, "poisson"),
            CountModel::Thermal => write!(f, "thermal"),
        }
    }
}

impl std::str::FromStr for CountModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "poisson" | "coherent" | "static" => Ok(CountModel::Poisson),
            "thermal" | "bose-einstein" | "bose_einstein" | "be" => Ok(CountModel::Thermal),
            _ => Err(format!("unknown count model: {}", s)),
        }
    }
}

/// Poisson log probability `k ln λ − λ − lnΓ(k+1)`.
///
/// Whole-number `k` (every observed count) uses [`log_factorial`].
///
/// Returns NaN for negative or NaN parameters and -inf for negative `k`.
pub fn poisson_log_pmf(k: f64, lambda: f64) -> f64 {
    if k.is_nan() || lambda.is_nan() || lambda < 0.0 {
        return f64::NAN;
    }
    if k < 0.0 {
        return f64::NEG_INFINITY;
    }
    if lambda == 0.0 {
        // Degenerate: all mass at k = 0
        return if k == 0.0 { 0.0 } else { f64::NEG_INFINITY };
    }
    let log_k_factorial = if k.fract() == 0.0 && k <= u64::MAX as f64 {
        log_factorial(k as u64)
    } else {
        log_gamma(k + 1.0)
    };
    k * lambda.ln() - lambda - log_k_factorial
}

/// Scaled Poisson model `scale * exp(poisson_log_pmf(k, λ))`.
pub fn poisson_model(k: f64, lambda: f64, scale: f64) -> f64 {
    let log_p = poisson_log_pmf(k, lambda);
    if log_p.is_nan() || scale.is_nan() {
        return f64::NAN;
    }
    scale * log_p.exp()
}

/// Bose–Einstein log probability `k ln n̄ − (k+1) ln(1+n̄)`.
pub fn thermal_log_pmf(k: f64, mean: f64) -> f64 {
    if k.is_nan() || mean.is_nan() || mean < 0.0 {
        return f64::NAN;
    }
    if k < 0.0 {
        return f64::NEG_INFINITY;
    }
    if mean == 0.0 {
        return if k == 0.0 { 0.0 } else { f64::NEG_INFINITY };
    }
    k * mean.ln() - (k + 1.0) * mean.ln_1p()
}

/// Scaled thermal model `scale * n̄^k / (1+n̄)^(k+1)`.
pub fn thermal_model(k: f64, mean: f64, scale: f64) -> f64 {
    let log_p = thermal_log_pmf(k, mean);
    if log_p.is_nan() || scale.is_nan() {
        return f64::NAN;
    }
    scale * log_p.exp()
}

/// Normalize model values over a finite support of `k` so they sum to one.
///
/// Works from log probabilities, so tails that underflow individually do not
/// distort the normalization. Returns an empty vector for empty input and
/// NaN entries if any log probability is NaN.
pub fn normalized_pmf(model: CountModel, ks: &[f64], mean: f64) -> Vec<f64> {
    let logs: Vec<f64> = ks.iter().map(|&k| model.log_pmf(k, mean)).collect();
    let log_norm = log_sum_exp(&logs);
    logs.iter().map(|l| (l - log_norm).exp()).collect()
}
