//! First-order propagation of Poisson counting errors.
//!
//! An independent count `N` has standard deviation `√N`, so relative error
//! `1/√N`. For a product or ratio of independent counts the relative errors
//! add in quadrature: `σ_f / f = √(Σ 1/N_i)`.
//!
//! The approximation degrades for small counts (it assumes `N` large enough
//! that the Poisson distribution is near-Gaussian).

/// Relative Poisson error `1/√n`. `None` for `n == 0`.
pub fn poisson_relative_error(n: u64) -> Option<f64> {
    if n == 0 {
        return None;
    }
    Some(1.0 / (n as f64).sqrt())
}

/// Quadrature sum of relative Poisson errors, `√(Σ 1/n_i)`.
///
/// `None` if any count is zero. An empty slice yields `Some(0.0)`.
pub fn relative_error_quadrature(counts: &[u64]) -> Option<f64> {
    let mut sum = 0.0;
    for &n in counts {
        if n == 0 {
            return None;
        }
        sum += 1.0 / n as f64;
    }
    Some(sum.sqrt())
}
