//! Sample moments of count sequences.
//!
//! Variance here is the **population** variance (divide by `n`), the
//! convention used for Fano factors of counting experiments.

use serde::{Deserialize, Serialize};

/// Mean and population variance of a count sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    /// Number of samples.
    pub n: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
}

impl Moments {
    /// Compute moments of integer counts. Returns `None` for an empty slice.
    ///
    /// Two-pass: the mean first, then squared deviations from it, which
    /// avoids the cancellation of the `E[x²] − E[x]²` form for large counts.
    pub fn from_counts(counts: &[u64]) -> Option<Self> {
        if counts.is_empty() {
            return None;
        }
        let n = counts.len();
        let sum: f64 = counts.iter().map(|&c| c as f64).sum();
        let mean = sum / n as f64;
        let sq_dev: f64 = counts
            .iter()
            .map(|&c| {
                let d = c as f64 - mean;
                d * d
            })
            .sum();
        Some(Moments {
            n,
            mean,
            variance: sq_dev / n as f64,
        })
    }

    /// Variance-to-mean ratio, `None` when the mean is zero.
    pub fn fano_factor(&self) -> Option<f64> {
        fano_factor(self.mean, self.variance)
    }
}

/// Fano factor `variance / mean`. `None` if the mean is zero or not finite.
pub fn fano_factor(mean: f64, variance: f64) -> Option<f64> {
    if !mean.is_finite() || !variance.is_finite() || mean == 0.0 {
        return None;
    }
    Some(variance / mean)
}
