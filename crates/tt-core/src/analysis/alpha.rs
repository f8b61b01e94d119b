//! Triple-coincidence α and heralded g²(0).
//!
//! ```text
//! α = (n_triple · n_reference) / (n_pair_a · n_pair_b)
//! σ = α · √(1/n_triple + 1/n_reference + 1/n_pair_a + 1/n_pair_b)
//! ```
//!
//! σ is first-order Poisson propagation over all four counts. It is poor at
//! low counts, where a single triple dominates the sum.

use serde::{Deserialize, Serialize};
use tt_common::{Error, Result};
use tt_math::relative_error_quadrature;

use super::coincidence::CoincidenceResult;

/// α with its propagated uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaStatistic {
    pub alpha: f64,
    pub sigma: f64,
}

/// Outcome of α estimation, separating "no triples" from failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlphaOutcome {
    Measured { alpha: f64, sigma: f64 },
    /// Pairs exist but no herald matched both targets: α = 0, σ undefined.
    NoTriples,
    /// A denominator or the herald population is empty.
    Insufficient { reason: String },
}

impl AlphaOutcome {
    pub fn statistic(&self) -> Option<AlphaStatistic> {
        match self {
            AlphaOutcome::Measured { alpha, sigma } => Some(AlphaStatistic {
                alpha: *alpha,
                sigma: *sigma,
            }),
            _ => None,
        }
    }
}

/// Classify a coincidence result without failing.
pub fn classify_alpha(r: &CoincidenceResult) -> AlphaOutcome {
    match estimate_alpha(r) {
        Ok(stat) => AlphaOutcome::Measured {
            alpha: stat.alpha,
            sigma: stat.sigma,
        },
        Err(_) if r.n_triple == 0 && has_denominators(r) => AlphaOutcome::NoTriples,
        Err(e) => AlphaOutcome::Insufficient {
            reason: e.to_string(),
        },
    }
}

fn has_denominators(r: &CoincidenceResult) -> bool {
    r.n_reference > 0 && r.n_pair_a > 0 && r.n_pair_b > 0
}

/// α and σ for one coincidence result.
///
/// Fails with [`Error::InsufficientData`] when the herald population or
/// either pair count is zero, and when there are no triples (σ undefined).
pub fn estimate_alpha(r: &CoincidenceResult) -> Result<AlphaStatistic> {
    if r.n_reference == 0 {
        return Err(Error::insufficient(format!(
            "herald channel {} has no events",
            r.herald
        )));
    }
    if r.n_pair_a == 0 {
        return Err(Error::insufficient(format!(
            "no coincidences between {} and {} within ±{} ticks",
            r.herald, r.target_a, r.window_ticks
        )));
    }
    if r.n_pair_b == 0 {
        return Err(Error::insufficient(format!(
            "no coincidences between {} and {} within ±{} ticks",
            r.herald, r.target_b, r.window_ticks
        )));
    }
    if r.n_triple == 0 {
        return Err(Error::insufficient(
            "no triple coincidences; sigma is undefined",
        ));
    }

    let alpha = (r.n_triple as f64 * r.n_reference as f64)
        / (r.n_pair_a as f64 * r.n_pair_b as f64);
    let rel = relative_error_quadrature(&[r.n_triple, r.n_reference, r.n_pair_a, r.n_pair_b])
        .ok_or_else(|| Error::insufficient("zero count in error propagation"))?;

    Ok(AlphaStatistic {
        alpha,
        sigma: alpha * rel,
    })
}

/// Heralded g²(0): the same triple ratio as α.
pub fn estimate_heralded_g2(r: &CoincidenceResult) -> Result<AlphaStatistic> {
    estimate_alpha(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_common::ChannelId;

    fn result(n3: u64, n13: u64, n23: u64, n123: u64) -> CoincidenceResult {
        CoincidenceResult {
            herald: ChannelId(3),
            target_a: ChannelId(1),
            target_b: ChannelId(2),
            window_ticks: 12,
            n_reference: n3,
            n_pair_a: n13,
            n_pair_b: n23,
            n_triple: n123,
            triples: Vec::new(),
        }
    }

    #[test]
    fn alpha_and_sigma() {
        let stat = estimate_alpha(&result(1000, 100, 50, 10)).unwrap();
        // 10 * 1000 / (100 * 50) = 2
        assert!((stat.alpha - 2.0).abs() < 1e-12);
        let expected = 2.0 * (0.1f64 + 0.001 + 0.01 + 0.02).sqrt();
        assert!((stat.sigma - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_pair_a_is_insufficient() {
        let err = estimate_alpha(&result(10, 0, 5, 0)).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
        assert!(matches!(
            classify_alpha(&result(10, 0, 5, 0)),
            AlphaOutcome::Insufficient { .. }
        ));
    }

    #[test]
    fn empty_herald_is_insufficient() {
        assert!(matches!(
            estimate_alpha(&result(0, 0, 0, 0)),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn zero_triples_classified_separately() {
        let r = result(100, 10, 10, 0);
        assert!(estimate_alpha(&r).is_err());
        assert_eq!(classify_alpha(&r), AlphaOutcome::NoTriples);
        assert!(classify_alpha(&r).statistic().is_none());
    }

    #[test]
    fn g2_matches_alpha() {
        let r = result(500, 40, 30, 3);
        assert_eq!(estimate_heralded_g2(&r).unwrap(), estimate_alpha(&r).unwrap());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_string(&AlphaOutcome::NoTriples).unwrap();
        assert_eq!(json, r#"{"status":"no_triples"}"#);
    }
}
