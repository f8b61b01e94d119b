//! Semantic checks that serde cannot express.
//!
//! Checks stop at the first problem. Tick conversions use the configured
//! clock period, so widths are also rejected when they round to zero ticks.

use thiserror::Error;
use tt_math::CountModel;

use crate::analysis::AnalysisConfig;

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field}: {reason}")]
    Field { field: String, reason: String },

    #[error("channel roles must be distinct (herald={herald}, target_a={target_a}, target_b={target_b})")]
    RolesOverlap {
        herald: u32,
        target_a: u32,
        target_b: u32,
    },

    #[error("schema_version {found} is not supported (expected {expected})")]
    Version {
        expected: &'static str,
        found: String,
    },
}

impl ValidationError {
    /// Dotted path of the offending setting, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::Field { field, .. } => Some(field),
            ValidationError::RolesOverlap { .. } => Some("channels"),
            ValidationError::Version { .. } => Some("schema_version"),
        }
    }
}

fn ensure(ok: bool, field: impl Into<String>, reason: impl FnOnce() -> String) -> ValidationResult<()> {
    if ok {
        Ok(())
    } else {
        Err(ValidationError::Field {
            field: field.into(),
            reason: reason(),
        })
    }
}

/// Half-widths and ranges: finite, zero allowed.
fn non_negative(field: impl Into<String>, v: f64) -> ValidationResult<()> {
    ensure(v.is_finite() && v >= 0.0, field, || {
        format!("must be finite and >= 0, got {v}")
    })
}

/// Widths: finite and strictly positive.
fn positive(field: impl Into<String>, v: f64) -> ValidationResult<()> {
    ensure(v.is_finite() && v > 0.0, field, || {
        format!("must be finite and > 0, got {v}")
    })
}

pub fn validate_analysis(cfg: &AnalysisConfig) -> ValidationResult<()> {
    if cfg.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::Version {
            expected: crate::CONFIG_SCHEMA_VERSION,
            found: cfg.schema_version.clone(),
        });
    }
    positive("clock_period_s", cfg.clock_period_s)?;

    let roles = cfg.channels;
    if roles.herald == roles.target_a
        || roles.herald == roles.target_b
        || roles.target_a == roles.target_b
    {
        return Err(ValidationError::RolesOverlap {
            herald: roles.herald,
            target_a: roles.target_a,
            target_b: roles.target_b,
        });
    }

    for (channel, delay) in &cfg.delays_s {
        ensure(delay.is_finite(), format!("delays_s.{channel}"), || {
            format!("must be finite, got {delay}")
        })?;
    }

    let coincidence = &cfg.coincidence;
    non_negative("coincidence.window_ns", coincidence.window_ns)?;
    for (i, w) in coincidence.scan_windows_ns.iter().enumerate() {
        non_negative(format!("coincidence.scan_windows_ns[{i}]"), *w)?;
    }

    let hist = &cfg.histogram;
    non_negative("histogram.max_delay_ns", hist.max_delay_ns)?;
    positive("histogram.bin_ns", hist.bin_ns)?;
    ensure(cfg.ns_to_ticks(hist.bin_ns) > 0, "histogram.bin_ns", || {
        format!(
            "{} ns is shorter than one clock tick of {} s",
            hist.bin_ns, cfg.clock_period_s
        )
    })?;
    ensure(hist.fwhm_min_peak >= 1, "histogram.fwhm_min_peak", || {
        "must be at least 1".to_string()
    })?;
    if let Some([a, _]) = hist.pairs.iter().find(|[a, b]| a == b) {
        return Err(ValidationError::Field {
            field: "histogram.pairs".into(),
            reason: format!("pair ({a},{a}) correlates a channel with itself"),
        });
    }

    let bins = &cfg.binning;
    positive("binning.bin_s", bins.bin_s)?;
    ensure(cfg.seconds_to_ticks(bins.bin_s) > 0, "binning.bin_s", || {
        format!("{} s is shorter than one clock tick", bins.bin_s)
    })?;
    if let Some(dead) = bins.dead_time_ticks {
        ensure(dead >= 0, "binning.dead_time_ticks", || {
            format!("must be >= 0, got {dead}")
        })?;
    }
    ensure(bins.model.parse::<CountModel>().is_ok(), "binning.model", || {
        format!("unknown count model '{}' (poisson or thermal)", bins.model)
    })?;

    ensure(cfg.qrng.min_interval_ticks >= 0, "qrng.min_interval_ticks", || {
        format!("must be >= 0, got {}", cfg.qrng.min_interval_ticks)
    })?;

    let delim = cfg.input.delimiter;
    ensure(!delim.is_ascii_digit() && delim != '-', "input.delimiter", || {
        format!("'{delim}' cannot separate numeric fields")
    })
}
