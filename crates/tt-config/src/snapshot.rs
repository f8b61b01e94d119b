//! Provenance attached to every report.
//!
//! The JSON envelope of each command carries a [`ConfigSnapshot`], so an α or
//! FWHM in a saved report can be matched to the clock period, channel roles
//! and windows that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisConfig;
use crate::load::{compute_hash, ResolvedConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub taken_at: DateTime<Utc>,
    #[serde(default)]
    pub host: Option<String>,
    pub schema_version: String,
    #[serde(default)]
    pub path: Option<String>,
    pub source: String,
    /// SHA-256 of the file bytes; for built-in defaults, of their JSON form.
    pub hash: String,
    pub summary: ConfigSummary,
}

/// Settings most often needed to read a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub clock_period_s: f64,
    pub herald: u32,
    pub target_a: u32,
    pub target_b: u32,
    pub window_ns: f64,
    pub histogram_bin_ns: f64,
    pub binning_bin_s: f64,
}

impl From<&AnalysisConfig> for ConfigSummary {
    fn from(cfg: &AnalysisConfig) -> Self {
        ConfigSummary {
            clock_period_s: cfg.clock_period_s,
            herald: cfg.channels.herald,
            target_a: cfg.channels.target_a,
            target_b: cfg.channels.target_b,
            window_ns: cfg.coincidence.window_ns,
            histogram_bin_ns: cfg.histogram.bin_ns,
            binning_bin_s: cfg.binning.bin_s,
        }
    }
}

impl ConfigSnapshot {
    pub fn new(resolved: &ResolvedConfig) -> Self {
        let cfg = &resolved.analysis;
        let hash = match &resolved.hash {
            Some(h) => h.clone(),
            None => compute_hash(&serde_json::to_string(cfg).unwrap_or_default()),
        };
        ConfigSnapshot {
            taken_at: Utc::now(),
            host: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok()),
            schema_version: cfg.schema_version.clone(),
            path: resolved.path.as_ref().map(|p| p.display().to_string()),
            source: resolved.source.to_string(),
            hash,
            summary: ConfigSummary::from(cfg),
        }
    }

    /// First 12 hex digits of the hash.
    pub fn short_id(&self) -> &str {
        self.hash.get(..12).unwrap_or(&self.hash)
    }
}
