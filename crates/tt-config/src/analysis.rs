//! Analysis configuration types.
//!
//! These types match the analysis.json document. Every section has a
//! `Default` carrying the values the acquisition setup was calibrated for,
//! so a partial file only needs the fields it changes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tt_common::{ChannelId, ChannelPair};

/// Time-tagger clock period in seconds.
pub const DEFAULT_CLOCK_PERIOD_S: f64 = 82e-12;

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalysisConfig {
    pub schema_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Duration of one time-tagger tick, in seconds.
    pub clock_period_s: f64,

    pub channels: ChannelRoles,

    /// Per-channel cable/electronics delay in seconds, keyed by channel number.
    /// Channels absent from the map are not shifted.
    pub delays_s: BTreeMap<u32, f64>,

    pub coincidence: CoincidenceSettings,
    pub histogram: HistogramSettings,
    pub binning: BinningSettings,
    pub input: InputSettings,
    pub qrng: QrngSettings,
}

/// Which channel plays which role in a heralded measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ChannelRoles {
    pub herald: u32,
    pub target_a: u32,
    pub target_b: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CoincidenceSettings {
    /// Coincidence half-width in nanoseconds.
    pub window_ns: f64,
    /// Half-widths scanned by the `scan` command, in nanoseconds.
    pub scan_windows_ns: Vec<f64>,
    /// Number of triple coincidences echoed in reports.
    pub audit_triples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HistogramSettings {
    /// Channel pairs `[reference, target]` to histogram.
    pub pairs: Vec<[u32; 2]>,
    pub max_delay_ns: f64,
    pub bin_ns: f64,
    /// Smallest peak count for which a width is reported.
    pub fwhm_min_peak: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BinningSettings {
    pub bin_s: f64,
    /// Minimum separation to the previous event; closer events are dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_time_ticks: Option<i64>,
    /// Count model offered to the fitter: `poisson` or `thermal`.
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct InputSettings {
    /// Lines skipped at the top of every time-tag file.
    pub header_lines: usize,
    /// Field separator between timestamp and channel.
    pub delimiter: char,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct QrngSettings {
    /// Intervals at or below this many ticks are discarded as afterpulses.
    pub min_interval_ticks: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let mut delays_s = BTreeMap::new();
        delays_s.insert(1, -0.129e-9);
        delays_s.insert(2, 0.369e-9);
        AnalysisConfig {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            clock_period_s: DEFAULT_CLOCK_PERIOD_S,
            channels: ChannelRoles::default(),
            delays_s,
            coincidence: CoincidenceSettings::default(),
            histogram: HistogramSettings::default(),
            binning: BinningSettings::default(),
            input: InputSettings::default(),
            qrng: QrngSettings::default(),
        }
    }
}

impl Default for ChannelRoles {
    fn default() -> Self {
        ChannelRoles {
            herald: 3,
            target_a: 1,
            target_b: 2,
        }
    }
}

impl Default for CoincidenceSettings {
    fn default() -> Self {
        CoincidenceSettings {
            window_ns: 1.0,
            scan_windows_ns: (1..=10).map(f64::from).collect(),
            audit_triples: 3,
        }
    }
}

impl Default for HistogramSettings {
    fn default() -> Self {
        HistogramSettings {
            pairs: vec![[2, 3], [1, 3]],
            max_delay_ns: 20.0,
            bin_ns: 0.1,
            fwhm_min_peak: 4,
        }
    }
}

impl Default for BinningSettings {
    fn default() -> Self {
        BinningSettings {
            bin_s: 1e-3,
            dead_time_ticks: None,
            model: "poisson".to_string(),
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        InputSettings {
            header_lines: 6,
            delimiter: ';',
        }
    }
}

impl Default for QrngSettings {
    fn default() -> Self {
        QrngSettings {
            min_interval_ticks: 3900,
        }
    }
}

impl ChannelRoles {
    pub fn herald(&self) -> ChannelId {
        ChannelId(self.herald)
    }

    pub fn target_a(&self) -> ChannelId {
        ChannelId(self.target_a)
    }

    pub fn target_b(&self) -> ChannelId {
        ChannelId(self.target_b)
    }
}

impl HistogramSettings {
    /// Configured pairs as typed channel pairs.
    pub fn channel_pairs(&self) -> Vec<ChannelPair> {
        self.pairs
            .iter()
            .map(|[a, b]| ChannelPair::new(*a, *b))
            .collect()
    }
}

impl AnalysisConfig {
    /// Parse a configuration document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Delays keyed by typed channel id.
    pub fn channel_delays_s(&self) -> BTreeMap<ChannelId, f64> {
        self.delays_s
            .iter()
            .map(|(ch, d)| (ChannelId(*ch), *d))
            .collect()
    }

    /// Every channel this configuration names: the three roles, the
    /// calibrated channels and both ends of each histogram pair.
    pub fn configured_channels(&self) -> BTreeSet<ChannelId> {
        let roles = &self.channels;
        [roles.herald(), roles.target_a(), roles.target_b()]
            .into_iter()
            .chain(self.delays_s.keys().map(|ch| ChannelId(*ch)))
            .chain(self.histogram.pairs.iter().flatten().map(|ch| ChannelId(*ch)))
            .collect()
    }

    /// Convert nanoseconds to whole clock ticks, truncating toward zero.
    pub fn ns_to_ticks(&self, ns: f64) -> i64 {
        (ns * 1e-9 / self.clock_period_s) as i64
    }

    /// Convert seconds to whole clock ticks, truncating toward zero.
    pub fn seconds_to_ticks(&self, seconds: f64) -> i64 {
        (seconds / self.clock_period_s) as i64
    }

    /// JSON schema describing this document.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(AnalysisConfig)
    }
}
