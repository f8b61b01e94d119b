//! Event vocabulary: pipeline stages, event names and the JSONL record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity as written in JSONL records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            _ => Level::Trace,
        }
    }
}

/// Where in a run an event was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    /// Parsing time-tag files.
    Load,
    /// Per-channel delay shifts.
    Calibrate,
    /// Window joins, α and scans.
    Coincidence,
    Histogram,
    Binning,
    Qrng,
    Report,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Calibrate => "calibrate",
            Stage::Coincidence => "coincidence",
            Stage::Histogram => "histogram",
            Stage::Binning => "binning",
            Stage::Qrng => "qrng",
            Stage::Report => "report",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event names. Each doubles as the tracing target of its event.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const LOAD_FILE: &str = "load.file";
    pub const LOAD_FINISHED: &str = "load.finished";
    pub const CALIBRATE_APPLIED: &str = "calibrate.applied";

    pub const COINCIDENCE_COUNTED: &str = "coincidence.counted";
    pub const SCAN_CACHE_HIT: &str = "scan.cache_hit";
    pub const SCAN_FINISHED: &str = "scan.finished";
    pub const HISTOGRAM_BUILT: &str = "histogram.built";
    pub const BINNING_FINISHED: &str = "binning.finished";
    pub const QRNG_EXTRACTED: &str = "qrng.extracted";

    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const ANALYSIS_FAILED: &str = "analysis.failed";
}

/// One line of `--log-format jsonl` output.
///
/// Correlation fields are optional because plain `tracing` calls (outside
/// [`log_event!`](crate::log_event)) do not carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: Level,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl LogEvent {
    pub fn new(level: Level, event: impl Into<String>) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: None,
            host_id: None,
            stage: None,
            message: String::new(),
            fields: serde_json::Map::new(),
        }
    }

    /// Route a recorded field: correlation keys and `message` go to their
    /// own slots, everything else into `fields`.
    pub fn put(&mut self, key: &str, value: serde_json::Value) {
        let slot = match key {
            "message" => {
                self.message = as_text(value);
                return;
            }
            "run_id" => &mut self.run_id,
            "host_id" => &mut self.host_id,
            "stage" => &mut self.stage,
            _ => {
                self.fields.insert(key.to_string(), value);
                return;
            }
        };
        *slot = Some(as_text(value));
    }
}

fn as_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Run and host identifiers attached to every event of one invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub host_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            host_id: host_id.into(),
        }
    }

    /// Fresh run id on this machine's host id.
    pub fn for_this_run() -> Self {
        LogContext::new(super::generate_run_id(), super::host_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_routes_correlation_keys() {
        let mut ev = LogEvent::new(Level::Info, event_names::HISTOGRAM_BUILT);
        ev.put("run_id", json!("run-1"));
        ev.put("stage", json!("histogram"));
        ev.put("message", json!("built"));
        ev.put("bins", json!(401));

        assert_eq!(ev.run_id.as_deref(), Some("run-1"));
        assert_eq!(ev.stage.as_deref(), Some("histogram"));
        assert_eq!(ev.message, "built");
        assert_eq!(ev.fields["bins"], 401);
        assert!(ev.host_id.is_none());
    }

    #[test]
    fn absent_optionals_are_not_serialized() {
        let ev = LogEvent::new(Level::Warn, event_names::CONFIG_DEFAULT_USED);
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["level"], "warn");
        assert!(v.get("run_id").is_none());
        assert!(v.get("fields").is_none());
    }

    #[test]
    fn stage_display_matches_serde() {
        for stage in [Stage::Load, Stage::Coincidence, Stage::Qrng] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{stage}\""));
        }
    }

    #[test]
    fn event_names_follow_stage_prefixes() {
        let names = [
            event_names::RUN_STARTED,
            event_names::RUN_FINISHED,
            event_names::LOAD_FILE,
            event_names::SCAN_FINISHED,
            event_names::ANALYSIS_FAILED,
        ];
        for name in names {
            let (prefix, rest) = name.split_once('.').unwrap();
            assert!(!prefix.is_empty() && !rest.is_empty(), "{name}");
        }
        assert_ne!(event_names::RUN_STARTED, event_names::RUN_FINISHED);
    }

    #[test]
    fn tracing_levels_map_one_to_one() {
        assert_eq!(Level::from(&tracing::Level::ERROR), Level::Error);
        assert_eq!(Level::from(&tracing::Level::TRACE), Level::Trace);
    }
}
