//! Logging settings from CLI flags and the environment.
//!
//! Lowest precedence first: built-in defaults, then `TT_LOG`, `TT_LOG_FORMAT`
//! and `TT_LOG_TIME`, then `-v`/`-q` and `--log-format`. `RUST_LOG`, when
//! set, replaces the resulting level inside [`init_logging`](super::init_logging).

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

pub const ENV_LEVEL: &str = "TT_LOG";
pub const ENV_FORMAT: &str = "TT_LOG_FORMAT";
pub const ENV_TIMESTAMPS: &str = "TT_LOG_TIME";

/// How log records are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Console lines.
    #[default]
    #[value(alias = "pretty")]
    Human,
    /// One JSON object per line.
    #[value(alias = "json")]
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as clap::ValueEnum>::from_str(s, true)
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        })
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LevelFilter,
    /// Prefix human output with a wall-clock time.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LevelFilter::INFO,
            timestamps: false,
        }
    }
}

impl LogConfig {
    /// Settings from the process environment, then CLI overrides.
    pub fn from_env(cli_level: Option<LevelFilter>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// As [`LogConfig::from_env`], reading variables through `lookup`.
    /// Unparsable values are ignored.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cli_level: Option<LevelFilter>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let defaults = LogConfig::default();
        let env_level = lookup(ENV_LEVEL).and_then(|v| v.trim().to_lowercase().parse().ok());
        let env_format = lookup(ENV_FORMAT).and_then(|v| v.parse().ok());
        let timestamps = lookup(ENV_TIMESTAMPS)
            .map(|v| matches!(v.trim(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.timestamps);

        LogConfig {
            format: cli_format.or(env_format).unwrap_or(defaults.format),
            level: cli_level.or(env_level).unwrap_or(defaults.level),
            timestamps,
        }
    }

    /// Level implied by `-v`/`-q`; `None` when neither was given.
    pub fn level_from_verbosity(verbose: u8, quiet: bool) -> Option<LevelFilter> {
        match (quiet, verbose) {
            (true, _) => Some(LevelFilter::ERROR),
            (false, 0) => None,
            (false, 1) => Some(LevelFilter::DEBUG),
            (false, _) => Some(LevelFilter::TRACE),
        }
    }
}
