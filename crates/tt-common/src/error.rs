//! The error type shared by every tt-* crate.
//!
//! Each variant has a stable numeric code, a category (which picks the CLI
//! exit status) and a one-line hint for humans. On the terminal an error
//! renders as
//!
//! ```text
//! ✗ Insufficient Data
//!   Reason: insufficient data: n_pair_a is zero, alpha is undefined
//!   Fix: Widen the coincidence window or acquire for longer.
//! ```
//!
//! and in JSON output as a [`StructuredError`].

use crate::id::ChannelId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rejected parameter or configuration.
    Config,
    /// Time-tag data that breaks a precondition.
    Input,
    /// A statistic with an empty denominator or population.
    InsufficientData,
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid coincidence window: {value} ticks (must be >= 0)")]
    InvalidWindow { value: i64 },

    #[error("invalid bin width: {value} ticks (must be > 0)")]
    InvalidBinWidth { value: i64 },

    #[error("unknown channel {channel}: not configured and absent from the input")]
    UnknownChannel { channel: ChannelId },

    #[error("invalid clock period: {value} s (must be finite and > 0)")]
    InvalidClockPeriod { value: f64 },

    #[error("channel {channel} is not sorted ascending at index {index}")]
    UnsortedSeries { channel: ChannelId, index: usize },

    #[error("parse error in {} line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fixed facts about an error variant.
struct Descriptor {
    code: u32,
    category: ErrorCategory,
    /// Whether other parameters or more data could succeed.
    recoverable: bool,
    headline: &'static str,
    hint: &'static str,
}

impl Error {
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Error::InsufficientData(reason.into())
    }

    // Codes: 1x config, 2x input, 30 insufficient data, 6x I/O.
    fn descriptor(&self) -> Descriptor {
        use ErrorCategory::*;
        let (code, category, recoverable, headline, hint) = match self {
            Error::Config(_) => (
                10,
                Config,
                true,
                "Configuration Error",
                "Run 'tt-core config validate' to check the analysis configuration.",
            ),
            Error::InvalidWindow { .. } => (
                11,
                Config,
                true,
                "Invalid Coincidence Window",
                "Coincidence windows are half-widths and must be zero or positive.",
            ),
            Error::InvalidBinWidth { .. } => (
                12,
                Config,
                true,
                "Invalid Bin Width",
                "Bin widths must cover at least one clock tick; compare bin_s and bin_ns with clock_period_s.",
            ),
            Error::UnknownChannel { .. } => (
                13,
                Config,
                true,
                "Unknown Channel",
                "Compare the configured channel numbers with those present in the time-tag files.",
            ),
            Error::InvalidClockPeriod { .. } => (
                14,
                Config,
                true,
                "Invalid Clock Period",
                "Set clock_period_s to the tagger resolution in seconds, e.g. 82e-12.",
            ),
            // Loaders sort their input, so this points at a caller bug
            Error::UnsortedSeries { .. } => (
                20,
                Input,
                false,
                "Unsorted Channel Series",
                "Build channel series through EventLog or ChannelSeries::new, which sort their input.",
            ),
            Error::Parse { .. } => (
                21,
                Input,
                true,
                "Time-Tag Parse Error",
                "Check header_lines and delimiter in the input settings, or remove the malformed line.",
            ),
            Error::InsufficientData(_) => (
                30,
                InsufficientData,
                true,
                "Insufficient Data",
                "Widen the coincidence window or acquire for longer.",
            ),
            Error::Io(_) => (
                60,
                Io,
                true,
                "I/O Error",
                "Check that the input paths exist and are readable.",
            ),
            Error::Json(_) => (
                61,
                Io,
                false,
                "JSON Error",
                "The file is not valid JSON for this command.",
            ),
        };
        Descriptor {
            code,
            category,
            recoverable,
            headline,
            hint,
        }
    }

    /// Stable numeric code.
    pub fn code(&self) -> u32 {
        self.descriptor().code
    }

    pub fn category(&self) -> ErrorCategory {
        self.descriptor().category
    }

    pub fn is_recoverable(&self) -> bool {
        self.descriptor().recoverable
    }

    pub fn headline(&self) -> &'static str {
        self.descriptor().headline
    }

    /// What the user can change to get past this error.
    pub fn remediation(&self) -> &'static str {
        self.descriptor().hint
    }

    /// Variant fields worth reporting next to the message.
    fn context(&self) -> Map<String, Value> {
        let mut ctx = Map::new();
        match self {
            Error::InvalidWindow { value } | Error::InvalidBinWidth { value } => {
                ctx.insert("value".into(), json!(value));
            }
            Error::InvalidClockPeriod { value } => {
                ctx.insert("value".into(), json!(value));
            }
            Error::UnknownChannel { channel } => {
                ctx.insert("channel".into(), json!(channel));
            }
            Error::UnsortedSeries { channel, index } => {
                ctx.insert("channel".into(), json!(channel));
                ctx.insert("index".into(), json!(index));
            }
            Error::Parse { path, line, .. } => {
                ctx.insert("path".into(), json!(path));
                ctx.insert("line".into(), json!(line));
            }
            _ => {}
        }
        ctx
    }
}

/// Machine-readable form of an [`Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let d = err.descriptor();
        StructuredError {
            code: d.code,
            category: d.category,
            message: err.to_string(),
            recoverable: d.recoverable,
            context: err.context(),
        }
    }
}

impl StructuredError {
    /// Compact JSON; falls back to a bare code object if serialization fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"code\":{}}}", self.code))
    }
}

/// Terminal rendering: headline, reason, fix.
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let paint = |code: &str, text: &str| {
        if use_color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    };
    format!(
        "{} {}\n  Reason: {err}\n  {} {}",
        paint("31", "✗"),
        err.headline(),
        paint("36", "Fix:"),
        err.remediation()
    )
}
