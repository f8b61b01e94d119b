//! Conversions between physical durations and time-tagger clock ticks.

use serde::{Deserialize, Serialize};
use tt_common::{Error, Result};

/// Seconds per clock tick of the time tagger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClockPeriod(f64);

impl ClockPeriod {
    /// A clock period must be finite and strictly positive.
    pub fn new(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(Error::InvalidClockPeriod { value: seconds });
        }
        Ok(ClockPeriod(seconds))
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Whole ticks in `seconds`, truncated toward zero.
    pub fn ticks_from_seconds(&self, seconds: f64) -> i64 {
        (seconds / self.0) as i64
    }

    /// Whole ticks in `ns` nanoseconds, truncated toward zero.
    pub fn ticks_from_ns(&self, ns: f64) -> i64 {
        self.ticks_from_seconds(ns * 1e-9)
    }

    pub fn ticks_to_seconds(&self, ticks: f64) -> f64 {
        ticks * self.0
    }

    pub fn ticks_to_ns(&self, ticks: f64) -> f64 {
        ticks * self.0 * 1e9
    }
}
