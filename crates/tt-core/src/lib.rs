//! Time-Tag Coincidence Core Library
//!
//! This library provides the coincidence engine for time-tagged photon
//! detections:
//! - Event logs of per-channel sorted timestamps
//! - Per-channel delay calibration
//! - The sorted-stream windowed join shared by every analysis
//! - Pair/triple coincidences, α and heralded g²(0) with uncertainty
//! - Delay-correlation histograms with peak and FWHM
//! - Fixed-bin counting statistics and count-model fit inputs
//! - Interval-comparison random bit extraction
//!
//! The binary entry point is in `main.rs`.

pub mod analysis;
pub mod cache;
pub mod calibrate;
pub mod clock;
pub mod event_log;
pub mod exit_codes;
pub mod ingest;
pub mod join;
pub mod logging;
pub mod output;

pub use analysis::{
    bin_statistics, count_coincidences, delay_histogram, estimate_alpha, scan_windows,
    AlphaStatistic, BinStatistics, CoincidenceResult, DelayHistogramResult, Fwhm,
};
pub use calibrate::calibrate;
pub use clock::ClockPeriod;
pub use event_log::{ChannelSeries, EventLog, EventRecord, LogState};
pub use join::{CoincidenceWindow, OffsetWindow, WindowBounds, WindowJoin};
pub use tt_common::{ChannelId, ChannelPair, Error, Result};
