//! Random bits from photon arrival intervals.
//!
//! Successive intervals of a Poissonian stream are independent and identically
//! distributed, so comparing neighbours yields unbiased bits: `1` when
//! `d_i >= d_{i+1}`, else `0`. Intervals up to `min_interval` ticks are
//! discarded first since dead time and afterpulsing make them non-random.
//!
//! Comparisons overlap (`d_0` vs `d_1`, `d_1` vs `d_2`, ...), so adjacent bits
//! share an interval.

use serde::{Deserialize, Serialize};
use tt_common::{ChannelId, Error, Result};

use crate::event_log::ChannelSeries;

/// Bytes extracted from one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrngOutput {
    pub channel: ChannelId,
    /// Intervals that survived the minimum-interval filter.
    pub n_intervals: usize,
    pub n_bits: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl QrngOutput {
    /// Fraction of one bits among the packed bytes.
    pub fn ones_fraction(&self) -> Option<f64> {
        if self.bytes.is_empty() {
            return None;
        }
        let ones: u32 = self.bytes.iter().map(|b| b.count_ones()).sum();
        Some(f64::from(ones) / (self.bytes.len() * 8) as f64)
    }
}

/// Interval-comparison bits of a sorted series.
pub fn extract_bits(timestamps: &[i64], min_interval: i64) -> Vec<bool> {
    let intervals: Vec<i64> = timestamps
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]))
        .filter(|d| *d > min_interval)
        .collect();
    intervals.windows(2).map(|d| d[0] >= d[1]).collect()
}

/// Pack bits MSB-first; a trailing partial byte is dropped.
pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | u8::from(b)))
        .collect()
}

/// Extract random bytes from one channel.
pub fn extract_random_bytes(series: &ChannelSeries, min_interval: i64) -> Result<QrngOutput> {
    if min_interval < 0 {
        return Err(Error::Config(format!(
            "minimum interval must be >= 0 ticks, got {min_interval}"
        )));
    }
    let bits = extract_bits(series.timestamps(), min_interval);
    if bits.len() < 8 {
        return Err(Error::insufficient(format!(
            "channel {} yields {} bits, fewer than one byte",
            series.channel(),
            bits.len()
        )));
    }
    let bytes = pack_bits(&bits);

    tracing::debug!(
        channel = %series.channel(),
        bits = bits.len(),
        bytes = bytes.len(),
        "extracted random bytes"
    );

    Ok(QrngOutput {
        channel: series.channel(),
        n_intervals: bits.len() + 1,
        n_bits: bits.len(),
        bytes,
    })
}
