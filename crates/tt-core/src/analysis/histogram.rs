//! Delay-correlation histograms G(τ).
//!
//! Every pair `(a, b)` with `|t_b − t_a| <= max_delay` contributes the signed
//! delay `t_b − t_a` to a fixed-width histogram. Bins are centered on
//! multiples of the bin width, `k · bin` for `k ∈ [−K, K]` with
//! `K = ⌈max_delay / bin⌉`, and bin `k` holds delays in
//! `[k·bin − bin/2, k·bin + bin/2)`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tt_common::{ChannelId, ChannelPair, Error, Result};

use crate::clock::ClockPeriod;
use crate::event_log::{ChannelSeries, EventLog};
use crate::join::{CoincidenceWindow, WindowJoin};

/// Peaks below this height are too sparse for a half-maximum crossing to mean
/// anything.
pub const DEFAULT_FWHM_MIN_PEAK: u64 = 4;

/// Largest number of bins one histogram may allocate.
pub const MAX_HISTOGRAM_BINS: usize = 1 << 24;

/// Histogram extent and resolution, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramParams {
    window: CoincidenceWindow,
    bin_width: i64,
    half_bins: i64,
    min_peak: u64,
}

impl HistogramParams {
    pub fn new(max_delay: i64, bin_width: i64) -> Result<Self> {
        let window = CoincidenceWindow::new(max_delay)?;
        if bin_width <= 0 {
            return Err(Error::InvalidBinWidth { value: bin_width });
        }
        // K = ceil(max_delay / bin), written so it cannot overflow
        let half_bins = max_delay / bin_width + i64::from(max_delay % bin_width != 0);
        let n_bins = usize::try_from(half_bins)
            .ok()
            .and_then(|k| k.checked_mul(2))
            .and_then(|n| n.checked_add(1))
            .filter(|&n| n <= MAX_HISTOGRAM_BINS);
        if n_bins.is_none() {
            return Err(Error::Config(format!(
                "histogram of ±{max_delay} ticks at {bin_width}-tick bins needs more than {MAX_HISTOGRAM_BINS} bins"
            )));
        }
        Ok(HistogramParams {
            window,
            bin_width,
            half_bins,
            min_peak: DEFAULT_FWHM_MIN_PEAK,
        })
    }

    /// Minimum peak height for which a FWHM is reported (at least 1).
    pub fn with_min_peak(mut self, min_peak: u64) -> Self {
        self.min_peak = min_peak.max(1);
        self
    }

    pub fn max_delay(&self) -> i64 {
        self.window.ticks()
    }

    pub fn bin_width(&self) -> i64 {
        self.bin_width
    }

    pub fn min_peak(&self) -> u64 {
        self.min_peak
    }

    /// Bins on each side of the zero-delay bin.
    fn half_bins(&self) -> i64 {
        self.half_bins
    }

    /// Bin index (0-based from the most negative bin) of an in-range delay.
    fn bin_index(&self, delay: i64) -> usize {
        let w = i128::from(self.bin_width);
        let k = (2 * i128::from(delay) + w).div_euclid(2 * w);
        (k + i128::from(self.half_bins())) as usize
    }
}

/// Why a FWHM could not be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FwhmUndefined {
    /// No pairs at all.
    Empty,
    /// The peak is lower than the configured minimum height.
    TooSparse,
    /// Never dropped below half maximum left of the peak.
    LeftUnbounded,
    /// Never dropped below half maximum right of the peak.
    RightUnbounded,
}

/// Full width at half maximum of the peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Fwhm {
    Defined { ticks: f64 },
    Undefined { reason: FwhmUndefined },
}

impl Fwhm {
    pub fn ticks(&self) -> Option<f64> {
        match self {
            Fwhm::Defined { ticks } => Some(*ticks),
            Fwhm::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Fwhm::Defined { .. })
    }
}

/// Histogram of `t_target − t_reference` for one channel pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayHistogramResult {
    pub reference: ChannelId,
    pub target: ChannelId,
    pub max_delay_ticks: i64,
    pub bin_width_ticks: i64,
    /// Bin centers in ticks, ascending.
    pub bin_centers: Vec<i64>,
    pub counts: Vec<u64>,
    /// First bin holding the maximum count; `None` when there are no pairs.
    pub peak_index: Option<usize>,
    pub fwhm: Fwhm,
}

impl DelayHistogramResult {
    /// Total number of pairs histogrammed.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn peak_delay_ticks(&self) -> Option<i64> {
        self.peak_index.map(|i| self.bin_centers[i])
    }

    pub fn peak_count(&self) -> Option<u64> {
        self.peak_index.map(|i| self.counts[i])
    }

    pub fn bin_centers_ns(&self, clock: ClockPeriod) -> Vec<f64> {
        self.bin_centers
            .iter()
            .map(|c| clock.ticks_to_ns(*c as f64))
            .collect()
    }

    pub fn peak_delay_ns(&self, clock: ClockPeriod) -> Option<f64> {
        self.peak_delay_ticks().map(|t| clock.ticks_to_ns(t as f64))
    }

    pub fn fwhm_ns(&self, clock: ClockPeriod) -> Option<f64> {
        self.fwhm.ticks().map(|t| clock.ticks_to_ns(t))
    }
}

/// Histogram the delays between two series using the default FWHM threshold.
pub fn delay_histogram(
    series_a: &ChannelSeries,
    series_b: &ChannelSeries,
    max_delay: i64,
    bin_width: i64,
) -> Result<DelayHistogramResult> {
    let params = HistogramParams::new(max_delay, bin_width)?;
    Ok(delay_histogram_with(series_a, series_b, params))
}

/// Histogram the delays between two series.
pub fn delay_histogram_with(
    series_a: &ChannelSeries,
    series_b: &ChannelSeries,
    params: HistogramParams,
) -> DelayHistogramResult {
    let k = params.half_bins();
    let bin_centers: Vec<i64> = (-k..=k).map(|i| i.saturating_mul(params.bin_width)).collect();
    let mut counts = vec![0u64; bin_centers.len()];

    let a_ts = series_a.timestamps();
    let b_ts = series_b.timestamps();
    for (i, range) in WindowJoin::new(series_a, series_b, params.window).matched() {
        let t = a_ts[i];
        for &b in &b_ts[range] {
            counts[params.bin_index(b - t)] += 1;
        }
    }

    let peak_index = peak_index(&counts);
    let fwhm = match peak_index {
        Some(p) => full_width_half_max(&counts, p, params.min_peak, params.bin_width),
        None => Fwhm::Undefined {
            reason: FwhmUndefined::Empty,
        },
    };

    tracing::debug!(
        reference = %series_a.channel(),
        target = %series_b.channel(),
        bins = counts.len(),
        pairs = counts.iter().sum::<u64>(),
        peak = ?peak_index,
        fwhm_defined = fwhm.is_defined(),
        "built delay histogram"
    );

    DelayHistogramResult {
        reference: series_a.channel(),
        target: series_b.channel(),
        max_delay_ticks: params.max_delay(),
        bin_width_ticks: params.bin_width,
        bin_centers,
        counts,
        peak_index,
        fwhm,
    }
}

/// Histograms for several channel pairs, in the order given.
///
/// Every channel is resolved before any histogram is built; pairs are then
/// processed in parallel.
pub fn delay_histograms(
    log: &EventLog,
    pairs: &[ChannelPair],
    params: HistogramParams,
) -> Result<Vec<DelayHistogramResult>> {
    let resolved = pairs
        .iter()
        .map(|p| Ok((log.channel(p.a)?, log.channel(p.b)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(resolved
        .par_iter()
        .map(|(a, b)| delay_histogram_with(a, b, params))
        .collect())
}

/// Index of the first maximal bin, `None` if every bin is empty.
fn peak_index(counts: &[u64]) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (i, &c) in counts.iter().enumerate() {
        if c > 0 && best.is_none_or(|(_, b)| c > b) {
            best = Some((i, c));
        }
    }
    best.map(|(i, _)| i)
}

/// Distance between the first bins below half maximum on either side of
/// `peak`, in whole bins.
fn full_width_half_max(counts: &[u64], peak: usize, min_peak: u64, bin_width: i64) -> Fwhm {
    let height = counts[peak];
    if height < min_peak {
        return Fwhm::Undefined {
            reason: FwhmUndefined::TooSparse,
        };
    }
    let half = height as f64 / 2.0;
    let below = |j: usize| (counts[j] as f64) < half;

    let Some(l) = (0..peak).rev().find(|&j| below(j)) else {
        return Fwhm::Undefined {
            reason: FwhmUndefined::LeftUnbounded,
        };
    };
    let Some(r) = (peak + 1..counts.len()).find(|&j| below(j)) else {
        return Fwhm::Undefined {
            reason: FwhmUndefined::RightUnbounded,
        };
    };

    Fwhm::Defined {
        ticks: (r - l) as f64 * bin_width as f64,
    }
}
