//! Photon-counting statistics over fixed-width time bins.
//!
//! Bins start at the series' first timestamp and are left-closed,
//! right-open: bin `i` holds `[first + i·w, first + (i+1)·w)`, which is the
//! same as assigning each event the index `(t − first) div w`. Bins without
//! events are kept as explicit zeros. The last bin is the one holding the
//! last event.
//!
//! The count sequence feeds a curve fit of either a Poisson or a
//! Bose–Einstein model to the distribution of counts per bin. The fit itself
//! is delegated to a [`CurveFitter`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tt_common::{ChannelId, Error, Result};
use tt_math::{CountModel, Moments};

use crate::event_log::ChannelSeries;
use crate::join::{OffsetWindow, WindowJoin};

/// Events per consecutive bin of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinnedCounts {
    pub channel: ChannelId,
    pub bin_width_ticks: i64,
    /// Start of the first bin (the first event).
    pub start: i64,
    pub counts: Vec<u64>,
}

/// Partition a series into bins of `bin_width` ticks and count each bin.
pub fn bin_counts(series: &ChannelSeries, bin_width: i64) -> Result<BinnedCounts> {
    if bin_width <= 0 {
        return Err(Error::InvalidBinWidth { value: bin_width });
    }
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Err(Error::insufficient(format!(
            "channel {} has no events to bin",
            series.channel()
        )));
    };

    let n_bins = usize::try_from((i128::from(last) - i128::from(first)) / i128::from(bin_width))
        .ok()
        .and_then(|n| n.checked_add(1))
        .ok_or_else(|| Error::Config(format!("bin width {bin_width} gives too many bins")))?;

    // Each bin start is a reference event whose one-sided window covers the bin
    let starts: Vec<i64> = (0..n_bins as i64)
        .map(|i| first.saturating_add(i.saturating_mul(bin_width)))
        .collect();
    let window = OffsetWindow {
        before: 0,
        after: bin_width - 1,
    };
    let counts = WindowJoin::over_slices(&starts, series.timestamps(), window)
        .map(|(_, range)| range.len() as u64)
        .collect();

    Ok(BinnedCounts {
        channel: series.channel(),
        bin_width_ticks: bin_width,
        start: first,
        counts,
    })
}

/// Per-bin counts with their moments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinStatistics {
    pub channel: ChannelId,
    pub bin_width_ticks: i64,
    pub start: i64,
    pub counts_per_bin: Vec<u64>,
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    pub fano_factor: f64,
}

impl BinStatistics {
    /// Moments of an existing count sequence.
    ///
    /// Fails with [`Error::InsufficientData`] for an empty sequence or a zero
    /// mean, where the Fano factor is undefined.
    pub fn from_counts(binned: BinnedCounts) -> Result<Self> {
        let moments = Moments::from_counts(&binned.counts)
            .ok_or_else(|| Error::insufficient("no bins to compute statistics over"))?;
        let fano_factor = moments.fano_factor().ok_or_else(|| {
            Error::insufficient(format!(
                "mean count on channel {} is zero; Fano factor undefined",
                binned.channel
            ))
        })?;
        Ok(BinStatistics {
            channel: binned.channel,
            bin_width_ticks: binned.bin_width_ticks,
            start: binned.start,
            counts_per_bin: binned.counts,
            mean: moments.mean,
            variance: moments.variance,
            fano_factor,
        })
    }

    pub fn n_bins(&self) -> usize {
        self.counts_per_bin.len()
    }

    pub fn total_events(&self) -> u64 {
        self.counts_per_bin.iter().sum()
    }

    /// How many bins saw each count.
    pub fn count_distribution(&self) -> BTreeMap<u64, u64> {
        count_distribution(&self.counts_per_bin)
    }
}

/// Bin a series and compute mean, population variance and Fano factor.
pub fn bin_statistics(series: &ChannelSeries, bin_width: i64) -> Result<BinStatistics> {
    let stats = BinStatistics::from_counts(bin_counts(series, bin_width)?)?;
    tracing::debug!(
        channel = %stats.channel,
        bins = stats.n_bins(),
        mean = stats.mean,
        variance = stats.variance,
        fano = stats.fano_factor,
        "binned counts"
    );
    Ok(stats)
}

/// Bin each acquisition from its own first event and pool the counts.
///
/// Every file restarts its clock, so runs are never merged onto one time
/// axis. Runs without events contribute no bins; `start` is that of the first
/// run that has events.
pub fn bin_statistics_per_run(runs: &[&ChannelSeries], bin_width: i64) -> Result<BinStatistics> {
    if bin_width <= 0 {
        return Err(Error::InvalidBinWidth { value: bin_width });
    }
    let mut pooled: Option<BinnedCounts> = None;
    for run in runs.iter().filter(|s| !s.is_empty()) {
        let binned = bin_counts(run, bin_width)?;
        match pooled.as_mut() {
            Some(acc) => acc.counts.extend(binned.counts),
            None => pooled = Some(binned),
        }
    }
    let Some(pooled) = pooled else {
        let channel = runs.first().map(|s| s.channel().to_string());
        return Err(Error::insufficient(format!(
            "channel {} has no events to bin in any run",
            channel.unwrap_or_else(|| "?".to_string())
        )));
    };

    let stats = BinStatistics::from_counts(pooled)?;
    tracing::debug!(
        channel = %stats.channel,
        runs = runs.len(),
        bins = stats.n_bins(),
        fano = stats.fano_factor,
        "binned counts per run"
    );
    Ok(stats)
}

/// Drop events closer than `min_separation` ticks to the previous raw event
/// of the same channel.
///
/// The comparison is always against the preceding event in the input, kept
/// or not, so an afterpulse burst is removed as a whole.
pub fn dead_time_filter(series: &ChannelSeries, min_separation: i64) -> Result<ChannelSeries> {
    if min_separation < 0 {
        return Err(Error::Config(format!(
            "dead time must be >= 0 ticks, got {min_separation}"
        )));
    }
    Ok(series.filter_with_previous(|prev, t| prev.is_none_or(|p| t.saturating_sub(p) >= min_separation)))
}

/// Occurrences of each per-bin count, `k → number of bins with k events`.
pub fn count_distribution(counts: &[u64]) -> BTreeMap<u64, u64> {
    let mut dist = BTreeMap::new();
    for &c in counts {
        *dist.entry(c).or_insert(0) += 1;
    }
    dist
}

/// One point of the count distribution: `occurrences` bins saw `k` events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitPoint {
    pub k: f64,
    pub occurrences: f64,
}

/// Mean and amplitude of a count model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub mean: f64,
    pub scale: f64,
}

/// Everything a curve fitter needs: model family, data and starting point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRequest {
    pub model: CountModel,
    pub points: Vec<FitPoint>,
    /// `(mean, Σ occurrences)`.
    pub initial_guess: ModelParameters,
}

impl FitRequest {
    /// Build the request from binned statistics.
    ///
    /// Points sit at integer `k`; the Γ-function model accepts them as
    /// real numbers.
    pub fn new(model: CountModel, stats: &BinStatistics) -> Self {
        let dist = stats.count_distribution();
        let points: Vec<FitPoint> = dist
            .iter()
            .map(|(&k, &n)| FitPoint {
                k: k as f64,
                occurrences: n as f64,
            })
            .collect();
        let scale = points.iter().map(|p| p.occurrences).sum();
        FitRequest {
            model,
            points,
            initial_guess: ModelParameters {
                mean: stats.mean,
                scale,
            },
        }
    }

    /// Sum of squared residuals of the model at `params`.
    pub fn residual_ss(&self, params: ModelParameters) -> f64 {
        self.points
            .iter()
            .map(|p| {
                let r = p.occurrences - self.model.evaluate(p.k, params.mean, params.scale);
                r * r
            })
            .sum()
    }
}

/// Fitted parameters and the quality of the fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOutcome {
    pub model: CountModel,
    pub params: ModelParameters,
    pub residual_ss: f64,
}

/// Fits a count model to a count distribution.
pub trait CurveFitter {
    fn fit(&self, request: &FitRequest) -> Result<FitOutcome>;
}

/// Closed-form fit: mean from the sample mean, scale from the bin count.
///
/// These are the maximum-likelihood estimates for both model families.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentFitter;

impl CurveFitter for MomentFitter {
    fn fit(&self, request: &FitRequest) -> Result<FitOutcome> {
        if request.points.is_empty() {
            return Err(Error::insufficient("count distribution is empty"));
        }
        let params = request.initial_guess;
        if !(params.mean.is_finite() && params.mean > 0.0) {
            return Err(Error::insufficient(format!(
                "model mean {} is not positive",
                params.mean
            )));
        }
        Ok(FitOutcome {
            model: request.model,
            params,
            residual_ss: request.residual_ss(params),
        })
    }
}
