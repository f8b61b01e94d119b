//! Coincidence and counting analyses over a calibrated event log.

pub mod alpha;
pub mod binning;
pub mod coincidence;
pub mod histogram;
pub mod qrng;

pub use alpha::{classify_alpha, estimate_alpha, estimate_heralded_g2, AlphaOutcome, AlphaStatistic};
pub use binning::{
    bin_counts, bin_statistics, bin_statistics_per_run, count_distribution, dead_time_filter, BinStatistics, BinnedCounts,
    CurveFitter, FitOutcome, FitPoint, FitRequest, ModelParameters, MomentFitter,
};
pub use coincidence::{
    count_coincidences, count_coincidences_audited, count_pairs, scan_windows, CoincidenceResult,
    PairCount, TripleRecord,
};
pub use histogram::{
    delay_histogram, delay_histogram_with, delay_histograms, DelayHistogramResult, Fwhm,
    FwhmUndefined, HistogramParams, DEFAULT_FWHM_MIN_PEAK,
};
pub use qrng::{extract_bits, extract_random_bytes, pack_bits, QrngOutput};
