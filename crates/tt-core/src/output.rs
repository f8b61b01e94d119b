//! Command reports and their renderings.
//!
//! Every command produces one report type. JSON output wraps it in an
//! envelope carrying the schema version, run id and the configuration
//! snapshot that produced it; the other formats render the report alone.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use tt_common::{ChannelId, OutputFormat, Result, SCHEMA_VERSION};
use tt_config::ConfigSnapshot;
use tt_math::{normalized_pmf, CountModel};

use crate::analysis::{
    classify_alpha, AlphaOutcome, BinStatistics, CoincidenceResult, DelayHistogramResult,
    FitOutcome, Fwhm, PairCount, QrngOutput, TripleRecord,
};
use crate::cache::CachedScan;
use crate::clock::ClockPeriod;

/// A command result that can be rendered in every output format.
pub trait Report: Serialize {
    /// Command name recorded in the JSON envelope.
    fn command(&self) -> &'static str;
    fn markdown(&self) -> String;
    fn csv(&self) -> String;
    fn summary(&self) -> String;
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    run_id: &'a str,
    generated_at: String,
    command: &'static str,
    config: &'a ConfigSnapshot,
    result: &'a T,
}

/// Render `report` in `format`.
pub fn render<T: Report>(
    format: OutputFormat,
    run_id: &str,
    config: &ConfigSnapshot,
    report: &T,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&Envelope {
            schema_version: SCHEMA_VERSION,
            run_id,
            generated_at: chrono::Utc::now().to_rfc3339(),
            command: report.command(),
            config,
            result: report,
        })?,
        OutputFormat::Md => report.markdown(),
        OutputFormat::Csv => report.csv(),
        OutputFormat::Summary => report.summary(),
    })
}

fn alpha_text(outcome: &AlphaOutcome) -> String {
    match outcome {
        AlphaOutcome::Measured { alpha, sigma } => format!("{alpha:.4} ± {sigma:.4}"),
        AlphaOutcome::NoTriples => "0 (no triples, σ undefined)".to_string(),
        AlphaOutcome::Insufficient { .. } => "undefined".to_string(),
    }
}

fn alpha_csv(outcome: &AlphaOutcome) -> (String, String) {
    match outcome {
        AlphaOutcome::Measured { alpha, sigma } => (alpha.to_string(), sigma.to_string()),
        AlphaOutcome::NoTriples => ("0".to_string(), String::new()),
        AlphaOutcome::Insufficient { .. } => (String::new(), String::new()),
    }
}

fn opt_f64(v: Option<f64>, precision: usize) -> String {
    v.map(|x| format!("{x:.precision$}"))
        .unwrap_or_else(|| "undefined".to_string())
}

// ============================================================================
// coincidences
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CoincidenceReport {
    pub window_ns: f64,
    pub window_ticks: i64,
    pub counts: CoincidenceResult,
    pub alpha: AlphaOutcome,
    pub pairs: Vec<PairCount>,
}

impl CoincidenceReport {
    pub fn new(result: CoincidenceResult, pairs: Vec<PairCount>, clock: ClockPeriod) -> Self {
        CoincidenceReport {
            window_ns: clock.ticks_to_ns(result.window_ticks as f64),
            window_ticks: result.window_ticks,
            alpha: classify_alpha(&result),
            counts: result,
            pairs,
        }
    }
}

fn triple_line(t: &TripleRecord) -> String {
    format!("herald {} | A {:?} | B {:?}", t.herald, t.hits_a, t.hits_b)
}

impl Report for CoincidenceReport {
    fn command(&self) -> &'static str {
        "coincidences"
    }

    fn markdown(&self) -> String {
        let c = &self.counts;
        let mut out = String::new();
        let _ = writeln!(out, "# Coincidences");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Herald {} vs targets {} and {}, window ±{:.3} ns ({} ticks)",
            c.herald, c.target_a, c.target_b, self.window_ns, self.window_ticks
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "| quantity | value |");
        let _ = writeln!(out, "|---|---|");
        let _ = writeln!(out, "| herald events | {} |", c.n_reference);
        let _ = writeln!(out, "| herald + {} | {} |", c.target_a, c.n_pair_a);
        let _ = writeln!(out, "| herald + {} | {} |", c.target_b, c.n_pair_b);
        let _ = writeln!(out, "| triples | {} |", c.n_triple);
        let _ = writeln!(out, "| α = g²(0) | {} |", alpha_text(&self.alpha));
        if let AlphaOutcome::Insufficient { reason } = &self.alpha {
            let _ = writeln!(out);
            let _ = writeln!(out, "α undefined: {reason}");
        }
        if !c.triples.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## First triples");
            for t in &c.triples {
                let _ = writeln!(out, "- {}", triple_line(t));
            }
        }
        if !self.pairs.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Pairs");
            let _ = writeln!(out, "| reference | target | matched | pairs |");
            let _ = writeln!(out, "|---|---|---|---|");
            for p in &self.pairs {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    p.reference, p.target, p.n_matched, p.n_pairs
                );
            }
        }
        out
    }

    fn csv(&self) -> String {
        let c = &self.counts;
        let (alpha, sigma) = alpha_csv(&self.alpha);
        format!(
            "window_ns,window_ticks,n_reference,n_pair_a,n_pair_b,n_triple,alpha,sigma\n{},{},{},{},{},{},{},{}\n",
            self.window_ns,
            self.window_ticks,
            c.n_reference,
            c.n_pair_a,
            c.n_pair_b,
            c.n_triple,
            alpha,
            sigma
        )
    }

    fn summary(&self) -> String {
        let c = &self.counts;
        format!(
            "w=±{} ticks: N{}={} N{}{}={} N{}{}={} triples={} α={}",
            self.window_ticks,
            c.herald,
            c.n_reference,
            c.herald,
            c.target_a,
            c.n_pair_a,
            c.herald,
            c.target_b,
            c.n_pair_b,
            c.n_triple,
            alpha_text(&self.alpha)
        )
    }
}

// ============================================================================
// scan
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ScanRow {
    pub window_ns: f64,
    pub window_ticks: i64,
    pub n_reference: u64,
    pub n_pair_a: u64,
    pub n_pair_b: u64,
    pub n_triple: u64,
    pub alpha: AlphaOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub path: PathBuf,
    pub cache_hits: usize,
    pub computed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub label: String,
    pub herald: ChannelId,
    pub target_a: ChannelId,
    pub target_b: ChannelId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheInfo>,
    pub rows: Vec<ScanRow>,
}

impl ScanReport {
    pub fn new(
        label: impl Into<String>,
        results: &[CoincidenceResult],
        clock: ClockPeriod,
        cache: Option<&CachedScan>,
    ) -> Self {
        let rows = results
            .iter()
            .map(|r| ScanRow {
                window_ns: clock.ticks_to_ns(r.window_ticks as f64),
                window_ticks: r.window_ticks,
                n_reference: r.n_reference,
                n_pair_a: r.n_pair_a,
                n_pair_b: r.n_pair_b,
                n_triple: r.n_triple,
                alpha: classify_alpha(r),
            })
            .collect();
        let (herald, target_a, target_b) = results
            .first()
            .map(|r| (r.herald, r.target_a, r.target_b))
            .unwrap_or((ChannelId(0), ChannelId(0), ChannelId(0)));
        ScanReport {
            label: label.into(),
            herald,
            target_a,
            target_b,
            cache: cache.map(|c| CacheInfo {
                path: c.path.clone(),
                cache_hits: c.cache_hits,
                computed: c.computed,
            }),
            rows,
        }
    }
}

impl Report for ScanReport {
    fn command(&self) -> &'static str {
        "scan"
    }

    fn markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# α vs coincidence window: {}", self.label);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Herald {} vs targets {} and {}",
            self.herald, self.target_a, self.target_b
        );
        if let Some(cache) = &self.cache {
            let _ = writeln!(
                out,
                "Cache: {} ({} cached, {} computed)",
                cache.path.display(),
                cache.cache_hits,
                cache.computed
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "| window (ns) | ticks | N_h | N_ha | N_hb | N_hab | α |");
        let _ = writeln!(out, "|---|---|---|---|---|---|---|");
        for r in &self.rows {
            let _ = writeln!(
                out,
                "| {:.3} | {} | {} | {} | {} | {} | {} |",
                r.window_ns,
                r.window_ticks,
                r.n_reference,
                r.n_pair_a,
                r.n_pair_b,
                r.n_triple,
                alpha_text(&r.alpha)
            );
        }
        out
    }

    fn csv(&self) -> String {
        let mut out =
            String::from("window_ns,window_ticks,n_reference,n_pair_a,n_pair_b,n_triple,alpha,sigma\n");
        for r in &self.rows {
            let (alpha, sigma) = alpha_csv(&r.alpha);
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{}",
                r.window_ns, r.window_ticks, r.n_reference, r.n_pair_a, r.n_pair_b, r.n_triple, alpha, sigma
            );
        }
        out
    }

    fn summary(&self) -> String {
        let measured = self
            .rows
            .iter()
            .filter(|r| matches!(r.alpha, AlphaOutcome::Measured { .. }))
            .count();
        format!(
            "{}: {} windows scanned, α defined for {}",
            self.label,
            self.rows.len(),
            measured
        )
    }
}

// ============================================================================
// histogram
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HistogramEntry {
    pub reference: ChannelId,
    pub target: ChannelId,
    pub bin_width_ns: f64,
    pub total: u64,
    pub bin_centers_ns: Vec<f64>,
    pub counts: Vec<u64>,
    pub peak_delay_ns: Option<f64>,
    pub peak_count: Option<u64>,
    pub fwhm: Fwhm,
    pub fwhm_ns: Option<f64>,
}

impl HistogramEntry {
    pub fn new(h: &DelayHistogramResult, clock: ClockPeriod) -> Self {
        HistogramEntry {
            reference: h.reference,
            target: h.target,
            bin_width_ns: clock.ticks_to_ns(h.bin_width_ticks as f64),
            total: h.total(),
            bin_centers_ns: h.bin_centers_ns(clock),
            counts: h.counts.clone(),
            peak_delay_ns: h.peak_delay_ns(clock),
            peak_count: h.peak_count(),
            fwhm: h.fwhm,
            fwhm_ns: h.fwhm_ns(clock),
        }
    }

    fn fwhm_text(&self) -> String {
        match (&self.fwhm, self.fwhm_ns) {
            (_, Some(ns)) => format!("{ns:.3} ns"),
            (Fwhm::Undefined { reason }, None) => format!("undefined ({reason:?})"),
            (Fwhm::Defined { .. }, None) => "undefined".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramReport {
    pub histograms: Vec<HistogramEntry>,
}

impl HistogramReport {
    pub fn new(histograms: &[DelayHistogramResult], clock: ClockPeriod) -> Self {
        HistogramReport {
            histograms: histograms
                .iter()
                .map(|h| HistogramEntry::new(h, clock))
                .collect(),
        }
    }
}

impl Report for HistogramReport {
    fn command(&self) -> &'static str {
        "histogram"
    }

    fn markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Delay histograms G(τ)");
        let _ = writeln!(out);
        let _ = writeln!(out, "| pair | pairs | peak delay (ns) | peak count | FWHM |");
        let _ = writeln!(out, "|---|---|---|---|---|");
        for h in &self.histograms {
            let _ = writeln!(
                out,
                "| ({},{}) | {} | {} | {} | {} |",
                h.reference,
                h.target,
                h.total,
                opt_f64(h.peak_delay_ns, 3),
                h.peak_count.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
                h.fwhm_text()
            );
        }
        out
    }

    fn csv(&self) -> String {
        let mut out = String::from("reference,target,delay_ns,count\n");
        for h in &self.histograms {
            for (center, count) in h.bin_centers_ns.iter().zip(&h.counts) {
                let _ = writeln!(out, "{},{},{},{}", h.reference, h.target, center, count);
            }
        }
        out
    }

    fn summary(&self) -> String {
        self.histograms
            .iter()
            .map(|h| {
                format!(
                    "({},{}) peak={} ns FWHM={}",
                    h.reference,
                    h.target,
                    opt_f64(h.peak_delay_ns, 3),
                    h.fwhm_text()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// bins
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BinsReport {
    pub channel: ChannelId,
    pub model: CountModel,
    pub bin_s: f64,
    pub bin_width_ticks: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_time_ticks: Option<i64>,
    pub events_read: usize,
    pub events_kept: u64,
    pub n_bins: usize,
    pub mean: f64,
    pub variance: f64,
    pub fano_factor: f64,
    /// Bins per observed count.
    pub distribution: BTreeMap<u64, u64>,
    pub fit: FitOutcome,
    /// Variance the fitted model predicts at the fitted mean.
    pub model_variance: f64,
    /// Fitted model probabilities for `k = 0..=max observed`, renormalized
    /// over that range.
    pub model_pmf: Vec<f64>,
}

impl BinsReport {
    pub fn new(
        stats: &BinStatistics,
        fit: FitOutcome,
        clock: ClockPeriod,
        events_read: usize,
        dead_time_ticks: Option<i64>,
    ) -> Self {
        BinsReport {
            channel: stats.channel,
            model: fit.model,
            bin_s: clock.ticks_to_seconds(stats.bin_width_ticks as f64),
            bin_width_ticks: stats.bin_width_ticks,
            dead_time_ticks,
            events_read,
            events_kept: stats.total_events(),
            n_bins: stats.n_bins(),
            mean: stats.mean,
            variance: stats.variance,
            fano_factor: stats.fano_factor,
            distribution: stats.count_distribution(),
            model_variance: fit.model.variance(fit.params.mean),
            model_pmf: model_pmf(stats, &fit),
            fit,
        }
    }
}

fn model_pmf(stats: &BinStatistics, fit: &FitOutcome) -> Vec<f64> {
    let max_k = stats.counts_per_bin.iter().copied().max().unwrap_or(0);
    let ks: Vec<f64> = (0..=max_k).map(|k| k as f64).collect();
    normalized_pmf(fit.model, &ks, fit.params.mean)
}

impl BinsReport {
    fn model_fraction(&self, k: u64) -> f64 {
        usize::try_from(k)
            .ok()
            .and_then(|i| self.model_pmf.get(i))
            .copied()
            .unwrap_or(0.0)
    }
}

impl Report for BinsReport {
    fn command(&self) -> &'static str {
        "bins"
    }

    fn markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Counting statistics, channel {}", self.channel);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} bins of {:e} s ({} ticks); {} of {} events kept",
            self.n_bins, self.bin_s, self.bin_width_ticks, self.events_kept, self.events_read
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "| statistic | value |");
        let _ = writeln!(out, "|---|---|");
        let _ = writeln!(out, "| mean | {:.4} |", self.mean);
        let _ = writeln!(out, "| variance | {:.4} |", self.variance);
        let _ = writeln!(out, "| Fano factor | {:.4} |", self.fano_factor);
        let _ = writeln!(out, "| model | {} |", self.model);
        let _ = writeln!(out, "| model variance | {:.4} |", self.model_variance);
        let _ = writeln!(out, "| fitted mean | {:.4} |", self.fit.params.mean);
        let _ = writeln!(out, "| fitted scale | {:.1} |", self.fit.params.scale);
        let _ = writeln!(out, "| residual SS | {:.4} |", self.fit.residual_ss);
        let _ = writeln!(out);
        let _ = writeln!(out, "| k | bins | model | model fraction |");
        let _ = writeln!(out, "|---|---|---|---|");
        for (k, n) in &self.distribution {
            let model = self
                .model
                .evaluate(*k as f64, self.fit.params.mean, self.fit.params.scale);
            let fraction = self.model_fraction(*k);
            let _ = writeln!(out, "| {k} | {n} | {model:.2} | {fraction:.4} |");
        }
        out
    }

    fn csv(&self) -> String {
        let mut out = String::from("k,bins,model,model_fraction\n");
        for (k, n) in &self.distribution {
            let model = self
                .model
                .evaluate(*k as f64, self.fit.params.mean, self.fit.params.scale);
            let _ = writeln!(out, "{k},{n},{model},{}", self.model_fraction(*k));
        }
        out
    }

    fn summary(&self) -> String {
        format!(
            "channel {}: {} bins, mean={:.4} var={:.4} F={:.4} ({})",
            self.channel, self.n_bins, self.mean, self.variance, self.fano_factor, self.model
        )
    }
}

// ============================================================================
// qrng
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct QrngReport {
    pub out: PathBuf,
    pub total_bytes: usize,
    pub ones_fraction: Option<f64>,
    pub sources: Vec<QrngSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrngSource {
    pub path: PathBuf,
    #[serde(flatten)]
    pub output: QrngOutput,
}

impl QrngReport {
    pub fn new(out: PathBuf, sources: Vec<QrngSource>) -> Self {
        let total_bytes = sources.iter().map(|s| s.output.bytes.len()).sum();
        let ones: u64 = sources
            .iter()
            .flat_map(|s| &s.output.bytes)
            .map(|b| u64::from(b.count_ones()))
            .sum();
        let ones_fraction = (total_bytes > 0).then(|| ones as f64 / (total_bytes * 8) as f64);
        QrngReport {
            out,
            total_bytes,
            ones_fraction,
            sources,
        }
    }
}

impl Report for QrngReport {
    fn command(&self) -> &'static str {
        "qrng"
    }

    fn markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Random bytes");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} bytes written to {} (ones fraction {})",
            self.total_bytes,
            self.out.display(),
            opt_f64(self.ones_fraction, 4)
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "| file | intervals | bits | bytes |");
        let _ = writeln!(out, "|---|---|---|---|");
        for s in &self.sources {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                s.path.display(),
                s.output.n_intervals,
                s.output.n_bits,
                s.output.bytes.len()
            );
        }
        out
    }

    fn csv(&self) -> String {
        let mut out = String::from("path,intervals,bits,bytes\n");
        for s in &self.sources {
            let _ = writeln!(
                out,
                "{},{},{},{}",
                s.path.display(),
                s.output.n_intervals,
                s.output.n_bits,
                s.output.bytes.len()
            );
        }
        out
    }

    fn summary(&self) -> String {
        format!(
            "{} bytes from {} files -> {}",
            self.total_bytes,
            self.sources.len(),
            self.out.display()
        )
    }
}
