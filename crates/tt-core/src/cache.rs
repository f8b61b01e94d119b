//! On-disk cache of α-vs-window scans.
//!
//! One CSV file per (label, herald, target A, target B, timing), one row per
//! window. The timing fingerprint covers the clock period, whether delays
//! were applied and which offsets were used, so raw and calibrated scans of
//! the same run never share a file:
//!
//! ```text
//! window_ticks,n_reference,n_pair_a,n_pair_b,n_triple,alpha,sigma
//! 12,48211,1032,998,3,0.1403,0.0811
//! ```
//!
//! α and σ are left empty when undefined. Rows are keyed by `window_ticks`;
//! only the counts are read back, α and σ are derived from them again.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tt_common::{ChannelId, Error, Result};

use crate::analysis::alpha::estimate_alpha;
use crate::analysis::coincidence::{scan_windows, CoincidenceResult};
use crate::clock::ClockPeriod;
use crate::event_log::EventLog;

const HEADER: &str = "window_ticks,n_reference,n_pair_a,n_pair_b,n_triple,alpha,sigma";

/// Identity of one cached scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanKey {
    pub label: String,
    pub herald: ChannelId,
    pub target_a: ChannelId,
    pub target_b: ChannelId,
    /// Short hash of the log's timing; see [`ScanKey::with_timing`].
    pub timing: Option<String>,
}

impl ScanKey {
    pub fn new(
        label: impl Into<String>,
        herald: ChannelId,
        target_a: ChannelId,
        target_b: ChannelId,
    ) -> Self {
        ScanKey {
            label: label.into(),
            herald,
            target_a,
            target_b,
            timing: None,
        }
    }

    /// Tie the key to how `log` was timed: clock period, calibration state
    /// and per-channel offsets.
    pub fn with_timing(mut self, log: &EventLog, clock: ClockPeriod) -> Self {
        let mut text = format!("{:?};{:016x}", log.state(), clock.seconds().to_bits());
        for (channel, offset) in log.applied_offsets() {
            let _ = write!(text, ";{channel}={offset}");
        }
        let digest = hex::encode(Sha256::digest(text.as_bytes()));
        self.timing = Some(digest[..8].to_string());
        self
    }

    fn file_name(&self) -> String {
        let label: String = self
            .label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let timing = self
            .timing
            .as_deref()
            .map(|t| format!("_t{t}"))
            .unwrap_or_default();
        format!(
            "{}_h{}_a{}_b{}{}_alpha_vs_window.csv",
            label, self.herald, self.target_a, self.target_b, timing
        )
    }
}

/// Results of a cached scan plus how many windows came from disk.
#[derive(Debug, Clone)]
pub struct CachedScan {
    pub results: Vec<CoincidenceResult>,
    pub cache_hits: usize,
    pub computed: usize,
    pub path: PathBuf,
}

/// Directory of cached scans.
#[derive(Debug, Clone)]
pub struct ScanCache {
    dir: PathBuf,
}

impl ScanCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ScanCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &ScanKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Cached rows for `key`; a missing file is an empty cache.
    pub fn load(&self, key: &ScanKey) -> Result<BTreeMap<i64, CoincidenceResult>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = std::fs::read_to_string(&path)?;
        parse_rows(&text, &path, key)
    }

    /// Write all rows for `key`, replacing the file.
    pub fn store(&self, key: &ScanKey, rows: &BTreeMap<i64, CoincidenceResult>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("csv.tmp");
        std::fs::write(&tmp, render_rows(rows))?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Scan `window_sizes`, computing only windows missing from the cache.
    ///
    /// Results are returned in the requested order. Newly computed windows
    /// are merged into the cache file.
    pub fn scan(
        &self,
        key: &ScanKey,
        log: &EventLog,
        window_sizes: &[i64],
    ) -> Result<CachedScan> {
        let mut rows = self.load(key)?;

        let mut missing: Vec<i64> = window_sizes
            .iter()
            .copied()
            .filter(|w| !rows.contains_key(w))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        let computed = missing.len();
        if !missing.is_empty() {
            let fresh = scan_windows(log, key.herald, key.target_a, key.target_b, &missing)?;
            rows.extend(fresh.into_iter().map(|r| (r.window_ticks, r)));
            self.store(key, &rows)?;
        }

        let results = window_sizes
            .iter()
            .map(|w| {
                rows.get(w).cloned().ok_or_else(|| {
                    Error::insufficient(format!("window {w} missing after scan"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let cache_hits = window_sizes
            .iter()
            .filter(|w| missing.binary_search(w).is_err())
            .count();
        tracing::debug!(
            path = %self.path_for(key).display(),
            cache_hits,
            computed,
            "scan cache consulted"
        );

        Ok(CachedScan {
            results,
            cache_hits,
            computed,
            path: self.path_for(key),
        })
    }
}

fn render_rows(rows: &BTreeMap<i64, CoincidenceResult>) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for r in rows.values() {
        let (alpha, sigma) = match estimate_alpha(r) {
            Ok(s) => (s.alpha.to_string(), s.sigma.to_string()),
            Err(_) => (String::new(), String::new()),
        };
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            r.window_ticks, r.n_reference, r.n_pair_a, r.n_pair_b, r.n_triple, alpha, sigma
        );
    }
    out
}

fn parse_rows(
    text: &str,
    path: &Path,
    key: &ScanKey,
) -> Result<BTreeMap<i64, CoincidenceResult>> {
    let mut rows = BTreeMap::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if idx == 0 || line.is_empty() {
            continue;
        }
        let parse_err = |message: String| Error::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            message,
        };
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 7 {
            return Err(parse_err(format!("expected 7 fields, found {}", fields.len())));
        }
        let int = |i: usize| {
            fields[i]
                .trim()
                .parse::<u64>()
                .map_err(|e| parse_err(format!("field {}: {}", i + 1, e)))
        };
        let window_ticks = fields[0]
            .trim()
            .parse::<i64>()
            .map_err(|e| parse_err(format!("window_ticks: {e}")))?;
        let result = CoincidenceResult {
            herald: key.herald,
            target_a: key.target_a,
            target_b: key.target_b,
            window_ticks,
            n_reference: int(1)?,
            n_pair_a: int(2)?,
            n_pair_b: int(3)?,
            n_triple: int(4)?,
            triples: Vec::new(),
        };
        rows.insert(window_ticks, result);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::EventRecord;

    fn log() -> EventLog {
        let mut recs = Vec::new();
        recs.extend([100, 200, 300].map(|t| EventRecord::new(3u32, t)));
        recs.extend([101, 305].map(|t| EventRecord::new(1u32, t)));
        recs.extend([99, 202].map(|t| EventRecord::new(2u32, t)));
        EventLog::from_records(recs)
    }

    fn key() -> ScanKey {
        ScanKey::new("run 1", ChannelId(3), ChannelId(1), ChannelId(2))
    }

    #[test]
    fn computes_then_hits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScanCache::new(dir.path());

        let first = cache.scan(&key(), &log(), &[5, 3]).unwrap();
        assert_eq!(first.computed, 2);
        assert_eq!(first.cache_hits, 0);
        assert!(first.path.ends_with("run_1_h3_a1_b2_alpha_vs_window.csv"));

        let second = cache.scan(&key(), &log(), &[3, 0, 5]).unwrap();
        assert_eq!(second.computed, 1);
        assert_eq!(second.cache_hits, 2);
        let windows: Vec<i64> = second.results.iter().map(|r| r.window_ticks).collect();
        assert_eq!(windows, vec![3, 0, 5]);
        assert_eq!(second.results[2].n_pair_a, 2);
    }

    #[test]
    fn raw_and_calibrated_scans_use_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScanCache::new(dir.path());
        let clock = ClockPeriod::new(1e-9).unwrap();

        let raw = log();
        let offsets = BTreeMap::from([(ChannelId(1), -4)]);
        let calibrated = crate::calibrate::calibrate(&raw, &offsets);

        let raw_key = key().with_timing(&raw, clock);
        let cal_key = key().with_timing(&calibrated, clock);
        assert_ne!(cache.path_for(&raw_key), cache.path_for(&cal_key));

        let cal = cache.scan(&cal_key, &calibrated, &[3]).unwrap();
        // 305 - 4 lands within 3 ticks of the herald at 300
        assert_eq!(cal.results[0].n_pair_a, 2);
        let fresh = cache.scan(&raw_key, &raw, &[3]).unwrap();
        assert_eq!(fresh.computed, 1);
        assert_eq!(fresh.results[0].n_pair_a, 1);

        let other_clock = key().with_timing(&raw, ClockPeriod::new(2e-9).unwrap());
        assert_ne!(raw_key.timing, other_clock.timing);
        assert_eq!(raw_key, key().with_timing(&raw, clock));
    }

    #[test]
    fn cached_rows_round_trip_counts() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScanCache::new(dir.path());
        cache.scan(&key(), &log(), &[5]).unwrap();

        let text = std::fs::read_to_string(cache.path_for(&key())).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(HEADER));
        assert!(lines.next().unwrap().starts_with("5,3,2,2,1,"));

        let rows = cache.load(&key()).unwrap();
        assert_eq!(rows[&5].n_triple, 1);
        assert_eq!(rows[&5].herald, ChannelId(3));
    }

    #[test]
    fn undefined_alpha_leaves_empty_fields() {
        let rows = BTreeMap::from([(
            0,
            CoincidenceResult {
                herald: ChannelId(3),
                target_a: ChannelId(1),
                target_b: ChannelId(2),
                window_ticks: 0,
                n_reference: 3,
                n_pair_a: 0,
                n_pair_b: 0,
                n_triple: 0,
                triples: Vec::new(),
            },
        )]);
        assert!(render_rows(&rows).ends_with("0,3,0,0,0,,\n"));
    }

    #[test]
    fn corrupt_row_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScanCache::new(dir.path());
        std::fs::write(cache.path_for(&key()), format!("{HEADER}\n1,2,3\n")).unwrap();
        assert!(matches!(
            cache.load(&key()),
            Err(Error::Parse { line: 2, .. })
        ));
    }
}
