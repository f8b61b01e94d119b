//! Pairwise and triple coincidence counting.
//!
//! A herald event is "paired" with a target channel when at least one target
//! event lies inside the window around it, and is a "triple" when it is paired
//! with both targets. Counts are per herald event, not per matched target event.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tt_common::{ChannelId, Result};

use crate::event_log::{ChannelSeries, EventLog};
use crate::join::{CoincidenceWindow, WindowJoin};

/// One herald event with matches on both targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleRecord {
    pub herald: i64,
    pub hits_a: Vec<i64>,
    pub hits_b: Vec<i64>,
}

/// Coincidence counts of a herald channel against two targets for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoincidenceResult {
    pub herald: ChannelId,
    pub target_a: ChannelId,
    pub target_b: ChannelId,
    pub window_ticks: i64,
    /// Herald events.
    pub n_reference: u64,
    /// Heralds with a match on target A.
    pub n_pair_a: u64,
    /// Heralds with a match on target B.
    pub n_pair_b: u64,
    /// Heralds with matches on both targets.
    pub n_triple: u64,
    /// Audited triples, in herald order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triples: Vec<TripleRecord>,
}

/// Count herald singles, pairs and triples for one window.
pub fn count_coincidences(
    log: &EventLog,
    herald: ChannelId,
    target_a: ChannelId,
    target_b: ChannelId,
    window: CoincidenceWindow,
) -> Result<CoincidenceResult> {
    count_coincidences_audited(log, herald, target_a, target_b, window, 0)
}

/// As [`count_coincidences`], also recording up to `max_triples` triples
/// with the matching target timestamps.
pub fn count_coincidences_audited(
    log: &EventLog,
    herald: ChannelId,
    target_a: ChannelId,
    target_b: ChannelId,
    window: CoincidenceWindow,
    max_triples: usize,
) -> Result<CoincidenceResult> {
    let h = log.channel(herald)?;
    let a = log.channel(target_a)?;
    let b = log.channel(target_b)?;
    let result = count_series(h, a, b, window, max_triples);

    tracing::debug!(
        herald = %herald,
        target_a = %target_a,
        target_b = %target_b,
        window_ticks = window.ticks(),
        n_reference = result.n_reference,
        n_pair_a = result.n_pair_a,
        n_pair_b = result.n_pair_b,
        n_triple = result.n_triple,
        "counted coincidences"
    );
    Ok(result)
}

fn count_series(
    h: &ChannelSeries,
    a: &ChannelSeries,
    b: &ChannelSeries,
    window: CoincidenceWindow,
    max_triples: usize,
) -> CoincidenceResult {
    let mut n_pair_a = 0;
    let mut n_pair_b = 0;
    let mut n_triple = 0;
    let mut triples = Vec::new();

    // Both joins walk the herald stream in lockstep
    let joins = WindowJoin::new(h, a, window).zip(WindowJoin::new(h, b, window));
    for ((i, ra), (_, rb)) in joins {
        let hit_a = !ra.is_empty();
        let hit_b = !rb.is_empty();
        n_pair_a += u64::from(hit_a);
        n_pair_b += u64::from(hit_b);
        if hit_a && hit_b {
            n_triple += 1;
            if triples.len() < max_triples {
                triples.push(TripleRecord {
                    herald: h.timestamps()[i],
                    hits_a: a.timestamps()[ra].to_vec(),
                    hits_b: b.timestamps()[rb].to_vec(),
                });
            }
        }
    }

    CoincidenceResult {
        herald: h.channel(),
        target_a: a.channel(),
        target_b: b.channel(),
        window_ticks: window.ticks(),
        n_reference: h.len() as u64,
        n_pair_a,
        n_pair_b,
        n_triple,
        triples,
    }
}

/// Count coincidences for every window size, returned in the requested order.
///
/// All sizes are validated before any counting starts. Windows are counted in
/// parallel over the same sorted series.
pub fn scan_windows(
    log: &EventLog,
    herald: ChannelId,
    target_a: ChannelId,
    target_b: ChannelId,
    window_sizes: &[i64],
) -> Result<Vec<CoincidenceResult>> {
    let windows = window_sizes
        .iter()
        .map(|w| CoincidenceWindow::new(*w))
        .collect::<Result<Vec<_>>>()?;
    let h = log.channel(herald)?;
    let a = log.channel(target_a)?;
    let b = log.channel(target_b)?;

    let results: Vec<CoincidenceResult> = windows
        .par_iter()
        .map(|w| count_series(h, a, b, *w, 0))
        .collect();

    tracing::debug!(windows = results.len(), herald = %herald, "scanned windows");
    Ok(results)
}

/// Two-channel coincidence counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCount {
    pub reference: ChannelId,
    pub target: ChannelId,
    pub window_ticks: i64,
    pub n_reference: u64,
    /// Reference events with at least one match.
    pub n_matched: u64,
    /// All matched (reference, target) pairs.
    pub n_pairs: u64,
}

/// Count coincidences between two channels.
pub fn count_pairs(
    log: &EventLog,
    reference: ChannelId,
    target: ChannelId,
    window: CoincidenceWindow,
) -> Result<PairCount> {
    let r = log.channel(reference)?;
    let t = log.channel(target)?;
    let (n_matched, n_pairs) = WindowJoin::new(r, t, window)
        .filter(|(_, range)| !range.is_empty())
        .fold((0u64, 0u64), |(m, p), (_, range)| (m + 1, p + range.len() as u64));
    Ok(PairCount {
        reference,
        target,
        window_ticks: window.ticks(),
        n_reference: r.len() as u64,
        n_matched,
        n_pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::EventRecord;
    use tt_common::Error;

    fn scenario_log() -> EventLog {
        let mut recs = Vec::new();
        recs.extend([100, 200, 300].map(|t| EventRecord::new(3u32, t)));
        recs.extend([101, 305].map(|t| EventRecord::new(1u32, t)));
        recs.extend([99, 202].map(|t| EventRecord::new(2u32, t)));
        EventLog::from_records(recs)
    }

    fn w(t: i64) -> CoincidenceWindow {
        CoincidenceWindow::new(t).unwrap()
    }

    #[test]
    fn herald_scenario_counts() {
        let count = |ticks| {
            count_coincidences(
                &scenario_log(),
                ChannelId(3),
                ChannelId(1),
                ChannelId(2),
                w(ticks),
            )
            .unwrap()
        };

        // 305 is 5 ticks from the herald at 300, outside ±3
        let r = count(3);
        assert_eq!(r.n_reference, 3);
        assert_eq!(r.n_pair_a, 1);
        assert_eq!(r.n_pair_b, 2);
        assert_eq!(r.n_triple, 1);
        assert!(r.triples.is_empty());

        let r = count(5);
        assert_eq!(
            (r.n_reference, r.n_pair_a, r.n_pair_b, r.n_triple),
            (3, 2, 2, 1)
        );
    }

    #[test]
    fn audit_records_triples() {
        let r = count_coincidences_audited(
            &scenario_log(),
            ChannelId(3),
            ChannelId(1),
            ChannelId(2),
            w(3),
            5,
        )
        .unwrap();
        assert_eq!(
            r.triples,
            vec![TripleRecord {
                herald: 100,
                hits_a: vec![101],
                hits_b: vec![99],
            }]
        );
    }

    #[test]
    fn unknown_channel_fails() {
        let err = count_coincidences(
            &scenario_log(),
            ChannelId(3),
            ChannelId(1),
            ChannelId(8),
            w(3),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownChannel { channel: ChannelId(8) }));
    }

    #[test]
    fn silent_declared_target_counts_zero() {
        let log = EventLog::from_records([
            EventRecord::new(3u32, 100),
            EventRecord::new(3u32, 200),
            EventRecord::new(1u32, 101),
        ])
        .declare_channels([ChannelId(1), ChannelId(2), ChannelId(3)]);

        let r = count_coincidences(&log, ChannelId(3), ChannelId(1), ChannelId(2), w(2)).unwrap();
        assert_eq!(
            (r.n_reference, r.n_pair_a, r.n_pair_b, r.n_triple),
            (2, 1, 0, 0)
        );
        let err = crate::analysis::estimate_alpha(&r).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));

        let scans = scan_windows(&log, ChannelId(3), ChannelId(1), ChannelId(2), &[0, 5]).unwrap();
        assert!(scans.iter().all(|s| s.n_pair_b == 0));
    }

    #[test]
    fn scan_preserves_requested_order() {
        let sizes = [5, 0, 3, 1];
        let results = scan_windows(
            &scenario_log(),
            ChannelId(3),
            ChannelId(1),
            ChannelId(2),
            &sizes,
        )
        .unwrap();
        let got: Vec<i64> = results.iter().map(|r| r.window_ticks).collect();
        assert_eq!(got, sizes);
        assert_eq!(results[1].n_triple, 0);
        assert_eq!(results[2].n_triple, 1);
    }

    #[test]
    fn scan_rejects_any_negative_window() {
        let err = scan_windows(
            &scenario_log(),
            ChannelId(3),
            ChannelId(1),
            ChannelId(2),
            &[1, 2, -4],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidWindow { value: -4 }));
    }

    #[test]
    fn pair_counts() {
        let p = count_pairs(&scenario_log(), ChannelId(3), ChannelId(2), w(3)).unwrap();
        assert_eq!(p.n_reference, 3);
        assert_eq!(p.n_matched, 2);
        assert_eq!(p.n_pairs, 2);
    }
}
