//! Sorted-stream windowed join.
//!
//! For each reference timestamp `a`, find the target timestamps inside a
//! window around `a`. Both streams are sorted, so the window's lower and
//! upper edges only ever move forward: two cursors walk the target stream
//! once, giving O(|A| + |B|) overall instead of O(|A|·|B|).
//!
//! Because the target stream is sorted, the matches of one reference event
//! form a contiguous range of target indices; the join yields that range.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use tt_common::{ChannelId, Error, Result};

use crate::clock::ClockPeriod;
use crate::event_log::{ensure_sorted, first_unsorted_index, ChannelSeries};

/// Inclusive bounds `[lo, hi]` of the target window around a reference time.
///
/// Implementations must be monotone: for `t1 <= t2`, both edges of
/// `bounds(t1)` are `<=` the corresponding edges of `bounds(t2)`.
pub trait WindowBounds {
    fn bounds(&self, reference: i64) -> (i64, i64);
}

/// Symmetric coincidence window: `[t − w, t + w]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoincidenceWindow(i64);

impl CoincidenceWindow {
    /// A half-width in ticks; negative widths are a configuration error.
    pub fn new(half_width_ticks: i64) -> Result<Self> {
        if half_width_ticks < 0 {
            return Err(Error::InvalidWindow {
                value: half_width_ticks,
            });
        }
        Ok(CoincidenceWindow(half_width_ticks))
    }

    /// Half-width given in nanoseconds, truncated to whole ticks.
    pub fn from_ns(ns: f64, clock: ClockPeriod) -> Result<Self> {
        if !ns.is_finite() {
            return Err(Error::Config(format!("window {} ns is not finite", ns)));
        }
        Self::new(clock.ticks_from_ns(ns))
    }

    pub fn ticks(&self) -> i64 {
        self.0
    }
}

impl WindowBounds for CoincidenceWindow {
    fn bounds(&self, reference: i64) -> (i64, i64) {
        (
            reference.saturating_sub(self.0),
            reference.saturating_add(self.0),
        )
    }
}

/// Window `[t − before, t + after]`, possibly off-center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetWindow {
    pub before: i64,
    pub after: i64,
}

impl WindowBounds for OffsetWindow {
    fn bounds(&self, reference: i64) -> (i64, i64) {
        (
            reference.saturating_sub(self.before),
            reference.saturating_add(self.after),
        )
    }
}

impl<W: WindowBounds + ?Sized> WindowBounds for &W {
    fn bounds(&self, reference: i64) -> (i64, i64) {
        (**self).bounds(reference)
    }
}

/// Iterator over `(reference_index, target_range)` for every reference event.
///
/// Reference events without matches yield an empty range.
#[derive(Debug, Clone)]
pub struct WindowJoin<'a, W> {
    reference: &'a [i64],
    target: &'a [i64],
    window: W,
    next: usize,
    lo: usize,
    hi: usize,
}

impl<'a, W: WindowBounds> WindowJoin<'a, W> {
    /// Join two channel series. Series are sorted by construction.
    pub fn new(reference: &'a ChannelSeries, target: &'a ChannelSeries, window: W) -> Self {
        Self::unchecked(reference.timestamps(), target.timestamps(), window)
    }

    /// Join raw timestamp slices, verifying that both are sorted.
    pub fn checked(
        reference: (ChannelId, &'a [i64]),
        target: (ChannelId, &'a [i64]),
        window: W,
    ) -> Result<Self> {
        ensure_sorted(reference.0, reference.1)?;
        ensure_sorted(target.0, target.1)?;
        Ok(Self::unchecked(reference.1, target.1, window))
    }

    /// Join slices the caller has already established as sorted.
    pub(crate) fn over_slices(reference: &'a [i64], target: &'a [i64], window: W) -> Self {
        debug_assert!(first_unsorted_index(reference).is_none());
        debug_assert!(first_unsorted_index(target).is_none());
        Self::unchecked(reference, target, window)
    }

    fn unchecked(reference: &'a [i64], target: &'a [i64], window: W) -> Self {
        WindowJoin {
            reference,
            target,
            window,
            next: 0,
            lo: 0,
            hi: 0,
        }
    }

    /// Only reference events with at least one match.
    pub fn matched(self) -> impl Iterator<Item = (usize, Range<usize>)> + 'a
    where
        W: 'a,
    {
        self.filter(|(_, r)| !r.is_empty())
    }

    /// Number of reference events with at least one match.
    pub fn count_matched(self) -> u64 {
        self.filter(|(_, r)| !r.is_empty()).count() as u64
    }

    /// Total number of matched (reference, target) pairs.
    pub fn count_pairs(self) -> u64 {
        self.map(|(_, r)| r.len() as u64).sum()
    }
}

impl<W: WindowBounds> Iterator for WindowJoin<'_, W> {
    type Item = (usize, Range<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.next;
        let t = *self.reference.get(i)?;
        self.next += 1;

        let (lo_t, hi_t) = self.window.bounds(t);
        while self.lo < self.target.len() && self.target[self.lo] < lo_t {
            self.lo += 1;
        }
        if self.hi < self.lo {
            self.hi = self.lo;
        }
        while self.hi < self.target.len() && self.target[self.hi] <= hi_t {
            self.hi += 1;
        }
        Some((i, self.lo..self.hi))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.reference.len() - self.next;
        (rest, Some(rest))
    }
}

impl<W: WindowBounds> ExactSizeIterator for WindowJoin<'_, W> {}

/// For every reference event, the signed differences `target − reference`
/// of all its matches, flattened.
pub fn delay_differences<W: WindowBounds>(
    reference: &ChannelSeries,
    target: &ChannelSeries,
    window: W,
) -> Vec<i64> {
    let ref_ts = reference.timestamps();
    let tgt_ts = target.timestamps();
    let mut out = Vec::new();
    for (i, range) in WindowJoin::new(reference, target, window) {
        let t = ref_ts[i];
        out.extend(tgt_ts[range].iter().map(|b| b.saturating_sub(t)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(ch: u32, ts: &[i64]) -> ChannelSeries {
        ChannelSeries::new(ch, ts.to_vec())
    }

    fn w(ticks: i64) -> CoincidenceWindow {
        CoincidenceWindow::new(ticks).unwrap()
    }

    #[test]
    fn negative_window_rejected() {
        assert!(matches!(
            CoincidenceWindow::new(-1),
            Err(Error::InvalidWindow { value: -1 })
        ));
    }

    #[test]
    fn yields_contiguous_ranges() {
        let a = series(3, &[100, 200, 300]);
        let b = series(1, &[99, 101, 103, 250, 301]);
        let got: Vec<_> = WindowJoin::new(&a, &b, w(2)).collect();
        assert_eq!(got, vec![(0, 0..2), (1, 3..3), (2, 4..5)]);
    }

    #[test]
    fn zero_window_matches_exact_ties_only() {
        let a = series(1, &[10, 20]);
        let b = series(2, &[9, 10, 10, 21]);
        let got: Vec<_> = WindowJoin::new(&a, &b, w(0)).collect();
        assert_eq!(got, vec![(0, 1..3), (1, 3..3)]);
    }

    #[test]
    fn empty_inputs_yield_no_matches() {
        let empty = series(1, &[]);
        let b = series(2, &[1, 2, 3]);
        assert_eq!(WindowJoin::new(&empty, &b, w(5)).count(), 0);
        assert_eq!(WindowJoin::new(&b, &empty, w(5)).count_matched(), 0);
    }

    #[test]
    fn overlapping_windows_share_targets() {
        let a = series(1, &[10, 11, 12]);
        let b = series(2, &[11]);
        assert_eq!(WindowJoin::new(&a, &b, w(1)).count_matched(), 3);
        assert_eq!(WindowJoin::new(&a, &b, w(1)).count_pairs(), 3);
    }

    #[test]
    fn checked_join_rejects_unsorted_target() {
        let a = [1i64, 2, 3];
        let b = [5i64, 4];
        let err = WindowJoin::checked((ChannelId(1), &a[..]), (ChannelId(2), &b[..]), w(1)).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsortedSeries {
                channel: ChannelId(2),
                index: 1
            }
        ));
    }

    #[test]
    fn offset_window_is_one_sided() {
        let a = series(1, &[100]);
        let b = series(2, &[95, 100, 104, 106]);
        let win = OffsetWindow {
            before: 0,
            after: 5,
        };
        let got: Vec<_> = WindowJoin::new(&a, &b, win).collect();
        assert_eq!(got, vec![(0, 1..3)]);
    }

    #[test]
    fn saturates_at_extremes() {
        let a = series(1, &[i64::MAX - 1]);
        let b = series(2, &[i64::MAX]);
        assert_eq!(WindowJoin::new(&a, &b, w(10)).count_pairs(), 1);
    }

    #[test]
    fn delay_differences_are_signed() {
        let a = series(1, &[1000]);
        let b = series(2, &[999, 1000, 1000, 1010]);
        let mut d = delay_differences(&a, &b, w(5));
        d.sort_unstable();
        assert_eq!(d, vec![-1, 0, 0]);
    }
}
