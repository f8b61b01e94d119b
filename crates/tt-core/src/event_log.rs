//! Time-tagged detector events and per-channel sorted views.
//!
//! An [`EventLog`] owns one [`ChannelSeries`] per channel. Every series is
//! sorted ascending by timestamp; the constructors establish that order and
//! nothing hands out mutable access to the timestamps afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tt_common::{ChannelId, Error, Result};

/// A single detection: which channel fired and when, in clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRecord {
    pub channel: ChannelId,
    pub timestamp: i64,
}

impl EventRecord {
    pub fn new(channel: impl Into<ChannelId>, timestamp: i64) -> Self {
        EventRecord {
            channel: channel.into(),
            timestamp,
        }
    }
}

/// Return the first index where `timestamps` decreases.
pub fn first_unsorted_index(timestamps: &[i64]) -> Option<usize> {
    timestamps
        .windows(2)
        .position(|w| w[1] < w[0])
        .map(|i| i + 1)
}

/// Fail with [`Error::UnsortedSeries`] unless `timestamps` is non-decreasing.
pub fn ensure_sorted(channel: ChannelId, timestamps: &[i64]) -> Result<()> {
    match first_unsorted_index(timestamps) {
        Some(index) => Err(Error::UnsortedSeries { channel, index }),
        None => Ok(()),
    }
}

/// One channel's timestamps, sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSeries {
    channel: ChannelId,
    timestamps: Vec<i64>,
}

impl ChannelSeries {
    /// Build a series from timestamps in any order.
    pub fn new(channel: impl Into<ChannelId>, mut timestamps: Vec<i64>) -> Self {
        timestamps.sort_unstable();
        ChannelSeries {
            channel: channel.into(),
            timestamps,
        }
    }

    /// Build a series from timestamps that must already be sorted.
    pub fn from_sorted(channel: impl Into<ChannelId>, timestamps: Vec<i64>) -> Result<Self> {
        let channel = channel.into();
        ensure_sorted(channel, &timestamps)?;
        Ok(ChannelSeries {
            channel,
            timestamps,
        })
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn first(&self) -> Option<i64> {
        self.timestamps.first().copied()
    }

    pub fn last(&self) -> Option<i64> {
        self.timestamps.last().copied()
    }

    /// Every timestamp shifted by `offset` ticks.
    ///
    /// Saturating addition is monotone, so the result stays sorted.
    pub fn shifted(&self, offset: i64) -> ChannelSeries {
        ChannelSeries {
            channel: self.channel,
            timestamps: self
                .timestamps
                .iter()
                .map(|t| t.saturating_add(offset))
                .collect(),
        }
    }

    /// Keep only the timestamps accepted by `keep`, given each timestamp and
    /// its predecessor in this series.
    pub fn filter_with_previous(&self, mut keep: impl FnMut(Option<i64>, i64) -> bool) -> Self {
        let mut prev = None;
        let mut kept = Vec::with_capacity(self.timestamps.len());
        for &t in &self.timestamps {
            if keep(prev, t) {
                kept.push(t);
            }
            prev = Some(t);
        }
        ChannelSeries {
            channel: self.channel,
            timestamps: kept,
        }
    }
}

/// Where an event log is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogState {
    /// Timestamps as read from the acquisition files.
    Loaded,
    /// Per-channel delays have been applied.
    Calibrated,
}

/// All channel series of one acquisition run.
#[derive(Debug, Clone)]
pub struct EventLog {
    series: BTreeMap<ChannelId, ChannelSeries>,
    state: LogState,
    offsets: BTreeMap<ChannelId, i64>,
}

impl EventLog {
    /// Group records by channel and sort each group.
    pub fn from_records(records: impl IntoIterator<Item = EventRecord>) -> Self {
        let mut grouped: BTreeMap<ChannelId, Vec<i64>> = BTreeMap::new();
        for rec in records {
            grouped.entry(rec.channel).or_default().push(rec.timestamp);
        }
        Self::from_series(
            grouped
                .into_iter()
                .map(|(ch, ts)| ChannelSeries::new(ch, ts)),
        )
    }

    /// Assemble a log from already-built series. A later series for the
    /// same channel replaces an earlier one.
    pub fn from_series(series: impl IntoIterator<Item = ChannelSeries>) -> Self {
        EventLog {
            series: series.into_iter().map(|s| (s.channel, s)).collect(),
            state: LogState::Loaded,
            offsets: BTreeMap::new(),
        }
    }

    /// Give every listed channel a series, empty when it recorded nothing.
    ///
    /// A declared channel that stayed silent then counts as zero events
    /// rather than [`Error::UnknownChannel`].
    pub fn declare_channels(mut self, channels: impl IntoIterator<Item = ChannelId>) -> Self {
        for channel in channels {
            self.series
                .entry(channel)
                .or_insert_with(|| ChannelSeries::new(channel, Vec::new()));
        }
        self
    }

    /// The series of `channel`, or [`Error::UnknownChannel`].
    pub fn channel(&self, channel: ChannelId) -> Result<&ChannelSeries> {
        self.series
            .get(&channel)
            .ok_or(Error::UnknownChannel { channel })
    }

    pub fn get(&self, channel: ChannelId) -> Option<&ChannelSeries> {
        self.series.get(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.series.keys().copied()
    }

    pub fn series(&self) -> impl Iterator<Item = &ChannelSeries> {
        self.series.values()
    }

    pub fn total_events(&self) -> usize {
        self.series.values().map(ChannelSeries::len).sum()
    }

    pub fn state(&self) -> LogState {
        self.state
    }

    /// Offsets (ticks) applied by calibration; empty before calibration.
    pub fn applied_offsets(&self) -> &BTreeMap<ChannelId, i64> {
        &self.offsets
    }

    pub(crate) fn calibrated_from(
        series: BTreeMap<ChannelId, ChannelSeries>,
        offsets: BTreeMap<ChannelId, i64>,
    ) -> Self {
        EventLog {
            series,
            state: LogState::Calibrated,
            offsets,
        }
    }

    pub(crate) fn series_map(&self) -> &BTreeMap<ChannelId, ChannelSeries> {
        &self.series
    }
}
