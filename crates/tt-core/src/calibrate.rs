//! Per-channel delay calibration.
//!
//! Detectors sit behind cables and electronics of different lengths, so the
//! same photon pair arrives at different raw timestamps. Calibration shifts
//! each channel by a fixed offset measured beforehand.

use std::collections::BTreeMap;
use tt_common::ChannelId;

use crate::clock::ClockPeriod;
use crate::event_log::EventLog;

/// Shift every timestamp by its channel's offset (0 for channels without
/// one) and return the calibrated log. The input is not modified.
///
/// Offsets for channels absent from the log are ignored.
pub fn calibrate(log: &EventLog, offsets: &BTreeMap<ChannelId, i64>) -> EventLog {
    let mut applied = log.applied_offsets().clone();
    let series = log
        .series_map()
        .iter()
        .map(|(ch, s)| {
            let offset = offsets.get(ch).copied().unwrap_or(0);
            if offset != 0 {
                *applied.entry(*ch).or_insert(0) += offset;
            }
            (*ch, s.shifted(offset))
        })
        .collect();

    tracing::debug!(
        channels = log.series_map().len(),
        shifted = offsets.values().filter(|o| **o != 0).count(),
        "applied channel delays"
    );

    EventLog::calibrated_from(series, applied)
}

/// Convert per-channel delays in seconds to tick offsets, truncating toward zero.
pub fn offsets_from_seconds(
    delays_s: &BTreeMap<ChannelId, f64>,
    clock: ClockPeriod,
) -> BTreeMap<ChannelId, i64> {
    delays_s
        .iter()
        .map(|(ch, d)| (*ch, clock.ticks_from_seconds(*d)))
        .collect()
}
