//! Fuzz target for the windowed join and the analyses built on it.
//!
//! Series are sorted before joining; windows and bin widths may be anything,
//! including invalid values that must come back as errors.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tt_core::analysis::{bin_statistics, delay_histogram};
use tt_core::event_log::ChannelSeries;
use tt_core::join::{CoincidenceWindow, WindowJoin};

#[derive(Debug, Arbitrary)]
struct Input {
    reference: Vec<i32>,
    target: Vec<i32>,
    window: i16,
    bin_width: i16,
}

fuzz_target!(|input: Input| {
    let widen = |v: &[i32]| v.iter().map(|t| i64::from(*t)).collect::<Vec<_>>();
    let a = ChannelSeries::new(1u32, widen(&input.reference));
    let b = ChannelSeries::new(2u32, widen(&input.target));

    if let Ok(w) = CoincidenceWindow::new(i64::from(input.window)) {
        let pairs = WindowJoin::new(&a, &b, w).count_pairs();
        assert_eq!(pairs, WindowJoin::new(&b, &a, w).count_pairs());
    }
    let _ = delay_histogram(&a, &b, i64::from(input.window), i64::from(input.bin_width));

    // Bin count grows with span / width; keep allocations bounded
    let width = i64::from(input.bin_width);
    let span = a.last().unwrap_or(0) - a.first().unwrap_or(0);
    if width <= 0 || span / width < 1 << 20 {
        let _ = bin_statistics(&a, width);
    }
});
