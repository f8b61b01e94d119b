//! Fuzz target for time-tag line parsing.
//!
//! Tests that both input layouts handle arbitrary lines without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tt_common::ChannelId;
use tt_core::ingest::InputFormat;

fuzz_target!(|data: &str| {
    for line in data.lines() {
        let _ = InputFormat::time_tag(0, ';').parse_line(line);
        let _ = InputFormat::time_tag(0, '\t').parse_line(line);
        let _ = InputFormat::csv(ChannelId(1)).parse_line(line);
    }
});
