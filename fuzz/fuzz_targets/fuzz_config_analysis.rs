//! Fuzz target for analysis.json parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tt_config::{validate_analysis, AnalysisConfig};

fuzz_target!(|data: &[u8]| {
    // Parsing may fail; validation of anything that parses must not panic
    if let Ok(cfg) = serde_json::from_slice::<AnalysisConfig>(data) {
        let _ = validate_analysis(&cfg);
        let _ = cfg.channel_delays_s();
    }
});
