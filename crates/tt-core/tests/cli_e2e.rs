//! End-to-end runs of the tt-core binary over small time-tag files.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One tick per nanosecond, no header, no channel delays.
const CONFIG: &str = r#"{
  "schema_version": "1.0.0",
  "clock_period_s": 1e-9,
  "channels": { "herald": 3, "target_a": 1, "target_b": 2 },
  "delays_s": {},
  "coincidence": { "window_ns": 3.5, "scan_windows_ns": [5.5, 0.5, 3.5], "audit_triples": 2 },
  "histogram": { "pairs": [[3, 1]], "max_delay_ns": 10.5, "bin_ns": 1.5, "fwhm_min_peak": 1 },
  "binning": { "bin_s": 5.5e-9, "model": "poisson" },
  "input": { "header_lines": 0, "delimiter": ";" },
  "qrng": { "min_interval_ticks": 0 }
}"#;

const HERALD_RUN: &str = "100;3\n200;3\n300;3\n101;1\n305;1\n99;2\n202;2\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("analysis.json"), CONFIG).expect("write config");
        fs::write(dir.path().join("run1.txt"), HERALD_RUN).expect("write run");
        Fixture { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tt-core").expect("tt-core binary should exist");
        cmd.env_remove("TT_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path("analysis.json"))
            .arg("-q");
        cmd
    }
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout should be JSON")
}

fn write(path: &Path, text: &str) {
    fs::write(path, text).expect("write fixture");
}

#[test]
fn coincidences_json_envelope() {
    let fx = Fixture::new();
    let out = fx
        .cmd()
        .arg("coincidences")
        .arg(fx.path("run1.txt"))
        .args(["--window-ns", "5.5"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = stdout_json(&out);
    assert_eq!(v["command"], "coincidences");
    assert!(v["run_id"].as_str().unwrap().starts_with("run-"));
    let result = &v["result"];
    assert_eq!(result["window_ticks"], 5);
    assert_eq!(result["counts"]["n_reference"], 3);
    assert_eq!(result["counts"]["n_pair_a"], 2);
    assert_eq!(result["counts"]["n_pair_b"], 2);
    assert_eq!(result["counts"]["n_triple"], 1);
    assert_eq!(result["alpha"]["status"], "measured");
    assert_eq!(result["counts"]["triples"][0]["herald"], 100);
    assert_eq!(result["pairs"].as_array().unwrap().len(), 2);
}

#[test]
fn coincidences_summary_format() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["--format", "summary", "coincidences"])
        .arg(fx.path("run1.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("w=±3 ticks"))
        .stdout(predicate::str::contains("triples=1"));
}

#[test]
fn zero_window_reports_insufficient_alpha() {
    let fx = Fixture::new();
    let out = fx
        .cmd()
        .arg("coincidences")
        .arg(fx.path("run1.txt"))
        .args(["--window-ns", "0.5"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    assert_eq!(v["result"]["alpha"]["status"], "insufficient");
}

#[test]
fn unknown_channel_is_a_config_error() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("coincidences")
        .arg(fx.path("run1.txt"))
        .args(["--target-b", "9"])
        .assert()
        .code(11)
        .stderr(predicate::str::contains("ERR_CONFIG"));
}

#[test]
fn silent_configured_detector_is_insufficient_data() {
    let fx = Fixture::new();
    let run = fx.path("silent_b.txt");
    write(&run, "100;3\n200;3\n101;1\n");
    let out = fx
        .cmd()
        .arg("coincidences")
        .arg(&run)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    assert_eq!(v["result"]["counts"]["n_reference"], 2);
    assert_eq!(v["result"]["counts"]["n_pair_b"], 0);
    assert_eq!(v["result"]["alpha"]["status"], "insufficient");
}

#[test]
fn malformed_line_reports_file_and_line() {
    let fx = Fixture::new();
    let bad = fx.path("bad.txt");
    write(&bad, "100;3\n1x1;1\n");
    fx.cmd()
        .args(["--format", "md", "coincidences"])
        .arg(&bad)
        .assert()
        .code(12)
        .stderr(predicate::str::contains("bad.txt line 2"));
}

#[test]
fn scan_uses_cache_on_second_run() {
    let fx = Fixture::new();
    let cache = fx.path("cache");

    let first = fx
        .cmd()
        .arg("scan")
        .arg(fx.path("run1.txt"))
        .arg("--cache-dir")
        .arg(&cache)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&first);
    let rows = v["result"]["rows"].as_array().unwrap();
    let windows: Vec<i64> = rows
        .iter()
        .map(|r| r["window_ticks"].as_i64().unwrap())
        .collect();
    assert_eq!(windows, vec![5, 0, 3]);
    assert_eq!(v["result"]["cache"]["computed"], 3);
    let cached: Vec<String> = fs::read_dir(&cache)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(cached.len(), 1);
    assert!(cached[0].starts_with("run1_h3_a1_b2_t"));
    assert!(cached[0].ends_with("_alpha_vs_window.csv"));

    let second = fx
        .cmd()
        .arg("scan")
        .arg(fx.path("run1.txt"))
        .arg("--cache-dir")
        .arg(&cache)
        .args(["--windows-ns", "3.5,7.5"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&second);
    assert_eq!(v["result"]["cache"]["cache_hits"], 1);
    assert_eq!(v["result"]["cache"]["computed"], 1);
}

#[test]
fn raw_scan_does_not_reuse_calibrated_cache() {
    let fx = Fixture::new();
    let cache = fx.path("cache");
    let scan = |raw: bool| {
        let mut cmd = fx.cmd();
        cmd.arg("scan").arg(fx.path("run1.txt")).arg("--cache-dir").arg(&cache);
        if raw {
            cmd.arg("--raw");
        }
        let out = cmd.assert().success().get_output().stdout.clone();
        stdout_json(&out)
    };

    assert_eq!(scan(false)["result"]["cache"]["computed"], 3);
    assert_eq!(scan(true)["result"]["cache"]["computed"], 3);
    assert_eq!(scan(true)["result"]["cache"]["cache_hits"], 3);
    assert_eq!(fs::read_dir(&cache).unwrap().count(), 2);
}

#[test]
fn scan_csv_has_header_and_rows() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["--format", "csv", "scan"])
        .arg(fx.path("run1.txt"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("window_ns,window_ticks"))
        .stdout(predicate::str::contains(",5,3,2,2,1,"));
}

#[test]
fn histogram_reports_peak() {
    let fx = Fixture::new();
    let run = fx.path("peak.txt");
    write(&run, "1000;1\n1000;2\n1000;2\n999;2\n");
    let out = fx
        .cmd()
        .arg("histogram")
        .arg(&run)
        .args(["--pair", "1,2", "--max-delay-ns", "5.5", "--bin-ns", "1.5"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    let h = &v["result"]["histograms"][0];
    assert_eq!(h["reference"], 1);
    assert_eq!(h["target"], 2);
    assert_eq!(h["total"], 3);
    assert_eq!(h["peak_count"], 2);
    assert_eq!(h["counts"].as_array().unwrap().len(), 11);
}

#[test]
fn bins_on_single_channel_csv() {
    let fx = Fixture::new();
    let csv = fx.path("ch4.csv");
    write(&csv, "timestamp,extra\n0,a\n0,b\n0,c\n5,d\n5,e\n10,f\n");
    let out = fx
        .cmd()
        .arg("bins")
        .arg(&csv)
        .args(["--channel", "4", "--csv-channel"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    let r = &v["result"];
    assert_eq!(r["n_bins"], 3);
    assert_eq!(r["events_kept"], 6);
    assert_eq!(r["distribution"]["3"], 1);
    assert_eq!(r["fit"]["model"], "poisson");
}

#[test]
fn bins_restart_with_every_file() {
    let fx = Fixture::new();
    let input = fx.path("bins");
    fs::create_dir(&input).unwrap();
    write(&input.join("a.csv"), "t\n0\n1\n6\n12\n");
    write(&input.join("b.csv"), "t\n2\n3\n4\n8\n");
    let out = fx
        .cmd()
        .arg("bins")
        .arg(&input)
        .args(["--channel", "4", "--csv-channel"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    let r = &v["result"];
    // 5-tick bins: [2, 1, 1] from a.csv, then [3, 1] from b.csv
    assert_eq!(r["n_bins"], 5);
    assert_eq!(r["events_kept"], 8);
    assert_eq!(r["distribution"]["1"], 3);
    assert_eq!(r["distribution"]["3"], 1);
}

#[test]
fn qrng_writes_bytes_per_file() {
    let fx = Fixture::new();
    let input = fx.path("qrng");
    fs::create_dir(&input).unwrap();
    // Ten events give nine intervals and eight comparisons, one byte
    let ts = [0, 5, 7, 20, 21, 40, 41, 42, 60, 70];
    let body: String = ts.iter().map(|t| format!("{t};1\n")).collect();
    write(&input.join("a.txt"), &body);
    write(&input.join("b.txt"), &body);
    let out_file = fx.path("bits.bin");

    fx.cmd()
        .arg("qrng")
        .arg(&input)
        .args(["--channel", "1", "--out"])
        .arg(&out_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_bytes\": 2"));

    let bytes = fs::read(&out_file).unwrap();
    assert_eq!(bytes.len(), 2);
    assert_eq!(bytes[0], bytes[1]);
}

#[test]
fn config_show_and_validate() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"clock_period_s\": 1e-9"));

    fx.cmd()
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));

    let bad = fx.path("bad.json");
    write(&bad, r#"{"schema_version": "1.0.0", "clock_period_s": -1.0}"#);
    fx.cmd()
        .args(["config", "validate"])
        .arg(&bad)
        .assert()
        .code(11);
}

#[test]
fn config_schema_is_json() {
    let fx = Fixture::new();
    let out = fx
        .cmd()
        .args(["config", "schema"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    assert!(v["properties"]["clock_period_s"].is_object());
}

#[test]
fn missing_config_file_is_a_config_error() {
    let fx = Fixture::new();
    let mut cmd = Command::cargo_bin("tt-core").unwrap();
    cmd.env_remove("TT_CONFIG")
        .arg("--config")
        .arg(fx.path("nope.json"))
        .arg("coincidences")
        .arg(fx.path("run1.txt"))
        .assert()
        .code(11);
}
