//! CLI help and argument error tests for tt-core.

use assert_cmd::Command;
use predicates::prelude::*;

fn tt_core() -> Command {
    Command::cargo_bin("tt-core").expect("tt-core binary should exist")
}

mod top_level {
    use super::*;

    #[test]
    fn help_flag_works() {
        tt_core()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Time-Tag Coincidence Core"));
    }

    #[test]
    fn help_shows_all_commands() {
        tt_core()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("coincidences"))
            .stdout(predicate::str::contains("scan"))
            .stdout(predicate::str::contains("histogram"))
            .stdout(predicate::str::contains("bins"))
            .stdout(predicate::str::contains("qrng"))
            .stdout(predicate::str::contains("config"));
    }

    #[test]
    fn help_shows_global_options() {
        tt_core()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--format"))
            .stdout(predicate::str::contains("--config"))
            .stdout(predicate::str::contains("--threads"));
    }

    #[test]
    fn version_flag_works() {
        tt_core()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("tt-core"));
    }
}

mod subcommands {
    use super::*;

    #[test]
    fn coincidences_help_lists_window() {
        tt_core()
            .args(["coincidences", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--window-ns"))
            .stdout(predicate::str::contains("--herald"))
            .stdout(predicate::str::contains("--raw"));
    }

    #[test]
    fn scan_help_lists_cache() {
        tt_core()
            .args(["scan", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--windows-ns"))
            .stdout(predicate::str::contains("--cache-dir"));
    }

    #[test]
    fn histogram_help_lists_pair() {
        tt_core()
            .args(["histogram", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--pair"))
            .stdout(predicate::str::contains("--bin-ns"));
    }

    #[test]
    fn config_help_lists_subcommands() {
        tt_core()
            .args(["config", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("show"))
            .stdout(predicate::str::contains("validate"))
            .stdout(predicate::str::contains("schema"));
    }
}

mod argument_errors {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        tt_core()
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn coincidences_requires_paths() {
        tt_core()
            .arg("coincidences")
            .assert()
            .failure()
            .stderr(predicate::str::contains("PATHS"));
    }

    #[test]
    fn malformed_pair_is_rejected() {
        tt_core()
            .args(["histogram", "data.txt", "--pair", "3"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--pair"));
    }

    #[test]
    fn unknown_model_is_rejected() {
        tt_core()
            .args(["bins", "data.txt", "--channel", "1", "--model", "gaussian"])
            .assert()
            .failure();
    }
}

mod completions {
    use super::*;

    #[test]
    fn bash_completions_generate() {
        tt_core()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("tt-core"));
    }
}
