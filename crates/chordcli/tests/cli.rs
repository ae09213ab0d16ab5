//! End-to-end tests for the chordal binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// A command isolated from local config files and CHORDAL_* variables.
fn chordal(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("chordal").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("CHORDAL_CONFIG")
        .env_remove("CHORDAL_LOG_LEVEL")
        .env_remove("CHORDAL_MIN_RECALL")
        .env_remove("CHORDAL_MIN_PRECISION")
        .env_remove("CHORDAL_MIN_LIKELIHOOD")
        .env_remove("CHORDAL_MAX_RESULTS");
    cmd
}

#[test]
fn describes_slash_chord() {
    let dir = tempfile::tempdir().unwrap();
    chordal(&dir)
        .args(["chord", "Am/C"])
        .assert()
        .success()
        .stdout(predicate::str::contains("C, E, A"))
        .stdout(predicate::str::contains("inverted"));
}

#[test]
fn rejects_unknown_chord() {
    let dir = tempfile::tempdir().unwrap();
    chordal(&dir)
        .args(["chord", "Cxyz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid chord"));
}

#[test]
fn matches_notes_into_table() {
    let dir = tempfile::tempdir().unwrap();
    chordal(&dir)
        .args(["match", "C", "E", "G", "B"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chord matches for notes: C, E, G, B"))
        .stdout(predicate::str::contains("Cmaj7"));
}

#[test]
fn match_json_is_an_array() {
    let dir = tempfile::tempdir().unwrap();
    let output = chordal(&dir)
        .args(["--json", "match", "D F# A C"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["name"], "D7");
}

#[test]
fn likely_always_answers() {
    let dir = tempfile::tempdir().unwrap();
    chordal(&dir)
        .args(["likely", "C", "E", "G"])
        .assert()
        .success()
        .stdout(predicate::str::diff("C\n"));
}

#[test]
fn vocab_lists_a_tier() {
    let dir = tempfile::tempdir().unwrap();
    chordal(&dir)
        .args(["vocab", "--tier", "0"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Tier 0"))
        .stdout(predicate::str::contains("(major) m 7 5"));
}

#[test]
fn config_file_changes_matching() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[matching]\nmax_results = 1").unwrap();

    chordal(&dir)
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"))
        .stdout(predicate::str::contains("max_results = 1"));

    let output = chordal(&dir)
        .arg("--config")
        .arg(&path)
        .args(["--json", "match", "C", "E", "G"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value.as_array().map(Vec::len), Some(1));
}
