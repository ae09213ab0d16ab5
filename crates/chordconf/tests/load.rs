use chordconf::{ChordalConfig, ConfigError};
use std::io::Write;

#[test]
fn explicit_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[matching]\nmax_results = 3\ninvert = false").unwrap();

    let (config, sources) = ChordalConfig::load_with_sources_from(Some(file.path())).unwrap();
    assert!(sources.files.iter().any(|p| p == file.path()));
    // environment may still override the thresholds, but not these two keys
    assert!(!config.matching.invert);
    if !sources.env_overrides.iter().any(|k| k == "CHORDAL_MAX_RESULTS") {
        assert_eq!(config.matching.max_results, 3);
    }
}

#[test]
fn malformed_file_reports_its_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[matching\nmin_recall = ").unwrap();

    match ChordalConfig::load_from(Some(file.path())) {
        Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn missing_explicit_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let (_, sources) = ChordalConfig::load_with_sources_from(Some(&missing)).unwrap();
    assert!(!sources.files.contains(&missing));
}

#[test]
fn single_file_loads_over_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

    let config = chordconf::loader::load_from_file(file.path()).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.matching, chordconf::MatchingConfig::default());
}
