//! Config file discovery, loading, and environment variable overlay.

use crate::{ChordalConfig, ConfigError};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/chordal/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("chordal/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("chordal.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// The keys one config file sets. Keys a file leaves out are `None` and do
/// not touch values from earlier files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigLayer {
    pub min_recall: Option<f64>,
    pub min_precision: Option<f64>,
    pub min_likelihood: Option<f64>,
    pub max_results: Option<usize>,
    pub invert: Option<bool>,
    pub assume_root: Option<bool>,
    pub require_root: Option<bool>,
    pub upweight_third: Option<bool>,
    pub downweight_fifth: Option<bool>,
    pub log_level: Option<String>,
}

/// Load the keys set by a TOML file.
pub fn load_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Load a single TOML file over the defaults.
pub fn load_from_file(path: &Path) -> Result<ChordalConfig, ConfigError> {
    let layer = load_layer(path)?;
    Ok(merge_configs(ChordalConfig::default(), &layer))
}

fn parse_toml(contents: &str, path: &Path) -> Result<ConfigLayer, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut layer = ConfigLayer::default();
    if let Some(section) = table.get("matching").and_then(|v| v.as_table()) {
        // integers are accepted where a float is expected ("min_recall = 1")
        let float = |key: &str| {
            section
                .get(key)
                .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
        };
        let flag = |key: &str| section.get(key).and_then(|v| v.as_bool());

        layer.min_recall = float("min_recall");
        layer.min_precision = float("min_precision");
        layer.min_likelihood = float("min_likelihood");
        layer.max_results = section
            .get("max_results")
            .and_then(|v| v.as_integer())
            .map(|v| v.max(0) as usize);
        layer.invert = flag("invert");
        layer.assume_root = flag("assume_root");
        layer.require_root = flag("require_root");
        layer.upweight_third = flag("upweight_third");
        layer.downweight_fifth = flag("downweight_fifth");
    }

    if let Some(section) = table.get("logging").and_then(|v| v.as_table()) {
        layer.log_level = section.get("level").and_then(|v| v.as_str()).map(str::to_string);
    }

    Ok(layer)
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

/// Lay `layer` over `base`: every key the layer sets wins, even when it
/// equals the default.
pub fn merge_configs(mut base: ChordalConfig, layer: &ConfigLayer) -> ChordalConfig {
    let matching = &mut base.matching;
    set(&mut matching.min_recall, &layer.min_recall);
    set(&mut matching.min_precision, &layer.min_precision);
    set(&mut matching.min_likelihood, &layer.min_likelihood);
    set(&mut matching.max_results, &layer.max_results);
    set(&mut matching.invert, &layer.invert);
    set(&mut matching.assume_root, &layer.assume_root);
    set(&mut matching.require_root, &layer.require_root);
    set(&mut matching.upweight_third, &layer.upweight_third);
    set(&mut matching.downweight_fifth, &layer.downweight_fifth);
    set(&mut base.logging.level, &layer.log_level);
    base
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut ChordalConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from any key lookup. Values that do not parse are ignored.
pub fn apply_overrides_from(
    config: &mut ChordalConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let mut float = |key: &str, target: &mut f64| {
        if let Some(v) = lookup(key).and_then(|v| v.parse().ok()) {
            *target = v;
            sources.env_overrides.push(key.to_string());
        }
    };
    float("CHORDAL_MIN_RECALL", &mut config.matching.min_recall);
    float("CHORDAL_MIN_PRECISION", &mut config.matching.min_precision);
    float("CHORDAL_MIN_LIKELIHOOD", &mut config.matching.min_likelihood);

    if let Some(v) = lookup("CHORDAL_MAX_RESULTS").and_then(|v| v.parse().ok()) {
        config.matching.max_results = v;
        sources.env_overrides.push("CHORDAL_MAX_RESULTS".to_string());
    }

    if let Some(v) = lookup("CHORDAL_LOG_LEVEL") {
        config.logging.level = v;
        sources.env_overrides.push("CHORDAL_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.logging.level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files();
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
[matching]
min_recall = 0.6
"#;
        let layer = parse_toml(toml, Path::new("test.toml")).unwrap();
        assert_eq!(layer.min_recall, Some(0.6));
        // Other keys are left unset
        assert_eq!(layer.max_results, None);
        assert_eq!(layer.log_level, None);

        let config = merge_configs(ChordalConfig::default(), &layer);
        assert_eq!(config.matching.min_recall, 0.6);
        assert_eq!(config.matching.max_results, 8);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[matching]
min_recall = 1
min_precision = 0.5
min_likelihood = 0.3
max_results = 3
invert = false
assume_root = false
require_root = false
upweight_third = false
downweight_fifth = false

[logging]
level = "chordal=debug"
"#;
        let layer = parse_toml(toml, Path::new("test.toml")).unwrap();
        let config = merge_configs(ChordalConfig::default(), &layer);
        assert_eq!(config.matching.min_recall, 1.0);
        assert_eq!(config.matching.min_precision, 0.5);
        assert_eq!(config.matching.min_likelihood, 0.3);
        assert_eq!(config.matching.max_results, 3);
        assert!(!config.matching.invert);
        assert!(!config.matching.assume_root);
        assert!(!config.matching.require_root);
        assert!(!config.matching.upweight_third);
        assert!(!config.matching.downweight_fifth);
        assert_eq!(config.logging.level, "chordal=debug");
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = parse_toml("[matching", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_merge_keeps_unset_keys() {
        let mut base = ChordalConfig::default();
        base.matching.max_results = 4;
        base.logging.level = "info".to_string();
        let layer = ConfigLayer {
            min_recall: Some(0.5),
            ..Default::default()
        };

        let merged = merge_configs(base, &layer);
        assert_eq!(merged.matching.max_results, 4);
        assert_eq!(merged.matching.min_recall, 0.5);
        assert_eq!(merged.logging.level, "info");
    }

    #[test]
    fn test_later_file_can_restore_a_default() {
        let system = parse_toml("[matching]\nmin_recall = 0.5", Path::new("system.toml")).unwrap();
        let user = parse_toml(
            "[matching]\nmin_recall = 0.8\n[logging]\nlevel = \"warn\"",
            Path::new("user.toml"),
        )
        .unwrap();

        let mut config = ChordalConfig::default();
        config.logging.level = "debug".to_string();
        let config = merge_configs(merge_configs(config, &system), &user);
        assert_eq!(config.matching.min_recall, 0.8);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("CHORDAL_MIN_PRECISION", "0.4"),
            ("CHORDAL_MAX_RESULTS", "not a number"),
            ("RUST_LOG", "debug"),
        ]
        .into_iter()
        .collect();
        let mut config = ChordalConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_from(&mut config, &mut sources, |key| {
            vars.get(key).map(|v| v.to_string())
        });

        assert_eq!(config.matching.min_precision, 0.4);
        assert_eq!(config.matching.max_results, 8);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(sources.env_overrides, vec!["CHORDAL_MIN_PRECISION", "RUST_LOG"]);
    }
}
