//! Configuration loading for chordal.
//!
//! Kept free of the chord library's own types so both the library and the
//! binary can depend on it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use chordconf::ChordalConfig;
//!
//! let config = ChordalConfig::load().expect("Failed to load config");
//! println!("min recall: {}", config.matching.min_recall);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/chordal/config.toml` (system)
//! 2. `~/.config/chordal/config.toml` (user)
//! 3. `./chordal.toml` (local override) or a path given on the command line
//! 4. Environment variables (`CHORDAL_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [matching]
//! min_recall = 0.8
//! min_precision = 0.7
//! min_likelihood = 0.5
//! max_results = 8
//! invert = true
//! assume_root = true
//!
//! [logging]
//! level = "warn"
//! ```

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigLayer, ConfigSources};
pub use settings::{LoggingConfig, MatchingConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete chordal configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChordalConfig {
    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ChordalConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/chordal/config.toml`
    /// 3. `~/.config/chordal/config.toml`
    /// 4. `./chordal.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with an explicit file in place of `./chordal.toml`.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables applied.
    pub fn load_with_sources() -> Result<(Self, ConfigSources), ConfigError> {
        Self::load_with_sources_from(None)
    }

    /// Like [`load_with_sources`](Self::load_with_sources) with an explicit
    /// file in place of `./chordal.toml`.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ChordalConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let layer = loader::load_layer(&path)?;
            config = loader::merge_configs(config, &layer);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# chordal configuration\n\n");

        let matching = &self.matching;
        output.push_str("[matching]\n");
        output.push_str(&format!("min_recall = {:?}\n", matching.min_recall));
        output.push_str(&format!("min_precision = {:?}\n", matching.min_precision));
        output.push_str(&format!("min_likelihood = {:?}\n", matching.min_likelihood));
        output.push_str(&format!("max_results = {}\n", matching.max_results));
        output.push_str(&format!("invert = {}\n", matching.invert));
        output.push_str(&format!("assume_root = {}\n", matching.assume_root));
        output.push_str(&format!("require_root = {}\n", matching.require_root));
        output.push_str(&format!("upweight_third = {}\n", matching.upweight_third));
        output.push_str(&format!("downweight_fifth = {}\n", matching.downweight_fifth));

        output.push_str("\n[logging]\n");
        output.push_str(&format!("level = \"{}\"\n", self.logging.level));

        output
    }
}
