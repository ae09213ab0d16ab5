//! Configuration sections.

use serde::{Deserialize, Serialize};

/// Thresholds and switches for note-set matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum weighted recall for a candidate to be reported.
    /// Default: 0.8
    #[serde(default = "MatchingConfig::default_min_recall")]
    pub min_recall: f64,

    /// Minimum weighted precision.
    /// Default: 0.7
    #[serde(default = "MatchingConfig::default_min_precision")]
    pub min_precision: f64,

    /// Minimum rarity-derived likelihood.
    /// Default: 0.5
    #[serde(default = "MatchingConfig::default_min_likelihood")]
    pub min_likelihood: f64,

    /// Default: 8
    #[serde(default = "MatchingConfig::default_max_results")]
    pub max_results: usize,

    /// Re-express candidates as inversions over the first note.
    #[serde(default = "MatchingConfig::default_true")]
    pub invert: bool,

    /// Penalise candidates not rooted on the first note.
    #[serde(default = "MatchingConfig::default_true")]
    pub assume_root: bool,

    /// Only report candidates with the first note in the bass.
    #[serde(default = "MatchingConfig::default_true")]
    pub require_root: bool,

    #[serde(default = "MatchingConfig::default_true")]
    pub upweight_third: bool,

    #[serde(default = "MatchingConfig::default_true")]
    pub downweight_fifth: bool,
}

impl MatchingConfig {
    fn default_min_recall() -> f64 {
        0.8
    }

    fn default_min_precision() -> f64 {
        0.7
    }

    fn default_min_likelihood() -> f64 {
        0.5
    }

    fn default_max_results() -> usize {
        8
    }

    fn default_true() -> bool {
        true
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_recall: Self::default_min_recall(),
            min_precision: Self::default_min_precision(),
            min_likelihood: Self::default_min_likelihood(),
            max_results: Self::default_max_results(),
            invert: Self::default_true(),
            assume_root: Self::default_true(),
            require_root: Self::default_true(),
            upweight_third: Self::default_true(),
            downweight_fifth: Self::default_true(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as "warn" or "chordal=debug".
    /// Default: warn
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "warn".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}
