//! chordal - chord naming and note-set matching from the command line
//!
//! Subcommands:
//! - `chordal chord <NAME>` - Describe a chord such as "Am7/G"
//! - `chordal match <NOTES>...` - List chords that fit a set of notes
//! - `chordal likely <NOTES>...` - Best single chord for a set of notes
//! - `chordal vocab` - List the registered chord names by rarity tier
//! - `chordal config` - Show the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "chordal")]
#[command(about = "Chord naming, parsing and note-set matching")]
#[command(version)]
struct Cli {
    /// Config file to load in place of ./chordal.toml
    #[arg(long, global = true, env = "CHORDAL_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe a chord given by name
    Chord {
        /// Chord name, e.g. "C", "Am7/G", "Ebmaj9/2"
        name: String,
    },

    /// List chords matching a set of notes
    Match {
        /// Notes, e.g. "C E G B" or "CEGB"; the first is taken as the bass
        #[arg(required = true)]
        notes: Vec<String>,

        #[command(flatten)]
        thresholds: Thresholds,
    },

    /// Print the single most likely chord for a set of notes
    Likely {
        #[arg(required = true)]
        notes: Vec<String>,
    },

    /// List registered chord names by rarity tier
    Vocab {
        /// Only list this tier
        #[arg(short, long)]
        tier: Option<u8>,
    },

    /// Show the effective configuration and where it came from
    Config,
}

/// Per-invocation overrides of the configured matching thresholds.
#[derive(clap::Args, Debug, Default)]
pub struct Thresholds {
    #[arg(long)]
    min_recall: Option<f64>,

    #[arg(long)]
    min_precision: Option<f64>,

    #[arg(long)]
    min_likelihood: Option<f64>,

    #[arg(short = 'n', long)]
    max_results: Option<usize>,

    /// Match only root-position chords
    #[arg(long)]
    no_invert: bool,

    /// Do not favour chords rooted on the first note
    #[arg(long)]
    no_assume_root: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = chordconf::ChordalConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");
    chordal::init();

    let output = match cli.command {
        Commands::Chord { name } => commands::describe(&name, cli.json)?,
        Commands::Match { notes, thresholds } => {
            let params = thresholds.apply(chordal::MatchParams::from(&config.matching));
            commands::matches(&notes, &params, cli.json)?
        }
        Commands::Likely { notes } => {
            let params = chordal::MatchParams {
                min_recall: 0.0,
                min_precision: 0.0,
                min_likelihood: 0.0,
                ..chordal::MatchParams::from(&config.matching)
            };
            commands::likely(&notes, &params, cli.json)?
        }
        Commands::Vocab { tier } => commands::vocab(tier, cli.json)?,
        Commands::Config => commands::show_config(&config, &sources, cli.json)?,
    };

    println!("{output}");
    Ok(())
}

impl Thresholds {
    fn apply(&self, mut params: chordal::MatchParams) -> chordal::MatchParams {
        if let Some(v) = self.min_recall {
            params.min_recall = v;
        }
        if let Some(v) = self.min_precision {
            params.min_precision = v;
        }
        if let Some(v) = self.min_likelihood {
            params.min_likelihood = v;
        }
        if let Some(v) = self.max_results {
            params.max_results = v;
        }
        if self.no_invert {
            params.invert = false;
        }
        if self.no_assume_root {
            params.assume_root = false;
        }
        params
    }
}
