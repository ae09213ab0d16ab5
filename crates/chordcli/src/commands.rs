//! Subcommand implementations. Each returns the text to print.

use anyhow::{Context, Result};
use chordal::{Chord, ChordMatch, MatchParams, MatchReport, NoteList};
use chordconf::{ChordalConfig, ConfigSources};
use serde_json::json;

fn parse_notes(args: &[String]) -> Result<NoteList> {
    let joined = args.join(" ");
    NoteList::parse(&joined).with_context(|| format!("Invalid notes: {joined}"))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

pub fn describe(name: &str, json: bool) -> Result<String> {
    let chord = Chord::new(name).with_context(|| format!("Invalid chord: {name}"))?;
    if json {
        return to_json(&json!({
            "name": chord.name(),
            "root": chord.root(),
            "bass": chord.bass(),
            "notes": chord.notes(),
            "intervals": chord.intervals().values(),
            "factors": chord.factors(),
            "inversion": chord.inversion(),
            "quality": chord.quality(),
            "rarity": chord.rarity(),
            "likelihood": chord.likelihood(),
            "consonance": chord.consonance(),
            "flags": chord.flags(),
        }));
    }
    Ok(chord.properties())
}

pub fn matches(notes: &[String], params: &MatchParams, json: bool) -> Result<String> {
    let notes = parse_notes(notes)?;
    let found = chordal::matching_chords(&notes, params)?;
    if json {
        let reports: Vec<MatchReport> = found.iter().map(ChordMatch::report).collect();
        return to_json(&reports);
    }
    if found.is_empty() {
        return Ok(format!("No chords match {notes}"));
    }
    Ok(chordal::render_table(&notes, params, &found))
}

pub fn likely(notes: &[String], params: &MatchParams, json: bool) -> Result<String> {
    let notes = parse_notes(notes)?;
    let best = chordal::most_likely_chord(&notes, params)?;
    if json {
        return to_json(&best.report());
    }
    Ok(best.chord.name())
}

pub fn vocab(tier: Option<u8>, json: bool) -> Result<String> {
    let registry = chordal::registry();
    let tiers: Vec<u8> = match tier {
        Some(t) if t > chordal::MAX_RARITY => {
            anyhow::bail!("No tier {t}; tiers run from 0 to {}", chordal::MAX_RARITY)
        }
        Some(t) => vec![t],
        None => (0..=chordal::MAX_RARITY).collect(),
    };

    if json {
        let listing: Vec<_> = tiers
            .iter()
            .map(|&t| json!({ "tier": t, "names": registry.names_by_rarity(t) }))
            .collect();
        return to_json(&listing);
    }

    let mut out = Vec::new();
    for t in tiers {
        let names: Vec<&str> = registry
            .names_by_rarity(t)
            .iter()
            .map(|n| if n.is_empty() { "(major)" } else { n.as_str() })
            .collect();
        out.push(format!("Tier {t} ({} names):\n  {}", names.len(), names.join(" ")));
    }
    Ok(out.join("\n"))
}

pub fn show_config(config: &ChordalConfig, sources: &ConfigSources, json: bool) -> Result<String> {
    if json {
        return to_json(&json!({
            "config": config,
            "files": sources.files,
            "env_overrides": sources.env_overrides,
        }));
    }

    let mut out = String::new();
    if sources.files.is_empty() {
        out.push_str("# no config files found, using defaults\n");
    }
    for file in &sources.files {
        out.push_str(&format!("# loaded {}\n", file.display()));
    }
    for var in &sources.env_overrides {
        out.push_str(&format!("# overridden by ${var}\n"));
    }
    out.push_str(&config.to_toml());
    Ok(out.trim_end().to_string())
}
