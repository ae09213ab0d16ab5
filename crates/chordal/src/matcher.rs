//! Fuzzy matching of unordered notes against the chord registry.
//!
//! Every unique input note is tried as a root for every registered chord.
//! Candidates are scored by weighted precision and recall against the
//! input, by how common the chord is, and by consonance, then filtered by
//! the thresholds in [`MatchParams`] and ranked.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;
use tracing::debug;

use crate::chord::{AbstractChord, Chord};
use crate::note::{Note, NoteList};
use crate::registry::{registry, Registry};
use crate::{Error, Result};

/// Likelihood lost by a candidate rooted away from the first input note.
const OFF_ROOT_PENALTY: f64 = 0.15;
const THIRD_WEIGHT: f64 = 2.0;
const FIFTH_WEIGHT: f64 = 0.5;

/// Thresholds and switches for [`matching_chords`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchParams {
    /// Penalise candidates whose root is not the first input note.
    pub assume_root: bool,
    /// Keep only candidates whose bass is the first input note.
    pub require_root: bool,
    /// Invert candidates so the first input note is in the bass.
    pub invert: bool,
    pub upweight_third: bool,
    pub downweight_fifth: bool,
    pub min_recall: f64,
    pub min_precision: f64,
    pub min_likelihood: f64,
    pub max_results: usize,
}

impl Default for MatchParams {
    fn default() -> Self {
        MatchParams {
            assume_root: true,
            require_root: true,
            invert: true,
            upweight_third: true,
            downweight_fifth: true,
            min_recall: 0.8,
            min_precision: 0.7,
            min_likelihood: 0.5,
            max_results: 8,
        }
    }
}

impl MatchParams {
    /// Defaults with every minimum relaxed to zero, so some chord always matches.
    pub fn most_likely() -> Self {
        MatchParams {
            min_recall: 0.0,
            min_precision: 0.0,
            min_likelihood: 0.0,
            ..MatchParams::default()
        }
    }
}

impl From<&chordconf::MatchingConfig> for MatchParams {
    fn from(config: &chordconf::MatchingConfig) -> Self {
        MatchParams {
            assume_root: config.assume_root,
            require_root: config.require_root,
            invert: config.invert,
            upweight_third: config.upweight_third,
            downweight_fifth: config.downweight_fifth,
            min_recall: config.min_recall,
            min_precision: config.min_precision,
            min_likelihood: config.min_likelihood,
            max_results: config.max_results,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchScores {
    pub recall: f64,
    pub precision: f64,
    pub likelihood: f64,
    pub consonance: f64,
}

#[derive(Debug, Clone)]
pub struct ChordMatch {
    pub chord: Chord,
    pub scores: MatchScores,
}

impl ChordMatch {
    pub fn report(&self) -> MatchReport {
        MatchReport {
            name: self.chord.name(),
            root: self.chord.root().to_string(),
            bass: self.chord.bass().to_string(),
            notes: self.chord.notes().iter().map(Note::to_string).collect(),
            rarity: self.chord.rarity(),
            scores: self.scores,
        }
    }
}

/// A flattened match for display or JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub name: String,
    pub root: String,
    pub bass: String,
    pub notes: Vec<String>,
    pub rarity: u8,
    #[serde(flatten)]
    pub scores: MatchScores,
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Weighted precision and recall of `candidate` against `target`. Notes
/// missing from `weights` count 1.
fn precision_recall(target: &NoteList, candidate: &NoteList, weights: &HashMap<Note, f64>) -> (f64, f64) {
    let weight = |note: &Note| weights.get(note).copied().unwrap_or(1.0);
    let mut true_positive = 0.0;
    let mut false_positive = 0.0;
    for note in candidate {
        if target.contains(note) {
            true_positive += weight(note);
        } else {
            false_positive += weight(note);
        }
    }
    let false_negative: f64 = target
        .iter()
        .filter(|note| !candidate.contains(note))
        .map(weight)
        .sum();

    let ratio = |denominator: f64| {
        if denominator > 0.0 {
            true_positive / denominator
        } else {
            0.0
        }
    };
    (
        ratio(true_positive + false_positive),
        ratio(true_positive + false_negative),
    )
}

/// Note weights for a candidate: its third counts double and a perfect
/// fifth counts half.
fn note_weights(candidate: &Chord, params: &MatchParams) -> HashMap<Note, f64> {
    let mut weights = HashMap::new();
    let factor_notes = candidate.factor_notes();
    if params.upweight_third {
        if let Some(third) = factor_notes.get(&3) {
            weights.insert(*third, THIRD_WEIGHT);
        }
    }
    if params.downweight_fifth && candidate.factors().get(5) == Some(0) {
        if let Some(fifth) = factor_notes.get(&5) {
            weights.insert(*fifth, FIFTH_WEIGHT);
        }
    }
    weights
}

/// Ranked chords that could account for `notes`, using the global registry.
pub fn matching_chords(notes: &NoteList, params: &MatchParams) -> Result<Vec<ChordMatch>> {
    matching_chords_in(registry(), notes, params)
}

/// Ranked chords from `registry` that could account for `notes`. The first
/// note is taken as the intended bass.
pub fn matching_chords_in(registry: &Registry, notes: &NoteList, params: &MatchParams) -> Result<Vec<ChordMatch>> {
    let first = *notes
        .first()
        .ok_or_else(|| Error::MalformedInput("no notes to match".to_string()))?;
    let unique = notes.unique();

    let mut matches = Vec::new();
    for &root in &unique {
        for (_, factors) in registry.entries() {
            let shape = AbstractChord::from_factors(factors.clone());
            let mut candidate = Chord::assemble(shape, root, None);
            let mut likelihood = candidate.likelihood();

            if candidate.root() != first {
                let position = if params.invert {
                    candidate.root_notes().iter().position(|n| *n == first)
                } else {
                    None
                };
                match position {
                    // an inversion keeps the likelihood of its root position
                    Some(position) => {
                        let inverted = AbstractChord::from_parts(factors.clone(), position);
                        candidate = Chord::assemble(inverted, root, None);
                    }
                    None if params.assume_root => likelihood -= OFF_ROOT_PENALTY,
                    None => {}
                }
            }

            if params.require_root && candidate.bass() != first {
                continue;
            }

            let weights = note_weights(&candidate, params);
            let (precision, recall) = precision_recall(&unique, &candidate.notes().unique(), &weights);
            if recall < params.min_recall
                || precision < params.min_precision
                || likelihood < params.min_likelihood
            {
                continue;
            }

            let consonance = candidate.consonance();
            matches.push(ChordMatch {
                chord: candidate,
                scores: MatchScores {
                    recall: round_to(recall, 2),
                    precision: round_to(precision, 2),
                    likelihood: round_to(likelihood, 2),
                    consonance: round_to(consonance, 3),
                },
            });
        }
    }

    matches.sort_by(|a, b| {
        let (x, y) = (&a.scores, &b.scores);
        y.recall
            .total_cmp(&x.recall)
            .then(y.precision.total_cmp(&x.precision))
            .then(y.likelihood.total_cmp(&x.likelihood))
            .then(y.consonance.total_cmp(&x.consonance))
    });
    matches.truncate(params.max_results);
    debug!(notes = %notes, found = matches.len(), "matched chords");
    Ok(matches)
}

/// The best match for `notes`. Pass [`MatchParams::most_likely`] (possibly
/// adjusted) to always get an answer for non-empty input.
pub fn most_likely_chord(notes: &NoteList, params: &MatchParams) -> Result<ChordMatch> {
    let params = MatchParams {
        max_results: params.max_results.max(1),
        ..params.clone()
    };
    matching_chords(notes, &params)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoMatch(notes.to_string()))
}

/// A plain-text table of matches with a header describing the search.
pub fn render_table(notes: &NoteList, params: &MatchParams, matches: &[ChordMatch]) -> String {
    let mut title = format!("Chord matches for notes: {notes}");
    if params.assume_root {
        if let Some(first) = notes.first() {
            let _ = write!(title, " (assumed root: {first})");
        }
    }
    title.push_str(if params.invert {
        " (inversions allowed)"
    } else {
        " (inversions disallowed)"
    });

    let reports: Vec<MatchReport> = matches.iter().map(ChordMatch::report).collect();
    let notes_column: Vec<String> = reports.iter().map(|r| r.notes.join(", ")).collect();
    let name_width = reports
        .iter()
        .map(|r| r.name.chars().count())
        .chain(["chord".len()])
        .max()
        .unwrap_or(0)
        + 2;
    let notes_width = notes_column
        .iter()
        .map(|n| n.chars().count())
        .chain(["notes".len()])
        .max()
        .unwrap_or(0)
        + 2;

    let mut out = title;
    let _ = write!(
        out,
        "\n{:name_width$}{:notes_width$}{:<10}{:<10}{:<10}{}",
        "chord", "notes", "recall", "precision", "likelihood", "consonance"
    );
    for (report, notes) in reports.iter().zip(&notes_column) {
        let scores = &report.scores;
        let _ = write!(
            out,
            "\n{:name_width$}{:notes_width$}{:<10}{:<10}{:<10}{:.3}",
            report.name, notes, scores.recall, scores.precision, scores.likelihood, scores.consonance
        );
    }
    out
}
