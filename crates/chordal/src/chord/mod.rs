//! Abstract and concrete chords.
//!
//! Construction goes through a [`ChordSpec`]: exactly one [`ChordInput`]
//! (or none, for a major triad), optional qualifiers layered on top, an
//! optional [`Inversion`], and for concrete chords a root. Everything is
//! resolved once into finished values; nothing is patched up afterwards.

mod abstract_chord;
mod concrete;
mod list;

pub use abstract_chord::AbstractChord;
pub use concrete::Chord;
pub use list::ChordList;

use tracing::{debug, warn};

use crate::factors::ChordFactors;
use crate::interval::Interval;
use crate::interval_list::IntervalList;
use crate::note::{Note, NoteList};
use crate::parsing::parse_out_note_names;
use crate::qualifier::{parse_qualifiers, ChordQualifier};
use crate::registry::{registry, UNNAMED_RARITY};
use crate::{Error, Result};

/// The primary input a chord is built from.
#[derive(Debug, Clone)]
pub enum ChordInput {
    /// A compositional name. For a concrete chord without an explicit root
    /// this includes the root ("Am7/G"); otherwise it is just the suffix
    /// ("m7/2").
    Name(String),
    /// Another chord's factors and inversion.
    Recast(AbstractChord),
    Factors(ChordFactors),
    /// Intervals from the root.
    Intervals(IntervalList),
    /// Notes in ascending order from the root. Concrete chords only.
    Notes(NoteList),
}

impl ChordInput {
    /// Decide whether a string is a run of notes ("CEG") or a chord name.
    /// Two or more notes are needed to count as a note string.
    pub fn classify(text: &str) -> ChordInput {
        match parse_out_note_names(text) {
            Some(notes) if notes.len() >= 2 => ChordInput::Notes(NoteList::new(notes)),
            _ => ChordInput::Name(text.to_string()),
        }
    }

    /// Intervals from raw semitone values, reading 3/4 as thirds and
    /// 6/7/8 as fifths.
    pub fn from_values(values: &[i32]) -> Result<ChordInput> {
        let intervals: IntervalList = values
            .iter()
            .map(|&v| match v {
                3 | 4 => Interval::with_degree(v, 3),
                6..=8 => Interval::with_degree(v, 5),
                _ => Ok(Interval::new(v)),
            })
            .collect::<Result<Vec<_>>>()?
            .into();
        if intervals.has_duplicates() {
            return Err(Error::DuplicateIntervals(values.to_vec()));
        }
        Ok(ChordInput::Intervals(intervals))
    }
}

/// Which note of a chord sits in the bass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inversion {
    /// Position in the ascending root-position notes; 0 is root position.
    Index(usize),
    /// The degree in the bass, e.g. 3 for first inversion of a triad.
    Degree(u8),
    /// A bass note. Concrete chords only; the note need not be in the chord.
    Bass(Note),
}

/// Everything needed to build an [`AbstractChord`] or a [`Chord`].
#[derive(Debug, Clone, Default)]
pub struct ChordSpec {
    pub input: Option<ChordInput>,
    pub qualifiers: Vec<ChordQualifier>,
    pub inversion: Option<Inversion>,
    pub root: Option<Note>,
    pub prefer_sharps: Option<bool>,
}

impl ChordSpec {
    pub fn new(input: ChordInput) -> Self {
        ChordSpec {
            input: Some(input),
            ..Default::default()
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        ChordSpec::new(ChordInput::Name(name.into()))
    }

    pub fn factors(factors: ChordFactors) -> Self {
        ChordSpec::new(ChordInput::Factors(factors))
    }

    pub fn intervals(intervals: IntervalList) -> Self {
        ChordSpec::new(ChordInput::Intervals(intervals))
    }

    pub fn notes(notes: NoteList) -> Self {
        ChordSpec::new(ChordInput::Notes(notes))
    }

    pub fn qualified(mut self, qualifiers: Vec<ChordQualifier>) -> Self {
        self.qualifiers.extend(qualifiers);
        self
    }

    /// Layer a textual qualifier string such as "sus4add9".
    pub fn qualified_by(self, suffix: &str) -> Result<Self> {
        Ok(self.qualified(parse_qualifiers(suffix)?))
    }

    pub fn inverted(mut self, inversion: Inversion) -> Self {
        self.inversion = Some(inversion);
        self
    }

    pub fn on(mut self, root: Note) -> Self {
        self.root = Some(root);
        self
    }

    pub fn sharps(mut self, prefer_sharps: bool) -> Self {
        self.prefer_sharps = Some(prefer_sharps);
        self
    }

    pub fn build_abstract(&self) -> Result<AbstractChord> {
        AbstractChord::from_spec(self)
    }

    pub fn build(&self) -> Result<Chord> {
        Chord::from_spec(self)
    }
}

/// Where the bass ends up once the inputs are resolved.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BassTarget {
    Index(usize),
    Note(Note),
}

/// Factors and inversion resolved from a builder, plus a root correction when
/// an interval list turned out to be an inversion of a better-known chord.
#[derive(Debug, Clone)]
pub(crate) struct Structure {
    pub factors: ChordFactors,
    pub bass: BassTarget,
    pub root_shift: i32,
}

/// Split "m7/2" or "Am/C" at the slash, rejecting an explicit inversion
/// alongside one.
fn split_slash<'a>(
    name: &'a str,
    inversion: Option<&Inversion>,
    allow_bass: bool,
) -> Result<(&'a str, Option<Inversion>)> {
    let Some(slash) = name.find(['/', '\\']) else {
        return Ok((name, inversion.cloned()));
    };
    if inversion.is_some() {
        return Err(Error::ConflictingInputs(format!(
            "'{name}' names an inversion but another inversion was also given"
        )));
    }
    let (suffix, marker) = (&name[..slash], &name[slash + 1..]);
    if marker.contains(['/', '\\']) {
        return Err(Error::MalformedInput(format!("'{name}' has more than one slash")));
    }
    if let Ok(index) = marker.parse::<usize>() {
        return Ok((suffix, Some(Inversion::Index(index))));
    }
    if !allow_bass {
        return Err(Error::MalformedInput(format!(
            "'{name}': only a numeric inversion is allowed without a root"
        )));
    }
    Ok((suffix, Some(Inversion::Bass(Note::parse(marker)?))))
}

/// Degrees above the octave that the qualifier vocabulary names.
const EXTENSION_DEGREES: [u8; 3] = [9, 11, 13];

/// Ways to spell `interval` as a chord factor, most natural first.
///
/// A compound interval keeps its own degree when that is a ninth, eleventh
/// or thirteenth, and otherwise folds down an octave. Later entries are
/// fallbacks for when the preferred degree is already taken: the other
/// extension degrees, then neighbouring simple degrees.
fn factor_spellings(interval: Interval) -> Vec<Interval> {
    let interval = if interval.is_descending() {
        interval.flatten()
    } else {
        interval
    };
    let value = interval.value();
    let simple = interval.flatten();
    let mut spellings = Vec::new();

    let compound_value = if interval.is_compound() {
        if EXTENSION_DEGREES.contains(&interval.extended_degree()) {
            spellings.push(interval);
        }
        spellings.push(simple);
        value
    } else {
        spellings.push(interval);
        value + 12
    };
    spellings.extend(
        EXTENSION_DEGREES
            .iter()
            .filter_map(|&degree| Interval::with_degree(compound_value, degree).ok()),
    );

    let base = simple.degree() as i32;
    spellings.extend(
        [base - 1, base + 1, base - 2, base + 2]
            .into_iter()
            .filter(|degree| (1..=7).contains(degree))
            .filter_map(|degree| Interval::with_degree(simple.value(), degree as u8).ok()),
    );
    spellings
}

/// Factors read degree by degree from intervals, skipping any interval whose
/// pitch class was already used (so C-E-G-C-E reads as C-E-G). Every other
/// pitch class gets a degree of its own: when the natural degree is taken,
/// the interval is respelled (18 semitones over a perfect fifth reads as a
/// sharp eleventh, not a flat fifth).
pub(crate) fn factors_from_intervals(intervals: &IntervalList) -> ChordFactors {
    let mut factors = ChordFactors::root_only().map().clone();
    let mut used = std::collections::HashSet::from([0]);
    for &interval in intervals {
        if !used.insert(interval.mod12()) {
            continue;
        }
        let spelled = factor_spellings(interval)
            .into_iter()
            .find(|spelling| !factors.contains_key(&spelling.extended_degree()));
        match spelled {
            Some(spelling) => {
                factors.insert(spelling.extended_degree(), spelling.offset_from_default());
            }
            None => warn!(interval = %interval, factors = ?factors, "no free degree for interval"),
        }
    }
    ChordFactors::new(factors)
}

/// Read an interval list, possibly re-reading it as an inversion of a less
/// rare chord when no inversion was requested.
fn resolve_intervals(
    intervals: &IntervalList,
    inversion: Option<&Inversion>,
) -> Result<(ChordFactors, Option<Inversion>, i32)> {
    let padded = intervals.sorted().pad(true, false)?;
    if padded.has_duplicates() {
        return Err(Error::DuplicateIntervals(intervals.values()));
    }
    if inversion.is_some() {
        return Ok((factors_from_intervals(&padded), inversion.cloned(), 0));
    }

    let reg = registry();
    let supplied_rarity = reg
        .name_for_intervals(&padded)
        .and_then(|name| reg.rarity_of(name))
        .unwrap_or(UNNAMED_RARITY);

    let candidates = AbstractChord::inversions_from_intervals(&padded);
    match candidates.first() {
        Some(best) if best.rarity() < supplied_rarity => {
            debug!(
                intervals = %padded,
                chord = %best.suffix(),
                "reading intervals as an inversion"
            );
            let shift = -best.root_intervals()[best.inversion()].value();
            Ok((
                best.factors().clone(),
                Some(Inversion::Index(best.inversion())),
                shift,
            ))
        }
        _ => {
            if supplied_rarity == UNNAMED_RARITY {
                debug!(intervals = %padded, "no chord or inversion matches these intervals");
            }
            Ok((factors_from_intervals(&padded), None, 0))
        }
    }
}

/// Resolve a builder's input, qualifiers and inversion into factors and a bass.
pub(crate) fn resolve_structure(spec: &ChordSpec, input: Option<&ChordInput>, allow_bass: bool) -> Result<Structure> {
    let requested = spec.inversion.as_ref();
    let (factors, inversion, root_shift) = match input {
        None => (ChordFactors::major_triad(), requested.cloned(), 0),
        Some(ChordInput::Name(name)) => {
            let (suffix, inversion) = split_slash(name, requested, allow_bass)?;
            let factors = ChordFactors::major_triad().apply_all(&parse_qualifiers(suffix)?)?;
            (factors, inversion, 0)
        }
        Some(ChordInput::Recast(chord)) => {
            let inversion = requested
                .cloned()
                .unwrap_or(Inversion::Index(chord.inversion()));
            (chord.factors().clone(), Some(inversion), 0)
        }
        Some(ChordInput::Factors(factors)) => (factors.clone(), requested.cloned(), 0),
        Some(ChordInput::Intervals(intervals)) => resolve_intervals(intervals, requested)?,
        Some(ChordInput::Notes(_)) => {
            return Err(Error::MalformedInput(
                "a chord without a root cannot be built from notes".to_string(),
            ))
        }
    };

    let factors = if spec.qualifiers.is_empty() {
        factors
    } else {
        factors.apply_all(&spec.qualifiers)?
    };

    let shape = AbstractChord::from_parts(factors.clone(), 0);
    let bass = match inversion {
        None | Some(Inversion::Index(0)) => BassTarget::Index(0),
        Some(Inversion::Index(index)) => {
            if index >= factors.order() {
                return Err(Error::InversionOutOfRange {
                    inversion: index,
                    order: factors.order(),
                });
            }
            BassTarget::Index(index)
        }
        Some(Inversion::Degree(degree)) => shape
            .position_of_degree(degree)
            .map(BassTarget::Index)
            .ok_or(Error::MissingDegree(degree))?,
        Some(Inversion::Bass(note)) => {
            if !allow_bass {
                return Err(Error::MalformedInput(
                    "a bass-note inversion needs a chord with a root".to_string(),
                ));
            }
            BassTarget::Note(note)
        }
    };

    Ok(Structure {
        factors,
        bass,
        root_shift,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(values: &[i32]) -> ChordFactors {
        factors_from_intervals(&IntervalList::from_values(values).unwrap())
    }

    #[test]
    fn test_plain_intervals_read_as_default_degrees() {
        assert_eq!(read(&[0, 4, 7, 10]), ChordFactors::from_pairs(&[(1, 0), (3, 0), (5, 0), (7, -1)]));
        assert_eq!(read(&[0, 7, 15]), ChordFactors::from_pairs(&[(1, 0), (3, -1), (5, 0)]));
    }

    #[test]
    fn test_sharp_eleven_does_not_replace_fifth() {
        let factors = read(&[0, 4, 7, 10, 14, 18]);
        assert_eq!(factors.get(5), Some(0));
        assert_eq!(factors.get(11), Some(1));
        assert_eq!(factors.order(), 6);
    }

    #[test]
    fn test_every_pitch_class_gets_a_degree() {
        for values in [vec![0, 4, 6, 7], vec![0, 3, 4, 7], vec![0, 1, 2, 3, 4]] {
            let factors = read(&values);
            let mut classes: Vec<i32> = factors.to_intervals().iter().map(Interval::mod12).collect();
            classes.sort_unstable();
            assert_eq!(classes, values, "{factors}");
        }
    }
}
