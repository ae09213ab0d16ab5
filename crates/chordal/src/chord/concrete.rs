use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};
use tracing::{debug, info, warn};

use super::{resolve_structure, AbstractChord, BassTarget, ChordInput, ChordList, ChordSpec, Inversion};
use crate::factors::ChordFactors;
use crate::interval::Interval;
use crate::interval_list::IntervalList;
use crate::matcher::{matching_chords, MatchParams};
use crate::note::{Note, NoteList};
use crate::parsing::{note_split, spelling_hint};
use crate::quality::Quality;
use crate::{Error, Result};

/// Upper bound on attempts to make sense of a bass note outside the chord.
const MAX_REIDENTIFY_STEPS: usize = 3;

// Pitch classes of tonics conventionally spelled with sharps or flats.
const SHARP_MAJOR_TONICS: [u8; 6] = [7, 2, 9, 4, 11, 6];
const FLAT_MAJOR_TONICS: [u8; 5] = [5, 10, 3, 8, 1];
const SHARP_MINOR_TONICS: [u8; 6] = [4, 11, 6, 1, 8, 3];
const FLAT_MINOR_TONICS: [u8; 5] = [2, 7, 0, 5, 10];

fn detect_sharp_preference(quality: Quality, root: Note) -> bool {
    let pc = root.pitch_class();
    match quality {
        Quality::Major if SHARP_MAJOR_TONICS.contains(&pc) => true,
        Quality::Major if FLAT_MAJOR_TONICS.contains(&pc) => false,
        Quality::Minor if SHARP_MINOR_TONICS.contains(&pc) => true,
        Quality::Minor if FLAT_MINOR_TONICS.contains(&pc) => false,
        _ => false,
    }
}

/// An abstract chord placed on a root note.
///
/// Equal to another chord when factors, inversion and root all match.
#[derive(Debug, Clone, Serialize)]
pub struct Chord {
    shape: AbstractChord,
    root: Note,
    bass: Note,
    inversion_degree: Option<u8>,
    root_notes: NoteList,
    notes: NoteList,
    prefer_sharps: bool,
}

impl Chord {
    /// Build from a full name such as "Am7", "F#sus4/C#" or "E#m7/C", or
    /// from a run of notes such as "CEG".
    pub fn new(name: &str) -> Result<Self> {
        ChordSpec::name(name).build()
    }

    pub fn from_notes(notes: NoteList) -> Result<Self> {
        ChordSpec::notes(notes).build()
    }

    pub fn from_factors(factors: ChordFactors, root: Note) -> Self {
        AbstractChord::from_factors(factors).on_root(root)
    }

    pub fn from_spec(spec: &ChordSpec) -> Result<Self> {
        let (root, input, sharps_hint) = split_root(spec)?;
        let structure = resolve_structure(spec, input.as_ref(), true)?;
        let root = root + structure.root_shift;
        let (factors, root, inversion) = match structure.bass {
            BassTarget::Index(index) => (structure.factors, root, index),
            BassTarget::Note(bass) => place_bass(structure.factors, root, bass, MAX_REIDENTIFY_STEPS)?,
        };
        let shape = AbstractChord::from_parts(factors, inversion);
        Ok(Chord::assemble(shape, root, spec.prefer_sharps.or(sharps_hint)))
    }

    /// Lay out the notes of `shape` on `root`. Detects a spelling when
    /// `prefer_sharps` is not given.
    pub(crate) fn assemble(shape: AbstractChord, root: Note, prefer_sharps: Option<bool>) -> Chord {
        let prefer_sharps =
            prefer_sharps.unwrap_or_else(|| detect_sharp_preference(shape.quality(), root));
        let root = root.spelled(prefer_sharps);
        let root_notes: NoteList = shape.root_intervals().iter().map(|&i| root + i).collect();
        let bass = root_notes.get(shape.inversion()).copied().unwrap_or(root);
        let notes: NoteList = shape.intervals().iter().map(|&i| bass + i).collect();
        let inversion_degree = if shape.inversion() == 0 {
            None
        } else {
            shape.degree_at(shape.inversion())
        };
        Chord {
            shape,
            root,
            bass,
            inversion_degree,
            root_notes,
            notes,
            prefer_sharps,
        }
    }

    /// The abstract chord with this chord's inversion.
    pub fn shape(&self) -> &AbstractChord {
        &self.shape
    }

    /// The abstract chord in root position.
    pub fn abstract_chord(&self) -> AbstractChord {
        AbstractChord::from_factors(self.shape.factors().clone())
    }

    pub fn factors(&self) -> &ChordFactors {
        self.shape.factors()
    }

    pub fn inversion(&self) -> usize {
        self.shape.inversion()
    }

    /// The degree in the bass, if inverted.
    pub fn inversion_degree(&self) -> Option<u8> {
        self.inversion_degree
    }

    pub fn root(&self) -> Note {
        self.root
    }

    pub fn bass(&self) -> Note {
        self.bass
    }

    /// Notes from the bass upwards.
    pub fn notes(&self) -> &NoteList {
        &self.notes
    }

    /// Notes from the root upwards, as if in root position.
    pub fn root_notes(&self) -> &NoteList {
        &self.root_notes
    }

    pub fn factor_notes(&self) -> BTreeMap<u8, Note> {
        self.factors()
            .factor_intervals()
            .into_iter()
            .map(|(degree, interval)| (degree, self.root + interval))
            .collect()
    }

    pub fn intervals(&self) -> &IntervalList {
        self.shape.intervals()
    }

    pub fn root_intervals(&self) -> &IntervalList {
        self.shape.root_intervals()
    }

    pub fn order(&self) -> usize {
        self.shape.order()
    }

    pub fn quality(&self) -> Quality {
        self.shape.quality()
    }

    pub fn rarity(&self) -> u8 {
        self.shape.rarity()
    }

    pub fn likelihood(&self) -> f64 {
        self.shape.likelihood()
    }

    pub fn consonance(&self) -> f64 {
        self.shape.consonance()
    }

    pub fn prefer_sharps(&self) -> bool {
        self.prefer_sharps
    }

    pub fn sharp_notes(&self) -> NoteList {
        self.notes.spelled(true)
    }

    pub fn flat_notes(&self) -> NoteList {
        self.notes.spelled(false)
    }

    /// The suffix with any inversion written as a bass note: "m7/G".
    pub fn suffix(&self) -> String {
        let marker = if self.inversion() == 0 {
            String::new()
        } else {
            format!("/{}", self.bass.name())
        };
        self.shape.suffix_with(&marker)
    }

    pub fn name(&self) -> String {
        format!("{}{}", self.root.name(), self.suffix())
    }

    pub fn contains_note(&self, note: Note) -> bool {
        self.notes.contains(&note)
    }

    pub fn contains_degree(&self, degree: u8) -> bool {
        self.shape.contains_degree(degree)
    }

    pub fn contains_interval(&self, interval: Interval) -> bool {
        self.intervals().contains_value(interval.value())
    }

    /// Same notes, possibly in a different order or spelling.
    pub fn enharmonic_to(&self, other: &Chord) -> bool {
        self.notes.len() == other.notes.len()
            && self.notes.iter().all(|n| other.notes.contains(n))
    }

    /// The same chord with a different inversion or bass note.
    pub fn invert(&self, inversion: Inversion) -> Result<Chord> {
        ChordSpec::factors(self.factors().clone())
            .on(self.root)
            .sharps(self.prefer_sharps)
            .inverted(inversion)
            .build()
    }

    /// Transpose by `semitones`, keeping the inversion.
    pub fn transpose(&self, semitones: i32) -> Chord {
        Chord::assemble(self.shape.clone(), self.root + semitones, None)
    }

    pub fn add_note(&self, note: Note) -> Result<Chord> {
        let mut notes: Vec<Note> = self.notes.iter().copied().collect();
        notes.push(note);
        Chord::from_notes(NoteList::new(notes))
    }

    pub fn remove_note(&self, note: Note) -> Result<Chord> {
        let notes: NoteList = self.notes.iter().copied().filter(|n| *n != note).collect();
        if notes.is_empty() {
            return Err(Error::MalformedInput(format!(
                "removing {note} from {} leaves no notes",
                self.name()
            )));
        }
        Chord::from_notes(notes)
    }

    fn third_shifted(&self, delta: i32, root: Note, relation: &'static str) -> Result<Chord> {
        let third = self.factors().get(3).ok_or_else(|| Error::NoRelative {
            chord: self.name(),
            relation,
        })?;
        let mut factors = self.factors().with_offset(3, third + delta);
        if let Some(fifth) = self.factors().get(5) {
            factors = factors.with_offset(5, -fifth);
        }
        let shape = AbstractChord::from_parts(factors, self.inversion());
        Ok(Chord::assemble(shape, root, None))
    }

    fn no_relative(&self, relation: &'static str) -> Error {
        Error::NoRelative {
            chord: self.name(),
            relation,
        }
    }

    /// The minor chord a minor third below. Major chords only.
    pub fn relative_minor(&self) -> Result<Chord> {
        if !self.quality().is_major() {
            return Err(self.no_relative("relative minor"));
        }
        self.third_shifted(-1, self.root - 3, "relative minor")
    }

    /// The major chord a minor third above. Minor chords only.
    pub fn relative_major(&self) -> Result<Chord> {
        if !self.quality().is_minor() {
            return Err(self.no_relative("relative major"));
        }
        self.third_shifted(1, self.root + 3, "relative major")
    }

    pub fn relative(&self) -> Result<Chord> {
        match self.quality() {
            Quality::Major => self.relative_minor(),
            Quality::Minor => self.relative_major(),
            _ => Err(self.no_relative("relative")),
        }
    }

    pub fn parallel_minor(&self) -> Result<Chord> {
        if !self.quality().is_major_ish() {
            return Err(self.no_relative("parallel minor"));
        }
        self.third_shifted(-1, self.root, "parallel minor")
    }

    pub fn parallel_major(&self) -> Result<Chord> {
        if !self.quality().is_minor_ish() {
            return Err(self.no_relative("parallel major"));
        }
        self.third_shifted(1, self.root, "parallel major")
    }

    pub fn parallel(&self) -> Result<Chord> {
        match self.quality() {
            Quality::Major => self.parallel_minor(),
            Quality::Minor => self.parallel_major(),
            _ => Err(self.no_relative("parallel")),
        }
    }

    pub fn is_suspended(&self) -> bool {
        !self.contains_degree(3) && (self.contains_degree(2) || self.contains_degree(4))
    }

    pub fn is_fifth_chord(&self) -> bool {
        self.factors().degrees() == [1, 5]
    }

    pub fn is_extended(&self) -> bool {
        self.factors().degrees().iter().any(|&d| d > 7)
    }

    /// Descriptive flags such as "inverted" or "suspended".
    pub fn flags(&self) -> Vec<&'static str> {
        let quality = self.quality();
        [
            ("inverted", self.inversion() != 0),
            ("suspended", self.is_suspended()),
            ("diminished", quality.is_diminished()),
            ("augmented", quality.is_augmented()),
            ("indeterminate", !self.contains_degree(3) && !self.is_suspended()),
            ("fifth chord", self.is_fifth_chord()),
            ("extended", self.is_extended()),
        ]
        .into_iter()
        .filter_map(|(flag, set)| set.then_some(flag))
        .collect()
    }

    /// A multi-line description of the chord.
    pub fn properties(&self) -> String {
        let degree = self
            .inversion_degree
            .map(|d| format!(" (degree {d} in the bass)"))
            .unwrap_or_default();
        format!(
            "Name:       {}\n\
             Root:       {}\n\
             Bass:       {}\n\
             Notes:      {}\n\
             Intervals:  {}\n\
             Factors:    {}\n\
             Inversion:  {}{}\n\
             Suffix:     {}\n\
             Quality:    {}\n\
             Rarity:     {}\n\
             Consonance: {:.3}\n\
             Sharps:     {}\n\
             Flags:      {}",
            self.name(),
            self.root,
            self.bass,
            self.notes,
            self.intervals(),
            self.factors(),
            self.inversion(),
            degree,
            self.suffix(),
            self.quality(),
            self.rarity(),
            self.consonance(),
            self.prefer_sharps,
            self.flags().join(", "),
        )
    }
}

/// Pull the root out of a spec: from the explicit root, the first note of
/// a note list, or the front of a chord name. Also returns the input left
/// to resolve and any spelling hint the name gives.
fn split_root(spec: &ChordSpec) -> Result<(Note, Option<ChordInput>, Option<bool>)> {
    let from_notes = |notes: &NoteList| -> Result<(Note, Option<ChordInput>, Option<bool>)> {
        let root = *notes
            .first()
            .ok_or_else(|| Error::MalformedInput("empty note list".to_string()))?;
        Ok((root, Some(ChordInput::Intervals(notes.ascending_intervals())), None))
    };

    match (&spec.input, spec.root) {
        (Some(ChordInput::Notes(_)), Some(_)) => Err(Error::ConflictingInputs(
            "a note list already fixes the root".to_string(),
        )),
        (Some(ChordInput::Notes(notes)), None) => from_notes(notes),
        (Some(ChordInput::Name(name)), None) => {
            if let ChordInput::Notes(notes) = ChordInput::classify(name) {
                return from_notes(&notes);
            }
            let (root, rest) = note_split(name)?;
            // an accidental on the root decides the spelling, then one on the bass
            let bass_hint = rest
                .rsplit_once(['/', '\\'])
                .and_then(|(_, marker)| spelling_hint(marker));
            let hint = spelling_hint(name).or(bass_hint);
            Ok((root, Some(ChordInput::Name(rest.to_string())), hint))
        }
        (input, Some(root)) => Ok((root, input.clone(), root.prefer_sharps().then_some(true))),
        (_, None) => Err(Error::MalformedInput("a chord needs a root".to_string())),
    }
}

fn bass_position(shape: &AbstractChord, root: Note, bass: Note) -> Option<usize> {
    shape.root_intervals().iter().position(|&i| root + i == bass)
}

/// Factors extended with `bass` as an upper note: above the top interval
/// if it falls inside the chord's span, otherwise at its plain distance.
fn extend_with_bass(shape: &AbstractChord, root: Note, bass: Note) -> ChordFactors {
    let distance = (bass - root).value();
    let top = shape.root_intervals().last().map(Interval::value).unwrap_or(0);
    let added = if distance < top { distance + 12 } else { distance };
    let mut intervals = shape.root_intervals().clone().into_vec();
    intervals.push(Interval::new(added));
    super::factors_from_intervals(&IntervalList::new(intervals).sorted())
}

/// The best named chord rooted on `bass` over the bass plus `notes`.
fn reidentify(notes: &NoteList, bass: Note, original: &str, steps: usize) -> Result<(ChordFactors, Note)> {
    let mut all = vec![bass];
    all.extend(notes.iter().copied());
    let params = MatchParams {
        invert: false,
        require_root: true,
        ..MatchParams::most_likely()
    };
    let best = matching_chords(&NoteList::new(all), &params)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Unresolved {
            chord: original.to_string(),
            bass: bass.to_string(),
            steps,
        })?;
    if best.scores.precision == 1.0 && best.scores.recall == 1.0 {
        info!(chord = original, bass = %bass, as_chord = %best.chord.name(), "reidentified chord over foreign bass");
    } else {
        warn!(
            chord = original,
            bass = %bass,
            as_chord = %best.chord.name(),
            precision = best.scores.precision,
            recall = best.scores.recall,
            "imperfect reidentification over foreign bass"
        );
    }
    Ok((best.chord.factors().clone(), best.chord.root()))
}

/// Work out factors, root and inversion for a chord with an explicit bass
/// note. A bass outside the chord is first added as an upper note; if that
/// gives no known chord, the notes are matched afresh with the bass as root.
/// Gives up with [`Error::Unresolved`] after `max_steps` attempts.
fn place_bass(
    factors: ChordFactors,
    root: Note,
    bass: Note,
    max_steps: usize,
) -> Result<(ChordFactors, Note, usize)> {
    let original = AbstractChord::from_parts(factors.clone(), 0);
    let original_name = format!("{}{}", root, original.suffix());
    let mut current = (factors, root);
    let mut reidentified = false;

    for step in 0..max_steps {
        let shape = AbstractChord::from_parts(current.0.clone(), 0);
        match bass_position(&shape, current.1, bass) {
            Some(position) if step == 0 || reidentified || shape.registered_name().is_some() => {
                return Ok((current.0, current.1, position));
            }
            None if step == 0 => {
                let extended = extend_with_bass(&shape, current.1, bass);
                debug!(chord = %original_name, bass = %bass, factors = %extended, "extending chord with bass");
                current = (extended, current.1);
            }
            _ if !reidentified => {
                current = reidentify(original.on_root(root).root_notes(), bass, &original_name, max_steps)?;
                reidentified = true;
            }
            _ => break,
        }
    }

    Err(Error::Unresolved {
        chord: original_name,
        bass: bass.to_string(),
        steps: max_steps,
    })
}

impl PartialEq for Chord {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.root == other.root
    }
}

impl Eq for Chord {}

impl Hash for Chord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shape.hash(state);
        self.root.hash(state);
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Add<i32> for Chord {
    type Output = Chord;

    fn add(self, semitones: i32) -> Chord {
        self.transpose(semitones)
    }
}

impl Add<Interval> for Chord {
    type Output = Chord;

    fn add(self, interval: Interval) -> Chord {
        self.transpose(interval.value())
    }
}

impl Sub<i32> for Chord {
    type Output = Chord;

    fn sub(self, semitones: i32) -> Chord {
        self.transpose(-semitones)
    }
}

impl Sub<Interval> for Chord {
    type Output = Chord;

    fn sub(self, interval: Interval) -> Chord {
        self.transpose(-interval.value())
    }
}

impl Add for Chord {
    type Output = ChordList;

    fn add(self, other: Chord) -> ChordList {
        ChordList::new(vec![self, other])
    }
}
