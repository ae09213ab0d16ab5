//! Pitch classes and ordered note collections.

use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::interval::Interval;
use crate::interval_list::IntervalList;
use crate::parsing;
use crate::{Error, Result};

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// A pitch class (no octave) with a sharp/flat spelling preference.
///
/// Two notes are equal when they sound the same: `E#` equals `F`.
#[derive(Debug, Clone, Copy)]
pub struct Note {
    pitch_class: u8,
    prefer_sharps: bool,
}

impl Note {
    /// A note from any integer pitch, folded into 0..12, spelled with flats.
    pub fn new(pitch: i32) -> Self {
        Note::with_preference(pitch, false)
    }

    pub fn with_preference(pitch: i32, prefer_sharps: bool) -> Self {
        Note {
            pitch_class: pitch.rem_euclid(12) as u8,
            prefer_sharps,
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        let (note, rest) = parsing::note_split(name)?;
        if !rest.is_empty() {
            return Err(Error::InvalidNoteName(name.to_string()));
        }
        Ok(note)
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch_class
    }

    pub fn prefer_sharps(&self) -> bool {
        self.prefer_sharps
    }

    /// The same pitch class with a different spelling preference.
    pub fn spelled(self, prefer_sharps: bool) -> Note {
        Note {
            prefer_sharps,
            ..self
        }
    }

    pub fn name(&self) -> &'static str {
        if self.prefer_sharps {
            self.sharp_name()
        } else {
            self.flat_name()
        }
    }

    pub fn sharp_name(&self) -> &'static str {
        NOTE_NAMES_SHARP[self.pitch_class as usize]
    }

    pub fn flat_name(&self) -> &'static str {
        NOTE_NAMES_FLAT[self.pitch_class as usize]
    }

    pub fn is_natural(&self) -> bool {
        self.sharp_name().len() == 1
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.pitch_class == other.pitch_class
    }
}

impl Eq for Note {}

impl Hash for Note {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pitch_class.hash(state);
    }
}

impl FromStr for Note {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Note::parse(s)
    }
}

impl Add<i32> for Note {
    type Output = Note;

    fn add(self, semitones: i32) -> Note {
        Note::with_preference(self.pitch_class as i32 + semitones, self.prefer_sharps)
    }
}

impl Add<Interval> for Note {
    type Output = Note;

    fn add(self, interval: Interval) -> Note {
        self + interval.value()
    }
}

impl Sub<i32> for Note {
    type Output = Note;

    fn sub(self, semitones: i32) -> Note {
        self + (-semitones)
    }
}

impl Sub<Interval> for Note {
    type Output = Note;

    fn sub(self, interval: Interval) -> Note {
        self + (-interval.value())
    }
}

/// The ascending interval (0..12) from `other` up to `self`.
impl Sub<Note> for Note {
    type Output = Interval;

    fn sub(self, other: Note) -> Interval {
        Interval::new((self.pitch_class as i32 - other.pitch_class as i32).rem_euclid(12))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Note {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// An ordered list of notes, e.g. a chord voicing or a set of played notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct NoteList(Vec<Note>);

impl NoteList {
    pub fn new(notes: Vec<Note>) -> Self {
        NoteList(notes)
    }

    /// Parse a note string such as "CEG" or "D F# A C".
    pub fn parse(input: &str) -> Result<Self> {
        parsing::parse_out_note_names(input)
            .filter(|notes| !notes.is_empty())
            .map(NoteList)
            .ok_or_else(|| Error::InvalidNoteName(input.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&Note> {
        self.0.first()
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.0.get(index)
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.0
    }

    pub fn contains(&self, note: &Note) -> bool {
        self.0.contains(note)
    }

    /// Drop repeated pitch classes after their first occurrence.
    pub fn unique(&self) -> NoteList {
        let mut unique: Vec<Note> = Vec::with_capacity(self.0.len());
        for note in &self.0 {
            if !unique.contains(note) {
                unique.push(*note);
            }
        }
        NoteList(unique)
    }

    /// Intervals from the first note, with each note placed at the smallest
    /// distance above the one before it. "CGE" gives 0, 7, 16.
    pub fn ascending_intervals(&self) -> IntervalList {
        let mut values = Vec::with_capacity(self.0.len());
        let mut previous: Option<(Note, i32)> = None;
        for &note in &self.0 {
            let value = match previous {
                None => 0,
                Some((prev_note, prev_value)) => {
                    let step = (note - prev_note).value();
                    prev_value + if step == 0 { 12 } else { step }
                }
            };
            values.push(value);
            previous = Some((note, value));
        }
        values.into_iter().map(Interval::new).collect()
    }

    /// The same notes, all spelled with the given preference.
    pub fn spelled(&self, prefer_sharps: bool) -> NoteList {
        self.0.iter().map(|n| n.spelled(prefer_sharps)).collect()
    }

    /// Sorted pitch classes, for comparing note content regardless of order.
    pub fn pitch_classes(&self) -> Vec<u8> {
        let mut classes: Vec<u8> = self.0.iter().map(Note::pitch_class).collect();
        classes.sort_unstable();
        classes.dedup();
        classes
    }
}

impl FromIterator<Note> for NoteList {
    fn from_iter<T: IntoIterator<Item = Note>>(iter: T) -> Self {
        NoteList(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a NoteList {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for NoteList {
    type Output = Note;

    fn index(&self, index: usize) -> &Note {
        &self.0[index]
    }
}

impl fmt::Display for NoteList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Note::name).collect();
        f.write_str(&names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn enharmonic_notes_are_equal() {
        assert_eq!(Note::parse("E#").unwrap(), Note::parse("F").unwrap());
        assert_eq!(Note::parse("Db").unwrap(), Note::parse("C#").unwrap());
    }

    #[test]
    fn spelling_follows_preference() {
        let c_sharp = Note::parse("C#").unwrap();
        assert_eq!(c_sharp.name(), "C#");
        assert_eq!(c_sharp.spelled(false).name(), "Db");
        assert_eq!(Note::new(10).name(), "Bb");
    }

    #[test]
    fn arithmetic_wraps_around_the_octave() {
        let b = Note::parse("B").unwrap();
        assert_eq!((b + 1).name(), "C");
        assert_eq!((Note::new(0) - 3).name(), "A");
        assert_eq!((Note::new(0) - b).value(), 1);
        assert_eq!((b - Note::new(0)).value(), 11);
    }

    #[test]
    fn ascending_intervals_climb() {
        let notes = NoteList::parse("CGE").unwrap();
        assert_eq!(notes.ascending_intervals().values(), vec![0, 7, 16]);
        let notes = NoteList::parse("CEGC").unwrap();
        assert_eq!(notes.ascending_intervals().values(), vec![0, 4, 7, 12]);
    }

    #[test]
    fn unique_keeps_first_occurrence() {
        let notes = NoteList::parse("CEGCE").unwrap();
        assert_eq!(notes.unique().to_string(), "C, E, G");
    }

    #[test]
    fn rejects_bad_note_strings() {
        assert!(NoteList::parse("Cmaj7").is_err());
        assert!(NoteList::parse("").is_err());
        assert!(Note::parse("H").is_err());
    }
}
