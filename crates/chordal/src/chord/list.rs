use serde::Serialize;
use std::fmt;
use std::ops::Add;

use super::Chord;

/// An ordered sequence of chords, e.g. the start of a progression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChordList(Vec<Chord>);

impl ChordList {
    pub fn new(chords: Vec<Chord>) -> Self {
        ChordList(chords)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chord> {
        self.0.iter()
    }

    pub fn push(&mut self, chord: Chord) {
        self.0.push(chord);
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(Chord::name).collect()
    }

    /// Every chord moved by the same number of semitones.
    pub fn transpose(&self, semitones: i32) -> ChordList {
        self.0.iter().map(|c| c.transpose(semitones)).collect()
    }
}

impl Add<Chord> for ChordList {
    type Output = ChordList;

    fn add(mut self, chord: Chord) -> ChordList {
        self.push(chord);
        self
    }
}

impl Add for ChordList {
    type Output = ChordList;

    fn add(mut self, other: ChordList) -> ChordList {
        self.0.extend(other.0);
        self
    }
}

impl FromIterator<Chord> for ChordList {
    fn from_iter<T: IntoIterator<Item = Chord>>(iter: T) -> Self {
        ChordList(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ChordList {
    type Item = &'a Chord;
    type IntoIter = std::slice::Iter<'a, Chord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for ChordList {
    type Output = Chord;

    fn index(&self, index: usize) -> &Chord {
        &self.0[index]
    }
}

impl fmt::Display for ChordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(" - "))
    }
}
