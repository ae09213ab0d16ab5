//! Chord algebra for symbolic music.
//!
//! Chords are modelled as sets of scale-degree factors with semitone offsets,
//! built on top of an interval engine that tracks both semitone distance and
//! diatonic degree. On top of that sit two inverse operations:
//!
//! - a naming [`Registry`] that deterministically generates a vocabulary of
//!   compositional chord names ("m7", "sus4add9", "9(no5)") and maps factor
//!   sets and interval sets back to those names
//! - a [`matcher`] that recovers the most likely named chords from an
//!   unordered, possibly incomplete set of notes
//!
//! # Example
//!
//! ```
//! use chordal::{AbstractChord, Chord, MatchParams, NoteList};
//!
//! let m7 = AbstractChord::new("m7").unwrap();
//! assert_eq!(m7.suffix(), "m7");
//!
//! let chord = Chord::new("Am/C").unwrap();
//! assert_eq!(chord.notes().to_string(), "C, E, A");
//!
//! let notes = NoteList::parse("CEGB").unwrap();
//! let matches = chordal::matching_chords(&notes, &MatchParams::default()).unwrap();
//! assert_eq!(matches[0].chord.name(), "Cmaj7");
//! ```
//!
//! The registry is built once per process, on first use or explicitly through
//! [`init`], and is read-only afterwards.

pub mod chord;
pub mod factors;
pub mod interval;
pub mod interval_list;
pub mod matcher;
pub mod note;
pub mod parsing;
pub mod quality;
pub mod qualifier;
pub mod registry;

pub use chord::{AbstractChord, Chord, ChordInput, ChordList, ChordSpec, Inversion};
pub use factors::ChordFactors;
pub use interval::Interval;
pub use interval_list::IntervalList;
pub use matcher::{
    matching_chords, most_likely_chord, render_table, ChordMatch, MatchParams, MatchReport, MatchScores,
};
pub use note::{Note, NoteList};
pub use quality::Quality;
pub use qualifier::{parse_qualifiers, ChordQualifier, Condition};
pub use registry::{registry, Registry, MAX_RARITY, UNNAMED_RARITY};

/// Errors from chord construction, naming, and matching.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{value} semitones cannot be degree {degree}: {reason}")]
    IntervalDegree {
        value: i32,
        degree: u8,
        reason: &'static str,
    },

    #[error("interval list contains repeated intervals: {0:?}")]
    DuplicateIntervals(Vec<i32>),

    #[error("interval list is not sorted: {0:?}")]
    UnsortedIntervals(Vec<i32>),

    #[error("unrecognised chord qualifier at '{rest}' in '{input}'")]
    UnknownQualifier { input: String, rest: String },

    #[error("qualifier {qualifier} is not valid on {factors}")]
    InvalidQualifier { qualifier: String, factors: String },

    #[error("invalid note name: '{0}'")]
    InvalidNoteName(String),

    #[error("inversion {inversion} is out of range for a chord with {order} factors")]
    InversionOutOfRange { inversion: usize, order: usize },

    #[error("chord has no degree {0}")]
    MissingDegree(u8),

    #[error("conflicting chord inputs: {0}")]
    ConflictingInputs(String),

    #[error("malformed chord input: {0}")]
    MalformedInput(String),

    #[error("could not reidentify {chord} over bass {bass} within {steps} steps")]
    Unresolved {
        chord: String,
        bass: String,
        steps: usize,
    },

    #[error("no chord matches notes: {0}")]
    NoMatch(String),

    #[error("{chord} is neither major nor minor, so it has no {relation}")]
    NoRelative {
        chord: String,
        relation: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Build the naming registry now rather than on first use.
///
/// Idempotent. Collision warnings from the build are logged on the first call.
pub fn init() -> &'static Registry {
    registry()
}
