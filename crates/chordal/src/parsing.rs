//! Note-name parsing using winnow combinators.
//!
//! A note name is an uppercase letter A-G followed by at most one
//! accidental: `#`, `♯`, `𝄪`, `b`, `♭` or `𝄫`. Anything after that is
//! treated as a chord suffix by [`note_split`].

use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::note::Note;
use crate::{Error, Result};

type PResult<T> = winnow::ModalResult<T>;

/// Parse a note letter into its natural pitch class.
pub fn parse_letter(input: &mut &str) -> PResult<i32> {
    let c = one_of(['C', 'D', 'E', 'F', 'G', 'A', 'B']).parse_next(input)?;
    Ok(match c {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        _ => 11,
    })
}

/// Parse a single accidental into a semitone shift.
pub fn parse_accidental(input: &mut &str) -> PResult<i32> {
    alt((
        "𝄪".map(|_| 2),
        "#".map(|_| 1),
        "♯".map(|_| 1),
        "𝄫".map(|_| -2),
        "b".map(|_| -1),
        "♭".map(|_| -1),
    ))
    .parse_next(input)
}

/// Parse a note name. Sharp accidentals set a sharp spelling preference.
pub fn parse_note(input: &mut &str) -> PResult<Note> {
    let natural = parse_letter.parse_next(input)?;
    let shift = opt(parse_accidental).parse_next(input)?;
    let shift = shift.unwrap_or(0);
    Ok(Note::with_preference(natural + shift, shift > 0))
}

/// Split a leading note name from the rest of a chord name.
///
/// `note_split("Bbm7")` gives `(Bb, "m7")`.
pub fn note_split(name: &str) -> Result<(Note, &str)> {
    let mut input = name;
    let note = parse_note
        .parse_next(&mut input)
        .map_err(|_| Error::InvalidNoteName(name.to_string()))?;
    Ok((note, input))
}

/// The spelling a written note asks for: `Some(true)` after a sharp,
/// `Some(false)` after a flat, `None` for naturals and non-notes.
pub fn spelling_hint(name: &str) -> Option<bool> {
    let mut input = name;
    parse_letter.parse_next(&mut input).ok()?;
    let shift = parse_accidental.parse_next(&mut input).ok()?;
    Some(shift > 0)
}

pub fn is_valid_note_name(name: &str) -> bool {
    matches!(note_split(name), Ok((_, rest)) if rest.is_empty())
}

/// Commas and whitespace between note names.
fn separators<'s>(input: &mut &'s str) -> PResult<&'s str> {
    take_while(0.., |c: char| c == ',' || c.is_whitespace()).parse_next(input)
}

/// Parse a string made only of note names ("CEG", "C# E G#", "D,F#,A").
///
/// All or nothing: returns `None` if any part of the string is not a note.
pub fn parse_out_note_names(input: &str) -> Option<Vec<Note>> {
    let mut input = input.trim();
    let mut notes = Vec::new();
    while !input.is_empty() {
        let note = parse_note.parse_next(&mut input).ok()?;
        notes.push(note);
        separators.parse_next(&mut input).ok()?;
    }
    Some(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_note_split() {
        let (note, rest) = note_split("Bbm7").unwrap();
        assert_eq!(note.pitch_class(), 10);
        assert_eq!(rest, "m7");

        let (note, rest) = note_split("F#sus4/C#").unwrap();
        assert_eq!(note.pitch_class(), 6);
        assert_eq!(rest, "sus4/C#");

        let (note, rest) = note_split("C").unwrap();
        assert_eq!(note.pitch_class(), 0);
        assert_eq!(rest, "");
    }

    #[test]
    fn test_enharmonic_spellings() {
        assert_eq!(note_split("E#").unwrap().0.pitch_class(), 5);
        assert_eq!(note_split("Cb").unwrap().0.pitch_class(), 11);
        assert_eq!(note_split("F𝄪").unwrap().0.pitch_class(), 7);
        assert_eq!(note_split("D♭").unwrap().0.pitch_class(), 1);
    }

    #[test]
    fn test_spelling_hint() {
        assert_eq!(spelling_hint("F#"), Some(true));
        assert_eq!(spelling_hint("Dbmaj7"), Some(false));
        assert_eq!(spelling_hint("C9"), None);
        assert_eq!(spelling_hint("2"), None);
    }

    #[test]
    fn test_invalid_note_names() {
        assert!(note_split("m7").is_err());
        assert!(note_split("").is_err());
        assert!(!is_valid_note_name("Cm"));
        assert!(is_valid_note_name("C#"));
    }

    #[test]
    fn test_parse_out_note_names() {
        let notes = parse_out_note_names("CEG").unwrap();
        let classes: Vec<u8> = notes.iter().map(|n| n.pitch_class()).collect();
        assert_eq!(classes, vec![0, 4, 7]);

        let notes = parse_out_note_names("D, F# A C").unwrap();
        let classes: Vec<u8> = notes.iter().map(|n| n.pitch_class()).collect();
        assert_eq!(classes, vec![2, 6, 9, 0]);

        assert!(parse_out_note_names("Cmaj7").is_none());
        assert!(parse_out_note_names("Am/C").is_none());
    }
}
