//! Interval and chord qualities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The quality of an interval (or, by extension, of a chord).
///
/// Perfect-family degrees (1, 4, 5) range over diminished/perfect/augmented;
/// all other degrees range over diminished/minor/major/augmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    DoublyDiminished,
    Diminished,
    Minor,
    Major,
    Perfect,
    Augmented,
    DoublyAugmented,
}

impl Quality {
    /// Quality of a perfect-family degree sitting `offset` semitones from perfect.
    pub fn from_offset_wrt_perfect(offset: i32) -> Option<Self> {
        match offset {
            -2 => Some(Quality::DoublyDiminished),
            -1 => Some(Quality::Diminished),
            0 => Some(Quality::Perfect),
            1 => Some(Quality::Augmented),
            2 => Some(Quality::DoublyAugmented),
            _ => None,
        }
    }

    /// Quality of a major-family degree sitting `offset` semitones from major.
    pub fn from_offset_wrt_major(offset: i32) -> Option<Self> {
        match offset {
            -3 => Some(Quality::DoublyDiminished),
            -2 => Some(Quality::Diminished),
            -1 => Some(Quality::Minor),
            0 => Some(Quality::Major),
            1 => Some(Quality::Augmented),
            2 => Some(Quality::DoublyAugmented),
            _ => None,
        }
    }

    /// Semitone offset from perfect. `None` for minor and major.
    pub fn offset_wrt_perfect(self) -> Option<i32> {
        match self {
            Quality::DoublyDiminished => Some(-2),
            Quality::Diminished => Some(-1),
            Quality::Perfect => Some(0),
            Quality::Augmented => Some(1),
            Quality::DoublyAugmented => Some(2),
            Quality::Minor | Quality::Major => None,
        }
    }

    /// Semitone offset from major. `None` for perfect.
    pub fn offset_wrt_major(self) -> Option<i32> {
        match self {
            Quality::DoublyDiminished => Some(-3),
            Quality::Diminished => Some(-2),
            Quality::Minor => Some(-1),
            Quality::Major => Some(0),
            Quality::Augmented => Some(1),
            Quality::DoublyAugmented => Some(2),
            Quality::Perfect => None,
        }
    }

    pub fn is_major(self) -> bool {
        self == Quality::Major
    }

    pub fn is_minor(self) -> bool {
        self == Quality::Minor
    }

    pub fn is_perfect(self) -> bool {
        self == Quality::Perfect
    }

    pub fn is_augmented(self) -> bool {
        matches!(self, Quality::Augmented | Quality::DoublyAugmented)
    }

    pub fn is_diminished(self) -> bool {
        matches!(self, Quality::Diminished | Quality::DoublyDiminished)
    }

    /// Major or augmented.
    pub fn is_major_ish(self) -> bool {
        matches!(self, Quality::Major | Quality::Augmented)
    }

    /// Minor or diminished.
    pub fn is_minor_ish(self) -> bool {
        matches!(self, Quality::Minor | Quality::Diminished)
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Quality::DoublyDiminished => "doubly diminished",
            Quality::Diminished => "diminished",
            Quality::Minor => "minor",
            Quality::Major => "major",
            Quality::Perfect => "perfect",
            Quality::Augmented => "augmented",
            Quality::DoublyAugmented => "doubly augmented",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Quality::DoublyDiminished => "dd",
            Quality::Diminished => "d",
            Quality::Minor => "m",
            Quality::Major => "M",
            Quality::Perfect => "P",
            Quality::Augmented => "A",
            Quality::DoublyAugmented => "AA",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_round_trip_through_both_scales() {
        for offset in -2..=2 {
            let q = Quality::from_offset_wrt_perfect(offset).unwrap();
            assert_eq!(q.offset_wrt_perfect(), Some(offset));
        }
        for offset in -3..=2 {
            let q = Quality::from_offset_wrt_major(offset).unwrap();
            assert_eq!(q.offset_wrt_major(), Some(offset));
        }
    }

    #[test]
    fn out_of_range_offsets_have_no_quality() {
        assert_eq!(Quality::from_offset_wrt_perfect(3), None);
        assert_eq!(Quality::from_offset_wrt_major(-4), None);
    }

    #[test]
    fn family_predicates() {
        assert!(Quality::Augmented.is_major_ish());
        assert!(Quality::Diminished.is_minor_ish());
        assert!(!Quality::Perfect.is_major_ish());
        assert!(!Quality::Perfect.is_minor_ish());
    }
}
