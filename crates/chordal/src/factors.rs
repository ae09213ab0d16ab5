//! Chord factors: a chord's structural identity as degree -> offset pairs.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::interval::{offset_accidental, Interval};
use crate::interval_list::IntervalList;
use crate::qualifier::ChordQualifier;
use crate::Result;

/// The interval for a factor, tolerating spellings that an explicit degree
/// cannot represent by falling back to the default degree for that width.
pub(crate) fn factor_interval(degree: u8, offset: i32) -> Interval {
    Interval::from_degree(degree, offset).unwrap_or_else(|_| {
        let octave_span = (degree.max(1) as i32 - 1) / 7;
        let mod_degree = degree.max(1) as i32 - 7 * octave_span;
        let base = Interval::from_degree(mod_degree as u8, 0)
            .map(|i| i.value())
            .unwrap_or(0);
        Interval::new(base + 12 * octave_span + offset)
    })
}

/// Degree -> semitone offset from that degree's perfect/major interval.
///
/// `{1: 0, 3: -1, 5: 0}` is a minor triad. Degrees are kept sorted.
/// Factors also carry the history of qualifiers that produced them; the
/// history is provenance only and takes no part in equality or hashing.
#[derive(Debug, Clone, Default)]
pub struct ChordFactors {
    factors: BTreeMap<u8, i32>,
    history: Vec<ChordQualifier>,
}

impl ChordFactors {
    pub fn new(factors: BTreeMap<u8, i32>) -> Self {
        ChordFactors {
            factors,
            history: Vec::new(),
        }
    }

    pub fn from_pairs(pairs: &[(u8, i32)]) -> Self {
        ChordFactors::new(pairs.iter().copied().collect())
    }

    pub fn major_triad() -> Self {
        ChordFactors::from_pairs(&[(1, 0), (3, 0), (5, 0)])
    }

    /// Just the root, the starting point when building factors from intervals.
    pub fn root_only() -> Self {
        ChordFactors::from_pairs(&[(1, 0)])
    }

    pub(crate) fn from_parts(factors: BTreeMap<u8, i32>, history: Vec<ChordQualifier>) -> Self {
        ChordFactors { factors, history }
    }

    pub(crate) fn map(&self) -> &BTreeMap<u8, i32> {
        &self.factors
    }

    pub fn get(&self, degree: u8) -> Option<i32> {
        self.factors.get(&degree).copied()
    }

    pub fn contains(&self, degree: u8) -> bool {
        self.factors.contains_key(&degree)
    }

    pub fn degrees(&self) -> Vec<u8> {
        self.factors.keys().copied().collect()
    }

    pub fn offsets(&self) -> Vec<i32> {
        self.factors.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, i32)> + '_ {
        self.factors.iter().map(|(&d, &o)| (d, o))
    }

    /// Number of notes in the chord.
    pub fn order(&self) -> usize {
        self.factors.len()
    }

    pub fn history(&self) -> &[ChordQualifier] {
        &self.history
    }

    /// Position of `degree` among the sorted degrees, i.e. the inversion
    /// index that puts this degree in the bass.
    pub fn position_of(&self, degree: u8) -> Option<usize> {
        self.factors.keys().position(|&d| d == degree)
    }

    pub fn factor_intervals(&self) -> BTreeMap<u8, Interval> {
        self.iter()
            .map(|(d, o)| (d, factor_interval(d, o)))
            .collect()
    }

    /// Intervals from the root, ascending.
    pub fn to_intervals(&self) -> IntervalList {
        self.iter()
            .map(|(d, o)| factor_interval(d, o))
            .collect::<IntervalList>()
            .sorted()
    }

    pub fn apply(&self, qualifier: &ChordQualifier) -> Result<ChordFactors> {
        qualifier.apply(self)
    }

    pub fn apply_all(&self, qualifiers: &[ChordQualifier]) -> Result<ChordFactors> {
        let mut factors = self.clone();
        for qualifier in qualifiers {
            factors = qualifier.apply(&factors)?;
        }
        Ok(factors)
    }

    /// The qualifier that turns `other` into `self`.
    ///
    /// Degrees only in `self` become adds, degrees whose offsets differ
    /// become modifies (by the difference), degrees only in `other` become
    /// removes.
    pub fn distance(&self, other: &ChordFactors) -> ChordQualifier {
        let mut qualifier = ChordQualifier::default();
        for (degree, offset) in self.iter() {
            match other.get(degree) {
                None => qualifier = qualifier.adding(degree, offset),
                Some(theirs) if theirs != offset => {
                    qualifier = qualifier.modifying(degree, offset - theirs)
                }
                Some(_) => {}
            }
        }
        for degree in other.degrees() {
            if !self.contains(degree) {
                qualifier = qualifier.removing(degree);
            }
        }
        qualifier
    }

    /// A copy with one degree set to `offset`, added if missing.
    pub fn with_offset(&self, degree: u8, offset: i32) -> ChordFactors {
        let mut factors = self.factors.clone();
        factors.insert(degree, offset);
        ChordFactors::new(factors)
    }

    pub fn without(&self, degree: u8) -> ChordFactors {
        let mut factors = self.factors.clone();
        factors.remove(&degree);
        ChordFactors::new(factors)
    }
}

impl PartialEq for ChordFactors {
    fn eq(&self, other: &Self) -> bool {
        self.factors == other.factors
    }
}

impl Eq for ChordFactors {}

impl Hash for ChordFactors {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (degree, offset) in &self.factors {
            degree.hash(state);
            offset.hash(state);
        }
    }
}

impl Serialize for ChordFactors {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.factors.serialize(serializer)
    }
}

impl fmt::Display for ChordFactors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(d, o)| format!("{}{}", offset_accidental(o), d))
            .collect();
        write!(f, "¦ {} ¦", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qualifier::parse_qualifiers;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_major_triad_intervals() {
        let triad = ChordFactors::major_triad();
        assert_eq!(triad.to_intervals().values(), vec![0, 4, 7]);
        assert_eq!(triad.order(), 3);
        assert_eq!(triad.to_string(), "¦ 1, 3, 5 ¦");
    }

    #[test]
    fn test_extended_factors() {
        let ninth = ChordFactors::from_pairs(&[(1, 0), (3, 0), (5, 0), (7, -1), (9, 0)]);
        assert_eq!(ninth.to_intervals().values(), vec![0, 4, 7, 10, 14]);
        assert_eq!(ninth.position_of(7), Some(3));
        assert_eq!(ninth.factor_intervals()[&9].extended_degree(), 9);
    }

    #[test]
    fn test_equality_ignores_history() {
        let built = ChordFactors::major_triad()
            .apply_all(&parse_qualifiers("m").unwrap())
            .unwrap();
        let literal = ChordFactors::from_pairs(&[(1, 0), (3, -1), (5, 0)]);
        assert_eq!(built, literal);
        assert_eq!(built.history().len(), 1);
        assert!(literal.history().is_empty());
    }

    #[test]
    fn test_distance_reapplies_to_target() {
        let pairs = [
            ("m7", ""),
            ("", "m7"),
            ("sus4", "dim7"),
            ("13", "5"),
            ("7b5", "maj9"),
            ("add9", "sus2"),
        ];
        for (a, b) in pairs {
            let fa = ChordFactors::major_triad()
                .apply_all(&parse_qualifiers(a).unwrap())
                .unwrap();
            let fb = ChordFactors::major_triad()
                .apply_all(&parse_qualifiers(b).unwrap())
                .unwrap();
            let distance = fa.distance(&fb);
            assert_eq!(fb.apply(&distance).unwrap(), fa, "{a} from {b}");
        }
    }

    #[test]
    fn test_distance_to_self_is_empty() {
        let triad = ChordFactors::major_triad();
        assert!(triad.distance(&triad).is_empty());
    }
}
