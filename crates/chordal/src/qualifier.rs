//! Chord qualifiers: declarative transformations over chord factors, and the
//! parser that turns chord-name suffixes into sequences of them.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use crate::factors::ChordFactors;
use crate::interval::offset_accidental;
use crate::{Error, Result};

/// An extra precondition a qualifier places on the factors it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// The degree must be present.
    Has(u8),
    /// The degree must be present with exactly this offset.
    HasExactly(u8, i32),
    /// The degree must be absent.
    Lacks(u8),
}

impl Condition {
    fn holds(&self, factors: &ChordFactors) -> bool {
        match *self {
            Condition::Has(degree) => factors.contains(degree),
            Condition::HasExactly(degree, offset) => factors.get(degree) == Some(offset),
            Condition::Lacks(degree) => !factors.contains(degree),
        }
    }
}

/// A named transformation over [`ChordFactors`]: degrees to add (with
/// offsets), degrees to modify (by a delta), and degrees to remove.
///
/// A qualifier is valid on a set of factors when everything it modifies or
/// removes is present, nothing it adds is already there, and its extra
/// [`Condition`]s hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChordQualifier {
    name: Option<String>,
    add: BTreeMap<u8, i32>,
    modify: BTreeMap<u8, i32>,
    remove: BTreeSet<u8>,
    conditions: Vec<Condition>,
}

impl ChordQualifier {
    pub fn new(name: impl Into<String>) -> Self {
        ChordQualifier {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn adding(mut self, degree: u8, offset: i32) -> Self {
        self.add.insert(degree, offset);
        self
    }

    pub fn modifying(mut self, degree: u8, delta: i32) -> Self {
        self.modify.insert(degree, delta);
        self
    }

    pub fn removing(mut self, degree: u8) -> Self {
        self.remove.insert(degree);
        self
    }

    pub fn requiring(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn adds(&self) -> &BTreeMap<u8, i32> {
        &self.add
    }

    pub fn modifies(&self) -> &BTreeMap<u8, i32> {
        &self.modify
    }

    pub fn removes(&self) -> &BTreeSet<u8> {
        &self.remove
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.modify.is_empty() && self.remove.is_empty()
    }

    pub fn valid_on(&self, factors: &ChordFactors) -> bool {
        self.modify.keys().all(|&d| factors.contains(d))
            && self.remove.iter().all(|&d| factors.contains(d))
            && self.add.keys().all(|&d| !factors.contains(d))
            && self.conditions.iter().all(|c| c.holds(factors))
    }

    /// Apply to `factors`, returning new factors whose history ends with this
    /// qualifier. Removals happen first, then modifications, then additions.
    pub fn apply(&self, factors: &ChordFactors) -> Result<ChordFactors> {
        if !self.valid_on(factors) {
            return Err(Error::InvalidQualifier {
                qualifier: self.to_string(),
                factors: factors.to_string(),
            });
        }
        let mut map = factors.map().clone();
        for degree in &self.remove {
            map.remove(degree);
        }
        for (degree, delta) in &self.modify {
            let offset = map.get_mut(degree).ok_or(Error::MissingDegree(*degree))?;
            *offset += delta;
        }
        for (&degree, &offset) in &self.add {
            map.insert(degree, offset);
        }
        let mut history = factors.history().to_vec();
        history.push(self.clone());
        Ok(ChordFactors::from_parts(map, history))
    }
}

impl fmt::Display for ChordQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            return f.write_str(name);
        }
        let mut parts = Vec::new();
        if !self.add.is_empty() {
            let adds: Vec<String> = self
                .add
                .iter()
                .map(|(d, o)| format!("{}{}", offset_accidental(*o), d))
                .collect();
            parts.push(format!("add {}", adds.join(", ")));
        }
        if !self.modify.is_empty() {
            let mods: Vec<String> = self
                .modify
                .iter()
                .map(|(d, o)| format!("{}{}", offset_accidental(*o), d))
                .collect();
            parts.push(format!("modify {}", mods.join(", ")));
        }
        if !self.remove.is_empty() {
            let removes: Vec<String> = self.remove.iter().map(|d| d.to_string()).collect();
            parts.push(format!("remove {}", removes.join(", ")));
        }
        if parts.is_empty() {
            f.write_str("(no change)")
        } else {
            write!(f, "{}", parts.join("; "))
        }
    }
}

fn minor() -> ChordQualifier {
    ChordQualifier::new("minor").modifying(3, -1)
}

fn diminished() -> ChordQualifier {
    ChordQualifier::new("diminished")
        .modifying(3, -1)
        .modifying(5, -1)
}

fn augmented() -> ChordQualifier {
    ChordQualifier::new("augmented").modifying(5, 1)
}

fn extension(name: &str, seventh: i32, upper: &[(u8, i32)]) -> ChordQualifier {
    let mut qualifier = ChordQualifier::new(name).adding(7, seventh);
    for &(degree, offset) in upper {
        qualifier = qualifier.adding(degree, offset);
    }
    qualifier
}

fn add(name: &str, degree: u8, offset: i32) -> ChordQualifier {
    ChordQualifier::new(name).adding(degree, offset)
}

fn suspension(name: &str, degree: u8) -> ChordQualifier {
    ChordQualifier::new(name).removing(3).adding(degree, 0)
}

fn no_fifth() -> ChordQualifier {
    ChordQualifier::new("(no5)")
        .removing(5)
        .requiring(Condition::HasExactly(5, 0))
        .requiring(Condition::Has(3))
}

const NINTH: &[(u8, i32)] = &[(9, 0)];
const ELEVENTH: &[(u8, i32)] = &[(9, 0), (11, 0)];
const THIRTEENTH: &[(u8, i32)] = &[(9, 0), (11, 0), (13, 0)];

/// Suffix tokens and the qualifiers each expands to, in application order.
fn token_table() -> &'static [(&'static str, Vec<ChordQualifier>)] {
    static TOKENS: OnceLock<Vec<(&'static str, Vec<ChordQualifier>)>> = OnceLock::new();
    TOKENS.get_or_init(|| {
        let dominant = || extension("dominant seventh", -1, &[]);
        let major7 = || extension("major seventh", 0, &[]);
        let dim7 = || vec![diminished(), extension("diminished seventh", -2, &[])];
        let hdim7 = || vec![diminished(), extension("minor seventh", -1, &[])];

        let mut tokens: Vec<(&'static str, Vec<ChordQualifier>)> = vec![
            // major triad spellings change nothing
            ("maj", vec![]),
            ("major", vec![]),
            ("M", vec![]),
            ("m", vec![minor()]),
            ("min", vec![minor()]),
            ("minor", vec![minor()]),
            ("-", vec![minor()]),
            ("dim", vec![diminished()]),
            ("o", vec![diminished()]),
            ("aug", vec![augmented()]),
            ("+", vec![augmented()]),
            ("5", vec![ChordQualifier::new("power").removing(3)]),
            ("6", vec![add("sixth", 6, 0)]),
            ("7", vec![dominant()]),
            ("dom7", vec![dominant()]),
            ("maj7", vec![major7()]),
            ("M7", vec![major7()]),
            ("Δ", vec![major7()]),
            ("9", vec![extension("dominant ninth", -1, NINTH)]),
            ("11", vec![extension("dominant eleventh", -1, ELEVENTH)]),
            ("13", vec![extension("dominant thirteenth", -1, THIRTEENTH)]),
            ("maj9", vec![extension("major ninth", 0, NINTH)]),
            ("maj11", vec![extension("major eleventh", 0, ELEVENTH)]),
            ("maj13", vec![extension("major thirteenth", 0, THIRTEENTH)]),
            ("dim7", dim7()),
            ("o7", dim7()),
            ("hdim7", hdim7()),
            ("ø", hdim7()),
            ("ø7", hdim7()),
            (
                "dim9",
                vec![diminished(), extension("diminished ninth", -2, NINTH)],
            ),
            (
                "dim11",
                vec![diminished(), extension("diminished eleventh", -2, ELEVENTH)],
            ),
            (
                "dim13",
                vec![diminished(), extension("diminished thirteenth", -2, THIRTEENTH)],
            ),
            (
                "hdmin9",
                vec![diminished(), extension("minor ninth", -1, &[(9, -1)])],
            ),
            ("dmin9", vec![extension("dominant minor ninth", -1, &[(9, -1)])]),
            ("b5", vec![ChordQualifier::new("b5").modifying(5, -1)]),
            ("#5", vec![ChordQualifier::new("#5").modifying(5, 1)]),
            ("b9", vec![add("b9", 9, -1)]),
            ("#9", vec![add("#9", 9, 1)]),
            ("#11", vec![add("#11", 11, 1)]),
            ("b13", vec![add("b13", 13, -1)]),
            ("sus4", vec![suspension("sus4", 4)]),
            ("sus", vec![suspension("sus4", 4)]),
            (
                "sus2",
                vec![suspension("sus2", 2).requiring(Condition::Lacks(9))],
            ),
            ("add2", vec![add("add2", 2, 0).requiring(Condition::Lacks(9))]),
            ("add4", vec![add("add4", 4, 0).requiring(Condition::Lacks(11))]),
            ("add9", vec![add("add9", 9, 0).requiring(Condition::Lacks(2))]),
            ("add11", vec![add("add11", 11, 0).requiring(Condition::Lacks(4))]),
            ("add13", vec![add("add13", 13, 0).requiring(Condition::Lacks(6))]),
            ("(no5)", vec![no_fifth()]),
            ("no5", vec![no_fifth()]),
            ("(no3)", vec![ChordQualifier::new("(no3)").removing(3)]),
        ];
        // longest first, so "maj7" wins over "maj" and "m"
        tokens.sort_by_key(|(token, _)| std::cmp::Reverse(token.len()));
        tokens
    })
}

/// The single qualifier a modifier token stands for, such as "sus4" or "(no5)".
pub fn named_qualifier(token: &str) -> Option<ChordQualifier> {
    token_table()
        .iter()
        .find(|(t, _)| *t == token)
        .and_then(|(_, qualifiers)| match qualifiers.as_slice() {
            [single] => Some(single.clone()),
            _ => None,
        })
}

/// Parse a chord suffix such as "m7b5" or "9sus4" into qualifiers, reading
/// the longest known token at each position.
pub fn parse_qualifiers(suffix: &str) -> Result<Vec<ChordQualifier>> {
    let mut rest = suffix.trim();
    let mut qualifiers = Vec::new();
    while !rest.is_empty() {
        let (token, expansion) = token_table()
            .iter()
            .find(|(token, _)| rest.starts_with(token))
            .ok_or_else(|| Error::UnknownQualifier {
                input: suffix.to_string(),
                rest: rest.to_string(),
            })?;
        qualifiers.extend(expansion.iter().cloned());
        rest = &rest[token.len()..];
    }
    Ok(qualifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn factors_of(suffix: &str) -> ChordFactors {
        ChordFactors::major_triad()
            .apply_all(&parse_qualifiers(suffix).unwrap())
            .unwrap()
    }

    fn pairs(factors: &ChordFactors) -> Vec<(u8, i32)> {
        factors.iter().collect()
    }

    #[test]
    fn test_parse_sevenths() {
        assert_eq!(pairs(&factors_of("m7")), vec![(1, 0), (3, -1), (5, 0), (7, -1)]);
        assert_eq!(pairs(&factors_of("maj7")), vec![(1, 0), (3, 0), (5, 0), (7, 0)]);
        assert_eq!(pairs(&factors_of("mmaj7")), vec![(1, 0), (3, -1), (5, 0), (7, 0)]);
        assert_eq!(pairs(&factors_of("hdim7")), vec![(1, 0), (3, -1), (5, -1), (7, -1)]);
        assert_eq!(pairs(&factors_of("dim7")), vec![(1, 0), (3, -1), (5, -1), (7, -2)]);
        assert_eq!(factors_of("dimM7"), factors_of("dim").with_offset(7, 0));
    }

    #[test]
    fn test_parse_alterations_and_modifiers() {
        assert_eq!(pairs(&factors_of("7b5")), vec![(1, 0), (3, 0), (5, -1), (7, -1)]);
        assert_eq!(pairs(&factors_of("sus4")), vec![(1, 0), (4, 0), (5, 0)]);
        assert_eq!(pairs(&factors_of("sus2")), vec![(1, 0), (2, 0), (5, 0)]);
        assert_eq!(pairs(&factors_of("9sus4")), vec![(1, 0), (4, 0), (5, 0), (7, -1), (9, 0)]);
        assert_eq!(pairs(&factors_of("m(no5)")), vec![(1, 0), (3, -1)]);
        assert_eq!(pairs(&factors_of("5")), vec![(1, 0), (5, 0)]);
        assert_eq!(factors_of(""), ChordFactors::major_triad());
        assert_eq!(factors_of("maj"), ChordFactors::major_triad());
    }

    #[test]
    fn test_dominant_minor_ninth_aliases_seven_flat_nine() {
        assert_eq!(factors_of("dmin9"), factors_of("7b9"));
    }

    #[test]
    fn test_unknown_suffix_fails() {
        let err = parse_qualifiers("m7xyz").unwrap_err();
        assert!(err.to_string().contains("xyz"));
    }

    #[test]
    fn test_validity() {
        let sus2 = named_qualifier("sus2").unwrap();
        let sus4 = named_qualifier("sus4").unwrap();
        let add9 = named_qualifier("add9").unwrap();
        let no5 = named_qualifier("(no5)").unwrap();

        assert!(!sus4.valid_on(&factors_of("sus2")));
        assert!(!add9.valid_on(&factors_of("9")));
        assert!(!add9.valid_on(&factors_of("sus2")));
        assert!(add9.valid_on(&factors_of("sus4")));
        assert!(!no5.valid_on(&factors_of("7b5")));
        assert!(!no5.valid_on(&factors_of("5")));
        assert!(no5.valid_on(&factors_of("m7")));
        assert!(sus4.apply(&factors_of("sus2")).is_err());
    }

    #[test]
    fn test_apply_records_history() {
        let factors = factors_of("m7");
        let names: Vec<_> = factors.history().iter().filter_map(|q| q.name()).collect();
        assert_eq!(names, vec!["minor", "dominant seventh"]);
    }
}
