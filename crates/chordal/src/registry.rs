//! The chord naming registry.
//!
//! A fixed base vocabulary is expanded with suspension and added-tone
//! modifiers and with "(no5)" variants. Every generated name is stored
//! against both its factors and its root-position intervals, so a chord
//! built any other way can be given a compositional name. A name whose
//! factors or intervals are already taken is dropped; the first
//! registrant wins.

use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::chord::AbstractChord;
use crate::factors::ChordFactors;
use crate::interval_list::IntervalList;
use crate::qualifier::named_qualifier;
use crate::quality::Quality;

/// Rarity reported for chords the registry has no name for.
pub const UNNAMED_RARITY: u8 = 10;

/// Highest tier a registered name can have.
pub const MAX_RARITY: u8 = 7;

const BASE_CHORDS: [&[&str]; 5] = [
    &["", "m", "7", "5"],
    &["m7", "maj7", "dim", "sus4", "sus2", "add9"],
    &["mmaj7", "dim7", "hdim7", "6", "m6", "aug7", "9", "maj9", "m9", "aug"],
    &[
        "7b5", "7#9", "add4", "7b9", "dim9", "dmin9", "mmaj9", "hdmin9", "dimM7", "augM7", "11",
        "13", "m11", "m13", "maj11", "maj13",
    ],
    &["add11", "add13", "dim11", "dim13", "mmaj11", "mmaj13"],
];

/// Modifiers in the order they are tried, with the tiers they add.
const MODIFIERS: [(&str, u8); 5] = [
    ("sus4", 1),
    ("sus2", 1),
    ("add9", 2),
    ("add11", 3),
    ("add13", 4),
];

/// Suspensions replace the third, so they are not applied to minor chords.
const SUSPENSIONS: [&str; 2] = ["sus4", "sus2"];

/// Base chords that take no further modifiers.
const UNMODIFIABLE: [&str; 7] = ["", "5", "(no5)", "add4", "add9", "add11", "add13"];

const NO_FIFTH: &str = "(no5)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Base,
    Generated,
}

/// A chord that received a single modifier, kept for the second pass.
struct Modified {
    name: String,
    factors: ChordFactors,
    base_quality: Quality,
    modifier: &'static str,
}

/// Bidirectional map between chord names and chord structure.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tiers: Vec<Vec<String>>,
    by_factors: HashMap<ChordFactors, String>,
    by_intervals: HashMap<IntervalList, String>,
    rarities: HashMap<String, u8>,
    factors: HashMap<String, ChordFactors>,
}

impl Registry {
    pub fn build() -> Self {
        let mut registry = Registry {
            tiers: vec![Vec::new(); MAX_RARITY as usize + 1],
            ..Default::default()
        };

        let mut bases = Vec::new();
        for (tier, names) in BASE_CHORDS.iter().enumerate() {
            for &name in names.iter() {
                match AbstractChord::new(name) {
                    Ok(chord) => {
                        registry.insert(name, tier as u8, chord.factors(), Stage::Base);
                        bases.push((name, tier as u8, chord));
                    }
                    Err(err) => warn!(name, error = %err, "base chord does not parse"),
                }
            }
        }
        debug!(names = registry.len(), "registered base chords");

        let singles = registry.register_single_modifiers(&bases);
        debug!(names = registry.len(), "registered single modifiers");

        registry.register_double_modifiers(&singles);
        registry.register_no_fifth_variants();

        info!(
            names = registry.len(),
            tiers = ?registry.tiers.iter().map(Vec::len).collect::<Vec<_>>(),
            "chord registry built"
        );
        registry
    }

    /// Record `name` unless its factors or intervals are already taken.
    fn insert(&mut self, name: &str, rarity: u8, factors: &ChordFactors, stage: Stage) -> bool {
        let intervals = factors.to_intervals();
        let existing = self
            .by_factors
            .get(factors)
            .or_else(|| self.by_intervals.get(&intervals));
        if let Some(existing) = existing {
            match stage {
                Stage::Base => warn!(name, existing = %existing, "chord name collision"),
                Stage::Generated => debug!(name, existing = %existing, "chord name collision"),
            }
            return false;
        }

        let rarity = rarity.min(MAX_RARITY);
        self.by_factors.insert(factors.clone(), name.to_string());
        self.by_intervals.insert(intervals, name.to_string());
        self.rarities.insert(name.to_string(), rarity);
        self.factors.insert(name.to_string(), factors.clone());
        self.tiers[rarity as usize].push(name.to_string());
        true
    }

    fn register_single_modifiers(&mut self, bases: &[(&str, u8, AbstractChord)]) -> Vec<Modified> {
        let mut singles = Vec::new();
        for (base_name, tier, chord) in bases {
            if UNMODIFIABLE.contains(base_name) {
                continue;
            }
            let base_quality = chord.quality();
            for (modifier, modifier_tier) in MODIFIERS {
                let Some(factors) = modify(chord.factors(), base_quality, modifier) else {
                    continue;
                };
                let name = format!("{base_name}{modifier}");
                if self.insert(&name, tier + modifier_tier, &factors, Stage::Generated) {
                    singles.push(Modified {
                        name,
                        factors,
                        base_quality,
                        modifier,
                    });
                }
            }
        }
        singles
    }

    fn register_double_modifiers(&mut self, singles: &[Modified]) {
        for single in singles {
            for (modifier, _) in MODIFIERS {
                if modifier == single.modifier {
                    continue;
                }
                let Some(factors) = modify(&single.factors, single.base_quality, modifier) else {
                    continue;
                };
                let name = format!("{}{modifier}", single.name);
                self.insert(&name, MAX_RARITY, &factors, Stage::Generated);
            }
        }
    }

    fn register_no_fifth_variants(&mut self) {
        let Some(no_fifth) = named_qualifier(NO_FIFTH) else {
            warn!("no (no5) qualifier available");
            return;
        };
        for name in self.all_names() {
            let Some(factors) = self.factors.get(&name) else {
                continue;
            };
            if !no_fifth.valid_on(factors) {
                continue;
            }
            let rarity = self.rarities.get(&name).copied().unwrap_or(MAX_RARITY);
            if let Ok(altered) = factors.apply(&no_fifth) {
                self.insert(&format!("{name}{NO_FIFTH}"), rarity, &altered, Stage::Generated);
            }
        }
    }

    pub fn name_for_factors(&self, factors: &ChordFactors) -> Option<&str> {
        self.by_factors.get(factors).map(String::as_str)
    }

    /// Name for a set of root-position intervals.
    pub fn name_for_intervals(&self, intervals: &IntervalList) -> Option<&str> {
        self.by_intervals.get(intervals).map(String::as_str)
    }

    pub fn rarity_of(&self, name: &str) -> Option<u8> {
        self.rarities.get(name).copied()
    }

    pub fn factors_of(&self, name: &str) -> Option<&ChordFactors> {
        self.factors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rarities.contains_key(name)
    }

    /// Names in one tier, in registration order. Empty for tiers past the maximum.
    pub fn names_by_rarity(&self, rarity: u8) -> &[String] {
        self.tiers
            .get(rarity as usize)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every name, commonest tier first.
    pub fn all_names(&self) -> Vec<String> {
        self.tiers.iter().flatten().cloned().collect()
    }

    /// Every (name, factors) pair, commonest tier first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ChordFactors)> + '_ {
        self.tiers
            .iter()
            .flatten()
            .filter_map(|name| self.factors.get(name).map(|f| (name.as_str(), f)))
    }

    pub fn len(&self) -> usize {
        self.rarities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rarities.is_empty()
    }
}

/// Apply a named modifier if it is valid on `factors` and fits the quality
/// of the chord it started from.
fn modify(factors: &ChordFactors, base_quality: Quality, modifier: &str) -> Option<ChordFactors> {
    if SUSPENSIONS.contains(&modifier) && base_quality.is_minor_ish() {
        return None;
    }
    let qualifier = named_qualifier(modifier)?;
    if !qualifier.valid_on(factors) {
        return None;
    }
    factors.apply(&qualifier).ok()
}

/// The process-wide registry, built on first use and read-only afterwards.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_tiers() {
        let reg = registry();
        assert_eq!(reg.names_by_rarity(0)[..4], ["", "m", "7", "5"]);
        assert!(reg.names_by_rarity(0).iter().any(|n| n == "m(no5)"));
        assert_eq!(reg.rarity_of("maj7"), Some(1));
        assert_eq!(reg.rarity_of("dim7"), Some(2));
    }

    #[test]
    fn test_modifier_rarity() {
        let reg = registry();
        assert_eq!(reg.rarity_of("7sus4"), Some(1));
        assert_eq!(reg.rarity_of("m7add11"), Some(4));
        assert_eq!(reg.rarity_of("7sus4add13"), Some(MAX_RARITY));
    }

    #[test]
    fn test_suspensions_skip_minor_chords() {
        let reg = registry();
        assert!(!reg.contains("msus4"));
        assert!(!reg.contains("m7sus2"));
        assert!(reg.contains("madd9"));
    }

    #[test]
    fn test_collisions_keep_first_name() {
        let reg = registry();
        // 7 plus an added ninth is just a ninth chord
        assert!(!reg.contains("7add9"));
        // a dominant minor ninth is spelled 7b9 first
        assert!(!reg.contains("dmin9"));
        let factors = AbstractChord::new("dmin9").unwrap().factors().clone();
        assert_eq!(reg.name_for_factors(&factors), Some("7b9"));
    }

    #[test]
    fn test_no_fifth_variants() {
        let reg = registry();
        assert_eq!(reg.rarity_of("m(no5)"), Some(0));
        assert_eq!(reg.rarity_of("6(no5)"), Some(2));
        assert!(!reg.contains("5(no5)"));
        assert!(!reg.contains("dim(no5)"));
    }

    #[test]
    fn test_lookup_by_intervals() {
        let reg = registry();
        let intervals = IntervalList::from_values(&[0, 4, 7, 11]).unwrap();
        assert_eq!(reg.name_for_intervals(&intervals), Some("maj7"));
        let factors = reg.factors_of("m7").unwrap();
        assert_eq!(factors.to_intervals().values(), vec![0, 3, 7, 10]);
    }

    #[test]
    fn test_names_are_unique() {
        let reg = registry();
        let names = reg.all_names();
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
        assert_eq!(names.len(), reg.len());
    }
}
