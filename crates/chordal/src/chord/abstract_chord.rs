use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::debug;

use super::{factors_from_intervals, resolve_structure, BassTarget, Chord, ChordInput, ChordSpec, Inversion};
use crate::factors::{factor_interval, ChordFactors};
use crate::interval::{Interval, P5};
use crate::interval_list::IntervalList;
use crate::note::Note;
use crate::quality::Quality;
use crate::registry::{registry, UNNAMED_RARITY};
use crate::{Error, Result};

/// Likelihood lost for not being in root position.
pub(crate) const INVERSION_PENALTY: f64 = 0.15;

// Raw pairwise consonance of the least and most consonant registered
// chords, used to stretch scores onto roughly 0..1.
const CONSONANCE_FLOOR: f64 = 0.49;
const CONSONANCE_CEILING: f64 = 14.0 / 15.0;

/// A chord with no root: factors plus an inversion.
///
/// Two abstract chords are equal when their factors and inversion match;
/// how they were built does not matter.
#[derive(Debug, Clone, Serialize)]
pub struct AbstractChord {
    factors: ChordFactors,
    inversion: usize,
    root_intervals: IntervalList,
    intervals: IntervalList,
    #[serde(skip)]
    assigned_name: Option<String>,
}

impl AbstractChord {
    /// Build from a name such as "m7", "sus4add9" or "maj7/3".
    pub fn new(name: &str) -> Result<Self> {
        ChordSpec::name(name).build_abstract()
    }

    pub fn from_factors(factors: ChordFactors) -> Self {
        AbstractChord::from_parts(factors, 0)
    }

    pub fn from_intervals(intervals: IntervalList) -> Result<Self> {
        ChordSpec::intervals(intervals).build_abstract()
    }

    pub fn from_spec(spec: &ChordSpec) -> Result<Self> {
        if spec.root.is_some() {
            return Err(Error::ConflictingInputs(
                "an abstract chord cannot have a root".to_string(),
            ));
        }
        let structure = resolve_structure(spec, spec.input.as_ref(), false)?;
        let inversion = match structure.bass {
            BassTarget::Index(index) => index,
            BassTarget::Note(note) => {
                return Err(Error::MalformedInput(format!(
                    "bass note {note} given for a chord without a root"
                )))
            }
        };
        Ok(AbstractChord::from_parts(structure.factors, inversion))
    }

    /// The caller guarantees `inversion < factors.order()`.
    pub(crate) fn from_parts(factors: ChordFactors, inversion: usize) -> Self {
        let root_intervals = factors.to_intervals();
        let intervals = if inversion == 0 {
            root_intervals.clone()
        } else {
            root_intervals.invert(inversion as i32)
        };
        AbstractChord {
            factors,
            inversion,
            root_intervals,
            intervals,
            assigned_name: None,
        }
    }

    /// A display name used when the registry has nothing better.
    pub fn with_assigned_name(mut self, name: impl Into<String>) -> Self {
        self.assigned_name = Some(name.into());
        self
    }

    pub fn assigned_name(&self) -> Option<&str> {
        self.assigned_name.as_deref()
    }

    pub fn factors(&self) -> &ChordFactors {
        &self.factors
    }

    pub fn inversion(&self) -> usize {
        self.inversion
    }

    /// Intervals from the root in root position, ascending.
    pub fn root_intervals(&self) -> &IntervalList {
        &self.root_intervals
    }

    /// Intervals from the bass, ascending.
    pub fn intervals(&self) -> &IntervalList {
        &self.intervals
    }

    pub fn order(&self) -> usize {
        self.factors.order()
    }

    pub fn contains_degree(&self, degree: u8) -> bool {
        self.factors.contains(degree)
    }

    pub fn contains_interval(&self, interval: Interval) -> bool {
        self.root_intervals.contains_value(interval.value())
    }

    /// Index into the root intervals of the note at `degree`.
    pub fn position_of_degree(&self, degree: u8) -> Option<usize> {
        let interval = factor_interval(degree, self.factors.get(degree)?);
        self.root_intervals.iter().position(|i| *i == interval)
    }

    /// The degree whose note sits at `position` in root position.
    pub(crate) fn degree_at(&self, position: usize) -> Option<u8> {
        let interval = *self.root_intervals.get(position)?;
        self.factors
            .factor_intervals()
            .into_iter()
            .find(|(_, i)| *i == interval)
            .map(|(degree, _)| degree)
    }

    /// Major, minor, augmented or diminished, from the third and fifth.
    pub fn quality(&self) -> Quality {
        let fifth = self.factors.get(5).map(|o| factor_interval(5, o).quality());
        match self.factors.get(3).map(|o| factor_interval(3, o).quality()) {
            Some(Quality::Major) if fifth == Some(Quality::Augmented) => Quality::Augmented,
            Some(Quality::Minor) if fifth == Some(Quality::Diminished) => Quality::Diminished,
            Some(third) => third,
            None => fifth.unwrap_or(Quality::Perfect),
        }
    }

    /// The registered name for these factors, or for the same root
    /// intervals under another spelling.
    pub fn registered_name(&self) -> Option<&'static str> {
        let reg = registry();
        reg.name_for_factors(&self.factors)
            .or_else(|| reg.name_for_intervals(&self.root_intervals))
    }

    /// Registry tier, or [`UNNAMED_RARITY`] for chords the registry does not know.
    pub fn rarity(&self) -> u8 {
        self.registered_name()
            .and_then(|name| registry().rarity_of(name))
            .unwrap_or(UNNAMED_RARITY)
    }

    pub fn likelihood(&self) -> f64 {
        let base = (10.0 - self.rarity() as f64) / 10.0;
        if self.inversion == 0 {
            base
        } else {
            base - INVERSION_PENALTY
        }
    }

    /// The chord suffix, e.g. "m7", "maj7/2", "6(no5)".
    pub fn suffix(&self) -> String {
        let marker = if self.inversion == 0 {
            String::new()
        } else {
            format!("/{}", self.inversion)
        };
        self.suffix_with(&marker)
    }

    /// Find a name for this chord, most specific first. `marker` is the
    /// inversion suffix to append to names that describe root position.
    pub(crate) fn suffix_with(&self, marker: &str) -> String {
        let reg = registry();
        if let Some(name) = reg.name_for_factors(&self.factors) {
            return format!("{name}{marker}");
        }
        if let Some(name) = reg.name_for_intervals(&self.root_intervals) {
            debug!(factors = %self.factors, name, "named by root intervals");
            return format!("{name}{marker}");
        }
        if let Some(name) = reg.name_for_intervals(&self.intervals) {
            debug!(intervals = %self.intervals, name, "named by inverted intervals");
            return name.to_string();
        }
        if !self.factors.contains(5) {
            let mut with_fifth = self.root_intervals.clone().into_vec();
            with_fifth.push(P5);
            let with_fifth = IntervalList::new(with_fifth).sorted();
            if let Some(name) = reg.name_for_intervals(&with_fifth) {
                return format!("{name}(no5){marker}");
            }
        }
        if let Some(name) = reg.name_for_intervals(&self.intervals.flatten(false)) {
            debug!(intervals = %self.intervals, name, "named by flattened intervals");
            return name.to_string();
        }
        if self.factors == ChordFactors::major_triad() {
            return String::new();
        }
        if let Some(name) = &self.assigned_name {
            return name.clone();
        }
        format!("(?){marker}")
    }

    /// "maj" for the bare major triad and "dom7" style names for numeric
    /// dominant suffixes.
    pub fn short_name(&self) -> String {
        let suffix = self.suffix();
        let (body, marker) = match suffix.find('/') {
            Some(slash) => suffix.split_at(slash),
            None => (suffix.as_str(), ""),
        };
        if body.is_empty() {
            format!("maj{marker}")
        } else if body.chars().all(|c| c.is_ascii_digit()) && body != "5" && body != "6" {
            format!("dom{body}{marker}")
        } else {
            suffix
        }
    }

    pub fn name(&self) -> String {
        format!("{} chord", self.short_name())
    }

    /// Every pair of notes measured from the bass upwards, with the interval
    /// between them.
    pub fn pairwise_intervals(&self) -> Vec<((Interval, Interval), Interval)> {
        let intervals = self.intervals.as_slice();
        let mut pairs = Vec::new();
        for (i, &lower) in intervals.iter().enumerate() {
            for &upper in &intervals[i + 1..] {
                pairs.push(((lower, upper), upper - lower));
            }
        }
        pairs
    }

    pub fn pairwise_consonances(&self) -> Vec<((Interval, Interval), f64)> {
        self.pairwise_intervals()
            .into_iter()
            .map(|(pair, interval)| (pair, interval.consonance()))
            .collect()
    }

    /// Weighted mean consonance of every note pair, rescaled to roughly 0..1.
    /// Pairs against the bass count double.
    pub fn consonance(&self) -> f64 {
        let mut total = 0.0;
        let mut weight = 0.0;
        for ((lower, _), consonance) in self.pairwise_consonances() {
            let w = if lower.is_unison() { 2.0 } else { 1.0 };
            total += consonance * w;
            weight += w;
        }
        if weight == 0.0 {
            return 1.0;
        }
        let raw = total / weight;
        let scaled = (raw - CONSONANCE_FLOOR) / (CONSONANCE_CEILING - CONSONANCE_FLOOR);
        (scaled * 1000.0).round() / 1000.0
    }

    pub fn invert(&self, inversion: usize) -> Result<AbstractChord> {
        self.with_inversion(Inversion::Index(inversion))
    }

    /// The same chord with a different inversion.
    pub fn with_inversion(&self, inversion: Inversion) -> Result<AbstractChord> {
        let spec = ChordSpec::new(ChordInput::Factors(self.factors.clone())).inverted(inversion);
        let mut chord = AbstractChord::from_spec(&spec)?;
        chord.assigned_name = self.assigned_name.clone();
        Ok(chord)
    }

    /// Place the root on `root`.
    pub fn on_root(&self, root: Note) -> Chord {
        Chord::assemble(self.clone(), root, None)
    }

    /// Place the bass on `bass`, working the root out from the inversion.
    pub fn on_bass(&self, bass: Note) -> Chord {
        let root = match self.root_intervals.get(self.inversion) {
            Some(&offset) => bass - offset,
            None => bass,
        };
        self.on_root(root)
    }

    /// Every non-root inversion that reads `intervals` as a chord rooted
    /// elsewhere, least rare first.
    pub fn inversions_from_intervals(intervals: &IntervalList) -> Vec<AbstractChord> {
        let values = intervals.as_slice();
        let Some(&bass) = values.first() else {
            return Vec::new();
        };
        let mut candidates = Vec::new();
        for place in 1..values.len() {
            let new_root = values[values.len() - place];
            let factors = factors_from_intervals(&intervals.invert(-(place as i32)));
            // folding and sorting can move the old bass anywhere in the new
            // root position, so find it by pitch class
            let bass_class = (bass.value() - new_root.value()).rem_euclid(12);
            let position = factors
                .to_intervals()
                .iter()
                .position(|i| i.value().rem_euclid(12) == bass_class);
            if let Some(position) = position.filter(|&p| p > 0) {
                candidates.push(AbstractChord::from_parts(factors, position));
            }
        }
        candidates.sort_by_key(AbstractChord::rarity);
        candidates
    }

    /// Readings of this chord's root-position intervals as inversions of
    /// other chords, least rare first.
    pub fn identify_inversion(&self) -> Vec<AbstractChord> {
        AbstractChord::inversions_from_intervals(&self.root_intervals)
    }
}

impl PartialEq for AbstractChord {
    fn eq(&self, other: &Self) -> bool {
        self.factors == other.factors && self.inversion == other.inversion
    }
}

impl Eq for AbstractChord {}

impl Hash for AbstractChord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.factors.hash(state);
        self.inversion.hash(state);
    }
}

impl fmt::Display for AbstractChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_suffixes_round_trip() {
        for name in ["", "m", "7", "m7", "maj7", "dim7", "hdim7", "sus4", "add9", "9", "m(no5)"] {
            assert_eq!(AbstractChord::new(name).unwrap().suffix(), name);
        }
    }

    #[test]
    fn test_inverted_intervals() {
        let chord = AbstractChord::new("m7").unwrap().invert(2).unwrap();
        assert_eq!(chord.root_intervals().values(), vec![0, 3, 7, 10]);
        assert_eq!(chord.intervals().values(), vec![0, 3, 5, 8]);
        assert_eq!(chord.suffix(), "m7/2");
    }

    #[test]
    fn test_invert_zero_is_identity() {
        let chord = AbstractChord::new("maj7").unwrap();
        assert_eq!(chord.invert(0).unwrap(), chord);
    }

    #[test]
    fn test_inversion_by_degree() {
        let chord = AbstractChord::new("7").unwrap();
        let third = chord.with_inversion(Inversion::Degree(3)).unwrap();
        assert_eq!(third.inversion(), 1);
        let missing = chord.with_inversion(Inversion::Degree(9));
        assert!(matches!(missing, Err(Error::MissingDegree(9))));
    }

    #[test]
    fn test_inversion_out_of_range() {
        let chord = AbstractChord::new("").unwrap();
        assert!(matches!(
            chord.invert(3),
            Err(Error::InversionOutOfRange { inversion: 3, order: 3 })
        ));
    }

    #[test]
    fn test_quality() {
        let cases = [
            ("", Quality::Major),
            ("m", Quality::Minor),
            ("aug", Quality::Augmented),
            ("dim", Quality::Diminished),
            ("hdim7", Quality::Diminished),
            ("5", Quality::Perfect),
            ("sus4", Quality::Perfect),
        ];
        for (name, quality) in cases {
            assert_eq!(AbstractChord::new(name).unwrap().quality(), quality, "{name}");
        }
    }

    #[test]
    fn test_inversion_of_compound_voicing() {
        // C E A G is A minor seventh over its third
        let intervals = IntervalList::from_values(&[0, 4, 9, 19]).unwrap();
        let best = &AbstractChord::inversions_from_intervals(&intervals)[0];
        assert_eq!(best.suffix(), "m7/1");
        assert_eq!(best.root_intervals().values(), vec![0, 3, 7, 10]);
    }

    #[test]
    fn test_likelihood_and_rarity() {
        let major = AbstractChord::new("").unwrap();
        assert_eq!(major.rarity(), 0);
        assert_eq!(major.likelihood(), 1.0);
        let inverted = major.invert(1).unwrap();
        assert!((inverted.likelihood() - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_short_names() {
        assert_eq!(AbstractChord::new("").unwrap().short_name(), "maj");
        assert_eq!(AbstractChord::new("7").unwrap().short_name(), "dom7");
        assert_eq!(AbstractChord::new("6").unwrap().short_name(), "6");
        assert_eq!(AbstractChord::new("m7").unwrap().name(), "m7 chord");
    }

    #[test]
    fn test_consonance_ordering() {
        let major = AbstractChord::new("").unwrap().consonance();
        let minor = AbstractChord::new("m").unwrap().consonance();
        let dim = AbstractChord::new("dim").unwrap().consonance();
        assert!(major > dim, "{major} vs {dim}");
        assert!(minor > dim, "{minor} vs {dim}");
    }

    #[test]
    fn test_intervals_read_as_inversion() {
        let list = IntervalList::from_values(&[0, 4, 9]).unwrap();
        let chord = AbstractChord::from_intervals(list).unwrap();
        assert_eq!(chord.suffix(), "m/1");
    }

    #[test]
    fn test_root_rejected() {
        let spec = ChordSpec::name("m7").on(Note::new(0));
        assert!(AbstractChord::from_spec(&spec).is_err());
    }
}
