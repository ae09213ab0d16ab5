//! Signed pitch distances with degree and quality semantics.
//!
//! An [`Interval`] carries both a semitone `value` and a diatonic degree, so a
//! diminished fifth (6 semitones, degree 5) and an augmented fourth
//! (6 semitones, degree 4) are distinct spellings of the same distance.
//! Equality, hashing and ordering only look at the semitone value.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Neg, Not, Rem, Sub};

use crate::quality::Quality;
use crate::{Error, Result};

/// Default degree for each semitone distance within an octave.
/// Six semitones is a diminished fifth rather than an augmented fourth.
const DEFAULT_INTERVAL_DEGREES: [u8; 12] = [1, 2, 2, 3, 3, 4, 5, 5, 6, 6, 7, 7];

/// Canonical (perfect or major) semitone value of each degree, indexed by degree.
const DEFAULT_DEGREE_INTERVALS: [i32; 8] = [0, 0, 2, 4, 5, 7, 9, 11];

const DEFAULT_QUALITIES: [Quality; 12] = [
    Quality::Perfect,
    Quality::Minor,
    Quality::Major,
    Quality::Minor,
    Quality::Major,
    Quality::Perfect,
    Quality::Diminished,
    Quality::Perfect,
    Quality::Minor,
    Quality::Major,
    Quality::Minor,
    Quality::Major,
];

/// Five-limit just intonation ratios for 0..=12 semitones.
const INTERVAL_RATIOS: [(u64, u64); 13] = [
    (1, 1),
    (16, 15),
    (9, 8),
    (6, 5),
    (5, 4),
    (4, 3),
    (25, 18),
    (3, 2),
    (8, 5),
    (5, 3),
    (16, 9),
    (15, 8),
    (2, 1),
];

const DEGREE_NAMES: [&str; 14] = [
    "",
    "unison",
    "second",
    "third",
    "fourth",
    "fifth",
    "sixth",
    "seventh",
    "octave",
    "ninth",
    "tenth",
    "eleventh",
    "twelfth",
    "thirteenth",
];

pub(crate) fn is_perfect_degree(degree: u8) -> bool {
    matches!(degree, 1 | 4 | 5)
}

/// Accidental glyph for a semitone offset from a canonical degree.
pub(crate) fn offset_accidental(offset: i32) -> &'static str {
    match offset {
        0 => "",
        -1 => "♭",
        1 => "♯",
        -2 => "𝄫",
        2 => "𝄪",
        o if o < 0 => "♭♭♭",
        _ => "♯♯♯",
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// A signed semitone distance with a diatonic degree and a quality.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Interval {
    value: i32,
    degree: u8,
    extended_degree: u8,
    quality: Quality,
}

impl Interval {
    /// An interval whose degree is inferred from its semitone value.
    pub const fn new(value: i32) -> Self {
        let width = value.unsigned_abs();
        let octave_span = width / 12;
        let modulo = (width % 12) as usize;
        let degree = DEFAULT_INTERVAL_DEGREES[modulo];
        // extended degrees past u8 saturate
        let span = if octave_span > u8::MAX as u32 {
            u8::MAX
        } else {
            octave_span as u8
        };
        Interval {
            value,
            degree,
            extended_degree: degree.saturating_add(span.saturating_mul(7)),
            quality: DEFAULT_QUALITIES[modulo],
        }
    }

    /// An interval with an explicit (possibly extended) degree.
    ///
    /// The degree must lie within 2 of the default degree for this value.
    /// A degree roughly an octave away from the default is rejected with its
    /// own message, since it usually means extended-degree notation was
    /// confused with the simple degree.
    pub fn with_degree(value: i32, degree: u8) -> Result<Self> {
        let fail = |reason| Error::IntervalDegree {
            value,
            degree,
            reason,
        };
        if degree == 0 {
            return Err(fail("degrees start at 1"));
        }

        let width = value.unsigned_abs();
        // no u8 degree lies further out than this
        let octave_span = (width / 12).min(64) as i32;
        let modulo = (width % 12) as i32;
        let default_degree = DEFAULT_INTERVAL_DEGREES[modulo as usize] as i32 + 7 * octave_span;

        let distance = (degree as i32 - default_degree).abs();
        if (distance - 7).abs() <= 2 {
            return Err(fail("degree is an octave away from the default degree"));
        }
        if distance > 2 {
            return Err(fail("degree is too far from the default degree"));
        }

        let mod_degree = degree as i32 - 7 * octave_span;
        if !(1..=7).contains(&mod_degree) {
            return Err(fail("degree does not fit this interval's octave"));
        }
        if modulo == 0 && mod_degree != 1 {
            return Err(fail("a unison or octave can only be degree 1"));
        }

        let offset = modulo - DEFAULT_DEGREE_INTERVALS[mod_degree as usize];
        let quality = if is_perfect_degree(mod_degree as u8) {
            Quality::from_offset_wrt_perfect(offset)
        } else {
            Quality::from_offset_wrt_major(offset)
        }
        .ok_or_else(|| fail("no quality spans that many semitones"))?;

        Ok(Interval {
            value,
            degree: mod_degree as u8,
            extended_degree: degree,
            quality,
        })
    }

    /// The interval at `degree` (which may be extended, e.g. 9) shifted by
    /// `offset` semitones from its perfect or major value.
    pub fn from_degree(degree: u8, offset: i32) -> Result<Self> {
        if degree == 0 {
            return Err(Error::IntervalDegree {
                value: offset,
                degree,
                reason: "degrees start at 1",
            });
        }
        let octave_span = (degree as i32 - 1) / 7;
        let mod_degree = (degree as usize - 1) % 7 + 1;
        let value = DEFAULT_DEGREE_INTERVALS[mod_degree] + 12 * octave_span + offset;
        Interval::with_degree(value, degree)
    }

    /// The interval at `degree` with the given quality.
    pub fn from_degree_quality(degree: u8, quality: Quality) -> Result<Self> {
        let mod_degree = (degree.max(1) - 1) % 7 + 1;
        let offset = if is_perfect_degree(mod_degree) {
            quality.offset_wrt_perfect()
        } else {
            quality.offset_wrt_major()
        };
        match offset {
            Some(offset) => Interval::from_degree(degree, offset),
            None => Err(Error::IntervalDegree {
                value: 0,
                degree,
                reason: "quality does not apply to this degree",
            }),
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Degree within the octave, 1..=7.
    pub fn degree(&self) -> u8 {
        self.degree
    }

    /// Degree including octave span, so a major ninth is 9.
    pub fn extended_degree(&self) -> u8 {
        self.extended_degree
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn width(&self) -> i32 {
        self.value.saturating_abs()
    }

    /// Width within the octave, always in 0..12.
    pub fn mod12(&self) -> i32 {
        (self.value.unsigned_abs() % 12) as i32
    }

    pub fn octave_span(&self) -> i32 {
        (self.value.unsigned_abs() / 12) as i32
    }

    pub fn sign(&self) -> i32 {
        if self.value < 0 {
            -1
        } else {
            1
        }
    }

    pub fn is_ascending(&self) -> bool {
        self.value >= 0
    }

    pub fn is_descending(&self) -> bool {
        self.value < 0
    }

    pub fn is_unison(&self) -> bool {
        self.mod12() == 0
    }

    pub fn is_compound(&self) -> bool {
        self.width() >= 12
    }

    /// Same width within the octave, regardless of direction, octave or spelling.
    pub fn enharmonic_to(&self, other: &Interval) -> bool {
        self.mod12() == other.mod12()
    }

    /// Semitones from the perfect or major interval of this interval's own degree.
    pub fn offset_from_default(&self) -> i32 {
        let offset = if is_perfect_degree(self.degree) {
            self.quality.offset_wrt_perfect()
        } else {
            self.quality.offset_wrt_major()
        };
        offset.unwrap_or(0)
    }

    /// Semitones from the perfect or major interval of an arbitrary degree.
    pub fn offset_from_degree(&self, degree: u8) -> i32 {
        let degree = degree.max(1) as i32;
        let octave_span = (degree - 1) / 7;
        let mod_degree = ((degree - 1) % 7 + 1) as usize;
        self.width() - (DEFAULT_DEGREE_INTERVALS[mod_degree] + 12 * octave_span)
    }

    /// Reduced just-intonation ratio. Compound intervals double the
    /// numerator of their in-octave ratio once per octave.
    pub fn ratio(&self) -> (u64, u64) {
        if (0..=12).contains(&self.value) {
            return INTERVAL_RATIOS[self.value as usize];
        }
        let (left, right) = INTERVAL_RATIOS[self.mod12() as usize];
        let left = left << self.octave_span().min(40);
        let divisor = gcd(left, right);
        (left / divisor, right / divisor)
    }

    /// `(15 - log2(lcm(ratio))) / 15`: 1.0 for a unison, approaching 0 for
    /// wide dissonant compound intervals.
    pub fn consonance(&self) -> f64 {
        let (left, right) = self.ratio();
        let lcm = left / gcd(left, right) * right;
        (15.0 - (lcm as f64).log2()) / 15.0
    }

    /// The non-compound, ascending form of this interval.
    pub fn flatten(&self) -> Interval {
        if self.value < 0 {
            return (!*self).flatten();
        }
        Interval::with_degree(self.mod12(), self.degree).unwrap_or_else(|_| Interval::new(self.mod12()))
    }

    /// Descending intervals become ascending ones of the same width.
    pub fn abs(&self) -> Interval {
        if self.value > 0 {
            *self
        } else {
            Interval::new(self.value.saturating_neg())
        }
    }

    /// The complementary interval: the one that, stacked with this one,
    /// spans an octave. A rising fifth inverts to a falling fourth.
    pub fn inverted(&self) -> Interval {
        let sign = self.sign();
        let new_mod = -(12 - self.mod12()) * sign;
        let new_value = new_mod + 12 * self.octave_span() * -sign;
        let new_degree = (9 - self.degree as i32) + 7 * self.octave_span();
        u8::try_from(new_degree)
            .ok()
            .and_then(|d| Interval::with_degree(new_value, d).ok())
            .unwrap_or_else(|| Interval::new(new_value))
    }

    fn shifted(self, delta: i32) -> Interval {
        let new_value = self.value + delta;
        if self.is_unison() || delta % 12 != 0 {
            return Interval::new(new_value);
        }
        // shifting by whole octaves keeps the degree, mirrored if the direction flips
        let new_sign = if new_value < 0 { -1 } else { 1 };
        let new_degree = if new_sign == self.sign() {
            self.degree as i32
        } else {
            9 - self.degree as i32
        };
        let extended = new_degree + 7 * (new_value.abs() / 12);
        u8::try_from(extended)
            .ok()
            .and_then(|d| Interval::with_degree(new_value, d).ok())
            .unwrap_or_else(|| Interval::new(new_value))
    }

    /// e.g. "Perfect Fifth", "Minor Ninth (descending)".
    pub fn name(&self) -> String {
        let (degree_name, compound) = match DEGREE_NAMES.get(self.extended_degree as usize) {
            Some(name) => (*name, false),
            None => (DEGREE_NAMES[self.degree as usize], true),
        };
        let mut notes = Vec::new();
        if self.is_descending() {
            notes.push("descending");
        }
        if compound {
            notes.push("compound");
        }
        let suffix = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        format!(
            "{} {}{}",
            capitalize(self.quality.full_name()),
            capitalize(degree_name),
            suffix
        )
    }

    /// e.g. "‹P5›", "‹-m3›", "‹Rt›".
    pub fn short_name(&self) -> String {
        if self.value == 0 {
            return "‹Rt›".to_string();
        }
        let sign = if self.is_descending() { "-" } else { "" };
        format!(
            "‹{}{}{}›",
            sign,
            self.quality.short_name(),
            self.extended_degree
        )
    }

    /// The interval as a chord factor, e.g. "♭3" or "♯11".
    pub fn factor_name(&self) -> String {
        let sign = if self.is_descending() { "-" } else { "" };
        format!(
            "{}{}{}",
            sign,
            offset_accidental(self.offset_from_default()),
            self.extended_degree
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub const P1: Interval = Interval::new(0);
pub const M2: Interval = Interval::new(2);
#[allow(non_upper_case_globals)]
pub const m2: Interval = Interval::new(1);
#[allow(non_upper_case_globals)]
pub const m3: Interval = Interval::new(3);
pub const M3: Interval = Interval::new(4);
pub const P4: Interval = Interval::new(5);
#[allow(non_upper_case_globals)]
pub const d5: Interval = Interval::new(6);
pub const P5: Interval = Interval::new(7);
#[allow(non_upper_case_globals)]
pub const m6: Interval = Interval::new(8);
pub const M6: Interval = Interval::new(9);
#[allow(non_upper_case_globals)]
pub const m7: Interval = Interval::new(10);
pub const M7: Interval = Interval::new(11);
pub const P8: Interval = Interval::new(12);
#[allow(non_upper_case_globals)]
pub const m9: Interval = Interval::new(13);
pub const M9: Interval = Interval::new(14);
#[allow(non_upper_case_globals)]
pub const m10: Interval = Interval::new(15);
pub const M10: Interval = Interval::new(16);
pub const P11: Interval = Interval::new(17);
pub const P12: Interval = Interval::new(19);
#[allow(non_upper_case_globals)]
pub const m13: Interval = Interval::new(20);
pub const M13: Interval = Interval::new(21);

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Interval {}

impl PartialEq<i32> for Interval {
    fn eq(&self, other: &i32) -> bool {
        self.value == *other
    }
}

impl Hash for Interval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl From<i32> for Interval {
    fn from(value: i32) -> Self {
        Interval::new(value)
    }
}

impl From<Interval> for i32 {
    fn from(interval: Interval) -> Self {
        interval.value
    }
}

impl Add<i32> for Interval {
    type Output = Interval;

    fn add(self, rhs: i32) -> Interval {
        self.shifted(rhs)
    }
}

impl Add<Interval> for Interval {
    type Output = Interval;

    fn add(self, rhs: Interval) -> Interval {
        self.shifted(rhs.value)
    }
}

impl Sub<i32> for Interval {
    type Output = Interval;

    fn sub(self, rhs: i32) -> Interval {
        self.shifted(-rhs)
    }
}

impl Sub<Interval> for Interval {
    type Output = Interval;

    fn sub(self, rhs: Interval) -> Interval {
        self.shifted(-rhs.value)
    }
}

impl Neg for Interval {
    type Output = Interval;

    fn neg(self) -> Interval {
        if self.value == 0 {
            return self;
        }
        Interval {
            value: self.value.saturating_neg(),
            ..self
        }
    }
}

/// `!interval` is the complementary interval, see [`Interval::inverted`].
impl Not for Interval {
    type Output = Interval;

    fn not(self) -> Interval {
        self.inverted()
    }
}

impl Rem<i32> for Interval {
    type Output = Interval;

    fn rem(self, modulus: i32) -> Interval {
        Interval::new(self.value.rem_euclid(modulus))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn infers_default_degrees() {
        assert_eq!(Interval::new(7).degree(), 5);
        assert_eq!(Interval::new(7).quality(), Quality::Perfect);
        assert_eq!(Interval::new(6).degree(), 5);
        assert_eq!(Interval::new(6).quality(), Quality::Diminished);
        assert_eq!(Interval::new(3).quality(), Quality::Minor);
        assert_eq!(Interval::new(14).extended_degree(), 9);
        assert_eq!(Interval::new(14).degree(), 2);
        assert_eq!(Interval::new(-10).extended_degree(), 7);
    }

    #[test]
    fn explicit_degree_changes_quality() {
        let aug4 = Interval::with_degree(6, 4).unwrap();
        assert_eq!(aug4.quality(), Quality::Augmented);
        assert_eq!(aug4, Interval::new(6));

        let dim3 = Interval::with_degree(2, 3).unwrap();
        assert_eq!(dim3.quality(), Quality::Diminished);

        let aug9 = Interval::with_degree(15, 9).unwrap();
        assert_eq!(aug9.quality(), Quality::Augmented);
        assert_eq!(aug9.degree(), 2);
    }

    #[test]
    fn rejects_distant_degrees() {
        assert!(Interval::with_degree(7, 2).is_err());
        assert!(Interval::with_degree(0, 2).is_err());
        let err = Interval::with_degree(4, 10).unwrap_err();
        assert!(err.to_string().contains("octave away"));
    }

    #[test]
    fn from_degree_builds_compound_intervals() {
        assert_eq!(Interval::from_degree(9, 0).unwrap().value(), 14);
        assert_eq!(Interval::from_degree(9, -1).unwrap().value(), 13);
        assert_eq!(Interval::from_degree(11, 1).unwrap().value(), 18);
        assert_eq!(Interval::from_degree(13, 0).unwrap().value(), 21);
        assert_eq!(Interval::from_degree(7, -2).unwrap().quality(), Quality::Diminished);
        assert_eq!(
            Interval::from_degree_quality(3, Quality::Minor).unwrap().value(),
            3
        );
    }

    #[test]
    fn offset_from_default_follows_quality() {
        assert_eq!(Interval::new(3).offset_from_default(), -1);
        assert_eq!(Interval::new(6).offset_from_default(), -1);
        assert_eq!(Interval::with_degree(8, 5).unwrap().offset_from_default(), 1);
        assert_eq!(Interval::new(10).offset_from_degree(7), -1);
    }

    #[test]
    fn inversion_complements_to_an_octave() {
        let fourth_down = !P5;
        assert_eq!(fourth_down.value(), -5);
        assert_eq!(fourth_down.degree(), 4);

        let sixth_up = !Interval::new(-4);
        assert_eq!(sixth_up.value(), 8);
        assert_eq!(sixth_up.degree(), 6);

        assert_eq!((-P5).value(), -7);
        assert_eq!((-P5).degree(), 5);
    }

    #[test]
    fn octave_shifts_preserve_degree() {
        let aug4 = Interval::with_degree(6, 4).unwrap();
        let raised = aug4 + 12;
        assert_eq!(raised.value(), 18);
        assert_eq!(raised.extended_degree(), 11);

        let lowered = Interval::new(-5) + 12;
        assert_eq!(lowered.value(), 7);
        assert_eq!(lowered.degree(), 5);

        assert_eq!((M3 + 3).value(), 7);
        assert_eq!((P5 - M3).value(), 3);
    }

    #[test]
    fn enharmonic_equality_ignores_octave_and_direction() {
        assert!(P5.enharmonic_to(&P12));
        assert!(P5.enharmonic_to(&Interval::new(-7)));
        assert!(!P5.enharmonic_to(&P4));
        assert_eq!(Interval::with_degree(6, 4).unwrap(), d5);
    }

    #[test]
    fn ratios_reduce_for_compound_intervals() {
        assert_eq!(P5.ratio(), (3, 2));
        assert_eq!(P12.ratio(), (3, 1));
        assert_eq!(M9.ratio(), (9, 4));
        assert_eq!(Interval::new(-7).ratio(), (3, 2));
    }

    #[test]
    fn consonance_orders_by_ratio_complexity() {
        assert_eq!(P1.consonance(), 1.0);
        assert!(P1.consonance() > P8.consonance());
        assert!(P8.consonance() > P5.consonance());
        assert!(P5.consonance() > d5.consonance());
        assert!(P5.consonance() > P4.consonance());
    }

    #[test]
    fn flatten_reduces_to_simple_ascending_form() {
        assert_eq!(M10.flatten().value(), 4);
        assert_eq!(Interval::new(-7).flatten().value(), 5);
        assert_eq!((Interval::new(19) % 12).value(), 7);
    }

    #[test]
    fn extreme_values_saturate() {
        let low = Interval::new(i32::MIN);
        assert_eq!(low.mod12(), 8);
        assert_eq!(low.extended_degree(), u8::MAX);
        assert_eq!((-low).value(), i32::MAX);
        assert!(low.abs().is_ascending());
        assert!(Interval::with_degree(i32::MIN, 6).is_err());
        assert_eq!(Interval::new(i32::MAX).mod12(), 7);
    }

    #[test]
    fn names() {
        assert_eq!(P5.name(), "Perfect Fifth");
        assert_eq!(Interval::new(-13).name(), "Minor Ninth (descending)");
        assert_eq!(P1.short_name(), "‹Rt›");
        assert_eq!(m3.short_name(), "‹m3›");
        assert_eq!(m3.factor_name(), "♭3");
        assert_eq!(Interval::from_degree(11, 1).unwrap().factor_name(), "♯11");
    }
}
