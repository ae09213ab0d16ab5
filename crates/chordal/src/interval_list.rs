//! Ordered collections of intervals and their stacking/inversion algebra.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;

use crate::interval::Interval;
use crate::{Error, Result};

/// An ordered list of intervals, usually measured from a chord's root or bass.
///
/// Order is kept so a list can represent a particular voicing, but equality
/// and hashing treat the list as its sorted tuple of semitone values. That
/// makes a list usable directly as an order-insensitive registry key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntervalList(Vec<Interval>);

impl IntervalList {
    pub fn new(intervals: Vec<Interval>) -> Self {
        IntervalList(intervals)
    }

    /// Build from raw semitone values, rejecting repeated values.
    pub fn from_values(values: &[i32]) -> Result<Self> {
        let list: IntervalList = values.iter().copied().map(Interval::new).collect();
        if list.has_duplicates() {
            return Err(Error::DuplicateIntervals(values.to_vec()));
        }
        Ok(list)
    }

    pub fn values(&self) -> Vec<i32> {
        self.0.iter().map(Interval::value).collect()
    }

    fn sorted_values(&self) -> Vec<i32> {
        let mut values = self.values();
        values.sort_unstable();
        values
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Interval> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&Interval> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Interval> {
        self.0.last()
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Interval> {
        self.0
    }

    /// Membership by semitone value.
    pub fn contains_value(&self, value: i32) -> bool {
        self.0.iter().any(|i| i.value() == value)
    }

    pub fn has_duplicates(&self) -> bool {
        let mut seen = HashSet::new();
        !self.0.iter().all(|i| seen.insert(i.value()))
    }

    pub fn is_sorted(&self) -> bool {
        self.0.windows(2).all(|w| w[0] <= w[1])
    }

    pub fn sorted(&self) -> IntervalList {
        let mut intervals = self.0.clone();
        intervals.sort();
        IntervalList(intervals)
    }

    /// Drop repeated values after their first occurrence.
    pub fn unique(&self) -> IntervalList {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .filter(|i| seen.insert(i.value()))
            .copied()
            .collect()
    }

    /// Remove unisons and octaves from either end.
    pub fn strip(&self) -> IntervalList {
        let mut intervals = self.0.as_slice();
        if let Some((first, rest)) = intervals.split_first() {
            if first.is_unison() {
                intervals = rest;
            }
        }
        if let Some((last, rest)) = intervals.split_last() {
            if last.is_unison() {
                intervals = rest;
            }
        }
        IntervalList(intervals.to_vec())
    }

    /// Add a leading unison and/or a closing octave where missing.
    pub fn pad(&self, left: bool, right: bool) -> Result<IntervalList> {
        if !self.is_sorted() {
            return Err(Error::UnsortedIntervals(self.values()));
        }
        let mut intervals = self.0.clone();
        if left && !self.0.first().is_some_and(Interval::is_unison) {
            intervals.insert(0, Interval::new(0));
        }
        if right {
            if let Some(last) = self.0.last().filter(|i| !i.is_unison()) {
                intervals.push(Interval::new(12 * (last.octave_span() + 1)));
            }
        }
        Ok(IntervalList(intervals))
    }

    /// Flatten every interval to its simple form and sort. Repeats are
    /// dropped unless `duplicates` is set.
    pub fn flatten(&self, duplicates: bool) -> IntervalList {
        let flat: IntervalList = self.0.iter().map(Interval::flatten).collect();
        let flat = if duplicates { flat } else { flat.unique() };
        flat.sorted()
    }

    /// Rotate so that the element at `places` (wrapping, may be negative) comes first.
    pub fn rotate(&self, places: i32) -> IntervalList {
        if self.0.is_empty() {
            return self.clone();
        }
        let mut intervals = self.0.clone();
        let shift = places.rem_euclid(self.0.len() as i32) as usize;
        intervals.rotate_left(shift);
        IntervalList(intervals)
    }

    /// The ascending intervals of the `position`-th inversion.
    ///
    /// Rotates so `position` leads, recentres on it, folds negative
    /// intervals up by interval inversion, then dedupes and sorts.
    pub fn invert(&self, position: i32) -> IntervalList {
        let rotated = self.rotate(position);
        let Some(&lead) = rotated.first() else {
            return rotated;
        };
        rotated
            .iter()
            .map(|&i| i - lead)
            .map(|i| if i.value() < 0 { !i } else { i })
            .collect::<IntervalList>()
            .unique()
            .sorted()
    }

    /// Cumulative sum: successive steps become intervals from the first.
    pub fn stack(&self) -> IntervalList {
        let mut stacked: Vec<Interval> = Vec::with_capacity(self.0.len());
        for &step in &self.0 {
            let next = match stacked.last() {
                Some(&previous) => step + previous,
                None => step,
            };
            stacked.push(next);
        }
        IntervalList(stacked)
    }

    /// Adjacent differences, the inverse of [`stack`](Self::stack).
    pub fn unstack(&self) -> Result<IntervalList> {
        if !self.is_sorted() {
            return Err(Error::UnsortedIntervals(self.values()));
        }
        let mut steps: Vec<Interval> = self.0.iter().take(1).copied().collect();
        steps.extend(self.0.windows(2).map(|w| w[1] - w[0]));
        Ok(IntervalList(steps))
    }

    /// Add `semitones` to every interval.
    pub fn shift(&self, semitones: i32) -> IntervalList {
        self.0.iter().map(|&i| i + semitones).collect()
    }

    /// Replace descending intervals with their ascending inversions.
    pub fn abs(&self) -> IntervalList {
        self.0
            .iter()
            .map(|&i| if i.value() < 0 { !i } else { i })
            .collect()
    }

    pub fn factor_names(&self) -> Vec<String> {
        self.0.iter().map(Interval::factor_name).collect()
    }
}

impl PartialEq for IntervalList {
    fn eq(&self, other: &Self) -> bool {
        self.sorted_values() == other.sorted_values()
    }
}

impl Eq for IntervalList {}

impl Hash for IntervalList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted_values().hash(state);
    }
}

impl Index<usize> for IntervalList {
    type Output = Interval;

    fn index(&self, index: usize) -> &Interval {
        &self.0[index]
    }
}

impl FromIterator<Interval> for IntervalList {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        IntervalList(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a IntervalList {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Interval>> for IntervalList {
    fn from(intervals: Vec<Interval>) -> Self {
        IntervalList(intervals)
    }
}

impl fmt::Display for IntervalList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(Interval::short_name).collect();
        write!(f, "𝄁 {} 𝄁", names.join(", "))
    }
}
