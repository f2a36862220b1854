//! Scalar arithmetic-progression intervals.
//!
//! An interval `[begin:step:end]` denotes `{ begin + k*step : k >= 0, begin + k*step <= end }`.
//! Values are kept canonical at construction so that structural equality is
//! semantic equality:
//! - `end` is always reachable from `begin`
//! - singletons carry step 1
//! - every empty interval is the same value

use crate::utils::errors::{malformed, MalformedKind, SbgResult};
use num_integer::Integer;
use serde::{Serialize, Deserialize};
use std::fmt;

/// A canonical arithmetic-progression interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    begin: i64,
    step: i64,
    end: i64,
}

impl Interval {
    /// Build a canonical interval, snapping `end` down to the last reachable point.
    pub fn new(begin: i64, step: i64, end: i64) -> SbgResult<Self> {
        if step < 0 {
            return Err(malformed(
                MalformedKind::NegativeStep,
                format!("interval [{}:{}:{}] has a negative step", begin, step, end),
            ));
        }
        if end < begin {
            return Ok(Self::empty());
        }
        if step == 0 {
            if begin != end {
                return Err(malformed(
                    MalformedKind::DegenerateInterval,
                    format!("zero step on non-singleton interval [{}:0:{}]", begin, end),
                ));
            }
            return Ok(Self::singleton(begin));
        }
        Ok(Self::canonical(begin, step, end))
    }

    /// Infallible constructor for callers that already hold `step > 0`.
    pub(crate) fn canonical(begin: i64, step: i64, end: i64) -> Self {
        debug_assert!(step > 0);
        if end < begin {
            return Self::empty();
        }
        let span = (i128::from(end) - i128::from(begin)) / i128::from(step) * i128::from(step);
        // begin <= begin + span <= end, so the sum fits.
        let last = (i128::from(begin) + span) as i64;
        if last == begin {
            Self::singleton(begin)
        } else {
            Self { begin, step, end: last }
        }
    }

    /// The canonical empty interval.
    pub fn empty() -> Self {
        Self { begin: 0, step: 1, end: -1 }
    }

    pub fn singleton(value: i64) -> Self {
        Self { begin: value, step: 1, end: value }
    }

    /// Contiguous range `[begin:1:end]`.
    pub fn range(begin: i64, end: i64) -> Self {
        Self::canonical(begin, 1, end)
    }

    pub fn begin(&self) -> i64 { self.begin }
    pub fn step(&self) -> i64 { self.step }
    pub fn end(&self) -> i64 { self.end }

    pub fn is_empty(&self) -> bool {
        self.end < self.begin
    }

    pub fn is_singleton(&self) -> bool {
        self.begin == self.end
    }

    /// Number of members.
    pub fn cardinality(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            let steps = (i128::from(self.end) - i128::from(self.begin)) / i128::from(self.step);
            u64::try_from(steps).map_or(u64::MAX, |n| n.saturating_add(1))
        }
    }

    pub fn is_member(&self, x: i64) -> bool {
        !self.is_empty()
            && self.begin <= x
            && x <= self.end
            && (i128::from(x) - i128::from(self.begin)) % i128::from(self.step) == 0
    }

    /// Smallest member, if any.
    pub fn min_element(&self) -> Option<i64> {
        if self.is_empty() { None } else { Some(self.begin) }
    }

    /// Largest member, if any.
    pub fn max_element(&self) -> Option<i64> {
        if self.is_empty() { None } else { Some(self.end) }
    }

    /// Members `x` with `lo <= x <= hi`.
    pub fn clamp(&self, lo: i64, hi: i64) -> Interval {
        if self.is_empty() || lo > self.end || hi < self.begin || hi < lo {
            return Self::empty();
        }
        let first = if lo <= self.begin {
            self.begin
        } else {
            let (begin, step) = (i128::from(self.begin), i128::from(self.step));
            let first = begin + Integer::div_ceil(&(i128::from(lo) - begin), &step) * step;
            match i64::try_from(first) {
                Ok(first) => first,
                Err(_) => return Self::empty(),
            }
        };
        Self::canonical(first, self.step, self.end.min(hi))
    }

    /// Intersection of two intervals.
    ///
    /// The combined step is `lcm(step1, step2)`; at most that many candidate
    /// offsets from `max(begin1, begin2)` are scanned for the first common
    /// member, which bounds the cost of the operation by the lcm.
    pub fn intersection(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        if self.end < other.begin || other.end < self.begin {
            return Self::empty();
        }
        let start = self.begin.max(other.begin);
        let end = self.end.min(other.end);
        let lcm = self.step.lcm(&other.step);
        let mut offset = 0;
        while offset < lcm {
            let x = match start.checked_add(offset) {
                Some(x) if x <= end => x,
                _ => break,
            };
            if self.is_member(x) && other.is_member(x) {
                return Self::canonical(x, lcm, end);
            }
            offset += 1;
        }
        Self::empty()
    }

    /// Members of `self` that are not members of `other`, as disjoint intervals.
    pub fn difference(&self, other: &Interval) -> Vec<Interval> {
        if self.is_empty() {
            return Vec::new();
        }
        let common = self.intersection(other);
        if common.is_empty() {
            return vec![*self];
        }
        let mut pieces = Vec::new();
        // Before and after the overlap.
        if let Some(before) = common.begin.checked_sub(self.step) {
            pieces.push(Self::canonical(self.begin, self.step, before));
        }
        if let Some(after) = common.end.checked_add(self.step) {
            pieces.push(Self::canonical(after, self.step, self.end));
        }
        // Residue classes of self skipped by the coarser common step.
        if !common.is_singleton() {
            let classes = common.step / self.step;
            for k in 1..classes {
                pieces.push(Self::canonical(common.begin + k * self.step, common.step, common.end));
            }
        }
        pieces.retain(|p| !p.is_empty());
        pieces
    }

    /// Merge two disjoint intervals into one progression when possible.
    ///
    /// Handles concatenation (`self` ends one step before `other` begins) and
    /// interleaving (two same-step progressions offset by half a step).
    pub fn try_merge(&self, other: &Interval) -> Option<Interval> {
        if self.is_empty() {
            return Some(*other);
        }
        if other.is_empty() || self == other {
            return Some(*self);
        }
        let (lo, hi) = if self.begin <= other.begin { (self, other) } else { (other, self) };
        if lo.end < hi.begin {
            let gap = hi.begin.checked_sub(lo.end)?;
            let lo_fits = lo.is_singleton() || lo.step == gap;
            let hi_fits = hi.is_singleton() || hi.step == gap;
            if lo_fits && hi_fits {
                return Some(Interval { begin: lo.begin, step: gap, end: hi.end });
            }
            return None;
        }
        if lo.step == hi.step && lo.step % 2 == 0 {
            let half = lo.step / 2;
            if Some(hi.begin) == lo.begin.checked_add(half) && Some(hi.end) == lo.end.checked_add(half) {
                return Some(Interval { begin: lo.begin, step: half, end: hi.end });
            }
        }
        None
    }

    /// Iterate over the members in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        let count = self.cardinality();
        (0..count).map(move |k| self.begin + k as i64 * self.step)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[]")
        } else {
            write!(f, "[{}:{}:{}]", self.begin, self.step, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(b: i64, s: i64, e: i64) -> Interval {
        Interval::new(b, s, e).unwrap()
    }

    #[test]
    fn test_canonical_end() {
        let i = iv(0, 3, 10);
        assert_eq!(i.end(), 9);
        assert_eq!(i.cardinality(), 4);
        assert_eq!(iv(4, 0, 4), Interval::singleton(4));
        assert_eq!(iv(4, 7, 5), Interval::singleton(4));
        assert_eq!(iv(5, 1, 2), Interval::empty());
    }

    #[test]
    fn test_malformed() {
        assert_eq!(
            Interval::new(0, -1, 5).unwrap_err().malformed_kind(),
            Some(MalformedKind::NegativeStep)
        );
        assert_eq!(
            Interval::new(0, 0, 5).unwrap_err().malformed_kind(),
            Some(MalformedKind::DegenerateInterval)
        );
    }

    #[test]
    fn test_extreme_bounds() {
        let all = Interval::range(i64::MIN, i64::MAX);
        assert!(all.is_member(i64::MIN));
        assert!(all.is_member(i64::MAX));
        assert_eq!(all.cardinality(), u64::MAX);

        let evens = iv(i64::MIN, 2, i64::MAX);
        assert_eq!(evens.end(), i64::MAX - 1);
        assert!(evens.is_member(0));
        assert!(!evens.is_member(1));
        assert!(!evens.is_member(i64::MAX));
        assert_eq!(evens.cardinality(), 1u64 << 63);
        assert_eq!(Interval::clamp(&evens, -3, 3), iv(-2, 2, 2));

        let top = Interval::range(i64::MAX - 2, i64::MAX);
        assert_eq!(top.intersection(&iv(i64::MAX - 1, 5, i64::MAX)), Interval::singleton(i64::MAX - 1));
        assert_eq!(top.difference(&Interval::singleton(i64::MAX)), vec![Interval::range(i64::MAX - 2, i64::MAX - 1)]);
        assert_eq!(Interval::singleton(i64::MIN).try_merge(&Interval::singleton(i64::MAX)), None);
    }

    #[test]
    fn test_membership() {
        let i = iv(1, 3, 10);
        assert!(i.is_member(1));
        assert!(i.is_member(7));
        assert!(!i.is_member(8));
        assert!(!i.is_member(13));
        assert!(!Interval::empty().is_member(0));
    }

    #[test]
    fn test_intersection() {
        assert_eq!(iv(1, 1, 10).intersection(&iv(5, 1, 15)), iv(5, 1, 10));
        assert!(iv(0, 2, 10).intersection(&iv(1, 2, 11)).is_empty());
        assert_eq!(iv(0, 2, 20).intersection(&iv(0, 3, 20)), iv(0, 6, 18));
        assert_eq!(iv(1, 2, 30).intersection(&iv(0, 3, 30)), iv(3, 6, 27));
        assert!(iv(0, 1, 4).intersection(&iv(5, 1, 9)).is_empty());
    }

    #[test]
    fn test_difference() {
        assert_eq!(iv(0, 1, 10).difference(&iv(3, 1, 5)), vec![iv(0, 1, 2), iv(6, 1, 10)]);
        assert_eq!(iv(0, 1, 10).difference(&iv(0, 2, 10)), vec![iv(1, 2, 9)]);
        assert!(iv(2, 2, 8).difference(&iv(0, 1, 10)).is_empty());
        assert_eq!(iv(0, 1, 4).difference(&iv(7, 1, 9)), vec![iv(0, 1, 4)]);

        let pieces = iv(0, 1, 10).difference(&iv(4, 3, 7));
        let members: Vec<i64> = pieces.iter().flat_map(|p| p.iter().collect::<Vec<_>>()).collect();
        let mut sorted = members.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2, 3, 5, 6, 8, 9, 10]);
    }

    #[test]
    fn test_merge() {
        assert_eq!(iv(0, 1, 4).try_merge(&iv(5, 1, 9)), Some(iv(0, 1, 9)));
        assert_eq!(Interval::singleton(3).try_merge(&Interval::singleton(7)), Some(iv(3, 4, 7)));
        assert_eq!(iv(0, 2, 10).try_merge(&iv(1, 2, 11)), Some(iv(0, 1, 11)));
        assert_eq!(iv(0, 2, 10).try_merge(&iv(13, 2, 15)), None);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Interval::clamp(&iv(0, 3, 30), 4, 20), iv(6, 3, 18));
        assert!(Interval::clamp(&iv(0, 3, 30), 31, 40).is_empty());
    }
}
