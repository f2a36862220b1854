//! Multi-dimensional intervals: the Cartesian product of one interval per dimension.

use crate::algebra::interval::Interval;
use serde::{Serialize, Deserialize};
use std::fmt;

/// A product of intervals, one per dimension.
///
/// Empty as soon as one coordinate is empty; an empty value is normalized so
/// that every coordinate is the empty interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MultiInterval {
    intervals: Vec<Interval>,
}

impl MultiInterval {
    pub fn new(intervals: Vec<Interval>) -> Self {
        if intervals.iter().any(|i| i.is_empty()) {
            Self::empty(intervals.len())
        } else {
            Self { intervals }
        }
    }

    pub fn empty(dim: usize) -> Self {
        Self { intervals: vec![Interval::empty(); dim] }
    }

    /// The single point `point`.
    pub fn point(point: &[i64]) -> Self {
        Self { intervals: point.iter().map(|&x| Interval::singleton(x)).collect() }
    }

    pub fn dim(&self) -> usize {
        self.intervals.len()
    }

    pub fn interval(&self, dim: usize) -> &Interval {
        &self.intervals[dim]
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Copy with coordinate `dim` replaced.
    pub fn with_interval(&self, dim: usize, interval: Interval) -> Self {
        let mut intervals = self.intervals.clone();
        intervals[dim] = interval;
        Self::new(intervals)
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty() || self.intervals.iter().any(|i| i.is_empty())
    }

    pub fn cardinality(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        self.intervals.iter().fold(1u64, |acc, i| acc.saturating_mul(i.cardinality()))
    }

    pub fn is_member(&self, point: &[i64]) -> bool {
        point.len() == self.dim()
            && !self.is_empty()
            && self.intervals.iter().zip(point).all(|(i, &x)| i.is_member(x))
    }

    /// Lexicographic minimum, which for a product is the tuple of minima.
    pub fn min_element(&self) -> Option<Vec<i64>> {
        if self.is_empty() {
            return None;
        }
        Some(self.intervals.iter().map(|i| i.begin()).collect())
    }

    /// Atoms of different dimensions share no point.
    pub fn intersection(&self, other: &MultiInterval) -> MultiInterval {
        if self.dim() != other.dim() {
            return Self::empty(self.dim());
        }
        Self::new(
            self.intervals.iter()
                .zip(&other.intervals)
                .map(|(a, b)| a.intersection(b))
                .collect(),
        )
    }

    pub fn overlaps(&self, other: &MultiInterval) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Box difference: pairwise-disjoint pieces covering `self \ other`.
    ///
    /// Piece `d` keeps the overlap in dimensions `< d`, takes the difference in
    /// dimension `d`, and leaves dimensions `> d` untouched.
    pub fn difference(&self, other: &MultiInterval) -> Vec<MultiInterval> {
        if self.is_empty() {
            return Vec::new();
        }
        let common = self.intersection(other);
        if common.is_empty() {
            return vec![self.clone()];
        }
        let mut pieces = Vec::new();
        let mut prefix = self.intervals.clone();
        for d in 0..self.dim() {
            for rest in self.intervals[d].difference(&other.intervals[d]) {
                let mut piece = prefix.clone();
                piece[d] = rest;
                pieces.push(Self::new(piece));
            }
            prefix[d] = common.intervals[d];
        }
        pieces
    }

    /// Merge two disjoint atoms that agree in every dimension but one.
    pub fn try_merge(&self, other: &MultiInterval) -> Option<MultiInterval> {
        if self.dim() != other.dim() {
            return None;
        }
        let mut differing = None;
        for d in 0..self.dim() {
            if self.intervals[d] != other.intervals[d] {
                if differing.is_some() {
                    return None;
                }
                differing = Some(d);
            }
        }
        match differing {
            None => Some(self.clone()),
            Some(d) => {
                let merged = self.intervals[d].try_merge(&other.intervals[d])?;
                Some(self.with_interval(d, merged))
            }
        }
    }
}

impl From<Interval> for MultiInterval {
    fn from(interval: Interval) -> Self {
        Self::new(vec![interval])
    }
}

impl fmt::Display for MultiInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 { write!(f, "x")?; }
            write!(f, "{}", interval)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mi(parts: &[(i64, i64, i64)]) -> MultiInterval {
        MultiInterval::new(parts.iter().map(|&(b, s, e)| Interval::new(b, s, e).unwrap()).collect())
    }

    #[test]
    fn test_empty_normalization() {
        let a = mi(&[(0, 1, 5), (3, 1, 2)]);
        assert!(a.is_empty());
        assert_eq!(a, MultiInterval::empty(2));
        assert_eq!(a.cardinality(), 0);
    }

    #[test]
    fn test_cardinality_and_membership() {
        let a = mi(&[(0, 1, 9), (0, 2, 8)]);
        assert_eq!(a.cardinality(), 50);
        assert!(a.is_member(&[3, 4]));
        assert!(!a.is_member(&[3, 5]));
        assert!(!a.is_member(&[3]));
    }

    #[test]
    fn test_difference_is_disjoint_cover() {
        let a = mi(&[(0, 1, 9), (0, 1, 9)]);
        let b = mi(&[(3, 1, 5), (2, 1, 20)]);
        let pieces = a.difference(&b);
        let total: u64 = pieces.iter().map(|p| p.cardinality()).sum();
        assert_eq!(total, 100 - 3 * 8);
        for (i, p) in pieces.iter().enumerate() {
            assert!(!p.overlaps(&b));
            for q in &pieces[i + 1..] {
                assert!(!p.overlaps(q));
            }
        }
    }

    #[test]
    fn test_mixed_dimensions_share_no_point() {
        let line = mi(&[(0, 1, 9)]);
        let square = mi(&[(0, 1, 9), (0, 1, 9)]);
        assert!(line.intersection(&square).is_empty());
        assert!(!line.overlaps(&square));
        assert_eq!(line.difference(&square), vec![line.clone()]);
    }

    #[test]
    fn test_merge() {
        let a = mi(&[(0, 1, 4), (0, 1, 9)]);
        let b = mi(&[(5, 1, 9), (0, 1, 9)]);
        assert_eq!(a.try_merge(&b), Some(mi(&[(0, 1, 9), (0, 1, 9)])));
        let c = mi(&[(5, 1, 9), (0, 1, 8)]);
        assert_eq!(a.try_merge(&c), None);
    }
}
