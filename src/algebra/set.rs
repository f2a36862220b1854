//! Sets of multi-intervals.
//!
//! A `Set` is an ordered sequence of pairwise-disjoint, non-empty atoms. After
//! every operation the atoms are re-canonicalized: empties dropped, atoms sorted
//! lexicographically, and atoms that continue each other's progression in a
//! single dimension merged, keeping the atom count small.

use crate::algebra::interval::Interval;
use crate::algebra::multi_interval::MultiInterval;
use crate::utils::errors::{malformed, MalformedKind, SbgResult};
use serde::{Serialize, Deserialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Set {
    dim: usize,
    atoms: Vec<MultiInterval>,
}

impl Set {
    pub fn empty(dim: usize) -> Self {
        Self { dim, atoms: Vec::new() }
    }

    /// Build a set from possibly overlapping atoms of dimension `dim`.
    pub fn new(dim: usize, atoms: Vec<MultiInterval>) -> SbgResult<Self> {
        if let Some(bad) = atoms.iter().find(|a| a.dim() != dim) {
            return Err(malformed(
                MalformedKind::DimensionMismatch,
                format!("atom {} has dimension {}, expected {}", bad, bad.dim(), dim),
            ));
        }
        Ok(atoms.into_iter().fold(Self::empty(dim), |acc, atom| {
            acc.union_unchecked(&Self::from_disjoint(dim, vec![atom]))
        }))
    }

    /// Build a set from atoms already known to be pairwise disjoint.
    pub(crate) fn from_disjoint(dim: usize, atoms: Vec<MultiInterval>) -> Self {
        debug_assert!(atoms.iter().all(|a| a.dim() == dim));
        Self { dim, atoms: canonicalize(atoms) }
    }

    pub fn from_atom(atom: MultiInterval) -> Self {
        let dim = atom.dim();
        Self::from_disjoint(dim, vec![atom])
    }

    /// One-dimensional set holding a single interval.
    pub fn from_interval(interval: Interval) -> Self {
        Self::from_atom(MultiInterval::from(interval))
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn atoms(&self) -> &[MultiInterval] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn cardinality(&self) -> u64 {
        self.atoms.iter().fold(0u64, |acc, a| acc.saturating_add(a.cardinality()))
    }

    pub fn is_member(&self, point: &[i64]) -> bool {
        self.atoms.iter().any(|a| a.is_member(point))
    }

    /// Lexicographically smallest element.
    pub fn min_element(&self) -> Option<Vec<i64>> {
        self.atoms.iter().filter_map(|a| a.min_element()).min()
    }

    /// Union; fails on operands of different dimensions.
    pub fn union(&self, other: &Set) -> SbgResult<Set> {
        self.same_dim(other, "union")?;
        Ok(self.union_unchecked(other))
    }

    pub fn intersection(&self, other: &Set) -> SbgResult<Set> {
        self.same_dim(other, "intersection")?;
        Ok(self.intersection_unchecked(other))
    }

    pub fn difference(&self, other: &Set) -> SbgResult<Set> {
        self.same_dim(other, "difference")?;
        Ok(self.difference_unchecked(other))
    }

    /// Intersection with a single atom.
    pub fn restrict_to(&self, atom: &MultiInterval) -> Set {
        self.intersection_unchecked(&Set::from_atom(atom.clone()))
    }

    /// A set of another dimension is a subset only when this set is empty.
    pub fn is_subset(&self, other: &Set) -> bool {
        if self.dim != other.dim {
            return self.is_empty();
        }
        self.difference_unchecked(other).is_empty()
    }

    fn same_dim(&self, other: &Set, operation: &str) -> SbgResult<()> {
        if self.dim != other.dim {
            return Err(malformed(
                MalformedKind::DimensionMismatch,
                format!("{} of {}-dimensional {} and {}-dimensional {}", operation, self.dim, self, other.dim, other),
            ));
        }
        Ok(())
    }

    pub(crate) fn union_unchecked(&self, other: &Set) -> Set {
        debug_assert_eq!(self.dim, other.dim);
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut atoms = self.atoms.clone();
        atoms.extend(other.difference_unchecked(self).atoms);
        Self::from_disjoint(self.dim, atoms)
    }

    pub(crate) fn intersection_unchecked(&self, other: &Set) -> Set {
        let mut atoms = Vec::new();
        for a in &self.atoms {
            for b in &other.atoms {
                let common = a.intersection(b);
                if !common.is_empty() {
                    atoms.push(common);
                }
            }
        }
        Self::from_disjoint(self.dim, atoms)
    }

    pub(crate) fn difference_unchecked(&self, other: &Set) -> Set {
        if other.is_empty() || self.is_empty() {
            return self.clone();
        }
        let mut atoms = Vec::new();
        for a in &self.atoms {
            let mut pieces = vec![a.clone()];
            for b in &other.atoms {
                pieces = pieces.iter().flat_map(|p| p.difference(b)).collect();
                if pieces.is_empty() {
                    break;
                }
            }
            atoms.extend(pieces);
        }
        Self::from_disjoint(self.dim, atoms)
    }

    pub fn overlaps(&self, other: &Set) -> bool {
        self.atoms.iter().any(|a| other.atoms.iter().any(|b| a.overlaps(b)))
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim
            && (self.atoms == other.atoms
                || (self.is_subset(other) && other.is_subset(self)))
    }
}

impl Eq for Set {}

impl From<MultiInterval> for Set {
    fn from(atom: MultiInterval) -> Self {
        Self::from_atom(atom)
    }
}

impl From<Interval> for Set {
    fn from(interval: Interval) -> Self {
        Self::from_interval(interval)
    }
}

/// Sort, drop empties and coalesce mergeable atoms until no merge applies.
fn canonicalize(mut atoms: Vec<MultiInterval>) -> Vec<MultiInterval> {
    atoms.retain(|a| !a.is_empty());
    atoms.sort();
    atoms.dedup();
    loop {
        let mut merged = false;
        let mut i = 0;
        while i < atoms.len() {
            let mut j = i + 1;
            while j < atoms.len() {
                if let Some(m) = atoms[i].try_merge(&atoms[j]) {
                    atoms[i] = m;
                    atoms.remove(j);
                    merged = true;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        if !merged {
            break;
        }
        atoms.sort();
    }
    atoms
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, atom) in self.atoms.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{}", atom)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set1(parts: &[(i64, i64, i64)]) -> Set {
        let atoms = parts.iter()
            .map(|&(b, s, e)| MultiInterval::from(Interval::new(b, s, e).unwrap()))
            .collect();
        Set::new(1, atoms).unwrap()
    }

    #[test]
    fn test_union_coalesces() {
        let s = set1(&[(0, 1, 4), (5, 1, 9)]);
        assert_eq!(s.atom_count(), 1);
        assert_eq!(s.cardinality(), 10);

        let evens = set1(&[(0, 2, 10)]);
        let odds = set1(&[(1, 2, 11)]);
        let all = evens.union(&odds).unwrap();
        assert_eq!(all.atoms(), &[MultiInterval::from(Interval::range(0, 11))]);
    }

    #[test]
    fn test_overlapping_atoms_become_disjoint() {
        let s = set1(&[(0, 1, 10), (5, 1, 15)]);
        assert_eq!(s.cardinality(), 16);
        assert_eq!(s.atom_count(), 1);
    }

    #[test]
    fn test_difference_and_intersection() {
        let a = set1(&[(0, 1, 20)]);
        let b = set1(&[(5, 5, 15)]);
        let d = a.difference(&b).unwrap();
        assert_eq!(d.cardinality(), 18);
        assert!(!d.is_member(&[10]));
        assert!(d.is_member(&[11]));
        assert_eq!(a.intersection(&b).unwrap(), b);
        assert!(d.intersection(&b).unwrap().is_empty());
        assert_eq!(d.union(&b).unwrap(), a);
    }

    #[test]
    fn test_semantic_equality() {
        let a = set1(&[(0, 2, 10), (1, 2, 11)]);
        let b = set1(&[(0, 1, 11)]);
        assert_eq!(a, b);
        assert_ne!(a, set1(&[(0, 1, 10)]));
    }

    #[test]
    fn test_dimension_mismatch() {
        let atom = MultiInterval::point(&[1, 2]);
        let err = Set::new(1, vec![atom.clone()]).unwrap_err();
        assert_eq!(err.malformed_kind(), Some(MalformedKind::DimensionMismatch));

        let line = set1(&[(0, 1, 5)]);
        let point = Set::from_atom(atom);
        for result in [line.union(&point), line.intersection(&point), line.difference(&point)] {
            assert_eq!(result.unwrap_err().malformed_kind(), Some(MalformedKind::DimensionMismatch));
        }
        assert!(!point.is_subset(&line));
        assert!(Set::empty(1).is_subset(&point));
        assert_ne!(line, point);
    }

    #[test]
    fn test_min_element() {
        let s = set1(&[(7, 1, 9), (2, 3, 5)]);
        assert_eq!(s.min_element(), Some(vec![2]));
        assert_eq!(Set::empty(1).min_element(), None);
    }
}
