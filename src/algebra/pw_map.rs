//! Piecewise affine maps: atomic maps over pairwise-disjoint domains.

use crate::algebra::expr::LinearExpression;
use crate::algebra::map::AtomicMap;
use crate::algebra::multi_interval::MultiInterval;
use crate::algebra::set::Set;
use crate::utils::errors::{malformed, MalformedKind, SbgResult};
use serde::{Serialize, Deserialize};
use std::fmt;

/// A (possibly partial) function defined case by case on disjoint atoms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiecewiseMap {
    dim: usize,
    maps: Vec<AtomicMap>,
}

impl PiecewiseMap {
    pub fn empty(dim: usize) -> Self {
        Self { dim, maps: Vec::new() }
    }

    /// Build from atomic maps, rejecting overlapping domains.
    pub fn new(dim: usize, maps: Vec<AtomicMap>) -> SbgResult<Self> {
        let maps: Vec<AtomicMap> = maps.into_iter().filter(|m| !m.is_empty()).collect();
        for (i, a) in maps.iter().enumerate() {
            if a.dim() != dim {
                return Err(malformed(
                    MalformedKind::DimensionMismatch,
                    format!("atomic map {} is not {}-dimensional", a, dim),
                ));
            }
            if let Some(b) = maps[i + 1..].iter().find(|b| a.dom().overlaps(b.dom())) {
                return Err(malformed(
                    MalformedKind::OverlappingDomains,
                    format!("domains of {} and {} overlap", a, b),
                ));
            }
        }
        Ok(Self { dim, maps })
    }

    pub(crate) fn from_disjoint(dim: usize, maps: Vec<AtomicMap>) -> Self {
        Self { dim, maps: maps.into_iter().filter(|m| !m.is_empty()).collect() }
    }

    /// The same expression over every atom of `dom`.
    pub fn affine(dom: &Set, exp: &LinearExpression) -> SbgResult<Self> {
        let maps = dom.atoms().iter()
            .map(|atom| AtomicMap::new(atom.clone(), exp.clone()))
            .collect::<SbgResult<Vec<_>>>()?;
        Ok(Self { dim: dom.dim(), maps })
    }

    pub fn identity(dom: &Set) -> Self {
        let maps = dom.atoms().iter().cloned().map(AtomicMap::identity).collect();
        Self { dim: dom.dim(), maps }
    }

    /// Everything in `dom` to `point`.
    pub fn constant(dom: &Set, point: &[i64]) -> SbgResult<Self> {
        Self::affine(dom, &LinearExpression::constant(point))
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn maps(&self) -> &[AtomicMap] {
        &self.maps
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn dom(&self) -> Set {
        Set::from_disjoint(self.dim, self.maps.iter().map(|m| m.dom().clone()).collect())
    }

    /// Image of `subset`.
    pub fn image(&self, subset: &Set) -> SbgResult<Set> {
        let mut atoms = Vec::new();
        for map in &self.maps {
            for atom in subset.atoms() {
                let img = map.image(atom)?;
                if !img.is_empty() {
                    atoms.push(img);
                }
            }
        }
        Set::new(self.dim, atoms)
    }

    pub fn image_of_domain(&self) -> SbgResult<Set> {
        let atoms = self.maps.iter()
            .map(|m| m.image_of_domain())
            .collect::<SbgResult<Vec<_>>>()?;
        Set::new(self.dim, atoms)
    }

    /// Domain points whose image lies in `subcodomain`.
    pub fn pre_image(&self, subcodomain: &Set) -> SbgResult<Set> {
        let mut atoms = Vec::new();
        for map in &self.maps {
            for atom in subcodomain.atoms() {
                let pre = map.pre_image(atom)?;
                if !pre.is_empty() {
                    atoms.push(pre);
                }
            }
        }
        Set::new(self.dim, atoms)
    }

    /// `self ∘ inner`, defined where `inner` lands inside `self`'s domain.
    pub fn compose(&self, inner: &PiecewiseMap) -> SbgResult<PiecewiseMap> {
        let mut maps = Vec::new();
        for g in &inner.maps {
            for f in &self.maps {
                if let Some(fg) = f.compose(g)? {
                    maps.push(fg);
                }
            }
        }
        Ok(Self::from_disjoint(inner.dim, maps).normalize())
    }

    /// Restrict the domain to `subset`.
    pub fn restrict(&self, subset: &Set) -> PiecewiseMap {
        let mut maps = Vec::new();
        for map in &self.maps {
            for atom in subset.atoms() {
                let piece = map.restrict(atom);
                if !piece.is_empty() {
                    maps.push(piece);
                }
            }
        }
        Self::from_disjoint(self.dim, maps)
    }

    /// Priority union: `self` wherever defined, `other` elsewhere.
    pub fn combine(&self, other: &PiecewiseMap) -> SbgResult<PiecewiseMap> {
        if self.dim != other.dim {
            return Err(malformed(
                MalformedKind::DimensionMismatch,
                format!("cannot combine {}-dimensional {} with {}-dimensional {}", self.dim, self, other.dim, other),
            ));
        }
        Ok(self.combine_unchecked(other))
    }

    pub(crate) fn combine_unchecked(&self, other: &PiecewiseMap) -> PiecewiseMap {
        if self.is_empty() {
            return other.clone();
        }
        let rest = other.restrict(&other.dom().difference_unchecked(&self.dom()));
        let mut maps = self.maps.clone();
        maps.extend(rest.maps);
        Self::from_disjoint(self.dim, maps)
    }

    /// Inverse of an injective map.
    pub fn inverse(&self) -> SbgResult<PiecewiseMap> {
        let maps = self.maps.iter()
            .map(|m| m.inverse())
            .collect::<SbgResult<Vec<_>>>()?;
        PiecewiseMap::new(self.dim, maps).map_err(|e| match e.malformed_kind() {
            Some(MalformedKind::OverlappingDomains) => malformed(
                MalformedKind::NonInvertible,
                format!("{} is not injective", self),
            ),
            _ => e,
        })
    }

    /// Evaluate at a point of the domain.
    pub fn eval(&self, point: &[i64]) -> Option<Vec<i64>> {
        self.maps.iter().find_map(|m| m.eval(point))
    }

    /// Domain points mapped to themselves.
    pub fn fixed_points(&self) -> Set {
        Set::from_disjoint(self.dim, self.maps.iter().map(|m| m.fixed_points()).collect())
    }

    pub fn is_identity(&self) -> bool {
        self.fixed_points() == self.dom()
    }

    /// Merge atoms sharing an expression so the atom count stays minimal.
    pub fn normalize(&self) -> PiecewiseMap {
        let mut groups: Vec<(LinearExpression, Vec<MultiInterval>)> = Vec::new();
        for map in &self.maps {
            match groups.iter_mut().find(|(exp, _)| exp == map.exp()) {
                Some((_, doms)) => doms.push(map.dom().clone()),
                None => groups.push((map.exp().clone(), vec![map.dom().clone()])),
            }
        }
        let mut maps = Vec::with_capacity(self.maps.len());
        for (exp, doms) in groups {
            let dom = Set::from_disjoint(self.dim, doms);
            for atom in dom.atoms() {
                maps.push(AtomicMap::from_parts_unchecked(atom.clone(), exp.clone()));
            }
        }
        maps.sort_by(|a, b| a.dom().cmp(b.dom()));
        Self { dim: self.dim, maps }
    }
}

impl From<AtomicMap> for PiecewiseMap {
    fn from(map: AtomicMap) -> Self {
        let dim = map.dim();
        Self::from_disjoint(dim, vec![map])
    }
}

/// Two expressions agree on every point of `dom`.
fn agree_on(dom: &MultiInterval, f: &LinearExpression, g: &LinearExpression) -> bool {
    dom.intervals().iter().zip(f.terms.iter().zip(&g.terms)).all(|(i, (a, b))| {
        a == b || (i.is_singleton() && a.apply_int(i.begin()) == b.apply_int(i.begin()))
    })
}

/// Semantic equality: same domain, same value at every point.
impl PartialEq for PiecewiseMap {
    fn eq(&self, other: &Self) -> bool {
        if self.dim != other.dim || self.dom() != other.dom() {
            return false;
        }
        self.maps.iter().all(|a| {
            other.maps.iter().all(|b| {
                let common = a.dom().intersection(b.dom());
                common.is_empty() || agree_on(&common, a.exp(), b.exp())
            })
        })
    }
}

impl Eq for PiecewiseMap {}

impl fmt::Display for PiecewiseMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<<")?;
        for (i, map) in self.maps.iter().enumerate() {
            if i > 0 { write!(f, "; ")?; }
            write!(f, "{}", map)?;
        }
        write!(f, ">>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::expr::LinearTerm;
    use crate::algebra::interval::Interval;

    fn set(b: i64, s: i64, e: i64) -> Set {
        Set::from_interval(Interval::new(b, s, e).unwrap())
    }

    fn shift(b: i64, e: i64, offset: i64) -> PiecewiseMap {
        PiecewiseMap::affine(&set(b, 1, e), &LinearExpression::shift(&[offset])).unwrap()
    }

    #[test]
    fn test_overlapping_domains_rejected() {
        let a = AtomicMap::identity(MultiInterval::from(Interval::range(0, 5)));
        let b = AtomicMap::identity(MultiInterval::from(Interval::range(5, 9)));
        let err = PiecewiseMap::new(1, vec![a, b]).unwrap_err();
        assert_eq!(err.malformed_kind(), Some(MalformedKind::OverlappingDomains));
    }

    #[test]
    fn test_image_and_pre_image() {
        let m = shift(0, 9, 10).combine(&shift(20, 29, -20)).unwrap();
        assert_eq!(m.image(&set(5, 1, 25)).unwrap(), set(0, 1, 5).union(&set(15, 1, 19)).unwrap());
        assert_eq!(m.pre_image(&set(0, 1, 12)).unwrap(), set(0, 1, 2).union(&set(20, 1, 29)).unwrap());
    }

    #[test]
    fn test_compose() {
        let f = shift(0, 100, 1);
        let g = PiecewiseMap::affine(&set(0, 1, 10), &LinearExpression::new(vec![LinearTerm::int(2, 0)])).unwrap();
        let fg = f.compose(&g).unwrap();
        assert_eq!(fg.eval(&[3]), Some(vec![7]));
        assert_eq!(fg.dom(), set(0, 1, 10));
        assert_eq!(fg.image_of_domain().unwrap(), f.image(&g.image_of_domain().unwrap()).unwrap());
    }

    #[test]
    fn test_combine_priority() {
        let a = shift(0, 4, 100);
        let b = shift(0, 9, 200);
        let c = a.combine(&b).unwrap();
        assert_eq!(c.eval(&[2]), Some(vec![102]));
        assert_eq!(c.eval(&[7]), Some(vec![207]));
        assert_eq!(c.dom(), set(0, 1, 9));
    }

    #[test]
    fn test_combine_dimension_mismatch() {
        let line = shift(0, 4, 1);
        let plane = PiecewiseMap::identity(&Set::from_atom(MultiInterval::point(&[1, 2])));
        let err = line.combine(&plane).unwrap_err();
        assert_eq!(err.malformed_kind(), Some(MalformedKind::DimensionMismatch));
    }

    #[test]
    fn test_inverse() {
        let m = shift(0, 9, 5);
        let inv = m.inverse().unwrap();
        assert!(inv.compose(&m).unwrap().is_identity());

        let collide = shift(0, 4, 10).combine(&shift(5, 9, 5)).unwrap();
        assert_eq!(
            collide.inverse().unwrap_err().malformed_kind(),
            Some(MalformedKind::NonInvertible)
        );
    }

    #[test]
    fn test_semantic_equality() {
        let split = shift(0, 4, 1).combine(&shift(5, 9, 1)).unwrap();
        let whole = shift(0, 9, 1);
        assert_eq!(split, whole);
        assert_eq!(split.normalize().maps().len(), 1);
        assert_ne!(whole, shift(0, 9, 2));

        let constant_point = PiecewiseMap::constant(&set(3, 1, 3), &[4]).unwrap();
        assert_eq!(constant_point, shift(3, 3, 1));
    }
}
