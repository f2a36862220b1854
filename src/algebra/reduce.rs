//! Whole-set reductions over piecewise maps.
//!
//! These are the primitives the graph algorithms iterate with:
//! - [`compare`]: split a common domain into the regions where one map is
//!   lexicographically below, equal to, or above another
//! - [`lexmin`]: pointwise lexicographic minimum of two maps
//! - [`min_adjacent`]: for every point `y` of a map's image, the minimum of a
//!   weight over the fibre `map⁻¹(y)`, together with the point achieving it
//!
//! Every operation works atom by atom; cost depends on the number of atoms,
//! never on the number of points they represent.

use crate::algebra::expr::{LinearExpression, LinearTerm};
use crate::algebra::interval::Interval;
use crate::algebra::map::AtomicMap;
use crate::algebra::multi_interval::MultiInterval;
use crate::algebra::pw_map::PiecewiseMap;
use crate::algebra::set::Set;
use crate::utils::errors::{malformed, MalformedKind, SbgResult};
use num_rational::Rational64;
use num_traits::{Signed, Zero};
use std::cmp::Ordering;

/// Regions of a common domain, by lexicographic comparison of two maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub less: Set,
    pub equal: Set,
    pub greater: Set,
}

fn same_dim(f: &PiecewiseMap, g: &PiecewiseMap, operation: &str) -> SbgResult<()> {
    if f.dim() != g.dim() {
        return Err(malformed(
            MalformedKind::DimensionMismatch,
            format!("{} of {}-dimensional {} and {}-dimensional {}", operation, f.dim(), f, g.dim(), g),
        ));
    }
    Ok(())
}

/// Compare `f` and `g` pointwise on the intersection of their domains.
pub fn compare(f: &PiecewiseMap, g: &PiecewiseMap) -> SbgResult<Comparison> {
    same_dim(f, g, "comparison")?;
    let (mut less, mut equal, mut greater) = (Vec::new(), Vec::new(), Vec::new());
    for a in f.maps() {
        for b in g.maps() {
            let common = a.dom().intersection(b.dom());
            if common.is_empty() {
                continue;
            }
            let split = compare_on(&common, a.exp(), b.exp());
            less.extend(split.0);
            equal.extend(split.1);
            greater.extend(split.2);
        }
    }
    let dim = f.dim();
    Ok(Comparison {
        less: Set::from_disjoint(dim, less),
        equal: Set::from_disjoint(dim, equal),
        greater: Set::from_disjoint(dim, greater),
    })
}

/// Split `interval` into the members where `a*x + b` is negative, zero, positive.
fn split_by_sign(interval: &Interval, a: Rational64, b: Rational64) -> (Interval, Interval, Interval) {
    let none = Interval::empty();
    if interval.is_empty() {
        return (none, none, none);
    }
    if a.is_zero() {
        return match b.cmp(&Rational64::zero()) {
            Ordering::Less => (*interval, none, none),
            Ordering::Equal => (none, *interval, none),
            Ordering::Greater => (none, none, *interval),
        };
    }
    let root = -b / a;
    let (below_hi, above_lo) = if root.is_integer() {
        (root.to_integer() - 1, root.to_integer() + 1)
    } else {
        (root.floor().to_integer(), root.ceil().to_integer())
    };
    let below = interval.clamp(i64::MIN, below_hi);
    let above = interval.clamp(above_lo, i64::MAX);
    let at = if root.is_integer() && interval.is_member(root.to_integer()) {
        Interval::singleton(root.to_integer())
    } else {
        none
    };
    if a.is_positive() {
        (below, at, above)
    } else {
        (above, at, below)
    }
}

/// Lexicographic comparison of two expressions over one atom.
fn compare_on(
    dom: &MultiInterval,
    f: &LinearExpression,
    g: &LinearExpression,
) -> (Vec<MultiInterval>, Vec<MultiInterval>, Vec<MultiInterval>) {
    let (mut less, mut greater) = (Vec::new(), Vec::new());
    let mut prefix = dom.clone();
    for d in 0..dom.dim() {
        let (fd, gd) = (f.term(d), g.term(d));
        let (lt, eq, gt) = split_by_sign(prefix.interval(d), fd.slope - gd.slope, fd.offset - gd.offset);
        let lt = prefix.with_interval(d, lt);
        let gt = prefix.with_interval(d, gt);
        if !lt.is_empty() { less.push(lt); }
        if !gt.is_empty() { greater.push(gt); }
        prefix = prefix.with_interval(d, eq);
        if prefix.is_empty() {
            return (less, Vec::new(), greater);
        }
    }
    (less, vec![prefix], greater)
}

/// A value/argument pair over one atom, tagged with where it came from.
#[derive(Debug, Clone)]
struct Candidate {
    dom: MultiInterval,
    value: LinearExpression,
    arg: LinearExpression,
    challenger: bool,
}

/// Insert `c` into disjoint candidates, keeping the strictly smaller value on overlaps.
fn insert_min(acc: Vec<Candidate>, c: Candidate) -> Vec<Candidate> {
    let mut next = Vec::with_capacity(acc.len() + 1);
    let mut uncovered = vec![c.dom.clone()];
    for r in acc {
        let common = r.dom.intersection(&c.dom);
        if common.is_empty() {
            next.push(r);
            continue;
        }
        for piece in r.dom.difference(&c.dom) {
            next.push(Candidate { dom: piece, ..r.clone() });
        }
        let (less, equal, greater) = compare_on(&common, &c.value, &r.value);
        for piece in less {
            next.push(Candidate { dom: piece, ..c.clone() });
        }
        for piece in equal.into_iter().chain(greater) {
            next.push(Candidate { dom: piece, ..r.clone() });
        }
        uncovered = uncovered.iter().flat_map(|u| u.difference(&common)).collect();
    }
    for piece in uncovered {
        next.push(Candidate { dom: piece, ..c.clone() });
    }
    next
}

fn value_map(dim: usize, candidates: &[Candidate]) -> PiecewiseMap {
    let maps = candidates.iter()
        .map(|c| AtomicMap::from_parts_unchecked(c.dom.clone(), c.value.clone()))
        .collect();
    PiecewiseMap::from_disjoint(dim, maps).normalize()
}

fn arg_map(dim: usize, candidates: &[Candidate]) -> PiecewiseMap {
    let maps = candidates.iter()
        .map(|c| AtomicMap::from_parts_unchecked(c.dom.clone(), c.arg.clone()))
        .collect();
    PiecewiseMap::from_disjoint(dim, maps).normalize()
}

/// Result of [`lexmin`].
#[derive(Debug, Clone)]
pub struct LexMin {
    /// Pointwise minimum over the union of both domains
    pub map: PiecewiseMap,
    /// Where the challenger was strictly smaller (or the base undefined)
    pub improved: Set,
}

/// Pointwise lexicographic minimum; ties keep `base`.
pub fn lexmin(base: &PiecewiseMap, challenger: &PiecewiseMap) -> SbgResult<LexMin> {
    same_dim(base, challenger, "lexicographic minimum")?;
    let dim = base.dim();
    let mut acc: Vec<Candidate> = base.maps().iter()
        .map(|m| Candidate {
            dom: m.dom().clone(),
            value: m.exp().clone(),
            arg: m.exp().clone(),
            challenger: false,
        })
        .collect();
    for m in challenger.maps() {
        acc = insert_min(acc, Candidate {
            dom: m.dom().clone(),
            value: m.exp().clone(),
            arg: m.exp().clone(),
            challenger: true,
        });
    }
    let improved = acc.iter().filter(|c| c.challenger).map(|c| c.dom.clone()).collect();
    Ok(LexMin {
        map: value_map(dim, &acc),
        improved: Set::from_disjoint(dim, improved),
    })
}

/// Result of [`min_adjacent`].
#[derive(Debug, Clone)]
pub struct MinAdjacency {
    /// `y -> min { weight(x) : map(x) = y }`
    pub value: PiecewiseMap,
    /// `y ->` the `x` achieving that minimum
    pub arg: PiecewiseMap,
}

/// Minimum of `weight` over each fibre of `map`.
///
/// Coordinates where an atom of `map` has a non-zero slope determine `x` from
/// `y` uniquely; constant coordinates leave `x` free over the atom, and since
/// every coordinate of `weight` depends only on its own coordinate of `x`, the
/// lexicographic minimum is reached coordinate by coordinate at an interval end.
pub fn min_adjacent(map: &PiecewiseMap, weight: &PiecewiseMap) -> SbgResult<MinAdjacency> {
    same_dim(map, weight, "adjacent minimum")?;
    let dim = map.dim();
    let mut acc = Vec::new();
    for a in map.maps() {
        for w in weight.maps() {
            let overlap = a.dom().intersection(w.dom());
            if overlap.is_empty() {
                continue;
            }
            let ys = a.image(&overlap)?;
            let mut value = Vec::with_capacity(dim);
            let mut arg = Vec::with_capacity(dim);
            for d in 0..dim {
                let (at, wt) = (a.exp().term(d), w.exp().term(d));
                if at.is_constant() {
                    let coord = overlap.interval(d);
                    let x = if wt.slope.is_negative() { coord.end() } else { coord.begin() };
                    value.push(LinearTerm::new(Rational64::zero(), wt.apply_int(x)));
                    arg.push(LinearTerm::constant(x));
                } else {
                    let inv = at.inverse()?;
                    value.push(wt.compose(&inv));
                    arg.push(inv);
                }
            }
            acc = insert_min(acc, Candidate {
                dom: ys,
                value: LinearExpression::new(value),
                arg: LinearExpression::new(arg),
                challenger: false,
            });
        }
    }
    Ok(MinAdjacency {
        value: value_map(dim, &acc),
        arg: arg_map(dim, &acc),
    })
}

/// `y -> min { x : map(x) = y }`.
pub fn min_inverse(map: &PiecewiseMap) -> SbgResult<PiecewiseMap> {
    Ok(min_adjacent(map, &PiecewiseMap::identity(&map.dom()))?.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(b: i64, s: i64, e: i64) -> Set {
        Set::from_interval(Interval::new(b, s, e).unwrap())
    }

    fn affine(dom: &Set, slope: i64, offset: i64) -> PiecewiseMap {
        PiecewiseMap::affine(dom, &LinearExpression::new(vec![LinearTerm::int(slope, offset)])).unwrap()
    }

    #[test]
    fn test_split_by_sign() {
        let iv = Interval::range(0, 10);
        let (neg, zero, pos) = split_by_sign(&iv, Rational64::from_integer(2), Rational64::from_integer(-8));
        assert_eq!(neg, Interval::range(0, 3));
        assert_eq!(zero, Interval::singleton(4));
        assert_eq!(pos, Interval::range(5, 10));

        let (neg, zero, pos) = split_by_sign(&iv, Rational64::new(-1, 1), Rational64::new(7, 2));
        assert_eq!(neg, Interval::range(4, 10));
        assert!(zero.is_empty());
        assert_eq!(pos, Interval::range(0, 3));
    }

    #[test]
    fn test_compare() {
        let dom = set(0, 1, 10);
        let f = affine(&dom, 1, 0);
        let g = affine(&dom, -1, 10);
        let cmp = compare(&f, &g).unwrap();
        assert_eq!(cmp.less, set(0, 1, 4));
        assert_eq!(cmp.equal, set(5, 1, 5));
        assert_eq!(cmp.greater, set(6, 1, 10));
    }

    #[test]
    fn test_lexmin() {
        let f = affine(&set(0, 1, 10), 1, 0);
        let g = affine(&set(5, 1, 15), 0, 7);
        let m = lexmin(&f, &g).unwrap();
        assert_eq!(m.map.eval(&[3]), Some(vec![3]));
        assert_eq!(m.map.eval(&[7]), Some(vec![7]));
        assert_eq!(m.map.eval(&[9]), Some(vec![7]));
        assert_eq!(m.map.eval(&[14]), Some(vec![7]));
        assert_eq!(m.improved, set(8, 1, 15));
    }

    #[test]
    fn test_min_adjacent_over_constant_fibre() {
        // Ten edges all ending at vertex 100; weight of edge x is 20 - x.
        let edges = set(0, 1, 9);
        let target = PiecewiseMap::constant(&edges, &[100]).unwrap();
        let weight = affine(&edges, -1, 20);
        let adj = min_adjacent(&target, &weight).unwrap();
        assert_eq!(adj.value.eval(&[100]), Some(vec![11]));
        assert_eq!(adj.arg.eval(&[100]), Some(vec![9]));
    }

    #[test]
    fn test_min_adjacent_picks_smaller_of_two_edges() {
        // Edge families x -> x and x -> x - 1 over vertices; weights are the edge ids.
        let a = affine(&set(0, 1, 4), 1, 0);
        let b = affine(&set(10, 1, 14), 1, -9);
        let map = a.combine(&b).unwrap();
        let weight = PiecewiseMap::identity(&set(0, 1, 4).union(&set(10, 1, 14)).unwrap());
        let adj = min_adjacent(&map, &weight).unwrap();
        // Vertex 3 is hit by edge 3 and edge 12.
        assert_eq!(adj.value.eval(&[3]), Some(vec![3]));
        // Vertex 5 only by edge 14.
        assert_eq!(adj.value.eval(&[5]), Some(vec![14]));
        assert_eq!(adj.arg.eval(&[5]), Some(vec![14]));
    }

    #[test]
    fn test_min_inverse() {
        let map = affine(&set(0, 1, 9), 0, 4).combine(&affine(&set(10, 1, 12), 1, -8)).unwrap();
        let inv = min_inverse(&map).unwrap();
        assert_eq!(inv.eval(&[4]), Some(vec![0]));
        assert_eq!(inv.eval(&[2]), Some(vec![10]));
    }

    #[test]
    fn test_dimension_mismatch_is_malformed() {
        let line = affine(&set(0, 1, 4), 1, 0);
        let plane = PiecewiseMap::identity(&Set::from_atom(MultiInterval::point(&[1, 2])));
        let kind = Some(MalformedKind::DimensionMismatch);
        assert_eq!(compare(&line, &plane).unwrap_err().malformed_kind(), kind);
        assert_eq!(lexmin(&line, &plane).unwrap_err().malformed_kind(), kind);
        assert_eq!(min_adjacent(&line, &plane).unwrap_err().malformed_kind(), kind);
    }
}
