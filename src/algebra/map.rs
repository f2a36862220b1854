//! Atomic maps: a linear expression restricted to one multi-interval domain.

use crate::algebra::expr::{LinearExpression, LinearTerm};
use crate::algebra::interval::Interval;
use crate::algebra::multi_interval::MultiInterval;
use crate::utils::errors::{malformed, MalformedKind, SbgResult};
use num_rational::Rational64;
use num_traits::{One, Signed};
use serde::{Serialize, Deserialize};
use std::fmt;

/// An affine map over a single atom.
///
/// The image of the domain always lies on integer coordinates; constructors
/// reject expressions that would leave the integer lattice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicMap {
    dom: MultiInterval,
    exp: LinearExpression,
}

impl AtomicMap {
    pub fn new(dom: MultiInterval, exp: LinearExpression) -> SbgResult<Self> {
        check_dims(&dom, &exp)?;
        let map = Self { dom, exp };
        map.image_of_domain()?;
        Ok(map)
    }

    /// Identity over `dom`.
    pub fn identity(dom: MultiInterval) -> Self {
        let exp = LinearExpression::identity(dom.dim());
        Self { dom, exp }
    }

    pub(crate) fn from_parts_unchecked(dom: MultiInterval, exp: LinearExpression) -> Self {
        debug_assert_eq!(dom.dim(), exp.dim());
        Self { dom, exp }
    }

    pub fn dom(&self) -> &MultiInterval {
        &self.dom
    }

    pub fn exp(&self) -> &LinearExpression {
        &self.exp
    }

    pub fn dim(&self) -> usize {
        self.dom.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.dom.is_empty()
    }

    /// Image of `subset ∩ dom`.
    pub fn image(&self, subset: &MultiInterval) -> SbgResult<MultiInterval> {
        check_dims(subset, &self.exp)?;
        let cap = self.dom.intersection(subset);
        if cap.is_empty() {
            return Ok(MultiInterval::empty(self.dim()));
        }
        let intervals = cap.intervals().iter()
            .zip(&self.exp.terms)
            .map(|(i, t)| map_interval(t, i))
            .collect::<SbgResult<Vec<_>>>()?;
        Ok(MultiInterval::new(intervals))
    }

    pub fn image_of_domain(&self) -> SbgResult<MultiInterval> {
        self.image(&self.dom)
    }

    /// Points of the domain whose image lies in `subcodomain`.
    pub fn pre_image(&self, subcodomain: &MultiInterval) -> SbgResult<MultiInterval> {
        check_dims(subcodomain, &self.exp)?;
        let hit = self.image_of_domain()?.intersection(subcodomain);
        if hit.is_empty() {
            return Ok(MultiInterval::empty(self.dim()));
        }
        let mut intervals = Vec::with_capacity(self.dim());
        for (d, term) in self.exp.terms.iter().enumerate() {
            let back = if term.is_constant() {
                *self.dom.interval(d)
            } else {
                map_interval(&term.inverse()?, hit.interval(d))?
            };
            intervals.push(back.intersection(self.dom.interval(d)));
        }
        Ok(MultiInterval::new(intervals))
    }

    /// Restrict the domain to `subset`.
    pub fn restrict(&self, subset: &MultiInterval) -> AtomicMap {
        Self { dom: self.dom.intersection(subset), exp: self.exp.clone() }
    }

    /// `self ∘ inner`, defined where `inner` lands inside `self`'s domain.
    pub fn compose(&self, inner: &AtomicMap) -> SbgResult<Option<AtomicMap>> {
        let dom = inner.pre_image(&self.dom)?;
        if dom.is_empty() {
            return Ok(None);
        }
        let exp = self.exp.compose(&inner.exp)?;
        Ok(Some(Self { dom, exp }))
    }

    /// Inverse map from the image back to the domain.
    ///
    /// A constant coordinate is invertible only when its domain coordinate is a
    /// single point.
    pub fn inverse(&self) -> SbgResult<AtomicMap> {
        let image = self.image_of_domain()?;
        let mut terms = Vec::with_capacity(self.dim());
        for (d, term) in self.exp.terms.iter().enumerate() {
            if term.is_constant() {
                let coord = self.dom.interval(d);
                if !coord.is_singleton() {
                    return Err(malformed(
                        MalformedKind::NonInvertible,
                        format!("{} collapses {} in dimension {}", self, coord, d),
                    ));
                }
                terms.push(LinearTerm::constant(coord.begin()));
            } else {
                terms.push(term.inverse()?);
            }
        }
        Ok(Self { dom: image, exp: LinearExpression::new(terms) })
    }

    /// Evaluate at a domain point.
    pub fn eval(&self, point: &[i64]) -> Option<Vec<i64>> {
        if !self.dom.is_member(point) {
            return None;
        }
        Some(self.exp.apply(point).into_iter().map(|v| v.to_integer()).collect())
    }

    /// Sub-atom of the domain where the map is the identity.
    pub fn fixed_points(&self) -> MultiInterval {
        let intervals = self.dom.intervals().iter()
            .zip(&self.exp.terms)
            .map(|(i, t)| fixed_points_of(t, i))
            .collect();
        MultiInterval::new(intervals)
    }

    /// Whether every domain point is mapped to itself.
    pub fn is_identity(&self) -> bool {
        !self.is_empty() && self.fixed_points() == self.dom
    }
}

fn check_dims(dom: &MultiInterval, exp: &LinearExpression) -> SbgResult<()> {
    if dom.dim() != exp.dim() {
        return Err(malformed(
            MalformedKind::DimensionMismatch,
            format!("{}-dimensional atom under {}-dimensional expression {}", dom.dim(), exp.dim(), exp),
        ));
    }
    Ok(())
}

fn integral(value: Rational64, context: &dyn Fn() -> String) -> SbgResult<i64> {
    if value.is_integer() {
        Ok(value.to_integer())
    } else {
        Err(malformed(
            MalformedKind::NonIntegralImage,
            format!("{} is not an integer in {}", value, context()),
        ))
    }
}

/// Apply one term to one interval coordinate.
pub(crate) fn map_interval(term: &LinearTerm, interval: &Interval) -> SbgResult<Interval> {
    if interval.is_empty() {
        return Ok(Interval::empty());
    }
    let context = || format!("{} applied to {}", term, interval);
    if term.is_constant() || interval.is_singleton() {
        let value = integral(term.apply_int(interval.begin()), &context)?;
        return Ok(Interval::singleton(value));
    }
    let begin = integral(term.apply_int(interval.begin()), &context)?;
    let end = integral(term.apply_int(interval.end()), &context)?;
    let step = integral(term.slope * Rational64::from_integer(interval.step()), &context)?;
    if term.slope.is_negative() {
        Interval::new(end, -step, begin)
    } else {
        Interval::new(begin, step, end)
    }
}

fn fixed_points_of(term: &LinearTerm, interval: &Interval) -> Interval {
    if term.is_identity() {
        return *interval;
    }
    if term.slope.is_one() {
        return Interval::empty();
    }
    // slope*x + offset = x  <=>  x = offset / (1 - slope)
    let x = term.offset / (Rational64::one() - term.slope);
    if x.is_integer() && interval.is_member(x.to_integer()) {
        Interval::singleton(x.to_integer())
    } else {
        Interval::empty()
    }
}

impl fmt::Display for AtomicMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.dom, self.exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    fn mi(b: i64, s: i64, e: i64) -> MultiInterval {
        MultiInterval::from(Interval::new(b, s, e).unwrap())
    }

    fn map(b: i64, s: i64, e: i64, term: LinearTerm) -> AtomicMap {
        AtomicMap::new(mi(b, s, e), LinearExpression::new(vec![term])).unwrap()
    }

    #[test]
    fn test_image() {
        let m = map(0, 1, 10, LinearTerm::int(2, 1));
        assert_eq!(m.image(&mi(3, 1, 20)).unwrap(), mi(7, 2, 21));
        assert!(m.image(&mi(11, 1, 20)).unwrap().is_empty());

        let neg = map(0, 1, 4, LinearTerm::int(-1, 10));
        assert_eq!(neg.image_of_domain().unwrap(), mi(6, 1, 10));

        let constant = map(0, 1, 4, LinearTerm::constant(7));
        assert_eq!(constant.image_of_domain().unwrap(), mi(7, 1, 7));
    }

    #[test]
    fn test_non_integral_image_rejected() {
        let half = LinearTerm::new(Rational64::new(1, 2), Rational64::zero());
        let err = AtomicMap::new(mi(0, 1, 10), LinearExpression::new(vec![half])).unwrap_err();
        assert_eq!(err.malformed_kind(), Some(MalformedKind::NonIntegralImage));
        assert!(AtomicMap::new(mi(0, 2, 10), LinearExpression::new(vec![half])).is_ok());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = AtomicMap::new(mi(0, 1, 10), LinearExpression::identity(2)).unwrap_err();
        assert_eq!(err.malformed_kind(), Some(MalformedKind::DimensionMismatch));
    }

    #[test]
    fn test_pre_image() {
        let m = map(0, 1, 10, LinearTerm::int(2, 1));
        assert_eq!(m.pre_image(&mi(5, 1, 9)).unwrap(), mi(2, 1, 4));
        let constant = map(0, 1, 4, LinearTerm::constant(7));
        assert_eq!(constant.pre_image(&mi(0, 1, 10)).unwrap(), mi(0, 1, 4));
        assert!(constant.pre_image(&mi(0, 1, 6)).unwrap().is_empty());
    }

    #[test]
    fn test_compose_and_inverse() {
        let f = map(0, 1, 10, LinearTerm::int(1, 5));
        let inv = f.inverse().unwrap();
        let round_trip = inv.compose(&f).unwrap().unwrap();
        assert!(round_trip.is_identity());
        assert_eq!(round_trip.dom(), f.dom());

        let collapse = map(0, 1, 4, LinearTerm::constant(7));
        assert_eq!(
            collapse.inverse().unwrap_err().malformed_kind(),
            Some(MalformedKind::NonInvertible)
        );
        let point = map(3, 1, 3, LinearTerm::constant(7));
        assert_eq!(point.inverse().unwrap().eval(&[7]), Some(vec![3]));
    }

    #[test]
    fn test_fixed_points() {
        let m = map(0, 1, 10, LinearTerm::int(-1, 8));
        assert_eq!(m.fixed_points(), mi(4, 1, 4));
        let c = map(0, 1, 10, LinearTerm::constant(3));
        assert_eq!(c.fixed_points(), mi(3, 1, 3));
        assert!(map(0, 1, 10, LinearTerm::int(1, 1)).fixed_points().is_empty());
    }
}
