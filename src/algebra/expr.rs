//! Per-dimension affine expressions with rational coefficients.
//!
//! A linear expression maps `x = (x0, ..., xn)` to `(m0*x0 + h0, ..., mn*xn + hn)`:
//! every dimension is transformed independently.

use crate::utils::errors::{malformed, MalformedKind, SbgResult};
use num_rational::Rational64;
use num_traits::{One, Zero};
use serde::{Serialize, Deserialize};
use std::fmt;

/// One dimension of a linear expression: `slope * x + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinearTerm {
    pub slope: Rational64,
    pub offset: Rational64,
}

impl LinearTerm {
    pub fn new(slope: Rational64, offset: Rational64) -> Self {
        Self { slope, offset }
    }

    /// Integer slope and offset.
    pub fn int(slope: i64, offset: i64) -> Self {
        Self::new(Rational64::from_integer(slope), Rational64::from_integer(offset))
    }

    pub fn identity() -> Self {
        Self::new(Rational64::one(), Rational64::zero())
    }

    pub fn constant(value: i64) -> Self {
        Self::new(Rational64::zero(), Rational64::from_integer(value))
    }

    pub fn is_identity(&self) -> bool {
        self.slope.is_one() && self.offset.is_zero()
    }

    pub fn is_constant(&self) -> bool {
        self.slope.is_zero()
    }

    pub fn apply(&self, x: Rational64) -> Rational64 {
        self.slope * x + self.offset
    }

    pub fn apply_int(&self, x: i64) -> Rational64 {
        self.apply(Rational64::from_integer(x))
    }

    /// `self ∘ inner`.
    pub fn compose(&self, inner: &LinearTerm) -> LinearTerm {
        LinearTerm {
            slope: self.slope * inner.slope,
            offset: self.slope * inner.offset + self.offset,
        }
    }

    pub fn inverse(&self) -> SbgResult<LinearTerm> {
        if self.slope.is_zero() {
            return Err(malformed(
                MalformedKind::ZeroDivisor,
                format!("cannot invert constant term {}", self),
            ));
        }
        let slope = self.slope.recip();
        Ok(LinearTerm { slope, offset: -self.offset * slope })
    }
}

impl fmt::Display for LinearTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.slope.is_zero() {
            return write!(f, "{}", self.offset);
        }
        if self.slope.is_one() {
            write!(f, "x")?;
        } else {
            write!(f, "{}*x", self.slope)?;
        }
        if self.offset > Rational64::zero() {
            write!(f, "+{}", self.offset)?;
        } else if self.offset < Rational64::zero() {
            write!(f, "{}", self.offset)?;
        }
        Ok(())
    }
}

/// A linear expression: one term per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinearExpression {
    pub terms: Vec<LinearTerm>,
}

impl LinearExpression {
    pub fn new(terms: Vec<LinearTerm>) -> Self {
        Self { terms }
    }

    /// Build from parallel slope and offset vectors.
    pub fn from_parts(slopes: &[Rational64], offsets: &[Rational64]) -> SbgResult<Self> {
        if slopes.len() != offsets.len() {
            return Err(malformed(
                MalformedKind::DimensionMismatch,
                format!("{} slopes but {} offsets", slopes.len(), offsets.len()),
            ));
        }
        Ok(Self::new(slopes.iter().zip(offsets).map(|(&m, &h)| LinearTerm::new(m, h)).collect()))
    }

    pub fn identity(dim: usize) -> Self {
        Self::new(vec![LinearTerm::identity(); dim])
    }

    /// Constant expression mapping everything to `point`.
    pub fn constant(point: &[i64]) -> Self {
        Self::new(point.iter().map(|&x| LinearTerm::constant(x)).collect())
    }

    /// Integer offsets on top of the identity: `x -> x + offset`.
    pub fn shift(offsets: &[i64]) -> Self {
        Self::new(offsets.iter().map(|&h| LinearTerm::int(1, h)).collect())
    }

    pub fn dim(&self) -> usize {
        self.terms.len()
    }

    pub fn term(&self, dim: usize) -> &LinearTerm {
        &self.terms[dim]
    }

    pub fn is_identity(&self) -> bool {
        self.terms.iter().all(|t| t.is_identity())
    }

    pub fn apply(&self, point: &[i64]) -> Vec<Rational64> {
        self.terms.iter().zip(point).map(|(t, &x)| t.apply_int(x)).collect()
    }

    /// `self ∘ inner`.
    pub fn compose(&self, inner: &LinearExpression) -> SbgResult<LinearExpression> {
        if self.dim() != inner.dim() {
            return Err(malformed(
                MalformedKind::DimensionMismatch,
                format!("cannot compose {}-dimensional with {}-dimensional expression", self.dim(), inner.dim()),
            ));
        }
        Ok(Self::new(self.terms.iter().zip(&inner.terms).map(|(f, g)| f.compose(g)).collect()))
    }

    pub fn inverse(&self) -> SbgResult<LinearExpression> {
        let terms = self.terms.iter().map(|t| t.inverse()).collect::<SbgResult<Vec<_>>>()?;
        Ok(Self::new(terms))
    }
}

impl fmt::Display for LinearExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{}", term)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i64, d: i64) -> Rational64 {
        Rational64::new(n, d)
    }

    #[test]
    fn test_compose() {
        let f = LinearTerm::int(2, 3);
        let g = LinearTerm::int(5, -1);
        let fg = f.compose(&g);
        assert_eq!(fg.slope, r(10, 1));
        assert_eq!(fg.offset, r(1, 1));
        assert_eq!(fg.apply_int(4), f.apply(g.apply_int(4)));
    }

    #[test]
    fn test_inverse() {
        let f = LinearTerm::new(r(3, 2), r(1, 2));
        let inv = f.inverse().unwrap();
        assert!(f.compose(&inv).is_identity());
        assert!(inv.compose(&f).is_identity());
        assert_eq!(
            LinearTerm::constant(4).inverse().unwrap_err().malformed_kind(),
            Some(MalformedKind::ZeroDivisor)
        );
    }

    #[test]
    fn test_expression_dims() {
        let a = LinearExpression::shift(&[1, 2]);
        let b = LinearExpression::identity(3);
        assert!(a.compose(&b).is_err());
        assert_eq!(a.apply(&[0, 0]), vec![r(1, 1), r(2, 1)]);
    }

    #[test]
    fn test_display() {
        assert_eq!(LinearTerm::int(2, -1).to_string(), "2*x-1");
        assert_eq!(LinearTerm::identity().to_string(), "x");
        assert_eq!(LinearTerm::constant(7).to_string(), "7");
    }
}
