//! Values a front end computes with.

use crate::algebra::{AtomicMap, Interval, LinearExpression, MultiInterval, PiecewiseMap, Set};
use num_rational::Rational64;
use serde::{Serialize, Deserialize};
use std::fmt;

/// Any value an expression can evaluate to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Rational(Rational64),
    Bool(bool),
    Interval(Interval),
    MultiInterval(MultiInterval),
    Set(Set),
    LinearExpression(LinearExpression),
    AtomicMap(AtomicMap),
    PiecewiseMap(PiecewiseMap),
}

impl Value {
    /// Short name of the value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "an integer",
            Value::Rational(_) => "a rational",
            Value::Bool(_) => "a boolean",
            Value::Interval(_) => "an interval",
            Value::MultiInterval(_) => "a multi-interval",
            Value::Set(_) => "a set",
            Value::LinearExpression(_) => "a linear expression",
            Value::AtomicMap(_) => "an atomic map",
            Value::PiecewiseMap(_) => "a piecewise map",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Rational(_) | Value::Bool(_))
    }

    /// The value as a set, for intervals, multi-intervals and sets.
    pub fn as_set(&self) -> Option<Set> {
        match self {
            Value::Interval(i) => Some(Set::from_interval(*i)),
            Value::MultiInterval(mi) => Some(Set::from_atom(mi.clone())),
            Value::Set(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Rational(r) => write!(f, "{}", r),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Interval(i) => write!(f, "{}", i),
            Value::MultiInterval(mi) => write!(f, "{}", mi),
            Value::Set(s) => write!(f, "{}", s),
            Value::LinearExpression(e) => write!(f, "{}", e),
            Value::AtomicMap(m) => write!(f, "{}", m),
            Value::PiecewiseMap(m) => write!(f, "{}", m),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self { Value::Int(n) }
}

impl From<Rational64> for Value {
    fn from(r: Rational64) -> Self { Value::Rational(r) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<Interval> for Value {
    fn from(i: Interval) -> Self { Value::Interval(i) }
}

impl From<MultiInterval> for Value {
    fn from(mi: MultiInterval) -> Self { Value::MultiInterval(mi) }
}

impl From<Set> for Value {
    fn from(s: Set) -> Self { Value::Set(s) }
}

impl From<LinearExpression> for Value {
    fn from(e: LinearExpression) -> Self { Value::LinearExpression(e) }
}

impl From<AtomicMap> for Value {
    fn from(m: AtomicMap) -> Self { Value::AtomicMap(m) }
}

impl From<PiecewiseMap> for Value {
    fn from(m: PiecewiseMap) -> Self { Value::PiecewiseMap(m) }
}
