//! Error types for the set-based graph library.
//!
//! Errors fall into three categories, matching the ways a call into the core
//! can fail: a malformed algebraic value, an operation applied to a value that
//! does not support it, and a graph algorithm finding its input in violation of
//! the graph invariants.

use thiserror::Error;
use std::fmt;

/// Top-level error type for the library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SbgError {
    /// Ill-formed interval, map or dimensionality
    #[error("Malformed value: {0}")]
    Malformed(#[from] MalformedValue),

    /// Operation not defined for the given operand
    #[error("Unsupported operation: {0}")]
    Unsupported(#[from] UnsupportedOperation),

    /// The input graph broke one of its structural invariants
    #[error("Algorithm invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl SbgError {
    /// The malformed-value kind, if this is a malformed-value error.
    pub fn malformed_kind(&self) -> Option<MalformedKind> {
        match self {
            SbgError::Malformed(e) => Some(e.kind),
            _ => None,
        }
    }

    /// The invariant kind, if this is an invariant violation.
    pub fn invariant_kind(&self) -> Option<InvariantKind> {
        match self {
            SbgError::Invariant(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// A value that cannot exist: rejected at construction or application.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct MalformedValue {
    /// The error message
    pub message: String,
    /// The kind of malformation
    pub kind: MalformedKind,
}

impl MalformedValue {
    pub fn new(kind: MalformedKind, message: impl Into<String>) -> Self {
        Self { message: message.into(), kind }
    }
}

impl fmt::Display for MalformedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.message, self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// Interval step below zero
    NegativeStep,
    /// Zero step on a non-singleton interval
    DegenerateInterval,
    /// Affine image lands off integer coordinates
    NonIntegralImage,
    /// Operands disagree on the number of dimensions
    DimensionMismatch,
    /// Inversion of a map that is not injective
    NonInvertible,
    /// Piecewise map atoms with overlapping domains
    OverlappingDomains,
    /// Division by a zero slope
    ZeroDivisor,
    /// The two incidence maps of an edge disagree on their domain
    DomainMismatch,
    /// Coordinates too far apart to relabel inside `i64`
    CoordinateOverflow,
}

/// An operation applied to a value kind that does not define it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedOperation {
    /// Name of the operation
    pub operation: String,
    /// Description of the offending operand(s)
    pub operand: String,
}

impl UnsupportedOperation {
    pub fn new(operation: impl Into<String>, operand: impl Into<String>) -> Self {
        Self { operation: operation.into(), operand: operand.into() }
    }
}

impl fmt::Display for UnsupportedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is not defined for {}", self.operation, self.operand)
    }
}

/// A graph invariant found broken while an algorithm ran over it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// The error message
    pub message: String,
    /// Which invariant failed
    pub kind: InvariantKind,
}

impl InvariantViolation {
    pub fn new(kind: InvariantKind, message: impl Into<String>) -> Self {
        Self { message: message.into(), kind }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.message, self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantKind {
    /// No vertex owns the queried subset
    MissingOwner,
    /// An edge image leaves the union of vertex ranges
    UncoveredEdge,
    /// Two vertex ranges intersect
    OverlappingVertices,
    /// Two edge domains intersect
    OverlappingEdges,
    /// An edge does not join the matching side to its complement
    NotBipartite,
    /// A fixed-point iteration exceeded its round bound
    NonConvergence,
    /// A vertex or edge name is used twice
    DuplicateName,
    /// A directed algorithm was given an undirected graph or vice versa
    DirectionMismatch,
}

/// Shorthand for a malformed-value error.
pub(crate) fn malformed(kind: MalformedKind, message: impl Into<String>) -> SbgError {
    SbgError::Malformed(MalformedValue::new(kind, message))
}

/// Shorthand for an invariant violation.
pub(crate) fn violation(kind: InvariantKind, message: impl Into<String>) -> SbgError {
    SbgError::Invariant(InvariantViolation::new(kind, message))
}

/// Result type using SbgError.
pub type SbgResult<T> = Result<T, SbgError>;
