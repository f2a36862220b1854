//! Set-based algebra.
//!
//! Layered bottom-up: scalar [`Interval`]s, their Cartesian products
//! ([`MultiInterval`]), unions of disjoint products ([`Set`]), per-dimension
//! affine expressions and the maps built from them ([`AtomicMap`],
//! [`PiecewiseMap`]). The [`reduce`] module adds the whole-set reductions used
//! by the graph algorithms.

pub mod interval;
pub mod multi_interval;
pub mod set;
pub mod expr;
pub mod map;
pub mod pw_map;
pub mod reduce;

pub use interval::Interval;
pub use multi_interval::MultiInterval;
pub use set::Set;
pub use expr::{LinearExpression, LinearTerm};
pub use map::AtomicMap;
pub use pw_map::PiecewiseMap;
pub use reduce::{compare, lexmin, min_adjacent, min_inverse, Comparison, LexMin, MinAdjacency};
