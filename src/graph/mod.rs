//! Set-based graphs.
//!
//! A set-graph stores families of vertices and edges compactly: each vertex is
//! a [`Set`](crate::algebra::Set) of points and each edge family carries two
//! piecewise maps sending edge points to vertex points.

pub mod set_graph;

pub use set_graph::{EdgeId, GraphKind, SetEdge, SetGraph, SetVertex, VertexId};
