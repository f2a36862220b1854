//! # sbgraph - Set-Based Graphs
//!
//! Compact graphs for systems with huge, regular structure (array equations,
//! discretized models), where vertices and edges come in families described by
//! arithmetic progressions and affine maps rather than one by one:
//! - Interval, multi-interval and set algebra
//! - Per-dimension linear expressions, atomic and piecewise affine maps
//! - Set-graphs of vertex and edge families
//! - Maximum bipartite matching (equations against variables)
//! - Connected components, strongly connected components and the ordering
//!   graph used to schedule a matched system
//!
//! Every algorithm works on whole sets at a time, so its cost depends on the
//! number of families, not on the number of vertices they stand for.
//!
//! ## Architecture
//!
//! ```text
//! Front end → Set / PiecewiseMap → SetGraph → MatchingEngine → ComponentAnalyzer → OrderGraph
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sbgraph::prelude::*;
//!
//! // Equations [1:2:99], variables [2:2:100], edges joining i and i + 1.
//! let graph = build_graph()?;
//! let side = Set::from_interval(Interval::new(1, 2, 99)?);
//! let order = sbgraph::schedule(&graph, &side, &AnalysisConfig::default())?;
//! println!("{}", order.graph);
//! ```

#![warn(clippy::all)]

pub mod algebra;
pub mod graph;
pub mod analysis;
pub mod eval;
pub mod config;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::algebra::{
        AtomicMap, Interval, LinearExpression, LinearTerm, MultiInterval, PiecewiseMap, Set,
    };
    pub use crate::graph::{EdgeId, GraphKind, SetEdge, SetGraph, SetVertex, VertexId};
    pub use crate::analysis::{
        ComponentAnalyzer, Components, Matching, MatchingEngine, OrderGraph, StrongComponents,
    };
    pub use crate::config::AnalysisConfig;
    pub use crate::eval::Value;
    pub use crate::utils::errors::*;
}

pub use config::AnalysisConfig;

use anyhow::{Context, Result};
use log::info;

/// Match `side` against the rest of `graph`.
pub fn match_graph(graph: &graph::SetGraph, side: &algebra::Set, config: &AnalysisConfig) -> Result<analysis::Matching> {
    analysis::match_graph(graph, side, config)
        .with_context(|| format!("matching {} against the rest of the graph", side))
}

/// Full pipeline: match the equations in `side`, then order the matched system.
///
/// Fails when the matching leaves equations unmatched.
pub fn schedule(graph: &graph::SetGraph, side: &algebra::Set, config: &AnalysisConfig) -> Result<analysis::OrderGraph> {
    let matching = match_graph(graph, side, config)?;
    if !matching.success {
        anyhow::bail!(
            "system is singular: equations {} have no variable to solve",
            matching.unmatched_side
        );
    }
    let order = analysis::order_matched(graph, &matching, config)
        .context("building the ordering graph")?;
    info!(
        "scheduled {} equations into {} blocks",
        matching.side.cardinality(),
        order.graph.vertex_count()
    );
    Ok(order)
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
