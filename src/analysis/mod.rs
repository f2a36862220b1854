//! Graph analyses over set-graphs.
//!
//! - [`MatchingEngine`]: maximum bipartite matching
//! - [`ComponentAnalyzer`]: connected components, strongly connected
//!   components, the dependency graph of a matched system and its ordering
//!   graph

pub mod matching;
pub mod components;
pub mod scc;
pub(crate) mod reach;

pub use matching::{Matching, MatchingEngine, MatchingState};
pub use components::{ComponentAnalyzer, Components};
pub use scc::{OrderGraph, StrongComponents};

use crate::algebra::Set;
use crate::config::AnalysisConfig;
use crate::graph::SetGraph;
use crate::utils::errors::SbgResult;

/// Maximum matching of `side` against the rest of `graph`.
pub fn match_graph(graph: &SetGraph, side: &Set, config: &AnalysisConfig) -> SbgResult<Matching> {
    MatchingEngine::new(config.clone()).run(graph, side)
}

/// Ordering graph of a matched equation/variable graph.
pub fn order_matched(graph: &SetGraph, matching: &Matching, config: &AnalysisConfig) -> SbgResult<OrderGraph> {
    ComponentAnalyzer::new(config.clone()).schedule(graph, matching)
}
