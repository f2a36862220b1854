//! Connected components of undirected set-graphs.

use crate::algebra::{lexmin, min_adjacent, PiecewiseMap, Set};
use crate::config::AnalysisConfig;
use crate::graph::SetGraph;
use crate::utils::errors::{violation, InvariantKind, SbgResult};
use log::{debug, info, trace};
use serde::{Serialize, Deserialize};

/// Connected components, each labelled by its least vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Components {
    /// Vertex -> representative of its component
    pub representative: PiecewiseMap,
    /// The representatives themselves
    pub representatives: Set,
    /// Number of components
    pub count: u64,
    /// Propagation rounds run
    pub rounds: u64,
}

impl Components {
    /// Whether two vertices are in the same component.
    pub fn connected(&self, a: &[i64], b: &[i64]) -> bool {
        match (self.representative.eval(a), self.representative.eval(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }
}

/// Component analyses over set-graphs: connectivity, strong connectivity and
/// the ordering graph of a matched system.
pub struct ComponentAnalyzer {
    pub(crate) config: AnalysisConfig,
}

impl ComponentAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Label every vertex with the least vertex of its component.
    ///
    /// Each round pulls the smaller label across every edge in both
    /// directions, then shortcuts labels through `rmap ∘ rmap`.
    pub fn connected_components(&self, graph: &SetGraph) -> SbgResult<Components> {
        if graph.is_directed() {
            return Err(violation(
                InvariantKind::DirectionMismatch,
                "connected components need an undirected graph",
            ));
        }
        if self.config.validate_input {
            graph.validate()?;
        }
        let vertices = graph.vertex_set();
        let (left, right) = graph.global_maps();
        let bound = self.config.round_bound(vertices.cardinality());

        let mut rmap = PiecewiseMap::identity(&vertices);
        let mut rounds = 0u64;
        loop {
            if rounds >= bound {
                return Err(violation(
                    InvariantKind::NonConvergence,
                    format!("component labels did not settle within {} rounds", bound),
                ));
            }
            rounds += 1;
            let from_right = min_adjacent(&left, &rmap.compose(&right)?)?.value;
            let from_left = min_adjacent(&right, &rmap.compose(&left)?)?.value;
            let a = lexmin(&rmap, &from_right)?;
            let b = lexmin(&a.map, &from_left)?;
            let jumped = lexmin(&b.map, &b.map.compose(&b.map)?)?;
            rmap = jumped.map;
            if self.config.trace_rounds {
                trace!("round {}: rmap = {}", rounds, rmap);
            }
            if a.improved.is_empty() && b.improved.is_empty() && jumped.improved.is_empty() {
                break;
            }
        }

        let representatives = rmap.fixed_points();
        let count = representatives.cardinality();
        debug!("component labels settled after {} rounds", rounds);
        info!("{} connected components over {} vertices", count, vertices.cardinality());
        Ok(Components { representative: rmap, representatives, count, rounds })
    }
}

impl Default for ComponentAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{Interval, LinearExpression};
    use crate::graph::{SetEdge, SetVertex};

    fn set(b: i64, e: i64) -> Set {
        Set::from_interval(Interval::range(b, e))
    }

    fn shift(dom: &Set, offset: i64) -> PiecewiseMap {
        PiecewiseMap::affine(dom, &LinearExpression::shift(&[offset])).unwrap()
    }

    /// Chain over `[lo..hi]`: edge `offset + i` joins `i` and `i + 1`.
    fn add_chain(g: &mut SetGraph, name: &str, lo: i64, hi: i64, offset: i64) {
        g.add_vertex(SetVertex::new(name, set(lo, hi))).unwrap();
        let dom = set(offset + lo, offset + hi - 1);
        let edge = SetEdge::new(format!("{}_e", name), shift(&dom, -offset), shift(&dom, 1 - offset)).unwrap();
        g.add_edge(edge).unwrap();
    }

    #[test]
    fn test_single_chain() {
        let mut g = SetGraph::undirected(1);
        add_chain(&mut g, "a", 1, 50, 1000);
        let c = ComponentAnalyzer::default().connected_components(&g).unwrap();
        assert_eq!(c.count, 1);
        assert_eq!(c.representatives, set(1, 1));
        assert_eq!(c.representative.eval(&[50]), Some(vec![1]));
    }

    #[test]
    fn test_two_disjoint_chains() {
        let mut g = SetGraph::undirected(1);
        add_chain(&mut g, "a", 1, 20, 1000);
        add_chain(&mut g, "b", 101, 130, 2000);
        let c = ComponentAnalyzer::default().connected_components(&g).unwrap();
        assert_eq!(c.count, 2);
        assert!(c.connected(&[3], &[20]));
        assert!(!c.connected(&[20], &[101]));
        assert_eq!(c.representative.eval(&[130]), Some(vec![101]));
    }

    #[test]
    fn test_isolated_vertices_are_their_own_component() {
        let mut g = SetGraph::undirected(1);
        g.add_vertex(SetVertex::new("lone", set(1, 5))).unwrap();
        let c = ComponentAnalyzer::default().connected_components(&g).unwrap();
        assert_eq!(c.count, 5);
        assert!(c.representative.is_identity());
    }
}
