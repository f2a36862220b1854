//! Strongly connected components and the ordering graph of a matched system.
//!
//! SCCs are found by coloring. Every vertex is colored with the least vertex
//! reaching it, and over edges whose endpoints share a color each vertex
//! learns the least vertex it reaches. Where both agree the vertex sits in
//! the SCC of its color. A pass colors the remaining graph in the coordinate
//! order and again in the negated order, so a component is solved as soon as
//! it is a source in either direction. Both reachability sweeps run on
//! `analysis::reach`, and solved vertices are dropped before the
//! next pass.

use crate::algebra::{compare, min_adjacent, LinearExpression, LinearTerm, PiecewiseMap, Set};
use crate::analysis::components::ComponentAnalyzer;
use crate::analysis::matching::Matching;
use crate::analysis::reach::least_reachable;
use crate::graph::{SetEdge, SetGraph, SetVertex, VertexId};
use crate::utils::errors::{malformed, violation, InvariantKind, MalformedKind, SbgResult};
use log::{debug, info, trace};
use serde::{Serialize, Deserialize};
use std::collections::HashMap;

/// Strongly connected components, each labelled by its least vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrongComponents {
    /// Vertex -> representative of its SCC
    pub representative: PiecewiseMap,
    /// The representatives themselves
    pub representatives: Set,
    /// Number of SCCs
    pub count: u64,
    /// Coloring passes run
    pub passes: u64,
    /// Propagation rounds run, over all passes
    pub rounds: u64,
}

/// The SCC-condensed graph of a directed set-graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderGraph {
    /// One vertex per family of SCC representatives; edge maps send an edge
    /// to the representatives of its endpoints
    pub graph: SetGraph,
    /// Vertex -> representative of its SCC
    pub representative: PiecewiseMap,
    /// Edges joining two vertices of the same SCC
    pub internal_edges: Set,
    /// Edges joining different SCCs
    pub ordering_edges: Set,
}

impl OrderGraph {
    /// Order-graph vertex holding the SCC of `vertex`.
    pub fn node_of(&self, vertex: &[i64]) -> Option<VertexId> {
        let rep = self.representative.eval(vertex)?;
        self.graph.vertex_of_point(&rep)
    }

    /// Topological order of the order-graph vertices (Kahn's algorithm).
    ///
    /// Self-edges stand for dependencies between SCCs of one family and are
    /// ignored. Returns `Ok(None)` if the families form a cycle.
    pub fn topological_order(&self) -> SbgResult<Option<Vec<VertexId>>> {
        let mut endpoints: Vec<(VertexId, VertexId)> = Vec::new();
        for (_, edge) in self.graph.edges() {
            let source = self.graph.vertex_containing(&edge.map_source().image_of_domain()?)?;
            let target = self.graph.vertex_containing(&edge.map_target().image_of_domain()?)?;
            if source != target {
                endpoints.push((source, target));
            }
        }

        let mut in_degree: HashMap<VertexId, usize> = HashMap::new();
        for (id, _) in self.graph.vertices() {
            in_degree.insert(id, 0);
        }
        for (_, target) in &endpoints {
            *in_degree.entry(*target).or_insert(0) += 1;
        }

        let mut queue: Vec<VertexId> = self.graph.vertices()
            .map(|(id, _)| id)
            .filter(|id| in_degree[id] == 0)
            .collect();
        queue.reverse();

        let mut result = Vec::new();
        while let Some(vertex) = queue.pop() {
            result.push(vertex);
            for (source, target) in &endpoints {
                if *source == vertex {
                    if let Some(count) = in_degree.get_mut(target) {
                        *count -= 1;
                        if *count == 0 {
                            queue.push(*target);
                        }
                    }
                }
            }
        }

        if result.len() == self.graph.vertex_count() {
            Ok(Some(result))
        } else {
            Ok(None)
        }
    }
}

/// SCC representative map of the graph `(vertices, source, target)`.
///
/// Returns the map together with the number of coloring passes and rounds.
fn scc_of_maps(
    vertices: &Set,
    source: &PiecewiseMap,
    target: &PiecewiseMap,
    bound: u64,
    trace_rounds: bool,
) -> SbgResult<(PiecewiseMap, u64, u64)> {
    let mut remaining = vertices.clone();
    let mut rep = PiecewiseMap::empty(vertices.dim());
    let mut passes = 0u64;
    let mut rounds = 0u64;
    while !remaining.is_empty() {
        if passes >= bound {
            return Err(violation(
                InvariantKind::NonConvergence,
                format!("SCC coloring did not finish within {} passes", bound),
            ));
        }
        passes += 1;
        let active = source.pre_image(&remaining)?.intersection(&target.pre_image(&remaining)?)?;
        let s = source.restrict(&active);
        let t = target.restrict(&active);

        let (ascending, up_rounds) = settle(&remaining, &s, &t, bound, trace_rounds)?;

        // Same coloring with every coordinate negated: roots become the
        // greatest vertex of their SCC, and sinks of the original order settle.
        let neg = negation(&remaining)?;
        let mirrored = neg.image(&remaining)?;
        let (settled, down_rounds) = settle(&mirrored, &neg.compose(&s)?, &neg.compose(&t)?, bound, trace_rounds)?;
        let greatest = negation(&mirrored)?.compose(&settled.compose(&neg)?)?;
        let least = min_adjacent(&greatest, &PiecewiseMap::identity(&greatest.dom()))?.value;
        let descending = least.compose(&greatest)?;

        let solved = ascending.combine(&descending)?;
        let pass_rounds = up_rounds + down_rounds;
        rounds += pass_rounds;
        if trace_rounds {
            trace!("pass {}: representatives {}", passes, solved);
        }
        let done = solved.dom();
        debug!(
            "pass {}: {} vertices solved after {} rounds",
            passes, done.cardinality(), pass_rounds
        );
        rep = rep.combine(&solved)?;
        remaining = remaining.difference(&done)?;
    }
    Ok((rep.normalize(), passes, rounds))
}

/// One coloring of `(vertices, s, t)` in the coordinate order.
///
/// Returns `v -> least vertex of its SCC` for every vertex whose SCC is
/// reached by no smaller vertex, plus the rounds spent.
fn settle(
    vertices: &Set,
    s: &PiecewiseMap,
    t: &PiecewiseMap,
    bound: u64,
    trace_rounds: bool,
) -> SbgResult<(PiecewiseMap, u64)> {
    let identity = PiecewiseMap::identity(vertices);
    // Least vertex reaching each vertex: reachability against the edges.
    let color = least_reachable(&identity, t, s, bound, trace_rounds)?;
    let same = compare(&color.label.compose(s)?, &color.label.compose(t)?)?.equal;
    let back = least_reachable(&identity, &s.restrict(&same), &t.restrict(&same), bound, trace_rounds)?;
    let settled = compare(&back.label, &color.label)?.equal;
    Ok((color.label.restrict(&settled), color.rounds + back.rounds))
}

/// `x -> -x` over `vertices`.
fn negation(vertices: &Set) -> SbgResult<PiecewiseMap> {
    let unbounded = vertices.atoms().iter()
        .flat_map(|a| a.intervals())
        .any(|i| i.begin() == i64::MIN);
    if unbounded {
        return Err(malformed(
            MalformedKind::CoordinateOverflow,
            format!("{} holds i64::MIN, which has no negation", vertices),
        ));
    }
    let flip = LinearExpression::new(vec![LinearTerm::int(-1, 0); vertices.dim()]);
    PiecewiseMap::affine(vertices, &flip)
}

impl ComponentAnalyzer {
    /// SCCs of a directed set-graph; edges run from left (source) to right (target).
    pub fn strongly_connected(&self, graph: &SetGraph) -> SbgResult<StrongComponents> {
        self.require_directed(graph)?;
        let vertices = graph.vertex_set();
        let (source, target) = graph.global_maps();
        let bound = self.config.round_bound(vertices.cardinality());
        let (representative, passes, rounds) =
            scc_of_maps(&vertices, &source, &target, bound, self.config.trace_rounds)?;
        let representatives = representative.fixed_points();
        let count = representatives.cardinality();
        info!("{} strongly connected components over {} vertices", count, vertices.cardinality());
        Ok(StrongComponents { representative, representatives, count, passes, rounds })
    }

    /// Directed graph of equations from an undirected equation/variable
    /// graph and a matching over it.
    ///
    /// For every unmatched edge joining equation `f` to a variable matched to
    /// equation `f'`, there is an edge `f' -> f`. Vertices are the side parts
    /// of the original vertices; edges are grouped per original edge family
    /// and (source, target) vertex pair.
    pub fn dependency_graph(&self, graph: &SetGraph, matching: &Matching) -> SbgResult<SetGraph> {
        let mut dep = SetGraph::directed(graph.dim());
        let mut ranges = Vec::new();
        for (_, v) in graph.vertices() {
            let range = v.range.intersection(&matching.side)?;
            if !range.is_empty() {
                let id = dep.add_vertex(SetVertex::new(v.name.clone(), range.clone()))?;
                ranges.push((id, range));
            }
        }

        let unmatched = graph.edge_set().difference(&matching.matched_edges)?;
        let producer = matching.assignment_inverse.compose(&matching.map_u.restrict(&unmatched))?;
        let user = matching.map_f.restrict(&producer.dom());

        for (_, edge) in graph.edges() {
            let family = producer.dom().intersection(&edge.domain())?;
            if family.is_empty() {
                continue;
            }
            for (src_id, src_range) in &ranges {
                let from = producer.pre_image(src_range)?.intersection(&family)?;
                if from.is_empty() {
                    continue;
                }
                for (tgt_id, tgt_range) in &ranges {
                    let dom = user.pre_image(tgt_range)?.intersection(&from)?;
                    if dom.is_empty() {
                        continue;
                    }
                    let name = format!("{}:{}->{}", edge.name, src_id, tgt_id);
                    dep.add_edge(SetEdge::new(name, producer.restrict(&dom), user.restrict(&dom))?)?;
                }
            }
        }
        debug!("dependency graph: {} vertex families, {} edge families", dep.vertex_count(), dep.edge_count());
        Ok(dep)
    }

    /// Condense a directed set-graph into its ordering graph.
    pub fn order_graph(&self, graph: &SetGraph) -> SbgResult<OrderGraph> {
        let scc = self.strongly_connected(graph)?;
        let rep = scc.representative;
        let (source, target) = graph.global_maps();
        let rep_source = rep.compose(&source)?;
        let rep_target = rep.compose(&target)?;
        let split = compare(&rep_source, &rep_target)?;
        let internal_edges = split.equal;
        let ordering_edges = split.less.union(&split.greater)?;

        let mut order = SetGraph::directed(graph.dim());
        let mut nodes = Vec::new();
        let mut taken = Set::empty(graph.dim());
        for (_, v) in graph.vertices() {
            let reps = rep.image(&v.range)?.difference(&taken)?;
            for atom in reps.atoms() {
                let range = Set::from_atom(atom.clone());
                let name = format!("scc_{}", nodes.len());
                let id = order.add_vertex(SetVertex::new(name, range.clone()))?;
                nodes.push((id, range));
            }
            taken = taken.union(&reps)?;
        }

        for (src_id, src_range) in &nodes {
            let from = rep_source.pre_image(src_range)?.intersection(&ordering_edges)?;
            if from.is_empty() {
                continue;
            }
            for (tgt_id, tgt_range) in &nodes {
                let dom = rep_target.pre_image(tgt_range)?.intersection(&from)?;
                if dom.is_empty() {
                    continue;
                }
                let name = format!("e_{}_{}", src_id.0, tgt_id.0);
                order.add_edge(SetEdge::new(name, rep_source.restrict(&dom), rep_target.restrict(&dom))?)?;
            }
        }

        info!(
            "order graph: {} nodes, {} edges ({} internal edges, {} ordering edges)",
            order.vertex_count(), order.edge_count(),
            internal_edges.cardinality(), ordering_edges.cardinality()
        );
        Ok(OrderGraph { graph: order, representative: rep, internal_edges, ordering_edges })
    }

    /// Matched system to ordering graph: dependency graph, then condensation.
    pub fn schedule(&self, graph: &SetGraph, matching: &Matching) -> SbgResult<OrderGraph> {
        let dep = self.dependency_graph(graph, matching)?;
        self.order_graph(&dep)
    }

    fn require_directed(&self, graph: &SetGraph) -> SbgResult<()> {
        if !graph.is_directed() {
            return Err(violation(
                InvariantKind::DirectionMismatch,
                "SCC analysis needs a directed graph",
            ));
        }
        if self.config.validate_input {
            graph.validate()?;
        }
        Ok(())
    }
}
