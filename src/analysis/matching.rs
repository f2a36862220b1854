//! Maximum matching on bipartite set-graphs.
//!
//! The engine works in phases. Each phase orients the graph so that unmatched
//! edges run from the designated side to the other side and matched edges run
//! back. Unmatched other-side vertices are keyed below every other vertex, so
//! the least key reachable from a vertex (see `analysis::reach`) is
//! a target's whenever an alternating path reaches one. A side vertex holding
//! a target key starts an augmenting path. Per label only the least such
//! vertex is kept, which makes the chosen paths vertex disjoint, and the paths
//! are collected by doubling along the reach pointers so they can all be
//! flipped at once. Phases stop when no unmatched side vertex reaches an
//! unmatched target, at which point the matching is maximum.

use crate::algebra::{min_adjacent, LinearExpression, PiecewiseMap, Set};
use crate::analysis::reach::least_reachable;
use crate::config::AnalysisConfig;
use crate::graph::SetGraph;
use crate::utils::errors::{malformed, violation, InvariantKind, MalformedKind, SbgResult};
use log::{debug, info, warn};
use serde::{Serialize, Deserialize};
use std::fmt;

/// Where a matching run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchingState {
    /// Orienting edges and checking the input
    Init,
    /// Searching augmenting paths; holds the phase number
    Iterate(u64),
    /// Finished; `true` when every side vertex is matched
    Done(bool),
}

impl fmt::Display for MatchingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchingState::Init => write!(f, "INIT"),
            MatchingState::Iterate(phase) => write!(f, "ITERATE({})", phase),
            MatchingState::Done(true) => write!(f, "DONE(success)"),
            MatchingState::Done(false) => write!(f, "DONE(partial)"),
        }
    }
}

/// Result of a matching run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matching {
    /// Edges in the matching
    pub matched_edges: Set,
    /// Whether every side vertex is matched
    pub success: bool,
    /// The designated side, restricted to the graph's vertices
    pub side: Set,
    /// Every other vertex
    pub other: Set,
    /// Edge -> its endpoint on the designated side
    pub map_f: PiecewiseMap,
    /// Edge -> its endpoint on the other side
    pub map_u: PiecewiseMap,
    /// Matched side vertex -> its matched edge
    pub matched_map: PiecewiseMap,
    /// Matched side vertex -> matched other-side vertex
    pub assignment: PiecewiseMap,
    /// Matched other-side vertex -> matched side vertex
    pub assignment_inverse: PiecewiseMap,
    /// Side vertices left unmatched
    pub unmatched_side: Set,
    /// Other-side vertices left unmatched
    pub unmatched_other: Set,
    /// Augmenting phases run
    pub phases: u64,
    /// Labelling rounds run, over all phases
    pub rounds: u64,
}

impl Matching {
    pub fn state(&self) -> MatchingState {
        MatchingState::Done(self.success)
    }

    /// Number of matched edges.
    pub fn size(&self) -> u64 {
        self.matched_edges.cardinality()
    }
}

/// Edge orientation fixed at INIT.
struct Oriented {
    side: Set,
    other: Set,
    edges: Set,
    map_f: PiecewiseMap,
    map_u: PiecewiseMap,
}

/// Bipartite maximum matching over a set-graph.
pub struct MatchingEngine {
    config: AnalysisConfig,
}

impl MatchingEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Match the vertices of `side` against the rest of the graph.
    pub fn run(&self, graph: &SetGraph, side: &Set) -> SbgResult<Matching> {
        debug!("matching: {}", MatchingState::Init);
        let oriented = self.orient(graph, side)?;
        let bound = self.config.round_bound(graph.vertex_set().cardinality());

        let mut matched = Set::empty(graph.dim());
        let mut phases = 0u64;
        let mut rounds = 0u64;
        loop {
            if phases >= bound {
                return Err(violation(
                    InvariantKind::NonConvergence,
                    format!("matching did not settle within {} phases", bound),
                ));
            }
            phases += 1;
            debug!("matching: {}", MatchingState::Iterate(phases));
            let (next, phase_rounds) = self.augment(&oriented, &matched, bound)?;
            rounds += phase_rounds;
            match next {
                Some(m) => matched = m,
                None => break,
            }
        }

        let result = self.finish(oriented, matched, phases, rounds)?;
        debug!("matching: {}", result.state());
        if result.success {
            info!(
                "matching complete: {} edges matched in {} phases ({} rounds)",
                result.size(), result.phases, result.rounds
            );
        } else {
            warn!(
                "partial matching: {} edges matched, {} side vertices unmatched",
                result.size(), result.unmatched_side.cardinality()
            );
        }
        Ok(result)
    }

    /// Check the input and split every edge into its side and other endpoint.
    fn orient(&self, graph: &SetGraph, side: &Set) -> SbgResult<Oriented> {
        if graph.is_directed() {
            return Err(violation(
                InvariantKind::DirectionMismatch,
                "matching needs an undirected graph",
            ));
        }
        if self.config.validate_input {
            graph.validate()?;
        }
        let vertices = graph.vertex_set();
        let edges = graph.edge_set();
        let side = side.intersection(&vertices)?;
        let other = vertices.difference(&side)?;
        let (left, right) = graph.global_maps();

        for map in [&left, &right] {
            let image = map.image_of_domain()?;
            if !image.is_subset(&vertices) {
                return Err(violation(
                    InvariantKind::UncoveredEdge,
                    format!("edges reach {} outside every vertex", image.difference(&vertices)?),
                ));
            }
        }

        let left_on_side = left.pre_image(&side)?;
        let right_on_side = right.pre_image(&side)?;
        let both = left_on_side.intersection(&right_on_side)?;
        if !both.is_empty() {
            return Err(violation(
                InvariantKind::NotBipartite,
                format!("edges {} join two side vertices", both),
            ));
        }
        let neither = edges.difference(&left_on_side.union(&right_on_side)?)?;
        if !neither.is_empty() {
            return Err(violation(
                InvariantKind::NotBipartite,
                format!("edges {} join two other-side vertices", neither),
            ));
        }

        let map_f = left.restrict(&left_on_side).combine(&right.restrict(&right_on_side))?.normalize();
        let map_u = right.restrict(&left_on_side).combine(&left.restrict(&right_on_side))?.normalize();
        debug!(
            "oriented {} edges: {} side vertices, {} other vertices",
            edges.cardinality(), side.cardinality(), other.cardinality()
        );
        Ok(Oriented { side, other, edges, map_f, map_u })
    }

    /// One phase: returns the augmented matching, or `None` when no
    /// augmenting path is left, plus the number of labelling rounds.
    fn augment(&self, g: &Oriented, matched: &Set, bound: u64) -> SbgResult<(Option<Set>, u64)> {
        let unmatched_side = g.side.difference(&g.map_f.image(matched)?)?;
        let targets = g.other.difference(&g.map_u.image(matched)?)?;
        if unmatched_side.is_empty() || targets.is_empty() {
            return Ok((None, 0));
        }

        let free = g.edges.difference(matched)?;
        let map_d = g.map_f.restrict(&free).combine(&g.map_u.restrict(matched))?;
        let map_b = g.map_u.restrict(&free).combine(&g.map_f.restrict(matched))?;
        let key = target_first_keys(&g.side.union(&g.other)?, &targets)?;
        let target_keys = key.image(&targets)?;

        let reach = least_reachable(&key, &map_d, &map_b, bound, self.config.trace_rounds)?;
        let mut rounds = reach.rounds;
        let reached = reach.label.pre_image(&target_keys)?.intersection(&unmatched_side)?;
        if reached.is_empty() {
            debug!("no augmenting path after {} rounds", rounds);
            return Ok((None, rounds));
        }

        // Least side vertex per label; paths with different labels are disjoint.
        let firsts = min_adjacent(&reach.label.restrict(&reached), &PiecewiseMap::identity(&reached))?;
        let starts = firsts.value.image_of_domain()?;
        let (on_paths, hops) = follow(&starts, &reach.next, bound)?;
        rounds += hops;
        let path = reach.succ.image(&on_paths)?;

        debug!(
            "augmenting {} paths ({} edges) after {} rounds",
            starts.cardinality(), path.cardinality(), rounds
        );
        let flipped = matched.difference(&path)?.union(&path.difference(matched)?)?;
        Ok((Some(flipped), rounds))
    }

    fn finish(&self, g: Oriented, matched: Set, phases: u64, rounds: u64) -> SbgResult<Matching> {
        let matched_f = g.map_f.restrict(&matched);
        let matched_map = matched_f.inverse()?;
        let assignment = g.map_u.compose(&matched_map)?;
        let assignment_inverse = assignment.inverse()?;
        let unmatched_side = g.side.difference(&matched_f.image_of_domain()?)?;
        let unmatched_other = g.other.difference(&g.map_u.image(&matched)?)?;
        Ok(Matching {
            success: unmatched_side.is_empty(),
            side: g.side,
            other: g.other,
            matched_edges: matched,
            map_f: g.map_f,
            map_u: g.map_u,
            matched_map,
            assignment,
            assignment_inverse,
            unmatched_side,
            unmatched_other,
            phases,
            rounds,
        })
    }
}

/// Vertex keys with `targets` moved below every vertex in the first
/// coordinate, so the least key reachable from a vertex is a target's
/// whenever some target is reachable.
fn target_first_keys(vertices: &Set, targets: &Set) -> SbgResult<PiecewiseMap> {
    let rest = PiecewiseMap::identity(&vertices.difference(targets)?);
    let lo = vertices.atoms().iter().map(|a| a.interval(0).begin()).min();
    let hi = vertices.atoms().iter().map(|a| a.interval(0).end()).max();
    let (lo, hi) = match (lo, hi) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Ok(rest),
    };
    let span = hi.checked_sub(lo)
        .and_then(|span| span.checked_add(1))
        .filter(|span| lo.checked_sub(*span).is_some())
        .ok_or_else(|| malformed(
            MalformedKind::CoordinateOverflow,
            format!("vertices {} span too wide to relabel", vertices),
        ))?;
    let mut offsets = vec![0; vertices.dim()];
    offsets[0] = -span;
    PiecewiseMap::affine(targets, &LinearExpression::shift(&offsets))?.combine(&rest)
}

/// Every vertex on the paths through `next` leaving `starts`, by doubling.
fn follow(starts: &Set, next: &PiecewiseMap, bound: u64) -> SbgResult<(Set, u64)> {
    let mut visited = starts.clone();
    let mut jump = next.clone();
    let mut steps = 0u64;
    loop {
        if steps >= bound {
            return Err(violation(
                InvariantKind::NonConvergence,
                format!("augmenting paths longer than {} hops", bound),
            ));
        }
        steps += 1;
        let ahead = jump.image(&visited)?;
        if ahead.is_subset(&visited) {
            return Ok((visited, steps));
        }
        visited = visited.union(&ahead)?;
        jump = jump.compose(&jump)?;
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
