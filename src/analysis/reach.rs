//! Least reachable keys over a directed view of a set-graph.
//!
//! Every vertex with an outgoing edge points at the neighbour holding the
//! least label, and a label is the least key along the vertex's pointer path.
//! Labels are settled by pointer jumping, so a path of length `L` costs
//! `O(log L)` compositions. Pointers are then re-aimed wherever a neighbour
//! holds a smaller label. Re-aiming only ever lowers labels, so once nothing
//! is re-aimed every label is the least key reachable from its vertex.

use crate::algebra::{compare, lexmin, min_adjacent, PiecewiseMap};
use crate::utils::errors::{violation, InvariantKind, SbgResult};
use log::trace;

/// Result of [`least_reachable`].
#[derive(Debug, Clone)]
pub(crate) struct Reach {
    /// Vertex -> least key reachable from it
    pub label: PiecewiseMap,
    /// Vertex -> the edge its pointer leaves through
    pub succ: PiecewiseMap,
    /// Vertex -> the vertex its pointer lands on
    pub next: PiecewiseMap,
    /// Aiming rounds plus pointer jumps
    pub rounds: u64,
}

/// Least `key` reachable from every vertex in the domain of `key`, over edges
/// that leave their `out` endpoint and arrive at their `into` endpoint.
pub(crate) fn least_reachable(
    key: &PiecewiseMap,
    out: &PiecewiseMap,
    into: &PiecewiseMap,
    bound: u64,
    trace_rounds: bool,
) -> SbgResult<Reach> {
    let mut label = key.clone();
    let mut succ = PiecewiseMap::empty(key.dim());
    let mut next = PiecewiseMap::empty(key.dim());
    let mut aims = 0u64;
    let mut rounds = 0u64;
    loop {
        if aims >= bound {
            return Err(violation(
                InvariantKind::NonConvergence,
                format!("reachability did not settle within {} rounds", bound),
            ));
        }
        aims += 1;
        rounds += 1;
        let adj = min_adjacent(out, &label.compose(into)?)?;
        let unaimed = adj.value.dom().difference(&succ.dom())?;
        let better = compare(&adj.value, &label)?.less.union(&unaimed)?;
        if better.is_empty() {
            return Ok(Reach { label, succ, next, rounds });
        }
        succ = adj.arg.restrict(&better).combine(&succ)?;
        next = into.compose(&succ)?;
        let (settled, jumps) = settle_labels(key, &next, bound)?;
        label = settled;
        rounds += jumps;
        if trace_rounds {
            trace!("round {}: {} re-aimed, label = {}", aims, better, label);
        }
    }
}

/// Least key along each vertex's path through `next`, by pointer jumping.
///
/// After `k` steps a label covers the first `2^k` vertices of the path; a
/// step that changes no label means every label covers its whole path.
fn settle_labels(key: &PiecewiseMap, next: &PiecewiseMap, bound: u64) -> SbgResult<(PiecewiseMap, u64)> {
    let mut label = key.clone();
    let mut jump = next.clone();
    let mut steps = 0u64;
    loop {
        if steps >= bound {
            return Err(violation(
                InvariantKind::NonConvergence,
                format!("labels did not settle within {} jumps", bound),
            ));
        }
        steps += 1;
        let step = lexmin(&label, &label.compose(&jump)?)?;
        label = step.map;
        if step.improved.is_empty() {
            return Ok((label, steps));
        }
        jump = jump.compose(&jump)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{Interval, LinearExpression, LinearTerm, Set};

    fn set(b: i64, e: i64) -> Set {
        Set::from_interval(Interval::range(b, e))
    }

    fn shift(dom: &Set, offset: i64) -> PiecewiseMap {
        PiecewiseMap::affine(dom, &LinearExpression::shift(&[offset])).unwrap()
    }

    fn constant(dom: &Set, value: i64) -> PiecewiseMap {
        PiecewiseMap::constant(dom, &[value]).unwrap()
    }

    fn negated(dom: &Set) -> PiecewiseMap {
        PiecewiseMap::affine(dom, &LinearExpression::new(vec![LinearTerm::int(-1, 0)])).unwrap()
    }

    /// Edges `100 + v` run `v -> v + 1` over `1..n`.
    fn chain(n: i64) -> (Set, PiecewiseMap, PiecewiseMap) {
        let edges = set(101, 100 + n - 1);
        (set(1, n), shift(&edges, -100), shift(&edges, -99))
    }

    #[test]
    fn test_least_key_downstream() {
        let (vertices, out, into) = chain(100);
        let reach = least_reachable(&negated(&vertices), &out, &into, 101, false).unwrap();
        assert_eq!(reach.label.eval(&[1]), Some(vec![-100]));
        assert_eq!(reach.label.eval(&[100]), Some(vec![-100]));
        assert_eq!(reach.next.eval(&[7]), Some(vec![8]));
        assert_eq!(reach.succ.eval(&[7]), Some(vec![107]));
        assert!(reach.rounds < 16, "{} rounds", reach.rounds);
    }

    #[test]
    fn test_keys_rising_downstream_stay_put() {
        let (vertices, out, into) = chain(100);
        let reach = least_reachable(&PiecewiseMap::identity(&vertices), &out, &into, 101, false).unwrap();
        assert!(reach.label.is_identity());
        assert_eq!(reach.label.dom(), vertices);
    }

    #[test]
    fn test_pointers_re_aim_at_smaller_labels() {
        // Edges 11: 1 -> 2, 12: 1 -> 3, 13: 3 -> 4; key(4) is below the rest.
        let key = PiecewiseMap::identity(&set(1, 3)).combine(&constant(&set(4, 4), 0)).unwrap();
        let out = constant(&set(11, 12), 1).combine(&constant(&set(13, 13), 3)).unwrap();
        let into = shift(&set(11, 12), -9).combine(&constant(&set(13, 13), 4)).unwrap();
        let reach = least_reachable(&key, &out, &into, 5, false).unwrap();
        assert_eq!(reach.label.eval(&[1]), Some(vec![0]));
        assert_eq!(reach.label.eval(&[2]), Some(vec![2]));
        assert_eq!(reach.succ.eval(&[1]), Some(vec![12]));
        assert_eq!(reach.label.dom(), set(1, 4));
    }

    #[test]
    fn test_bound_reports_non_convergence() {
        let (vertices, out, into) = chain(64);
        let err = least_reachable(&negated(&vertices), &out, &into, 2, false).unwrap_err();
        assert_eq!(err.invariant_kind(), Some(InvariantKind::NonConvergence));
    }
}
