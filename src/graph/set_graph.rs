//! Vertices, edges and the set-graph container.

use crate::algebra::{PiecewiseMap, Set};
use crate::utils::errors::{malformed, violation, InvariantKind, MalformedKind, SbgResult};
use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::fmt;

/// Handle of a vertex inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    pub fn new(id: u32) -> Self { Self(id) }
    fn index(self) -> usize { self.0 as usize }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

/// Handle of an edge inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub fn new(id: u32) -> Self { Self(id) }
    fn index(self) -> usize { self.0 as usize }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A named family of vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetVertex {
    /// Name, unique in the graph
    pub name: String,
    /// The vertex points
    pub range: Set,
}

impl SetVertex {
    pub fn new(name: impl Into<String>, range: Set) -> Self {
        Self { name: name.into(), range }
    }
}

/// A named family of edges.
///
/// Both incidence maps share one domain (the edge set); each sends the whole
/// domain into the range of a single vertex. For directed graphs the left map
/// gives the source and the right map the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEdge {
    pub name: String,
    map_left: PiecewiseMap,
    map_right: PiecewiseMap,
}

impl SetEdge {
    pub fn new(name: impl Into<String>, map_left: PiecewiseMap, map_right: PiecewiseMap) -> SbgResult<Self> {
        let name = name.into();
        if map_left.dim() != map_right.dim() {
            return Err(malformed(
                MalformedKind::DimensionMismatch,
                format!("edge {}: incidence maps of dimension {} and {}", name, map_left.dim(), map_right.dim()),
            ));
        }
        if map_left.dom() != map_right.dom() {
            return Err(malformed(
                MalformedKind::DomainMismatch,
                format!("edge {}: {} and {} have different domains", name, map_left, map_right),
            ));
        }
        Ok(Self { name, map_left, map_right })
    }

    pub fn map_left(&self) -> &PiecewiseMap {
        &self.map_left
    }

    pub fn map_right(&self) -> &PiecewiseMap {
        &self.map_right
    }

    /// Source map of a directed edge.
    pub fn map_source(&self) -> &PiecewiseMap {
        &self.map_left
    }

    /// Target map of a directed edge.
    pub fn map_target(&self) -> &PiecewiseMap {
        &self.map_right
    }

    /// The edge points.
    pub fn domain(&self) -> Set {
        self.map_left.dom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphKind {
    Undirected,
    Directed,
}

/// A graph whose vertices and edges are sets of points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetGraph {
    kind: GraphKind,
    dim: usize,
    vertices: Vec<SetVertex>,
    edges: Vec<SetEdge>,
    vertex_names: HashMap<String, VertexId>,
    edge_names: HashMap<String, EdgeId>,
}

impl SetGraph {
    pub fn new(kind: GraphKind, dim: usize) -> Self {
        Self {
            kind,
            dim,
            vertices: Vec::new(),
            edges: Vec::new(),
            vertex_names: HashMap::new(),
            edge_names: HashMap::new(),
        }
    }

    pub fn undirected(dim: usize) -> Self {
        Self::new(GraphKind::Undirected, dim)
    }

    pub fn directed(dim: usize) -> Self {
        Self::new(GraphKind::Directed, dim)
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn is_directed(&self) -> bool {
        self.kind == GraphKind::Directed
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn add_vertex(&mut self, vertex: SetVertex) -> SbgResult<VertexId> {
        if vertex.range.dim() != self.dim {
            return Err(malformed(
                MalformedKind::DimensionMismatch,
                format!("vertex {} has dimension {}, graph has {}", vertex.name, vertex.range.dim(), self.dim),
            ));
        }
        if self.vertex_names.contains_key(&vertex.name) {
            return Err(violation(
                InvariantKind::DuplicateName,
                format!("vertex {} already exists", vertex.name),
            ));
        }
        let id = VertexId(self.vertices.len() as u32);
        self.vertex_names.insert(vertex.name.clone(), id);
        self.vertices.push(vertex);
        Ok(id)
    }

    pub fn add_edge(&mut self, edge: SetEdge) -> SbgResult<EdgeId> {
        if edge.map_left.dim() != self.dim {
            return Err(malformed(
                MalformedKind::DimensionMismatch,
                format!("edge {} has dimension {}, graph has {}", edge.name, edge.map_left.dim(), self.dim),
            ));
        }
        if self.edge_names.contains_key(&edge.name) {
            return Err(violation(
                InvariantKind::DuplicateName,
                format!("edge {} already exists", edge.name),
            ));
        }
        let id = EdgeId(self.edges.len() as u32);
        self.edge_names.insert(edge.name.clone(), id);
        self.edges.push(edge);
        Ok(id)
    }

    pub fn vertex(&self, id: VertexId) -> Option<&SetVertex> {
        self.vertices.get(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&SetEdge> {
        self.edges.get(id.index())
    }

    pub fn vertex_by_name(&self, name: &str) -> Option<VertexId> {
        self.vertex_names.get(name).copied()
    }

    pub fn edge_by_name(&self, name: &str) -> Option<EdgeId> {
        self.edge_names.get(name).copied()
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &SetVertex)> {
        self.vertices.iter().enumerate().map(|(i, v)| (VertexId(i as u32), v))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &SetEdge)> {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeId(i as u32), e))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Union of every vertex range.
    pub fn vertex_set(&self) -> Set {
        self.vertices.iter().fold(Set::empty(self.dim), |acc, v| acc.union_unchecked(&v.range))
    }

    /// Union of every edge domain.
    pub fn edge_set(&self) -> Set {
        self.edges.iter().fold(Set::empty(self.dim), |acc, e| acc.union_unchecked(&e.domain()))
    }

    /// Left incidence maps of all edges, as one map over the edge set.
    pub fn left_map(&self) -> PiecewiseMap {
        self.edges.iter().fold(PiecewiseMap::empty(self.dim), |acc, e| acc.combine_unchecked(&e.map_left))
    }

    /// Right incidence maps of all edges, as one map over the edge set.
    pub fn right_map(&self) -> PiecewiseMap {
        self.edges.iter().fold(PiecewiseMap::empty(self.dim), |acc, e| acc.combine_unchecked(&e.map_right))
    }

    /// `(left_map, right_map)`.
    pub fn global_maps(&self) -> (PiecewiseMap, PiecewiseMap) {
        (self.left_map(), self.right_map())
    }

    /// The vertex owning every point of `subset`.
    pub fn vertex_containing(&self, subset: &Set) -> SbgResult<VertexId> {
        if !subset.is_empty() {
            if let Some((id, _)) = self.vertices().find(|(_, v)| subset.is_subset(&v.range)) {
                return Ok(id);
            }
        }
        Err(violation(
            InvariantKind::MissingOwner,
            format!("no vertex contains {}", subset),
        ))
    }

    /// The vertex owning `point`, if any.
    pub fn vertex_of_point(&self, point: &[i64]) -> Option<VertexId> {
        self.vertices().find(|(_, v)| v.range.is_member(point)).map(|(id, _)| id)
    }

    /// Check the structural invariants the analyses rely on.
    pub fn validate(&self) -> SbgResult<()> {
        for (i, a) in self.vertices.iter().enumerate() {
            if let Some(b) = self.vertices[i + 1..].iter().find(|b| a.range.overlaps(&b.range)) {
                return Err(violation(
                    InvariantKind::OverlappingVertices,
                    format!("vertices {} and {} overlap", a.name, b.name),
                ));
            }
        }
        let domains: Vec<Set> = self.edges.iter().map(|e| e.domain()).collect();
        for (i, a) in domains.iter().enumerate() {
            if let Some(j) = (i + 1..domains.len()).find(|&j| a.overlaps(&domains[j])) {
                return Err(violation(
                    InvariantKind::OverlappingEdges,
                    format!("edges {} and {} overlap", self.edges[i].name, self.edges[j].name),
                ));
            }
        }
        let vertices = self.vertex_set();
        for edge in &self.edges {
            for map in [&edge.map_left, &edge.map_right] {
                let image = map.image_of_domain()?;
                if !image.is_subset(&vertices) {
                    return Err(violation(
                        InvariantKind::UncoveredEdge,
                        format!("edge {} reaches {} outside every vertex", edge.name, image.difference(&vertices)?),
                    ));
                }
                if !image.is_empty() {
                    self.vertex_containing(&image)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for SetGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            GraphKind::Undirected => "undirected",
            GraphKind::Directed => "directed",
        };
        writeln!(f, "{} set-graph ({} vertices, {} edges)", kind, self.vertices.len(), self.edges.len())?;
        for (id, v) in self.vertices() {
            writeln!(f, "  {} {}: {}", id, v.name, v.range)?;
        }
        for (id, e) in self.edges() {
            writeln!(f, "  {} {}: {} | {}", id, e.name, e.map_left, e.map_right)?;
        }
        Ok(())
    }
}
