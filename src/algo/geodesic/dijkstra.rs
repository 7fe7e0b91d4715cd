//! Dijkstra's algorithm on the mesh edge graph.
//!
//! Computes shortest path distances along mesh edges. Several sources can be
//! seeded at distance 0 at once, which is equivalent to a single implicit
//! super-source joined to each of them by a zero-length edge.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::marker::PhantomData;

use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

use super::GeodesicResult;

/// Options for Dijkstra's algorithm.
#[derive(Debug, Clone, Default)]
pub struct DijkstraOptions {
    /// Whether to store predecessor information for path reconstruction.
    pub store_predecessors: bool,
}

impl DijkstraOptions {
    /// Enable predecessor storage for path reconstruction.
    pub fn with_predecessors(mut self, store: bool) -> Self {
        self.store_predecessors = store;
        self
    }
}

/// Entry in Dijkstra's priority queue.
#[derive(Debug, Clone)]
struct DijkstraEntry {
    vertex: usize,
    distance: f64,
}

impl DijkstraEntry {
    fn new(vertex: usize, distance: f64) -> Self {
        Self { vertex, distance }
    }
}

// Ordering for min-heap (BinaryHeap is a max-heap by default)
impl PartialEq for DijkstraEntry {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for DijkstraEntry {}

impl PartialOrd for DijkstraEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DijkstraEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// Weighted undirected graph over the vertices and edges of a mesh.
///
/// Edge weights are Euclidean edge lengths. Building the graph once lets
/// repeated searches over different vertex subsets skip the half-edge
/// circulation.
#[derive(Debug, Clone)]
pub struct EdgeGraph<I: MeshIndex = u32> {
    adjacency: Vec<Vec<(usize, f64)>>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> EdgeGraph<I> {
    /// Build the edge graph of a mesh.
    pub fn from_mesh(mesh: &HalfEdgeMesh<I>) -> Self {
        let mut adjacency = vec![Vec::new(); mesh.num_vertices()];

        for he in mesh.edges() {
            let u = mesh.origin(he).index();
            let v = mesh.dest(he).index();
            let length = mesh.edge_length(he);
            adjacency[u].push((v, length));
            adjacency[v].push((u, length));
        }

        Self {
            adjacency,
            _marker: PhantomData,
        }
    }

    /// Number of vertices in the graph.
    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    /// Iterate over the neighbours of `v` with the connecting edge length.
    pub fn neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = (VertexId<I>, f64)> + '_ {
        self.adjacency[v.index()]
            .iter()
            .map(|&(u, w)| (VertexId::new(u), w))
    }

    /// Run Dijkstra from all `sources` at once.
    ///
    /// When `subset` is given the search is confined to the subgraph induced
    /// by the vertices flagged `true`; sources outside the subset are
    /// ignored and vertices outside it stay unreachable.
    pub fn shortest_paths(
        &self,
        sources: &[VertexId<I>],
        subset: Option<&[bool]>,
        options: &DijkstraOptions,
    ) -> GeodesicResult<I> {
        let n = self.adjacency.len();
        let allowed = |v: usize| subset.map_or(true, |s| s[v]);

        let mut distances = vec![f64::INFINITY; n];
        let mut predecessors: Option<Vec<Option<usize>>> = if options.store_predecessors {
            Some(vec![None; n])
        } else {
            None
        };

        let mut heap = BinaryHeap::new();
        for &source in sources {
            let idx = source.index();
            if idx < n && allowed(idx) && distances[idx] > 0.0 {
                distances[idx] = 0.0;
                heap.push(DijkstraEntry::new(idx, 0.0));
            }
        }

        while let Some(entry) = heap.pop() {
            let u = entry.vertex;
            let dist_u = entry.distance;

            // Stale entry: a shorter path was already found
            if dist_u > distances[u] {
                continue;
            }

            for &(v, length) in &self.adjacency[u] {
                if !allowed(v) {
                    continue;
                }

                let new_dist = dist_u + length;
                if new_dist < distances[v] {
                    distances[v] = new_dist;
                    if let Some(ref mut preds) = predecessors {
                        preds[v] = Some(u);
                    }
                    heap.push(DijkstraEntry::new(v, new_dist));
                }
            }
        }

        GeodesicResult::new(distances, predecessors)
    }
}

/// Compute geodesic distances from multiple source vertices.
///
/// All source vertices are treated as having distance 0. This is useful for
/// computing distance fields from a set of points.
pub fn dijkstra_multiple<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    sources: &[VertexId<I>],
    options: &DijkstraOptions,
) -> GeodesicResult<I> {
    EdgeGraph::from_mesh(mesh).shortest_paths(sources, None, options)
}
