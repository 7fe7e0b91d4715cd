//! Geodesic distance computation on meshes.
//!
//! Shortest paths are measured along mesh edges with Dijkstra's algorithm.
//! The search can start from several sources at once and can be confined to
//! a subset of the edges, which is how planar patches are triangulated.
//!
//! # Example
//!
//! ```
//! use tessera::prelude::*;
//! use tessera::algo::geodesic::{dijkstra_multiple, DijkstraOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! let options = DijkstraOptions::default().with_predecessors(true);
//! let result = dijkstra_multiple(&mesh, &[VertexId::new(0)], &options);
//! assert_eq!(result.source_of(VertexId::new(2)), Some(VertexId::new(0)));
//! ```

mod dijkstra;

use std::marker::PhantomData;

pub use dijkstra::{dijkstra_multiple, DijkstraOptions, EdgeGraph};

use crate::mesh::{MeshIndex, VertexId};

/// Result of geodesic distance computation.
///
/// Contains distances from source vertex/vertices to all other vertices,
/// and optionally predecessor information for path reconstruction.
#[derive(Debug, Clone)]
pub struct GeodesicResult<I: MeshIndex = u32> {
    /// Distance from source(s) to each vertex.
    /// `f64::INFINITY` if the vertex is unreachable.
    distances: Vec<f64>,

    /// Predecessor vertex for each vertex (for path reconstruction).
    /// `None` if predecessors weren't computed or vertex is a source/unreachable.
    predecessors: Option<Vec<Option<usize>>>,

    /// Phantom data for the index type.
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> GeodesicResult<I> {
    /// Create a new geodesic result.
    pub(crate) fn new(distances: Vec<f64>, predecessors: Option<Vec<Option<usize>>>) -> Self {
        Self {
            distances,
            predecessors,
            _marker: PhantomData,
        }
    }

    /// Get the distance to a vertex.
    ///
    /// Returns `f64::INFINITY` if the vertex is unreachable from the source(s).
    #[inline]
    pub fn distance(&self, v: VertexId<I>) -> f64 {
        self.distances[v.index()]
    }

    /// Get all distances as a slice.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Get the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Reconstruct the shortest path from a source to the given vertex.
    ///
    /// Returns `None` if:
    /// - Predecessors weren't stored (see [`DijkstraOptions::with_predecessors`])
    /// - The vertex is unreachable
    /// - The vertex is a source vertex (path is empty)
    ///
    /// The returned path includes both the source and target vertices.
    pub fn path_to(&self, target: VertexId<I>) -> Option<Vec<VertexId<I>>> {
        let predecessors = self.predecessors.as_ref()?;

        // Check if target is reachable
        if !self.distances[target.index()].is_finite() {
            return None;
        }

        // Reconstruct path by following predecessors
        let mut path = Vec::new();
        let mut current = target.index();

        loop {
            path.push(VertexId::new(current));

            match predecessors[current] {
                Some(pred) => current = pred,
                None => break, // Reached a source
            }

            // Safety check to prevent infinite loops
            if path.len() > self.distances.len() {
                return None;
            }
        }

        path.reverse();
        Some(path)
    }

    /// Get the vertex a shortest path to `v` arrives from.
    ///
    /// Returns `None` for sources, unreachable vertices, or when predecessors
    /// weren't stored.
    #[inline]
    pub fn predecessor(&self, v: VertexId<I>) -> Option<VertexId<I>> {
        self.predecessors.as_ref()?[v.index()].map(VertexId::new)
    }

    /// Follow predecessors from `v` back to the source its shortest path starts at.
    ///
    /// Returns `None` if `v` is unreachable or predecessors weren't stored.
    pub fn source_of(&self, v: VertexId<I>) -> Option<VertexId<I>> {
        let predecessors = self.predecessors.as_ref()?;
        if !self.is_reachable(v) {
            return None;
        }

        let mut current = v.index();
        for _ in 0..self.distances.len() {
            match predecessors[current] {
                Some(pred) => current = pred,
                None => return Some(VertexId::new(current)),
            }
        }

        None
    }

    /// Check if a vertex is reachable from the source(s).
    #[inline]
    pub fn is_reachable(&self, v: VertexId<I>) -> bool {
        self.distances[v.index()].is_finite()
    }

    /// Count the number of reachable vertices.
    pub fn reachable_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_finite()).count()
    }
}
