//! Mesh construction utilities.
//!
//! [`build_from_triangles`] turns an indexed triangle list into a
//! [`HalfEdgeMesh`]. [`SurfaceBuilder`] answers the cheaper question of
//! whether a triangle list *could* be assembled into an oriented 2-manifold,
//! one facet at a time.

use std::collections::{HashMap, HashSet};

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Half-edge ids are assigned deterministically: face `f` owns half-edges
/// `3f`, `3f + 1` and `3f + 2`, and border half-edges follow in the order
/// of the interior half-edges they are twinned with.
///
/// # Example
/// ```
/// use tessera::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vi) = face.iter().find(|&&vi| vi >= vertices.len()) {
            return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices
        .iter()
        .map(|&pos| mesh.add_vertex(pos))
        .collect();

    // Directed edge (v0, v1) -> interior half-edge
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> =
        HashMap::with_capacity(faces.len() * 3);

    // First pass: faces and their half-edge triangles
    for face in faces {
        let base = mesh.num_halfedges();
        let face_id = FaceId::<I>::new(mesh.num_faces());
        mesh.faces.push(Face::new(HalfEdgeId::new(base)));

        for corner in 0..3 {
            let he = HalfEdgeId::<I>::new(base + corner);
            let v0 = face[corner];
            let v1 = face[(corner + 1) % 3];

            if edge_map.insert((v0, v1), he).is_some() {
                return Err(MeshError::NonManifoldEdge { v0, v1 });
            }

            mesh.halfedges.push(HalfEdge {
                origin: vertex_ids[v0],
                twin: HalfEdgeId::invalid(),
                next: HalfEdgeId::new(base + (corner + 1) % 3),
                prev: HalfEdgeId::new(base + (corner + 2) % 3),
                face: face_id,
            });

            // Overwritten for shared vertices; border vertices are fixed below.
            mesh.vertex_mut(vertex_ids[v0]).halfedge = he;
        }
    }

    // Second pass: twins, creating border half-edges where the opposite is missing
    let num_interior = mesh.num_halfedges();
    for index in 0..num_interior {
        let he = HalfEdgeId::<I>::new(index);
        let v0 = mesh.origin(he).index();
        // Twins are not linked yet; the next half-edge starts at our destination.
        let v1 = mesh.origin(mesh.next(he)).index();

        match edge_map.get(&(v1, v0)) {
            Some(&twin) => mesh.halfedge_mut(he).twin = twin,
            None => {
                let border = HalfEdgeId::<I>::new(mesh.num_halfedges());
                mesh.halfedges.push(HalfEdge {
                    origin: vertex_ids[v1],
                    twin: he,
                    ..HalfEdge::new()
                });
                mesh.halfedge_mut(he).twin = border;
            }
        }
    }

    link_boundary_loops(&mut mesh, num_interior);
    fix_boundary_vertex_halfedges(&mut mesh);

    Ok(mesh)
}

/// Link border half-edges into loops.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, first_border: usize) {
    let mut outgoing: HashMap<usize, HalfEdgeId<I>> = HashMap::new();
    for index in first_border..mesh.num_halfedges() {
        let he = HalfEdgeId::<I>::new(index);
        outgoing.insert(mesh.origin(he).index(), he);
    }

    for index in first_border..mesh.num_halfedges() {
        let he = HalfEdgeId::<I>::new(index);
        let dest = mesh.dest(he).index();
        if let Some(&next_he) = outgoing.get(&dest) {
            mesh.halfedge_mut(he).next = next_he;
            mesh.halfedge_mut(next_he).prev = he;
        }
    }
}

/// Ensure boundary vertices point to their outgoing border half-edge.
fn fix_boundary_vertex_halfedges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let first_border = mesh.num_faces() * 3;
    for index in first_border..mesh.num_halfedges() {
        let he = HalfEdgeId::<I>::new(index);
        let v = mesh.origin(he);
        mesh.vertex_mut(v).halfedge = he;
    }
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Returns a `(vertices, faces)` tuple.
pub fn to_face_vertex<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<[usize; 3]> = mesh
        .face_ids()
        .map(|f| mesh.face_triangle(f).map(|v| v.index()))
        .collect();

    (vertices, faces)
}

/// Incremental test for oriented 2-manifold surfaces.
///
/// Facets are offered one at a time. [`test_facet`](Self::test_facet)
/// reports whether a facet can join the surface built so far without
/// breaking manifoldness, [`add_facet`](Self::add_facet) commits it.
#[derive(Debug, Clone)]
pub struct SurfaceBuilder {
    num_vertices: usize,
    directed: HashSet<(usize, usize)>,
    edge_faces: HashMap<(usize, usize), u8>,
    used: Vec<bool>,
    // Incident undirected edges carrying exactly one facet.
    open_edges: Vec<usize>,
}

impl SurfaceBuilder {
    /// Create a builder over `num_vertices` vertices and no facets.
    pub fn new(num_vertices: usize) -> Self {
        Self {
            num_vertices,
            directed: HashSet::new(),
            edge_faces: HashMap::new(),
            used: vec![false; num_vertices],
            open_edges: vec![0; num_vertices],
        }
    }

    /// Number of facets added so far.
    pub fn num_facets(&self) -> usize {
        self.directed.len() / 3
    }

    /// Check whether `facet` can be added.
    pub fn test_facet(&self, facet: &[usize; 3]) -> bool {
        let [a, b, c] = *facet;
        if a >= self.num_vertices || b >= self.num_vertices || c >= self.num_vertices {
            return false;
        }
        if a == b || b == c || a == c {
            return false;
        }

        let edges_ok = (0..3).all(|i| {
            let (u, v) = (facet[i], facet[(i + 1) % 3]);
            !self.directed.contains(&(u, v))
                && self.edge_faces.get(&undirected(u, v)).copied().unwrap_or(0) < 2
        });

        // A used vertex without open edges is enclosed by a full umbrella.
        let corners_ok = facet
            .iter()
            .all(|&v| !self.used[v] || self.open_edges[v] > 0);

        edges_ok && corners_ok
    }

    /// Add `facet`, returning `false` (and leaving the builder unchanged)
    /// when [`test_facet`](Self::test_facet) rejects it.
    pub fn add_facet(&mut self, facet: &[usize; 3]) -> bool {
        if !self.test_facet(facet) {
            return false;
        }

        for i in 0..3 {
            let (u, v) = (facet[i], facet[(i + 1) % 3]);
            self.directed.insert((u, v));

            let count = self.edge_faces.entry(undirected(u, v)).or_insert(0);
            *count += 1;
            if *count == 1 {
                self.open_edges[u] += 1;
                self.open_edges[v] += 1;
            } else {
                self.open_edges[u] -= 1;
                self.open_edges[v] -= 1;
            }
        }
        for &v in facet {
            self.used[v] = true;
        }

        true
    }
}

fn undirected(u: usize, v: usize) -> (usize, usize) {
    if u < v {
        (u, v)
    } else {
        (v, u)
    }
}
