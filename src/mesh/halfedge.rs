//! Half-edge mesh data structure.
//!
//! Triangle meshes are stored as a half-edge (doubly-connected edge list)
//! structure over three arenas: vertices, half-edges and faces. All adjacency
//! is index based, so every navigation step is O(1).
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite directions
//! - Each half-edge knows its **twin**, the **next**/**prev** half-edge around
//!   its face, its **origin** vertex and its incident **face**
//! - Each vertex stores one outgoing half-edge
//! - Each face stores one of its three half-edges
//!
//! # Boundary Handling
//!
//! Half-edges on the mesh border have an invalid face id. They are linked into
//! loops through `next`/`prev`, which lets vertex circulation run through the
//! border like through any other face.

use std::collections::VecDeque;

use nalgebra::{Point3, Vector3};

use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge from this vertex.
    /// For boundary vertices, this is a border half-edge.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new unconnected vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge originates from.
    pub origin: VertexId<I>,

    /// The opposite half-edge.
    pub twin: HalfEdgeId<I>,

    /// The next half-edge around the face (or border loop).
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face (or border loop).
    pub prev: HalfEdgeId<I>,

    /// The face this half-edge belongs to. Invalid on the mesh border.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new unlinked half-edge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Check if this half-edge lies on the mesh border.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

impl<I: MeshIndex> Default for HalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A triangular face in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge of this face.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Face<I> {
    /// Create a new face with the given half-edge.
    pub fn new(halfedge: HalfEdgeId<I>) -> Self {
        Self { halfedge }
    }
}

/// A half-edge triangle mesh.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create an empty mesh with room for the given number of elements.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Closed meshes have exactly 3F half-edges; leave some slack for borders.
        let num_halfedges = num_faces * 3 + num_faces / 2;

        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_halfedges),
            faces: Vec::with_capacity(num_faces),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of half-edges, border half-edges included.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Get the origin (source) vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Get the destination (target) vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(self.twin(he))
    }

    /// Get the face of a half-edge (invalid on the border).
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Check if a half-edge lies on the mesh border (has no face).
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if the edge of a half-edge touches the mesh border on either side.
    #[inline]
    pub fn is_boundary_edge(&self, he: HalfEdgeId<I>) -> bool {
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(self.twin(he))
    }

    /// Check if a vertex is on the boundary.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        if !self.vertex(v).halfedge.is_valid() {
            return true;
        }
        self.vertex_halfedges(v)
            .any(|he| self.is_boundary_halfedge(he))
    }

    /// Check if the mesh has no border half-edges.
    pub fn is_closed(&self) -> bool {
        self.halfedges.iter().all(|he| !he.is_boundary())
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over the edges of the mesh, one representative half-edge each.
    pub fn edges(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.halfedge_ids().filter(move |&he| he < self.twin(he))
    }

    /// Iterate over half-edges leaving a vertex.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, self.vertex(v).halfedge)
    }

    /// Iterate over half-edges arriving at a vertex.
    pub fn incoming_halfedges(&self, v: VertexId<I>) -> TargetHalfEdgeIter<'_, I> {
        let out = self.vertex(v).halfedge;
        let start = if out.is_valid() { self.twin(out) } else { out };
        TargetHalfEdgeIter::new(self, start)
    }

    /// Iterate over the half-edges arriving at `dest(he)`, starting with `he`.
    ///
    /// Consecutive items are related by `h -> twin(next(h))`, i.e. the walk
    /// turns around the target vertex through faces and border loops alike.
    pub fn halfedges_around_target(&self, he: HalfEdgeId<I>) -> TargetHalfEdgeIter<'_, I> {
        TargetHalfEdgeIter::new(self, he)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over faces incident to a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// Get the three half-edges of a face, starting at its stored half-edge.
    pub fn face_halfedges(&self, f: FaceId<I>) -> [HalfEdgeId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [he0, he1, he2]
    }

    /// Iterate over the faces sharing an edge with `f`.
    ///
    /// Neighbours come in the order of the face's half-edges; edges on the
    /// mesh border contribute nothing.
    pub fn face_neighbors(&self, f: FaceId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.face_halfedges(f)
            .into_iter()
            .map(|he| self.face_of(self.twin(he)))
            .filter(|n| n.is_valid())
    }

    /// Get the three vertices of a face.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Get the positions of the three vertices of a face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        self.face_triangle(f).map(|v| *self.position(v))
    }

    /// Count the face-connected components of the mesh.
    pub fn num_face_components(&self) -> usize {
        let mut component = vec![false; self.num_faces()];
        let mut queue = VecDeque::new();
        let mut count = 0;

        for seed in self.face_ids() {
            if component[seed.index()] {
                continue;
            }
            count += 1;
            component[seed.index()] = true;
            queue.push_back(seed);

            while let Some(f) = queue.pop_front() {
                for n in self.face_neighbors(f) {
                    if !component[n.index()] {
                        component[n.index()] = true;
                        queue.push_back(n);
                    }
                }
            }
        }

        count
    }

    // ==================== Geometry ====================

    /// Compute the unit normal of a face.
    ///
    /// Degenerate (zero-area) faces yield the zero vector.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0)
            .cross(&(p2 - p0))
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, he: HalfEdgeId<I>) -> f64 {
        (self.position(self.dest(he)) - self.position(self.origin(he))).norm()
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Compute the axis-aligned bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            (min.inf(&v.position), max.sup(&v.position))
        }))
    }

    // ==================== Construction ====================

    /// Add a new unconnected vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    // ==================== Validation ====================

    /// Check if the connectivity is consistent.
    pub fn is_valid(&self) -> bool {
        let vertices_ok = self.vertex_ids().all(|v| {
            let he = self.vertex(v).halfedge;
            !he.is_valid() || self.origin(he) == v
        });

        let halfedges_ok = self.halfedge_ids().all(|id| {
            let he = self.halfedge(id);
            he.twin.is_valid()
                && he.next.is_valid()
                && he.prev.is_valid()
                && self.twin(he.twin) == id
                && self.prev(he.next) == id
                && self.next(he.prev) == id
                && self.origin(he.next) == self.dest(id)
        });

        let faces_ok = self.face_ids().all(|f| {
            let [he0, he1, he2] = self.face_halfedges(f);
            self.next(he2) == he0
                && [he0, he1, he2].iter().all(|&he| self.face_of(he) == f)
        });

        vertices_ok && halfedges_ok && faces_ok
    }
}

/// Iterator over the half-edges leaving a vertex.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, start: HalfEdgeId<I>) -> Self {
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        // he: v -> w, twin: w -> v, next(twin) leaves v again.
        self.current = self.mesh.next(self.mesh.twin(self.current));
        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over the half-edges arriving at a vertex.
pub struct TargetHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> TargetHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, start: HalfEdgeId<I>) -> Self {
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for TargetHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        // he: u -> v, next(he) leaves v, its twin arrives at v again.
        self.current = self.mesh.twin(self.mesh.next(self.current));
        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;

    fn create_tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn create_fan() -> HalfEdgeMesh {
        // Four triangles around the centre vertex 0, open boundary.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = HalfEdgeMesh::<u32>::new();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_faces(), 0);
        assert!(mesh.bounding_box().is_none());
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_incoming_halfedges_target_vertex() {
        let mesh = create_tetrahedron();
        for v in mesh.vertex_ids() {
            let incoming: Vec<_> = mesh.incoming_halfedges(v).collect();
            assert_eq!(incoming.len(), 3);
            assert!(incoming.iter().all(|&he| mesh.dest(he) == v));
        }
    }

    #[test]
    fn test_incoming_halfedges_cross_border() {
        let mesh = create_fan();
        // Boundary vertex 1 has edges to 0, 2 and 4.
        let v = VertexId::new(1);
        let incoming: Vec<_> = mesh.incoming_halfedges(v).collect();
        assert_eq!(incoming.len(), 3);
        let borders = incoming
            .iter()
            .filter(|&&he| mesh.is_boundary_halfedge(he))
            .count();
        assert_eq!(borders, 1);
    }

    #[test]
    fn test_halfedges_around_target_starts_at_given() {
        let mesh = create_fan();
        let f = FaceId::new(2);
        let he = mesh.face(f).halfedge;
        let first = mesh.halfedges_around_target(he).next();
        assert_eq!(first, Some(he));
        assert_eq!(
            mesh.halfedges_around_target(he).count(),
            mesh.incoming_halfedges(mesh.dest(he)).count()
        );
    }

    #[test]
    fn test_face_neighbors() {
        let mesh = create_fan();
        let neighbors: Vec<_> = mesh.face_neighbors(FaceId::new(0)).collect();
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.contains(&FaceId::new(1)));
        assert!(neighbors.contains(&FaceId::new(3)));

        let closed = create_tetrahedron();
        assert_eq!(closed.face_neighbors(FaceId::new(0)).count(), 3);
    }

    #[test]
    fn test_edges_unique() {
        let mesh = create_tetrahedron();
        assert_eq!(mesh.edges().count(), 6);

        let fan = create_fan();
        assert_eq!(fan.edges().count(), 8);
    }

    #[test]
    fn test_geometry() {
        let mesh = create_fan();
        let f = FaceId::new(0);
        assert!((mesh.face_area(f) - 0.5).abs() < 1e-12);
        assert!((mesh.face_normal(f) - Vector3::z()).norm() < 1e-12);
        assert!((mesh.surface_area() - 2.0).abs() < 1e-12);

        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_components() {
        let mesh = create_tetrahedron();
        assert_eq!(mesh.num_face_components(), 1);

        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(5.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [3, 4, 5]];
        let split: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
        assert_eq!(split.num_face_components(), 2);
    }
}
