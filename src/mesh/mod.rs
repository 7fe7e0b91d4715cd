//! Core mesh data structures.
//!
//! The primary type is [`HalfEdgeMesh`], a triangle mesh stored as a half-edge
//! (doubly-connected edge list). Adjacency queries are O(1), and the
//! circulators cross the mesh border the same way they cross faces.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! ```
//! use tessera::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert!(!mesh.is_closed());
//! ```

mod builder;
mod halfedge;
mod index;

pub use builder::{build_from_triangles, to_face_vertex, SurfaceBuilder};
pub use halfedge::{
    Face, HalfEdge, HalfEdgeMesh, TargetHalfEdgeIter, Vertex, VertexHalfEdgeIter,
};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
