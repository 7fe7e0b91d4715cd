//! # Tessera
//!
//! Variational shape approximation for triangle meshes.
//!
//! Tessera partitions a surface into regions that are each well described by
//! a plane (a *proxy*), then rebuilds a coarse triangle mesh whose vertices
//! sit where region boundaries meet. The partition alone is useful as a
//! planar segmentation; the coarse mesh is a feature-preserving
//! simplification.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Three seeding strategies**: uniform, incremental and hierarchical
//! - **Parallel evaluation**: per-face geometry and errors through rayon
//! - **File formats**: STL and PLY input, approximation and segmentation output
//!
//! ## Quick Start
//!
//! ```no_run
//! use tessera::prelude::*;
//! use tessera::algo::approximate::{approximate, ApproximateOptions};
//!
//! let mesh: HalfEdgeMesh = tessera::io::load("model.stl").unwrap();
//!
//! let options = ApproximateOptions::default().with_num_proxies(40);
//! let result = approximate(&mesh, &options).unwrap();
//! println!(
//!     "{} anchors, {} triangles, error {:.4}",
//!     result.mesh.num_vertices(),
//!     result.mesh.num_triangles(),
//!     result.fitting_error
//! );
//!
//! tessera::io::save_triangles(&result.mesh, "coarse.stl").unwrap();
//! ```
//!
//! ## Step by Step
//!
//! A [`VsaSession`](algo::approximate::VsaSession) exposes the individual
//! phases, so a partition can be refined before extraction:
//!
//! ```
//! use tessera::prelude::*;
//! use tessera::algo::approximate::VsaSession;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let mut session = VsaSession::new(&mesh).unwrap();
//! session.partition(2, 5).unwrap();
//! while session.num_proxies() < 4 && session.insert_proxy() {
//!     session.flood();
//!     session.fit();
//! }
//!
//! let coarse = session.extract_mesh().unwrap();
//! assert_eq!(coarse.num_triangles(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

pub use error::{MeshError, Result};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_triangles, to_face_vertex, Face, FaceId, HalfEdge, HalfEdgeId, HalfEdgeMesh,
        MeshIndex, Vertex, VertexId,
    };
    pub use nalgebra::{Point3, Vector3};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
