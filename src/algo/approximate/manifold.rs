//! Manifoldness check for reconstructed triangle sets.

use log::debug;

use crate::mesh::SurfaceBuilder;

/// Check whether `triangles` over `num_vertices` vertices can be assembled
/// into an oriented 2-manifold, possibly with boundary.
///
/// Triangles are fed one by one to a [`SurfaceBuilder`]; the check fails at
/// the first triangle the builder rejects. An empty set is manifold.
pub fn is_manifold_surface(triangles: &[[usize; 3]], num_vertices: usize) -> bool {
    let mut builder = SurfaceBuilder::new(num_vertices);
    for (i, triangle) in triangles.iter().enumerate() {
        if !builder.add_facet(triangle) {
            debug!("triangle {} {:?} breaks manifoldness", i, triangle);
            return false;
        }
    }
    true
}
