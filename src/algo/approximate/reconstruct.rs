//! Rebuild a coarse triangle mesh from anchors.
//!
//! Every mesh vertex is tagged with the anchor it is closest to along the
//! edges of its region, border vertices with the nearer end of their chord.
//! Each input face whose three corners carry three different anchors becomes
//! one output triangle over those anchors.

use log::debug;
use nalgebra::Point3;

use crate::algo::geodesic::{DijkstraOptions, EdgeGraph};
use crate::error::Result;
use crate::mesh::{build_from_triangles, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

use super::manifold::is_manifold_surface;
use super::session::VsaSession;

/// Triangle soup over anchor positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApproximatedMesh {
    /// Anchor positions, indexed by anchor id.
    pub positions: Vec<Point3<f64>>,

    /// Triangles as triples of anchor ids.
    pub triangles: Vec<[usize; 3]>,
}

impl ApproximatedMesh {
    /// Number of vertices (anchors).
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the triangles form an oriented 2-manifold.
    pub fn is_manifold(&self) -> bool {
        is_manifold_surface(&self.triangles, self.positions.len())
    }

    /// Convert to a half-edge mesh.
    ///
    /// Fails with [`MeshError::EmptyMesh`](crate::MeshError::EmptyMesh) when
    /// there are no triangles, and when a directed edge is used twice.
    pub fn to_halfedge_mesh<I: MeshIndex>(&self) -> Result<HalfEdgeMesh<I>> {
        build_from_triangles(&self.positions, &self.triangles)
    }
}

impl<'a, I: MeshIndex> VsaSession<'a, I> {
    /// Triangulate the anchors by tagging vertices with their nearest anchor.
    pub(super) fn pseudo_cdt(&self) -> ApproximatedMesh {
        let mut tags = self.vertex_status.clone();
        self.tag_region_interiors(&mut tags);
        self.tag_chords(&mut tags);

        let mut triangles = Vec::new();
        let mut skipped = 0;
        for f in self.mesh.face_ids() {
            let [a, b, c] = self.mesh.face_triangle(f).map(|v| tags[v.index()]);
            match (a, b, c) {
                (Some(a), Some(b), Some(c)) => {
                    if a != b && b != c && a != c {
                        triangles.push([a, b, c]);
                    }
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("{} faces skipped for untagged corners", skipped);
        }

        ApproximatedMesh {
            positions: self.anchors.iter().map(|a| a.position).collect(),
            triangles,
        }
    }

    // Tag the vertices of each region with their closest anchor in it.
    fn tag_region_interiors(&self, tags: &mut [Option<usize>]) {
        let graph = EdgeGraph::from_mesh(self.mesh);
        let options = DijkstraOptions::default().with_predecessors(true);

        let mut patches = vec![Vec::new(); self.proxies.len()];
        for f in self.mesh.face_ids() {
            patches[self.segments[f.index()]].extend(self.mesh.face_triangle(f));
        }

        let mut in_patch = vec![false; self.mesh.num_vertices()];
        for (region, patch) in patches.iter().enumerate() {
            for v in patch {
                in_patch[v.index()] = true;
            }

            let mut sources: Vec<VertexId<I>> = patch
                .iter()
                .copied()
                .filter(|v| self.vertex_status[v.index()].is_some())
                .collect();
            sources.sort_unstable_by_key(|v| v.index());
            sources.dedup();

            if sources.is_empty() {
                debug!("region {} has no anchor, left untagged", region);
            } else {
                let subset = Some(in_patch.as_slice());
                let paths = graph.shortest_paths(&sources, subset, &options);
                for &v in patch {
                    if let Some(source) = paths.source_of(v) {
                        tags[v.index()] = self.vertex_status[source.index()];
                    }
                }
            }

            for v in patch {
                in_patch[v.index()] = false;
            }
        }
    }

    // Split each chord at half its length between its two end anchors.
    fn tag_chords(&self, tags: &mut [Option<usize>]) {
        for border in &self.borders {
            let mut he = border.head;
            for _ in 0..self.mesh.num_halfedges() {
                let (next, chord) = self.walk_to_next_anchor(he);
                self.tag_chord(&chord, tags);
                he = next;
                if he == border.head {
                    break;
                }
            }
        }
    }

    fn tag_chord(&self, chord: &[HalfEdgeId<I>], tags: &mut [Option<usize>]) {
        let Some((&first, &last)) = chord.first().zip(chord.last()) else {
            return;
        };
        let left = self.vertex_status[self.mesh.origin(first).index()];
        let right = self.vertex_status[self.mesh.dest(last).index()];

        let mut walked = Vec::with_capacity(chord.len());
        let mut length = 0.0;
        for &h in chord {
            length += self.mesh.edge_length(h);
            walked.push(length);
        }
        let half = length / 2.0;

        for (i, &h) in chord[..chord.len() - 1].iter().enumerate() {
            let v = self.mesh.dest(h);
            tags[v.index()] = if walked[i] < half { left } else { right };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::approximate::fixtures::{flat_grid, folded_grid, tessellated_cube, unit_cube};

    fn assert_triangles_well_formed(approximation: &ApproximatedMesh) {
        for t in &approximation.triangles {
            assert!(t.iter().all(|&a| a < approximation.num_vertices()));
            assert!(t[0] != t[1] && t[1] != t[2] && t[0] != t[2]);
        }
    }

    #[test]
    fn test_cube_reconstructs_cube() {
        let mesh = unit_cube();
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(6, 3).unwrap();
        let approximation = session.extract_mesh().unwrap();

        assert_eq!(approximation.num_vertices(), 8);
        assert_eq!(approximation.num_triangles(), 12);
        assert!(approximation.is_manifold());
        assert_triangles_well_formed(&approximation);

        let rebuilt: HalfEdgeMesh = approximation.to_halfedge_mesh().unwrap();
        assert!(rebuilt.is_valid() && rebuilt.is_closed());
        assert!((rebuilt.surface_area() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_folded_grid_triangles() {
        let mesh = folded_grid(4);
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(2, 3).unwrap();
        let approximation = session.extract_mesh().unwrap();

        assert_eq!(approximation.num_vertices(), 6);
        assert!(approximation.num_triangles() > 0);
        assert_triangles_well_formed(&approximation);
    }

    #[test]
    fn test_tessellated_cube_triangles() {
        let mesh = tessellated_cube(3);
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(6, 5).unwrap();
        let approximation = session.extract_mesh().unwrap();

        // One quad per side, spanning the centre cell.
        assert_eq!(approximation.num_vertices(), 8);
        assert_eq!(approximation.num_triangles(), 12);
        assert!(approximation.is_manifold());
        assert_triangles_well_formed(&approximation);
    }

    #[test]
    fn test_single_region_closed_mesh_is_empty() {
        let mesh = unit_cube();
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(1, 2).unwrap();
        let approximation = session.extract_mesh().unwrap();

        assert_eq!(approximation.num_vertices(), 0);
        assert_eq!(approximation.num_triangles(), 0);
        assert!(approximation.to_halfedge_mesh::<u32>().is_err());
    }

    #[test]
    fn test_chord_midpoint_split() {
        let mesh = flat_grid(4);
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(1, 2).unwrap();
        session.extract_mesh().unwrap();

        // Every border vertex ends up tagged with an anchor of its own chord.
        let mut tags = session.vertex_status.clone();
        session.tag_chords(&mut tags);
        for v in mesh.vertex_ids() {
            if mesh.is_boundary_vertex(v) {
                assert!(tags[v.index()].is_some());
            }
        }
    }
}
