//! Anchors, borders and chord subdivision.
//!
//! Region boundaries are walked along region-side half-edges: a half-edge
//! belongs to the walk of the region its face is in, and the next half-edge
//! is found by turning around its target until the region changes.
//!
//! # Algorithm
//!
//! 1. Vertices where three or more boundary edges meet become anchors
//! 2. Every boundary loop is walked from anchor to anchor; a loop without an
//!    anchor gets one at its starting half-edge
//! 3. Each chord between consecutive anchors is split recursively at its
//!    most distant vertex while the deviation criterion exceeds the threshold
//! 4. Loops left with two anchors or fewer receive one more at the vertex
//!    farthest from the line through the head anchor and the next anchor

use std::collections::BTreeSet;

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::mesh::{HalfEdgeId, MeshIndex, VertexId};

use super::session::VsaSession;

/// Boundary state of a half-edge during border tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfEdgeStatus {
    /// Not on a region boundary.
    OffBorder,
    /// On a region boundary that has not been walked yet.
    Candidate,
    /// Consumed by a border walk.
    OnBorder,
}

/// A vertex of the approximated mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor<I: MeshIndex = u32> {
    /// The mesh vertex the anchor sits on.
    pub vertex: VertexId<I>,

    /// Area-weighted mean of the vertex projected onto the incident proxy planes.
    pub position: Point3<f64>,
}

/// A closed boundary loop of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border<I: MeshIndex = u32> {
    /// Region-side half-edge whose target carries an anchor.
    pub head: HalfEdgeId<I>,

    /// Number of anchors on the loop.
    pub num_anchors: usize,
}

impl<'a, I: MeshIndex> VsaSession<'a, I> {
    /// Anchor ids met along each border, chord by chord, ending with the
    /// anchor at the head.
    pub fn collect_borders(&self) -> Vec<Vec<usize>> {
        self.borders
            .iter()
            .map(|border| {
                let mut ids = Vec::with_capacity(border.num_anchors);
                let mut he = border.head;
                for _ in 0..self.mesh.num_halfedges() {
                    let (next, _) = self.walk_to_next_anchor(he);
                    if let Some(id) = self.vertex_status[self.mesh.dest(next).index()] {
                        ids.push(id);
                    }
                    he = next;
                    if he == border.head {
                        break;
                    }
                }
                ids
            })
            .collect()
    }

    /// Rebuild anchors and borders from the current partition.
    pub(super) fn trace_boundaries(&mut self) {
        self.find_anchors();
        self.find_edges();
        self.add_anchors();
    }

    pub(super) fn region_of(&self, he: HalfEdgeId<I>) -> Option<usize> {
        let face = self.mesh.face_of(he);
        face.is_valid().then(|| self.segments[face.index()])
    }

    fn is_anchor_attached(&self, he: HalfEdgeId<I>) -> bool {
        self.vertex_status[self.mesh.dest(he).index()].is_some()
    }

    // Regions on both sides of a region-side half-edge.
    fn regions_across(&self, he: HalfEdgeId<I>) -> BTreeSet<usize> {
        [he, self.mesh.twin(he)]
            .into_iter()
            .filter_map(|h| self.region_of(h))
            .collect()
    }

    /// Attach an anchor to `vertex`, placed on the planes of `regions`.
    ///
    /// Returns the existing id if the vertex already carries one.
    fn attach_anchor(&mut self, vertex: VertexId<I>, regions: &BTreeSet<usize>) -> usize {
        if let Some(id) = self.vertex_status[vertex.index()] {
            return id;
        }

        let point = *self.mesh.position(vertex);
        let mut weighted = Vector3::zeros();
        let mut total_area = 0.0;
        for &region in regions {
            let area = self.regions.areas[region];
            let projected = self.regions.project(&self.proxies[region], region, &point);
            weighted += projected.coords * area;
            total_area += area;
        }
        let position = if total_area > 0.0 {
            Point3::from(weighted / total_area)
        } else {
            point
        };

        let id = self.anchors.len();
        self.vertex_status[vertex.index()] = Some(id);
        self.anchors.push(Anchor { vertex, position });
        id
    }

    /// Mark vertices where three or more boundary edges meet as anchors.
    fn find_anchors(&mut self) {
        self.anchors.clear();
        self.vertex_status.fill(None);

        for v in self.mesh.vertex_ids() {
            let mut regions = BTreeSet::new();
            let mut crossings = 0;

            for h in self.mesh.incoming_halfedges(v) {
                let twin = self.mesh.twin(h);
                let (near, far) = (self.region_of(h), self.region_of(twin));
                match (near, far) {
                    (Some(a), Some(b)) if a == b => {}
                    (Some(a), _) => {
                        crossings += 1;
                        regions.insert(a);
                    }
                    (None, _) => crossings += 1,
                }
            }

            if crossings >= 3 {
                self.attach_anchor(v, &regions);
            }
        }

        debug!("found {} anchors at region corners", self.anchors.len());
    }

    fn tag_halfedge_status(&mut self) {
        for he in self.mesh.halfedge_ids() {
            let status = match (self.region_of(he), self.region_of(self.mesh.twin(he))) {
                (Some(a), Some(b)) if a != b => HalfEdgeStatus::Candidate,
                (Some(_), None) => HalfEdgeStatus::Candidate,
                _ => HalfEdgeStatus::OffBorder,
            };
            self.halfedge_status[he.index()] = status;
        }
    }

    /// The region-side boundary half-edge following `he` on its loop.
    pub(super) fn next_border_halfedge(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        let region = self.region_of(he);
        self.mesh
            .halfedges_around_target(he)
            .find(|&h| self.region_of(h) != region)
            .map_or(he, |h| self.mesh.twin(h))
    }

    fn walk_to_first_anchor(&self, start: HalfEdgeId<I>) -> HalfEdgeId<I> {
        let mut he = start;
        while !self.is_anchor_attached(he) {
            he = self.next_border_halfedge(he);
            if he == start {
                break;
            }
        }
        he
    }

    /// Walk from `he` to the next half-edge pointing at an anchor, returning
    /// it together with the chord walked.
    pub(super) fn walk_to_next_anchor(
        &self,
        mut he: HalfEdgeId<I>,
    ) -> (HalfEdgeId<I>, Vec<HalfEdgeId<I>>) {
        let mut chord = Vec::new();
        for _ in 0..self.mesh.num_halfedges() {
            he = self.next_border_halfedge(he);
            chord.push(he);
            if self.is_anchor_attached(he) {
                break;
            }
        }
        (he, chord)
    }

    /// Trace every boundary loop, subdividing its chords.
    fn find_edges(&mut self) {
        self.tag_halfedge_status();
        self.borders.clear();

        let num_halfedges = self.mesh.num_halfedges();
        let mut cursor = 0;
        loop {
            while cursor < num_halfedges
                && self.halfedge_status[cursor] != HalfEdgeStatus::Candidate
            {
                cursor += 1;
            }
            if cursor == num_halfedges {
                break;
            }

            let head = self.walk_to_first_anchor(HalfEdgeId::new(cursor));
            if !self.is_anchor_attached(head) {
                let regions = self.regions_across(head);
                self.attach_anchor(self.mesh.dest(head), &regions);
            }

            let mut border = Border {
                head,
                num_anchors: 0,
            };
            let mut he = head;
            for _ in 0..num_halfedges {
                let (next, chord) = self.walk_to_next_anchor(he);
                border.num_anchors += self.subdivide_chord(&chord);
                for h in &chord {
                    self.halfedge_status[h.index()] = HalfEdgeStatus::OnBorder;
                }
                he = next;
                if he == head {
                    break;
                }
            }
            self.halfedge_status[cursor] = HalfEdgeStatus::OnBorder;

            debug!(
                "border {} at {:?}: {} anchors",
                self.borders.len(),
                head,
                border.num_anchors
            );
            self.borders.push(border);
        }
    }

    /// Recursively split `chord` while it deviates too far from the straight
    /// segment between its end anchors.
    ///
    /// Returns the number of anchors on the chord, not counting its start.
    fn subdivide_chord(&mut self, chord: &[HalfEdgeId<I>]) -> usize {
        if chord.len() < 4 {
            return 1;
        }

        let first = chord[0];
        let last = chord[chord.len() - 1];
        let twin = self.mesh.twin(first);
        let (Some(left), right) = (self.region_of(first), self.region_of(twin)) else {
            return 1;
        };

        let norm_sin = match right {
            Some(right) => self.proxies[left]
                .normal
                .cross(&self.proxies[right].normal)
                .norm(),
            None => 1.0,
        };

        let start = self.mesh.origin(first);
        let end = self.mesh.dest(last);
        let p_begin = *self.mesh.position(start);
        let p_end = *self.mesh.position(end);
        let interior = &chord[..chord.len() - 1];

        let mut split: Option<(usize, f64)> = None;
        let criterion = if self.vertex_status[start.index()] == self.vertex_status[end.index()] {
            // A loop through a single anchor is always split
            for (i, &h) in interior.iter().enumerate() {
                let dist = (self.mesh.position(self.mesh.dest(h)) - p_begin).norm();
                if dist > split.map_or(0.0, |(_, max)| max) {
                    split = Some((i, dist));
                }
            }
            self.subdivision_threshold + 1.0
        } else {
            let chord_vec = p_end - p_begin;
            let chord_len = chord_vec.norm();
            if chord_len > 0.0 {
                let direction = chord_vec / chord_len;
                for (i, &h) in interior.iter().enumerate() {
                    let offset = self.mesh.position(self.mesh.dest(h)) - p_begin;
                    let dist = direction.cross(&offset).norm();
                    if dist > split.map_or(0.0, |(_, max)| max) {
                        split = Some((i, dist));
                    }
                }
                split.map_or(0.0, |(_, max)| max) * norm_sin / chord_len
            } else {
                0.0
            }
        };

        match split {
            Some((i, _)) if criterion > self.subdivision_threshold => {
                let regions: BTreeSet<usize> = [Some(left), right].into_iter().flatten().collect();
                self.attach_anchor(self.mesh.dest(chord[i]), &regions);
                self.subdivide_chord(&chord[..=i]) + self.subdivide_chord(&chord[i + 1..])
            }
            _ => 1,
        }
    }

    /// Give every border with two anchors or fewer one more anchor.
    fn add_anchors(&mut self) {
        for b in 0..self.borders.len() {
            if self.borders[b].num_anchors > 2 {
                continue;
            }

            let head = self.borders[b].head;
            let p_begin = *self.mesh.position(self.mesh.dest(head));
            let mut p_end = p_begin;
            let mut candidates = Vec::new();
            let mut count = 0;

            let mut he = head;
            for _ in 0..self.mesh.num_halfedges() {
                he = self.next_border_halfedge(he);
                if !self.is_anchor_attached(he) {
                    candidates.push(he);
                } else {
                    if count == 0 {
                        p_end = *self.mesh.position(self.mesh.dest(he));
                    }
                    count += 1;
                }
                if he == head {
                    break;
                }
            }

            // A neighbouring border may have added anchors in the meantime.
            if count > 2 {
                self.borders[b].num_anchors = count;
                continue;
            }

            let direction = (p_end - p_begin).try_normalize(0.0);
            let mut farthest: Option<(HalfEdgeId<I>, f64)> = None;
            for &h in &candidates {
                let offset = self.mesh.position(self.mesh.dest(h)) - p_begin;
                let dist = match direction {
                    Some(direction) => direction.cross(&offset).norm(),
                    None => offset.norm(),
                };
                if dist > farthest.map_or(0.0, |(_, max)| max) {
                    farthest = Some((h, dist));
                }
            }

            match farthest {
                Some((h, _)) => {
                    let regions = self.regions_across(h);
                    self.attach_anchor(self.mesh.dest(h), &regions);
                    self.borders[b].num_anchors = count + 1;
                }
                None => self.borders[b].num_anchors = count,
            }
            debug!(
                "border {} repaired to {} anchors",
                b, self.borders[b].num_anchors
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::approximate::fixtures::{flat_grid, folded_grid, tessellated_cube, unit_cube};
    use crate::algo::approximate::proxy::{PlaneProxy, RegionGeometry};
    use crate::algo::approximate::ApproximateOptions;
    use crate::mesh::{build_from_triangles, FaceId};
    use approx::assert_relative_eq;

    fn traced<'a>(session: &mut VsaSession<'a>) {
        session.regions = RegionGeometry::from_partition(
            session.mesh,
            &session.geometry,
            &session.segments,
            session.proxies.len(),
        );
        session.trace_boundaries();
    }

    fn assert_borders_close(session: &VsaSession<'_>) {
        for border in session.borders() {
            let mut he = border.head;
            let mut closed = false;
            for _ in 0..session.mesh().num_halfedges() {
                he = session.next_border_halfedge(he);
                if he == border.head {
                    closed = true;
                    break;
                }
            }
            assert!(closed, "border at {:?} does not close", border.head);
        }
    }

    // Grid coordinates of the anchors, in anchor id order.
    fn anchor_cells(session: &VsaSession<'_>) -> Vec<(i64, i64)> {
        session
            .anchors()
            .iter()
            .map(|a| {
                let p = session.mesh().position(a.vertex);
                (p.x.round() as i64, p.y.round() as i64)
            })
            .collect()
    }

    fn assert_anchor_ids_dense(session: &VsaSession<'_>) {
        let mut seen = vec![false; session.anchors().len()];
        for (v, status) in session.vertex_status().iter().enumerate() {
            if let Some(id) = *status {
                assert!(!seen[id], "anchor {} attached twice", id);
                seen[id] = true;
                assert_eq!(session.anchors()[id].vertex.index(), v);
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_cube_anchors_at_corners() {
        let mesh = unit_cube();
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(6, 3).unwrap();
        traced(&mut session);

        assert_eq!(session.anchors().len(), 8);
        for anchor in session.anchors() {
            assert_relative_eq!(
                anchor.position,
                *mesh.position(anchor.vertex),
                epsilon = 1e-12
            );
        }

        assert_eq!(session.borders().len(), 6);
        assert!(session.borders().iter().all(|b| b.num_anchors == 4));
        for ids in session.collect_borders() {
            assert_eq!(ids.len(), 4);
        }
        assert_borders_close(&session);
        assert_anchor_ids_dense(&session);
    }

    #[test]
    fn test_folded_grid_corners() {
        let mesh = folded_grid(4);
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(2, 3).unwrap();
        traced(&mut session);

        assert_eq!(session.anchors().len(), 6);
        assert_eq!(session.borders().len(), 2);
        assert!(session.borders().iter().all(|b| b.num_anchors == 4));

        // Interior fold vertices stay plain vertices.
        for anchor in session.anchors() {
            let p = mesh.position(anchor.vertex);
            let on_fold = (p.x - 1.0).abs() < 1e-12 && p.z.abs() < 1e-12;
            if on_fold {
                assert!(p.y.abs() < 1e-12 || (p.y - 1.0).abs() < 1e-12);
            }
        }
        assert_borders_close(&session);
        assert_anchor_ids_dense(&session);
    }

    #[test]
    fn test_straight_chord_not_subdivided() {
        // The fold between floor and wall is a straight chord of 8 half-edges.
        let mesh = folded_grid(8);
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(2, 3).unwrap();
        traced(&mut session);

        let fold_anchors = session
            .anchors()
            .iter()
            .filter(|a| {
                let p = mesh.position(a.vertex);
                (p.x - 1.0).abs() < 1e-12 && p.z.abs() < 1e-12
            })
            .count();
        assert_eq!(fold_anchors, 2);
    }

    #[test]
    fn test_single_region_closed_mesh() {
        let mesh = tessellated_cube(2);
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(1, 2).unwrap();
        traced(&mut session);

        assert!(session.anchors().is_empty());
        assert!(session.borders().is_empty());
        assert!(session.collect_borders().is_empty());
    }

    #[test]
    fn test_single_region_open_mesh() {
        let mesh = flat_grid(4);
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(1, 2).unwrap();

        session.regions =
            RegionGeometry::from_partition(&mesh, &session.geometry, &session.segments, 1);
        session.find_anchors();
        assert!(session.anchors().is_empty());

        session.find_edges();
        session.add_anchors();
        assert_eq!(session.borders().len(), 1);
        assert!(session.borders()[0].num_anchors >= 3);
        assert_eq!(
            session.collect_borders()[0].len(),
            session.borders()[0].num_anchors
        );
        assert_borders_close(&session);
        assert_anchor_ids_dense(&session);
    }

    #[test]
    fn test_bent_chords_are_subdivided() {
        // The outer loop starts at (1, 0) and is first split at (4, 4), the
        // farthest vertex. The chord (1, 0) -> (4, 4) deviates by 2.4 at
        // (4, 0), the chord (4, 4) -> (1, 0) by 3.2 at (0, 4), both over a
        // length of 5. The remaining chord (0, 4) -> (1, 0) scores 4/17 at
        // (0, 0).
        let mesh = flat_grid(4);
        let options = ApproximateOptions::default().with_subdivision_threshold(0.2);
        let mut session = VsaSession::with_options(&mesh, &options).unwrap();
        session.partition(1, 2).unwrap();
        traced(&mut session);

        assert_eq!(
            anchor_cells(&session),
            vec![(1, 0), (4, 4), (4, 0), (0, 4), (0, 0)]
        );
        assert_eq!(session.borders().len(), 1);
        assert_eq!(session.borders()[0].num_anchors, 5);
        assert_eq!(session.collect_borders()[0], vec![2, 1, 3, 4, 0]);
        assert_anchor_ids_dense(&session);
    }

    #[test]
    fn test_subdivision_threshold_limits_splits() {
        let mesh = flat_grid(4);

        // 4/17 falls below the threshold, 0.48 and 0.64 stay above.
        let options = ApproximateOptions::default().with_subdivision_threshold(0.3);
        let mut session = VsaSession::with_options(&mesh, &options).unwrap();
        session.partition(1, 2).unwrap();
        traced(&mut session);
        assert_eq!(anchor_cells(&session), vec![(1, 0), (4, 4), (4, 0), (0, 4)]);
        assert_eq!(session.borders()[0].num_anchors, 4);

        // Only the split of the circular chord survives; the repair adds the
        // vertex farthest from the line (1, 0) -> (4, 4).
        let options = ApproximateOptions::default().with_subdivision_threshold(10.0);
        let mut session = VsaSession::with_options(&mesh, &options).unwrap();
        session.partition(1, 2).unwrap();
        traced(&mut session);
        assert_eq!(anchor_cells(&session), vec![(1, 0), (4, 4), (0, 4)]);
        assert_eq!(session.borders()[0].num_anchors, 3);
        assert_anchor_ids_dense(&session);
    }

    #[test]
    fn test_repair_counts_anchors_of_neighbouring_border() {
        // The bottom side of the cube is its own region. Its loop has no
        // corner, so both sides of it are traced with two anchors.
        let mesh = unit_cube();
        let mut session = VsaSession::new(&mesh).unwrap();
        session.proxies = vec![
            PlaneProxy {
                normal: Vector3::new(0.0, 0.0, -1.0),
                seed: FaceId::new(0),
            },
            PlaneProxy {
                normal: Vector3::new(0.0, 0.0, 1.0),
                seed: FaceId::new(2),
            },
        ];
        session.segments = vec![0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1];
        session.flooded = true;

        session.regions =
            RegionGeometry::from_partition(&mesh, &session.geometry, &session.segments, 2);
        session.find_anchors();
        assert!(session.anchors().is_empty());

        session.find_edges();
        assert_eq!(session.borders().len(), 2);
        assert!(session.borders().iter().all(|b| b.num_anchors == 2));
        let corners: Vec<usize> = session
            .anchors()
            .iter()
            .map(|a| a.vertex.index())
            .collect();
        assert_eq!(corners, vec![1, 3]);

        // Repairing the first border puts an anchor on the shared loop, so the
        // second border is only recounted.
        session.add_anchors();
        assert_eq!(session.anchors().len(), 3);
        assert_eq!(session.anchors()[2].vertex.index(), 0);
        assert_eq!(session.borders()[0].num_anchors, 3);
        assert_eq!(session.borders()[1].num_anchors, 3);
        for ids in session.collect_borders() {
            assert_eq!(ids.len(), 3);
        }
        assert_anchor_ids_dense(&session);
    }

    #[test]
    fn test_short_loop_gets_extra_anchor() {
        // A loop of 3 half-edges is never subdivided.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: crate::mesh::HalfEdgeMesh =
            build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(1, 1).unwrap();
        traced(&mut session);

        // The forced anchor plus the repair anchor opposite to it.
        assert_eq!(session.borders().len(), 1);
        assert_eq!(session.anchors().len(), 2);
        assert_eq!(session.anchors()[1].vertex.index(), 2);
        assert_eq!(session.borders()[0].num_anchors, 2);
    }

    #[test]
    fn test_rerun_resets_state() {
        let mesh = unit_cube();
        let mut session = VsaSession::new(&mesh).unwrap();
        session.partition(6, 3).unwrap();
        traced(&mut session);
        traced(&mut session);

        assert_eq!(session.anchors().len(), 8);
        assert_eq!(session.borders().len(), 6);
        assert_anchor_ids_dense(&session);
    }
}
