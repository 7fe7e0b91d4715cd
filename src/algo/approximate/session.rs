//! The approximation session: all state of one partition-to-reconstruction run.

use log::{debug, info, warn};

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

use super::boundary::{Anchor, Border, HalfEdgeStatus};
use super::proxy::{FaceGeometry, PlaneProxy, RegionGeometry};
use super::reconstruct::ApproximatedMesh;
use super::{ApproximateOptions, Seeding};

/// Region id of a face not reached by the current flood.
pub(super) const UNASSIGNED: usize = usize::MAX;

/// Variational shape approximation over a borrowed mesh.
///
/// A session owns the proxies, the face partition and the anchor/border
/// structures derived from it. Typical use is one `partition*` call
/// followed by [`extract_mesh`](Self::extract_mesh):
///
/// ```
/// use tessera::algo::approximate::VsaSession;
/// use tessera::prelude::*;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2], [0, 2, 3]];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
///
/// let mut session = VsaSession::new(&mesh).unwrap();
/// let segments = session.partition(1, 3).unwrap();
/// assert_eq!(segments, &[0, 0]);
///
/// let approximation = session.extract_mesh().unwrap();
/// assert_eq!(approximation.num_vertices(), session.anchors().len());
/// ```
#[derive(Debug, Clone)]
pub struct VsaSession<'a, I: MeshIndex = u32> {
    pub(super) mesh: &'a HalfEdgeMesh<I>,
    pub(super) geometry: FaceGeometry,
    pub(super) parallel: bool,
    pub(super) subdivision_threshold: f64,
    pub(super) hierarchical_steps: usize,

    pub(super) proxies: Vec<PlaneProxy<I>>,
    pub(super) segments: Vec<usize>,
    // Whether `segments` covers every face for the current proxies.
    pub(super) flooded: bool,

    pub(super) regions: RegionGeometry,
    pub(super) vertex_status: Vec<Option<usize>>,
    pub(super) halfedge_status: Vec<HalfEdgeStatus>,
    pub(super) anchors: Vec<Anchor<I>>,
    pub(super) borders: Vec<Border<I>>,
}

impl<'a, I: MeshIndex> VsaSession<'a, I> {
    /// Create a session with default options.
    ///
    /// Fails if the mesh has no faces or is not face-connected.
    pub fn new(mesh: &'a HalfEdgeMesh<I>) -> Result<Self> {
        Self::with_options(mesh, &ApproximateOptions::default())
    }

    /// Create a session using the tuning parameters of `options`.
    ///
    /// `num_proxies`, `iterations` and `seeding` are not stored; they are
    /// arguments of the partition calls.
    pub fn with_options(mesh: &'a HalfEdgeMesh<I>, options: &ApproximateOptions) -> Result<Self> {
        if mesh.num_faces() == 0 {
            return Err(MeshError::EmptyMesh);
        }
        options.validate_tuning()?;

        let components = mesh.num_face_components();
        if components > 1 {
            return Err(MeshError::DisconnectedMesh { components });
        }

        let geometry = FaceGeometry::from_mesh(mesh, options.parallel);
        debug!(
            "session over {} faces, {} vertices, {} half-edges",
            mesh.num_faces(),
            mesh.num_vertices(),
            mesh.num_halfedges()
        );

        Ok(Self {
            mesh,
            geometry,
            parallel: options.parallel,
            subdivision_threshold: options.subdivision_threshold,
            hierarchical_steps: options.hierarchical_steps,
            proxies: Vec::new(),
            segments: vec![UNASSIGNED; mesh.num_faces()],
            flooded: false,
            regions: RegionGeometry::default(),
            vertex_status: vec![None; mesh.num_vertices()],
            halfedge_status: vec![HalfEdgeStatus::OffBorder; mesh.num_halfedges()],
            anchors: Vec::new(),
            borders: Vec::new(),
        })
    }

    /// The mesh being approximated.
    pub fn mesh(&self) -> &'a HalfEdgeMesh<I> {
        self.mesh
    }

    /// Per-face normals and areas.
    pub fn face_geometry(&self) -> &FaceGeometry {
        &self.geometry
    }

    /// Current proxies; the region id of a proxy is its index.
    pub fn proxies(&self) -> &[PlaneProxy<I>] {
        &self.proxies
    }

    /// Number of regions.
    pub fn num_proxies(&self) -> usize {
        self.proxies.len()
    }

    /// Region id per face. Entries are meaningful once a flood has run.
    pub fn segments(&self) -> &[usize] {
        &self.segments
    }

    /// Whether the partition covers every face for the current proxies.
    pub fn is_partitioned(&self) -> bool {
        self.flooded
    }

    /// Anchors found by the last extraction, indexed by anchor id.
    pub fn anchors(&self) -> &[Anchor<I>] {
        &self.anchors
    }

    /// Borders traced by the last extraction.
    pub fn borders(&self) -> &[Border<I>] {
        &self.borders
    }

    /// Anchor id attached to each vertex by the last extraction.
    pub fn vertex_status(&self) -> &[Option<usize>] {
        &self.vertex_status
    }

    // ==================== Partitioning ====================

    /// Partition into `num_proxies` regions from uniform seeds, then run
    /// `iterations` flood/fit passes.
    pub fn partition(&mut self, num_proxies: usize, iterations: usize) -> Result<&[usize]> {
        self.partition_with(Seeding::Random, num_proxies, iterations)
    }

    /// Partition by seeding half of the regions and inserting the rest one
    /// at a time where the error is largest.
    pub fn partition_incremental(
        &mut self,
        num_proxies: usize,
        iterations: usize,
    ) -> Result<&[usize]> {
        self.partition_with(Seeding::Incremental, num_proxies, iterations)
    }

    /// Partition by growing from two seeds with batched error diffusion.
    pub fn partition_hierarchical(
        &mut self,
        num_proxies: usize,
        iterations: usize,
    ) -> Result<&[usize]> {
        self.partition_with(Seeding::Hierarchical, num_proxies, iterations)
    }

    /// Partition with the given seeding strategy.
    ///
    /// With `iterations == 0` a single flood still runs so that every face
    /// carries a region id.
    pub fn partition_with(
        &mut self,
        seeding: Seeding,
        num_proxies: usize,
        iterations: usize,
    ) -> Result<&[usize]> {
        self.validate_num_proxies(num_proxies)?;

        match seeding {
            Seeding::Random => self.random_seed(num_proxies),
            Seeding::Incremental => self.incremental_seed(num_proxies, iterations),
            Seeding::Hierarchical => self.hierarchical_seed(num_proxies),
        }

        self.run_iterations(iterations);
        self.ensure_flooded();

        info!(
            "{:?} partition: {} regions, fitting error {:.6}",
            seeding,
            self.proxies.len(),
            self.fitting_error()
        );
        Ok(&self.segments)
    }

    pub(super) fn run_iterations(&mut self, iterations: usize) {
        for _ in 0..iterations {
            self.flood();
            self.fit();
        }
    }

    pub(super) fn ensure_flooded(&mut self) {
        if !self.flooded {
            self.flood();
        }
    }

    fn validate_num_proxies(&self, num_proxies: usize) -> Result<()> {
        if num_proxies == 0 {
            return Err(MeshError::invalid_param(
                "num_proxies",
                num_proxies,
                "must be at least 1",
            ));
        }
        if num_proxies > self.mesh.num_faces() {
            return Err(MeshError::invalid_param(
                "num_proxies",
                num_proxies,
                "cannot exceed the number of faces",
            ));
        }
        Ok(())
    }

    // ==================== Extraction ====================

    /// Extract the approximated mesh from the current partition.
    ///
    /// Anchors, borders and status arrays are rebuilt from scratch on every
    /// call. The manifold check is logged and never fails the extraction.
    pub fn extract_mesh(&mut self) -> Result<ApproximatedMesh> {
        if self.proxies.is_empty() || !self.flooded {
            return Err(MeshError::NotPartitioned);
        }

        self.regions = RegionGeometry::from_partition(
            self.mesh,
            &self.geometry,
            &self.segments,
            self.proxies.len(),
        );

        self.trace_boundaries();
        let approximation = self.pseudo_cdt();

        if approximation.is_manifold() {
            info!(
                "manifold surface: {} anchors, {} triangles, {} borders",
                approximation.num_vertices(),
                approximation.num_triangles(),
                self.borders.len()
            );
        } else {
            warn!(
                "non-manifold surface: {} anchors, {} triangles, {} borders",
                approximation.num_vertices(),
                approximation.num_triangles(),
                self.borders.len()
            );
        }

        Ok(approximation)
    }
}
