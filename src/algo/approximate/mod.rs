//! Variational shape approximation.
//!
//! Partitions a triangle mesh into regions that are each well described by a
//! plane, then rebuilds a coarse triangle mesh whose vertices (anchors) sit
//! where region boundaries meet.
//!
//! # Algorithm
//!
//! Partitioning alternates two steps, Lloyd style:
//!
//! - **Flood**: faces are assigned to regions best-first, smallest L2,1
//!   error `area * |n_face - n_proxy|²` first, growing from one seed face
//!   per proxy
//! - **Fit**: every proxy normal becomes the area-weighted mean normal of
//!   its region, and its seed the region's best-fitting face
//!
//! Seeding is either uniform over the face order, incremental (worst face of
//! the worst region) or hierarchical (batched error diffusion).
//!
//! Extraction then places anchors at region corners, traces and subdivides
//! region borders, and triangulates the anchors by tagging every vertex with
//! its closest anchor inside its region.
//!
//! # Example
//!
//! ```
//! use tessera::prelude::*;
//! use tessera::algo::approximate::{approximate, ApproximateOptions, Seeding};
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(1.0, 0.0, 1.0),
//!     Point3::new(1.0, 1.0, 1.0),
//!     Point3::new(0.0, 1.0, 1.0),
//! ];
//! let faces = vec![
//!     [0, 2, 1], [0, 3, 2], [4, 5, 6], [4, 6, 7],
//!     [0, 1, 5], [0, 5, 4], [2, 3, 7], [2, 7, 6],
//!     [0, 4, 7], [0, 7, 3], [1, 2, 6], [1, 6, 5],
//! ];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let options = ApproximateOptions::default()
//!     .with_num_proxies(6)
//!     .with_seeding(Seeding::Random);
//! let result = approximate(&mesh, &options).unwrap();
//!
//! assert_eq!(result.mesh.num_vertices(), 8);
//! assert_eq!(result.mesh.num_triangles(), 12);
//! assert!(result.manifold);
//! ```
//!
//! # References
//!
//! - Cohen-Steiner, D., Alliez, P. & Desbrun, M. (2004). "Variational Shape
//!   Approximation." SIGGRAPH '04.

mod boundary;
mod manifold;
mod partition;
mod proxy;
mod reconstruct;
mod seeding;
mod session;

#[cfg(test)]
pub(crate) mod fixtures;

pub use boundary::{Anchor, Border, HalfEdgeStatus};
pub use manifold::is_manifold_surface;
pub use proxy::{FaceGeometry, PlaneProxy, RegionGeometry};
pub use reconstruct::ApproximatedMesh;
pub use session::VsaSession;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// How the initial proxies are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Seeding {
    /// All seeds at once, evenly spaced in face order.
    Random,
    /// Half of the seeds at once, the rest inserted one by one at the
    /// worst-fitting face.
    Incremental,
    /// Two seeds, then the region count doubles by error diffusion.
    #[default]
    Hierarchical,
}

/// Options for shape approximation.
#[derive(Debug, Clone)]
pub struct ApproximateOptions {
    /// Number of regions (proxies) to partition into.
    pub num_proxies: usize,

    /// Number of flood/fit iterations after seeding.
    pub iterations: usize,

    /// Seeding strategy.
    pub seeding: Seeding,

    /// Chord subdivision threshold. Lower values add more anchors along
    /// curved or strongly bent borders.
    pub subdivision_threshold: f64,

    /// Flood/fit iterations between two hierarchical seeding passes.
    pub hierarchical_steps: usize,

    /// Whether to evaluate per-face geometry and errors in parallel.
    pub parallel: bool,
}

impl Default for ApproximateOptions {
    fn default() -> Self {
        Self {
            num_proxies: 20,
            iterations: 10,
            seeding: Seeding::default(),
            subdivision_threshold: 0.2,
            hierarchical_steps: 5,
            parallel: true,
        }
    }
}

impl ApproximateOptions {
    /// Set the number of regions.
    pub fn with_num_proxies(mut self, num_proxies: usize) -> Self {
        self.num_proxies = num_proxies;
        self
    }

    /// Set the number of flood/fit iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the seeding strategy.
    pub fn with_seeding(mut self, seeding: Seeding) -> Self {
        self.seeding = seeding;
        self
    }

    /// Set the chord subdivision threshold.
    pub fn with_subdivision_threshold(mut self, threshold: f64) -> Self {
        self.subdivision_threshold = threshold;
        self
    }

    /// Set the iterations between hierarchical seeding passes.
    pub fn with_hierarchical_steps(mut self, steps: usize) -> Self {
        self.hierarchical_steps = steps;
        self
    }

    /// Enable or disable parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check the options against a mesh with `num_faces` faces.
    pub fn validate(&self, num_faces: usize) -> Result<()> {
        if self.num_proxies == 0 {
            return Err(MeshError::invalid_param(
                "num_proxies",
                self.num_proxies,
                "must be at least 1",
            ));
        }
        if self.num_proxies > num_faces {
            return Err(MeshError::invalid_param(
                "num_proxies",
                self.num_proxies,
                "cannot exceed the number of faces",
            ));
        }
        self.validate_tuning()
    }

    pub(crate) fn validate_tuning(&self) -> Result<()> {
        if !self.subdivision_threshold.is_finite() || self.subdivision_threshold < 0.0 {
            return Err(MeshError::invalid_param(
                "subdivision_threshold",
                self.subdivision_threshold,
                "must be finite and non-negative",
            ));
        }
        if self.hierarchical_steps == 0 {
            return Err(MeshError::invalid_param(
                "hierarchical_steps",
                self.hierarchical_steps,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Everything produced by one [`approximate`] run.
#[derive(Debug, Clone)]
pub struct Approximation<I: MeshIndex = u32> {
    /// Region id per input face.
    pub segments: Vec<usize>,

    /// Fitted proxies, indexed by region id.
    pub proxies: Vec<PlaneProxy<I>>,

    /// Anchors, indexed by anchor id.
    pub anchors: Vec<Anchor<I>>,

    /// Anchor ids along each border.
    pub borders: Vec<Vec<usize>>,

    /// The approximated triangle mesh.
    pub mesh: ApproximatedMesh,

    /// Whether `mesh` is an oriented 2-manifold.
    pub manifold: bool,

    /// Total L2,1 error of the final partition.
    pub fitting_error: f64,
}

/// Partition `mesh` and extract its approximation in one call.
///
/// # Errors
///
/// Fails for an empty or face-disconnected mesh and for invalid options.
/// A non-manifold result is reported through [`Approximation::manifold`],
/// not as an error.
pub fn approximate<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &ApproximateOptions,
) -> Result<Approximation<I>> {
    let mut session = VsaSession::with_options(mesh, options)?;
    options.validate(mesh.num_faces())?;

    session.partition_with(options.seeding, options.num_proxies, options.iterations)?;
    let approximated = session.extract_mesh()?;

    Ok(Approximation {
        segments: session.segments().to_vec(),
        proxies: session.proxies().to_vec(),
        anchors: session.anchors().to_vec(),
        borders: session.collect_borders(),
        manifold: approximated.is_manifold(),
        fitting_error: session.fitting_error(),
        mesh: approximated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use approx::assert_relative_eq;
    use super::fixtures::{folded_grid, tessellated_cube, unit_cube};
    use nalgebra::Point3;

    #[test]
    fn test_default_options() {
        let options = ApproximateOptions::default();
        assert_eq!(options.num_proxies, 20);
        assert_eq!(options.iterations, 10);
        assert_eq!(options.seeding, Seeding::Hierarchical);
        assert_relative_eq!(options.subdivision_threshold, 0.2);
        assert_eq!(options.hierarchical_steps, 5);
        assert!(options.parallel);
    }

    #[test]
    fn test_validate() {
        let options = ApproximateOptions::default().with_num_proxies(6);
        assert!(options.validate(12).is_ok());
        assert!(options.validate(5).is_err());
        assert!(options.clone().with_num_proxies(0).validate(12).is_err());
        assert!(options
            .clone()
            .with_subdivision_threshold(f64::NAN)
            .validate(12)
            .is_err());
        assert!(options
            .clone()
            .with_subdivision_threshold(-0.1)
            .validate(12)
            .is_err());
        assert!(options.with_hierarchical_steps(0).validate(12).is_err());
    }

    #[test]
    fn test_approximate_cube() {
        let mesh = unit_cube();
        let options = ApproximateOptions::default()
            .with_num_proxies(6)
            .with_iterations(5)
            .with_seeding(Seeding::Random);
        let result = approximate(&mesh, &options).unwrap();

        assert_eq!(result.proxies.len(), 6);
        assert_eq!(result.anchors.len(), 8);
        assert_eq!(result.borders.len(), 6);
        assert!(result.borders.iter().all(|b| b.len() == 4));
        assert_eq!(result.mesh.num_triangles(), 12);
        assert!(result.manifold);
        assert_relative_eq!(result.fitting_error, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_approximate_sequential_matches_parallel() {
        let mesh = tessellated_cube(3);
        let options = ApproximateOptions::default()
            .with_num_proxies(6)
            .with_iterations(5);
        let parallel = approximate(&mesh, &options).unwrap();
        let sequential = approximate(&mesh, &options.with_parallel(false)).unwrap();

        assert_eq!(parallel.segments, sequential.segments);
        assert_eq!(parallel.mesh, sequential.mesh);
    }

    #[test]
    fn test_approximate_incremental() {
        let mesh = folded_grid(4);
        let options = ApproximateOptions::default()
            .with_num_proxies(2)
            .with_iterations(3)
            .with_seeding(Seeding::Incremental);
        let result = approximate(&mesh, &options).unwrap();

        assert_eq!(result.proxies.len(), 2);
        assert_eq!(result.anchors.len(), 6);
        assert_relative_eq!(result.fitting_error, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_approximate_rejects_too_many_proxies() {
        let mesh = unit_cube();
        let options = ApproximateOptions::default().with_num_proxies(13);
        assert!(matches!(
            approximate(&mesh, &options),
            Err(MeshError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_approximate_u16_indices() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
        let mesh: HalfEdgeMesh<u16> = build_from_triangles(&vertices, &faces).unwrap();

        let options = ApproximateOptions::default().with_num_proxies(4);
        let result = approximate(&mesh, &options).unwrap();
        assert_eq!(result.anchors.len(), 4);
        assert_eq!(result.mesh.num_triangles(), 4);
        assert!(result.manifold);
    }
}
