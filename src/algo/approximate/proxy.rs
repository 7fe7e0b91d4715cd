//! Planar proxies and the L2,1 fit-error metric.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex};

/// Planar approximant of one region: a unit normal and a representative face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneProxy<I: MeshIndex = u32> {
    /// Unit normal of the plane.
    pub normal: Vector3<f64>,

    /// A face of the region that fits the normal best.
    pub seed: FaceId<I>,
}

impl<I: MeshIndex> PlaneProxy<I> {
    /// Create a proxy seeded at `seed` with the face's own normal.
    pub fn from_face(geometry: &FaceGeometry, seed: FaceId<I>) -> Self {
        Self {
            normal: geometry.normals[seed.index()],
            seed,
        }
    }
}

/// Per-face normals and areas, computed once per mesh.
#[derive(Debug, Clone)]
pub struct FaceGeometry {
    /// Unit normal per face (zero vector for degenerate faces).
    pub normals: Vec<Vector3<f64>>,

    /// Area per face.
    pub areas: Vec<f64>,
}

impl FaceGeometry {
    /// Compute normals and areas for every face of `mesh`.
    pub fn from_mesh<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, parallel: bool) -> Self {
        let compute = |i: usize| {
            let f = FaceId::<I>::new(i);
            (mesh.face_normal(f), mesh.face_area(f))
        };

        let pairs: Vec<(Vector3<f64>, f64)> = if parallel {
            (0..mesh.num_faces()).into_par_iter().map(compute).collect()
        } else {
            (0..mesh.num_faces()).map(compute).collect()
        };

        let (normals, areas) = pairs.into_iter().unzip();
        Self { normals, areas }
    }

    /// Number of faces covered.
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Check if no faces are covered.
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// The L2,1 error of face `face` against `proxy`:
    /// `area(face) * |normal(face) - proxy.normal|^2`.
    #[inline]
    pub fn fit_error<I: MeshIndex>(&self, face: usize, proxy: &PlaneProxy<I>) -> f64 {
        self.areas[face] * (self.normals[face] - proxy.normal).norm_squared()
    }

    /// Fit error of every face against the proxy of its region.
    pub fn face_errors<I: MeshIndex>(
        &self,
        segments: &[usize],
        proxies: &[PlaneProxy<I>],
        parallel: bool,
    ) -> Vec<f64> {
        let compute = |f: usize| self.fit_error(f, &proxies[segments[f]]);

        if parallel {
            (0..segments.len()).into_par_iter().map(compute).collect()
        } else {
            (0..segments.len()).map(compute).collect()
        }
    }
}

/// Area and area-weighted centroid of each region.
#[derive(Debug, Clone, Default)]
pub struct RegionGeometry {
    /// Total face area per region.
    pub areas: Vec<f64>,

    /// Area-weighted centroid per region.
    pub centers: Vec<Point3<f64>>,
}

impl RegionGeometry {
    /// Accumulate region areas and centroids from a complete partition.
    pub fn from_partition<I: MeshIndex>(
        mesh: &HalfEdgeMesh<I>,
        geometry: &FaceGeometry,
        segments: &[usize],
        num_regions: usize,
    ) -> Self {
        let mut areas = vec![0.0; num_regions];
        let mut weighted = vec![Vector3::zeros(); num_regions];

        for f in mesh.face_ids() {
            let region = segments[f.index()];
            let area = geometry.areas[f.index()];
            areas[region] += area;
            weighted[region] += mesh.face_centroid(f).coords * area;
        }

        let centers = weighted
            .iter()
            .zip(&areas)
            .map(|(sum, &area)| {
                if area > 0.0 {
                    Point3::from(sum / area)
                } else {
                    Point3::origin()
                }
            })
            .collect();

        Self { areas, centers }
    }

    /// Orthogonal projection of `point` onto the fitted plane of `region`.
    pub fn project<I: MeshIndex>(
        &self,
        proxy: &PlaneProxy<I>,
        region: usize,
        point: &Point3<f64>,
    ) -> Point3<f64> {
        let offset = (point - self.centers[region]).dot(&proxy.normal);
        point - proxy.normal * offset
    }
}
