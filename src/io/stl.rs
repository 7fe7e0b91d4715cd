//! STL (stereolithography) format support.
//!
//! Binary and ASCII files are read; approximations are written as binary STL.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::warn;
use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an STL file.
///
/// Vertices shared between facets are merged by exact position; facets that
/// collapse onto fewer than three distinct vertices are dropped.
///
/// # Example
///
/// ```no_run
/// use tessera::io::stl;
/// use tessera::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let mut faces = Vec::with_capacity(stl.faces.len());
    let mut degenerate = 0;
    for tri in &stl.faces {
        let [a, b, c] = tri.vertices;
        if a != b && b != c && a != c {
            faces.push([a, b, c]);
        } else {
            degenerate += 1;
        }
    }
    if degenerate > 0 {
        warn!("{}: dropped {} degenerate facets", path.display(), degenerate);
    }

    if faces.is_empty() {
        return Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    build_from_triangles(&vertices, &faces)
}

/// Save a triangle soup to a binary STL file.
pub fn save_triangles<P: AsRef<Path>>(
    positions: &[Point3<f64>],
    triangles: &[[usize; 3]],
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    super::check_triangle_indices(positions.len(), triangles, path)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let to_vertex = |p: &Point3<f64>| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32]);

    let facets: Vec<stl_io::Triangle> = triangles
        .iter()
        .map(|&[a, b, c]| {
            let (p0, p1, p2) = (&positions[a], &positions[b], &positions[c]);
            let n = (p1 - p0)
                .cross(&(p2 - p0))
                .try_normalize(0.0)
                .unwrap_or_else(Vector3::zeros);

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [to_vertex(p0), to_vertex(p1), to_vertex(p2)],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, facets.iter()).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(())
}
