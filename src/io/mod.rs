//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save approximation | Save segmentation |
//! |--------|-----------|------|--------------------|-------------------|
//! | STL | `.stl` | ✓ | ✓ (binary) | ✗ |
//! | PLY | `.ply` | ✓ | ✓ (ASCII) | ✓ |
//!
//! # Usage
//!
//! ```no_run
//! use tessera::algo::approximate::{approximate, ApproximateOptions};
//! use tessera::io::{load, ply, save_triangles};
//! use tessera::mesh::HalfEdgeMesh;
//!
//! let mesh: HalfEdgeMesh = load("model.stl").unwrap();
//! let result = approximate(&mesh, &ApproximateOptions::default()).unwrap();
//!
//! save_triangles(&result.mesh, "coarse.ply").unwrap();
//! ply::save_segmentation(&mesh, &result.segments, "regions.ply").unwrap();
//! ```

pub mod ply;
pub mod stl;

use std::path::Path;

use crate::algo::approximate::ApproximatedMesh;
use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// STL (stereolithography) format.
    Stl,
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "stl" => Some(Format::Stl),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path, failing on unknown extensions.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
            .ok_or_else(|| MeshError::UnsupportedFormat {
                extension: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("(none)")
                    .to_string(),
            })
    }
}

/// Load a mesh, choosing the format from the file extension.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Stl => stl::load(path),
        Format::Ply => ply::load(path),
    }
}

/// Save an approximated mesh, choosing the format from the file extension.
pub fn save_triangles<P: AsRef<Path>>(mesh: &ApproximatedMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Stl => stl::save_triangles(&mesh.positions, &mesh.triangles, path),
        Format::Ply => ply::save_triangles(&mesh.positions, &mesh.triangles, path),
    }
}

// Reject triangles referencing positions that do not exist.
fn check_triangle_indices(
    num_positions: usize,
    triangles: &[[usize; 3]],
    path: &Path,
) -> Result<()> {
    for (t, triangle) in triangles.iter().enumerate() {
        if let Some(&index) = triangle.iter().find(|&&i| i >= num_positions) {
            return Err(MeshError::SaveError {
                path: path.to_path_buf(),
                message: format!(
                    "triangle {} references vertex {} of {}",
                    t, index, num_positions
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/model.STL").unwrap(), Format::Stl);
        assert_eq!(Format::from_path("model.ply").unwrap(), Format::Ply);
        assert!(matches!(
            Format::from_path("model.obj"),
            Err(MeshError::UnsupportedFormat { extension }) if extension == "obj"
        ));
        assert!(Format::from_path("model").is_err());
    }
}
