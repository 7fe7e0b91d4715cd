//! PLY (Stanford polygon) format support.
//!
//! Polygons are fan-triangulated on load. Output is ASCII: either the
//! approximated triangle soup, or the input mesh with its partition stored
//! as a per-face `region` property and colour.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh, MeshIndex};

fn load_error(path: &Path, message: &str) -> MeshError {
    MeshError::LoadError {
        path: PathBuf::from(path),
        message: message.to_string(),
    }
}

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use tessera::io::ply;
/// use tessera::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| load_error(path, &e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error(path, "PLY file has no vertex element"))?;

    let vertices = vertex_element
        .iter()
        .map(|vertex| {
            match (
                float_property(vertex, "x"),
                float_property(vertex, "y"),
                float_property(vertex, "z"),
            ) {
                (Some(x), Some(y), Some(z)) => Ok(Point3::new(x, y, z)),
                _ => Err(load_error(path, "vertex missing a coordinate")),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error(path, "PLY file has no face element"))?;

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = list_property(face, "vertex_indices")
            .or_else(|| list_property(face, "vertex_index"))
            .ok_or_else(|| load_error(path, "face missing vertex_indices property"))?;

        for i in 1..indices.len().saturating_sub(1) {
            faces.push([indices[0], indices[i], indices[i + 1]]);
        }
    }

    if faces.is_empty() {
        return Err(load_error(path, "PLY file contains no faces"));
    }

    build_from_triangles(&vertices, &faces)
}

fn float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

fn write_vertex_header(writer: &mut impl Write, num_vertices: usize) -> std::io::Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by tessera")?;
    writeln!(writer, "element vertex {}", num_vertices)?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")
}

/// Save a triangle soup to an ASCII PLY file.
pub fn save_triangles<P: AsRef<Path>>(
    positions: &[Point3<f64>],
    triangles: &[[usize; 3]],
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    super::check_triangle_indices(positions.len(), triangles, path)?;
    let mut writer = BufWriter::new(File::create(path)?);

    write_vertex_header(&mut writer, positions.len())?;
    writeln!(writer, "element face {}", triangles.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for p in positions {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }
    for t in triangles {
        writeln!(writer, "3 {} {} {}", t[0], t[1], t[2])?;
    }

    writer.flush()?;
    Ok(())
}

/// Save `mesh` with one region id and colour per face.
///
/// `segments` holds the region id of every face, as returned by a
/// partition.
pub fn save_segmentation<P: AsRef<Path>, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    segments: &[usize],
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    if segments.len() != mesh.num_faces() {
        return Err(MeshError::SaveError {
            path: path.to_path_buf(),
            message: format!(
                "{} region ids for {} faces",
                segments.len(),
                mesh.num_faces()
            ),
        });
    }

    let (vertices, faces) = to_face_vertex(mesh);
    let mut writer = BufWriter::new(File::create(path)?);

    write_vertex_header(&mut writer, vertices.len())?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "property int region")?;
    writeln!(writer, "property uchar red")?;
    writeln!(writer, "property uchar green")?;
    writeln!(writer, "property uchar blue")?;
    writeln!(writer, "end_header")?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }
    for (f, &region) in faces.iter().zip(segments) {
        let [r, g, b] = region_color(region);
        writeln!(
            writer,
            "3 {} {} {} {} {} {} {}",
            f[0], f[1], f[2], region, r, g, b
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// A colour for `region`, with hues spread by the golden angle.
pub fn region_color(region: usize) -> [u8; 3] {
    const GOLDEN: f64 = 0.618_033_988_749_895;
    let hue = (region as f64 * GOLDEN).fract() * 6.0;
    let x = 1.0 - (hue % 2.0 - 1.0).abs();
    let (r, g, b) = match hue as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    // Keep colours away from black so shading stays visible.
    let scale = |c: f64| (55.0 + 200.0 * c).round() as u8;
    [scale(r), scale(g), scale(b)]
}
