//! Test meshes shared by the approximation tests.

use std::collections::HashMap;

use nalgebra::Point3;

use crate::mesh::{build_from_triangles, HalfEdgeMesh};

/// Unit cube with two triangles per side, sides in the order
/// bottom, top, front, back, left, right.
pub fn unit_cube() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let faces = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [2, 3, 7],
        [2, 7, 6],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    build_from_triangles(&vertices, &faces).unwrap()
}

/// Flat `n` x `n` grid of unit cells in the z = 0 plane.
pub fn flat_grid(n: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = j * (n + 1) + i + 1;
            let v01 = (j + 1) * (n + 1) + i;
            let v11 = (j + 1) * (n + 1) + i + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// Unit square floor folded up into a unit square wall along `x = 1`.
///
/// Faces are ordered column by column, so the first half of the faces lies
/// on the floor and the second half on the wall.
pub fn folded_grid(n: usize) -> HalfEdgeMesh {
    let step = 1.0 / n as f64;
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for i in 0..=2 * n {
        for j in 0..=n {
            let y = j as f64 * step;
            if i <= n {
                vertices.push(Point3::new(i as f64 * step, y, 0.0));
            } else {
                vertices.push(Point3::new(1.0, y, (i - n) as f64 * step));
            }
        }
    }

    for i in 0..2 * n {
        for j in 0..n {
            let v00 = i * (n + 1) + j;
            let v10 = (i + 1) * (n + 1) + j;
            let v01 = i * (n + 1) + j + 1;
            let v11 = (i + 1) * (n + 1) + j + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// Closed unit cube with every side split into `n` x `n` cells.
///
/// Sides are emitted one after another, so seeding every `2n²`-th face picks
/// one face per side.
pub fn tessellated_cube(n: usize) -> HalfEdgeMesh {
    let n_i = n as i64;
    // (origin, du, dv) with du x dv pointing outward
    let sides: [([i64; 3], [i64; 3], [i64; 3]); 6] = [
        ([0, 0, 0], [0, 1, 0], [1, 0, 0]),
        ([0, 0, n_i], [1, 0, 0], [0, 1, 0]),
        ([0, 0, 0], [1, 0, 0], [0, 0, 1]),
        ([0, n_i, 0], [0, 0, 1], [1, 0, 0]),
        ([0, 0, 0], [0, 0, 1], [0, 1, 0]),
        ([n_i, 0, 0], [0, 1, 0], [0, 0, 1]),
    ];

    let mut lattice: HashMap<[i64; 3], usize> = HashMap::new();
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    let mut vertex_at = |key: [i64; 3], vertices: &mut Vec<Point3<f64>>| -> usize {
        *lattice.entry(key).or_insert_with(|| {
            vertices.push(Point3::new(
                key[0] as f64 / n as f64,
                key[1] as f64 / n as f64,
                key[2] as f64 / n as f64,
            ));
            vertices.len() - 1
        })
    };

    for (origin, du, dv) in sides {
        let point = |a: i64, b: i64| -> [i64; 3] {
            [
                origin[0] + a * du[0] + b * dv[0],
                origin[1] + a * du[1] + b * dv[1],
                origin[2] + a * du[2] + b * dv[2],
            ]
        };

        for a in 0..n_i {
            for b in 0..n_i {
                let v00 = vertex_at(point(a, b), &mut vertices);
                let v10 = vertex_at(point(a + 1, b), &mut vertices);
                let v01 = vertex_at(point(a, b + 1), &mut vertices);
                let v11 = vertex_at(point(a + 1, b + 1), &mut vertices);

                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

#[test]
fn test_fixtures_are_valid() {
    let cube = unit_cube();
    assert!(cube.is_valid() && cube.is_closed());

    let tessellated = tessellated_cube(3);
    assert_eq!(tessellated.num_faces(), 6 * 9 * 2);
    assert_eq!(tessellated.num_vertices(), 6 * 9 + 2);
    assert!(tessellated.is_valid() && tessellated.is_closed());

    let folded = folded_grid(4);
    assert_eq!(folded.num_faces(), 64);
    assert!(folded.is_valid() && !folded.is_closed());
    assert_eq!(folded.num_face_components(), 1);
}
