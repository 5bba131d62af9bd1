#![warn(missing_docs)]

//! Stock mesh provider for rockgen.
//!
//! Tessellates a cube with independent per-axis subdivision counts and
//! projects the lattice onto a sphere ("spherified cube"). Unlike a
//! latitude/longitude sphere this puts no poles in the mesh, so the
//! distortion pass sees a near-uniform vertex distribution.
//!
//! Deterministic: identical inputs produce identical buffers.

use std::collections::HashMap;

use rockgen_math::{Point3, Vec3};
use rockgen_mesh::TriangleMesh;

/// Generates the undistorted base solid for rock generation.
///
/// Six cube faces carry quad grids sized by the subdivision counts of the
/// two axes they span; every lattice vertex is normalized onto the sphere
/// of the configured radius. Shared edge and corner vertices are welded,
/// so the result is a closed mesh.
#[derive(Debug, Clone)]
pub struct SphereCubeGenerator {
    /// Sphere radius.
    pub radius: f64,
    /// Subdivision count along each of the X, Y, Z axes. Must be >= 1.
    pub subdivisions: [u32; 3],
}

/// One cube face: corner origin plus the two axes its grid spans.
/// `du x dv` points outward, which makes the emitted winding
/// counter-clockwise seen from outside.
struct FaceDef {
    origin: [f64; 3],
    du_axis: usize,
    dv_axis: usize,
}

const FACES: [FaceDef; 6] = [
    // +X
    FaceDef {
        origin: [1.0, -1.0, -1.0],
        du_axis: 1,
        dv_axis: 2,
    },
    // -X
    FaceDef {
        origin: [-1.0, -1.0, -1.0],
        du_axis: 2,
        dv_axis: 1,
    },
    // +Y
    FaceDef {
        origin: [-1.0, 1.0, -1.0],
        du_axis: 2,
        dv_axis: 0,
    },
    // -Y
    FaceDef {
        origin: [-1.0, -1.0, -1.0],
        du_axis: 0,
        dv_axis: 2,
    },
    // +Z
    FaceDef {
        origin: [-1.0, -1.0, 1.0],
        du_axis: 0,
        dv_axis: 1,
    },
    // -Z
    FaceDef {
        origin: [-1.0, -1.0, -1.0],
        du_axis: 1,
        dv_axis: 0,
    },
];

impl SphereCubeGenerator {
    /// Create a generator with the given radius and 1x1x1 subdivisions.
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            subdivisions: [1, 1, 1],
        }
    }

    /// Build the spherified-cube mesh.
    ///
    /// Vertex normals are the radial directions, exact for a sphere.
    pub fn make_sphere(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        // Welds shared lattice points across faces. The cube coordinate
        // along an axis is always computed as -1 + 2*i/n with that axis's
        // own count, so shared points are bitwise identical and keying on
        // the raw bits is exact.
        let mut seen: HashMap<[u64; 3], u32> = HashMap::new();

        for face in &FACES {
            let nu = self.subdivisions[face.du_axis].max(1) as usize;
            let nv = self.subdivisions[face.dv_axis].max(1) as usize;

            // Grid of welded vertex ids for this face.
            let mut ids = Vec::with_capacity((nu + 1) * (nv + 1));
            for j in 0..=nv {
                for i in 0..=nu {
                    let mut cube = face.origin;
                    cube[face.du_axis] = -1.0 + 2.0 * i as f64 / nu as f64;
                    cube[face.dv_axis] = -1.0 + 2.0 * j as f64 / nv as f64;
                    ids.push(self.weld_vertex(&mut mesh, &mut seen, cube));
                }
            }

            let stride = nu + 1;
            for j in 0..nv {
                for i in 0..nu {
                    let p00 = ids[j * stride + i];
                    let p10 = ids[j * stride + i + 1];
                    let p01 = ids[(j + 1) * stride + i];
                    let p11 = ids[(j + 1) * stride + i + 1];
                    mesh.indices.push([p00, p10, p11]);
                    mesh.indices.push([p00, p11, p01]);
                }
            }
        }

        mesh
    }

    fn weld_vertex(
        &self,
        mesh: &mut TriangleMesh,
        seen: &mut HashMap<[u64; 3], u32>,
        cube: [f64; 3],
    ) -> u32 {
        let key = [cube[0].to_bits(), cube[1].to_bits(), cube[2].to_bits()];
        if let Some(&id) = seen.get(&key) {
            return id;
        }
        let id = mesh.vertices.len() as u32;
        let dir = Vec3::new(cube[0], cube[1], cube[2]).normalize();
        mesh.vertices.push(Point3::from(dir * self.radius));
        mesh.normals.push(dir);
        seen.insert(key, id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn count_edges(mesh: &TriangleMesh) -> usize {
        let mut edges = HashSet::new();
        for tri in &mesh.indices {
            for k in 0..3 {
                let a = tri[k];
                let b = tri[(k + 1) % 3];
                edges.insert(if a < b { (a, b) } else { (b, a) });
            }
        }
        edges.len()
    }

    #[test]
    fn test_uniform_counts() {
        let generator = SphereCubeGenerator {
            radius: 0.5,
            subdivisions: [4, 4, 4],
        };
        let mesh = generator.make_sphere();
        // Welded cube surface: 6n^2 + 2 vertices, 4 triangles per quad pair.
        assert_eq!(mesh.num_vertices(), 6 * 16 + 2);
        assert_eq!(mesh.num_triangles(), 4 * (16 + 16 + 16));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_closed_mesh_euler_characteristic() {
        for subdivisions in [[1, 1, 1], [2, 3, 4], [6, 6, 6]] {
            let generator = SphereCubeGenerator {
                radius: 0.5,
                subdivisions,
            };
            let mesh = generator.make_sphere();
            let v = mesh.num_vertices() as i64;
            let e = count_edges(&mesh) as i64;
            let f = mesh.num_triangles() as i64;
            assert_eq!(v - e + f, 2, "not a closed sphere for {subdivisions:?}");
        }
    }

    #[test]
    fn test_vertices_on_sphere_with_radial_normals() {
        let generator = SphereCubeGenerator {
            radius: 0.5,
            subdivisions: [3, 5, 2],
        };
        let mesh = generator.make_sphere();
        for (v, n) in mesh.vertices.iter().zip(&mesh.normals) {
            assert!((v.coords.norm() - 0.5).abs() < 1e-12);
            assert!((n.norm() - 1.0).abs() < 1e-12);
            assert!((v.coords.normalize() - n).norm() < 1e-12);
        }
    }

    #[test]
    fn test_outward_winding() {
        let generator = SphereCubeGenerator {
            radius: 0.5,
            subdivisions: [4, 4, 4],
        };
        let mesh = generator.make_sphere();
        for tri in &mesh.indices {
            let [a, b, c] = tri.map(|i| i as usize);
            let e1 = mesh.vertices[b] - mesh.vertices[a];
            let e2 = mesh.vertices[c] - mesh.vertices[a];
            let centroid =
                (mesh.vertices[a].coords + mesh.vertices[b].coords + mesh.vertices[c].coords) / 3.0;
            assert!(e1.cross(&e2).dot(&centroid) > 0.0, "inward-facing triangle");
        }
    }

    #[test]
    fn test_deterministic() {
        let generator = SphereCubeGenerator {
            radius: 0.5,
            subdivisions: [5, 4, 3],
        };
        assert_eq!(generator.make_sphere(), generator.make_sphere());
    }
}
