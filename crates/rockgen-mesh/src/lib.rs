#![warn(missing_docs)]

//! Triangle mesh type shared across the rockgen pipeline.
//!
//! The stock mesh provider produces it, the distortion pass rewrites its
//! vertices, and the simplifier consumes and re-emits it. Positions and
//! normals are `f64` end to end.

use rockgen_math::{Point3, Vec3};
use thiserror::Error;

/// Errors reported by mesh validation.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Mesh has no triangles.
    #[error("mesh is empty")]
    Empty,

    /// Normal count does not match vertex count.
    #[error("normal count {normals} does not match vertex count {vertices}")]
    NormalCountMismatch {
        /// Number of vertices.
        vertices: usize,
        /// Number of normals.
        normals: usize,
    },

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references out-of-range vertex {index}")]
    IndexOutOfRange {
        /// Offending triangle.
        triangle: usize,
        /// Offending vertex index.
        index: u32,
    },
}

/// An indexed triangle mesh with per-vertex normals.
///
/// Invariants: `vertices.len() == normals.len()`, and every index triple
/// references a valid vertex. [`TriangleMesh::validate`] checks both.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Per-vertex normals, parallel to `vertices`.
    pub normals: Vec<Vec3>,
    /// Triangle index triples into `vertices`.
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Build a mesh from positions and indices, computing smooth normals.
    pub fn from_positions(vertices: Vec<Point3>, indices: Vec<[u32; 3]>) -> Self {
        let mut mesh = Self {
            normals: vec![Vec3::zeros(); vertices.len()],
            vertices,
            indices,
        };
        mesh.recalculate_normals();
        mesh
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// True if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Recompute smooth per-vertex normals from the triangle set.
    ///
    /// Face normals are accumulated un-normalized, so larger faces weigh
    /// more; the per-vertex sum is normalized at the end. Degenerate
    /// faces contribute nothing and isolated vertices keep a zero normal.
    pub fn recalculate_normals(&mut self) {
        self.normals.clear();
        self.normals.resize(self.vertices.len(), Vec3::zeros());

        for tri in &self.indices {
            let [a, b, c] = tri.map(|i| i as usize);
            let e1 = self.vertices[b] - self.vertices[a];
            let e2 = self.vertices[c] - self.vertices[a];
            let face_normal = e1.cross(&e2);
            self.normals[a] += face_normal;
            self.normals[b] += face_normal;
            self.normals[c] += face_normal;
        }

        for n in &mut self.normals {
            let norm = n.norm();
            if norm > 0.0 {
                *n /= norm;
            }
        }
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.is_empty() {
            return Err(MeshError::Empty);
        }
        if self.normals.len() != self.vertices.len() {
            return Err(MeshError::NormalCountMismatch {
                vertices: self.vertices.len(),
                normals: self.normals.len(),
            });
        }
        let n = self.vertices.len() as u32;
        for (t, tri) in self.indices.iter().enumerate() {
            for &i in tri {
                if i >= n {
                    return Err(MeshError::IndexOutOfRange {
                        triangle: t,
                        index: i,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}
