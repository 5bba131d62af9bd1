#![warn(missing_docs)]

//! rockgen: procedural generation of irregular rock meshes.
//!
//! A smooth stock solid is distorted by a cellular (Voronoi) distance
//! field and decimated down to a triangle budget. The
//! [`RockGenerator`] owns the expensive intermediates (the stock mesh
//! and the cellular grid) and rebuilds them only when a settings
//! replacement invalidates them.
//!
//! # Example
//!
//! ```
//! use rockgen::{RockGenerationSettings, RockGenerator};
//!
//! let mut generator = RockGenerator::new();
//! generator.set_settings(RockGenerationSettings::default())?;
//! let mesh = generator.generate()?;
//! assert!(mesh.num_triangles() > 0);
//! # Ok::<(), rockgen::GenerationError>(())
//! ```

pub use rockgen_decimate;
pub use rockgen_grid;
pub use rockgen_math;
pub use rockgen_mesh;
pub use rockgen_stock;

mod error;
mod generator;
mod policy;
mod settings;

pub use error::{GenerationError, Result};
pub use generator::{RockGenerator, VertexSink};
pub use policy::{DensityKeyedPolicy, Invalidation, InvalidationPolicy};
pub use settings::RockGenerationSettings;

pub use rockgen_grid::{VoronoiGrid, VoronoiGridSettings};
pub use rockgen_math::{Point3, Transform, Vec3};
pub use rockgen_mesh::TriangleMesh;
pub use rockgen_stock::SphereCubeGenerator;
