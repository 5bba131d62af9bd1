//! The rock generator: cached state, invalidation, and the distortion pass.

use log::debug;
use rockgen_grid::VoronoiGrid;
use rockgen_math::{Point3, Vec3};
use rockgen_mesh::TriangleMesh;
use rockgen_stock::SphereCubeGenerator;

use crate::error::{GenerationError, Result};
use crate::policy::{DensityKeyedPolicy, InvalidationPolicy};
use crate::settings::RockGenerationSettings;

/// Radius of the undistorted stock solid.
const STOCK_RADIUS: f64 = 0.5;

/// Per-vertex visitor for diagnostics and visualization.
///
/// Receives the displaced world-space position, the world-space normal,
/// and the nearest grid site for every processed vertex, in vertex
/// order. Observing must not affect generation; the unit type `()` is
/// the no-op sink [`RockGenerator::generate`] uses.
pub trait VertexSink {
    /// Called once per processed vertex.
    fn found_nearest(&mut self, position: &Point3, normal: &Vec3, nearest_site: &Point3);
}

impl VertexSink for () {
    fn found_nearest(&mut self, _position: &Point3, _normal: &Vec3, _nearest_site: &Point3) {}
}

/// Generates irregular rock meshes by distorting a stock solid with a
/// cellular distance field and decimating the result.
///
/// The generator owns two expensive cached structures, the stock mesh
/// and the cellular grid, and rebuilds them only when a settings
/// replacement invalidates them (see [`InvalidationPolicy`]). Settings
/// are replaced wholesale via [`set_settings`]; the previous value is
/// the baseline for the diff.
///
/// [`set_settings`]: RockGenerator::set_settings
pub struct RockGenerator {
    settings: RockGenerationSettings,
    policy: Box<dyn InvalidationPolicy>,
    stock_generator: SphereCubeGenerator,
    stock_mesh: Option<TriangleMesh>,
    grid: Option<VoronoiGrid>,
    latest_mesh: Option<TriangleMesh>,
}

impl RockGenerator {
    /// Create a generator with the default invalidation policy.
    ///
    /// No caches exist until the first [`set_settings`] call;
    /// [`generate`] fails before that.
    ///
    /// [`set_settings`]: RockGenerator::set_settings
    /// [`generate`]: RockGenerator::generate
    pub fn new() -> Self {
        Self::with_policy(Box::new(DensityKeyedPolicy))
    }

    /// Create a generator with a custom invalidation policy.
    pub fn with_policy(policy: Box<dyn InvalidationPolicy>) -> Self {
        Self {
            settings: RockGenerationSettings::default(),
            policy,
            stock_generator: SphereCubeGenerator::new(STOCK_RADIUS),
            stock_mesh: None,
            grid: None,
            latest_mesh: None,
        }
    }

    /// The last applied settings.
    pub fn settings(&self) -> &RockGenerationSettings {
        &self.settings
    }

    /// The result of the most recent [`generate`](RockGenerator::generate)
    /// call, if any.
    pub fn latest_mesh(&self) -> Option<&TriangleMesh> {
        self.latest_mesh.as_ref()
    }

    /// The cached cellular grid, for diagnostic collaborators.
    pub fn grid(&self) -> Option<&VoronoiGrid> {
        self.grid.as_ref()
    }

    /// The cached stock mesh, for diagnostic collaborators.
    pub fn stock_mesh(&self) -> Option<&TriangleMesh> {
        self.stock_mesh.as_ref()
    }

    /// Replace the settings, rebuilding whatever caches the change
    /// invalidates.
    ///
    /// All-or-nothing: an invalid settings value (or a collaborator
    /// failure during a rebuild) leaves the previous settings and every
    /// cache untouched.
    pub fn set_settings(&mut self, new: RockGenerationSettings) -> Result<()> {
        new.validate()?;

        let mut decision = self.policy.decide(&self.settings, &new);
        // A cache that was never built cannot be diffed into existence.
        decision.rebuild_stock |= self.stock_mesh.is_none();
        decision.rebuild_grid |= self.grid.is_none();

        let new_stock = if decision.rebuild_stock {
            Some(self.build_stock_mesh(&new)?)
        } else {
            None
        };
        let new_grid = if decision.rebuild_grid {
            debug!("rebuilding cellular grid: {:?}", new.grid_settings);
            Some(VoronoiGrid::new(new.grid_settings.clone()))
        } else {
            None
        };

        if let Some(stock) = new_stock {
            self.stock_mesh = Some(stock);
        }
        if let Some(grid) = new_grid {
            self.grid = Some(grid);
        }
        self.settings = new;
        Ok(())
    }

    /// Generate a rock mesh from the current settings.
    ///
    /// The returned reference stays valid until the next call; it is
    /// also readable afterwards via
    /// [`latest_mesh`](RockGenerator::latest_mesh).
    pub fn generate(&mut self) -> Result<&TriangleMesh> {
        self.generate_with(&mut ())
    }

    /// Generate a rock mesh, reporting every processed vertex to `sink`.
    pub fn generate_with<S: VertexSink>(&mut self, sink: &mut S) -> Result<&TriangleMesh> {
        let stock = self.stock_mesh.as_ref().ok_or(GenerationError::NotInitialized)?;
        let grid = self.grid.as_ref().ok_or(GenerationError::NotInitialized)?;
        let settings = &self.settings;

        let origin = settings.transform.translation_part();
        let mut vertices = Vec::with_capacity(stock.num_vertices());

        for (vertex, normal) in stock.vertices.iter().zip(&stock.normals) {
            let world_pos = settings.transform.apply_point(vertex);
            let world_normal = settings.transform.apply_dir(normal);

            let query = Point3::from(world_pos.coords * settings.pattern_size);
            let (nearest, nearest_distance) = grid.nearest(&query);

            let world_result =
                world_pos + world_normal * ((nearest_distance - 0.5) * settings.distortion);

            // Keep the scale and rotation, drop the absolute placement.
            vertices.push(world_result - origin);

            sink.found_nearest(&world_result, &world_normal, &nearest);
        }

        let (positions, indices) = rockgen_decimate::simplify(
            &vertices,
            &stock.indices,
            settings.target_triangle_count as usize,
        );

        let mesh = TriangleMesh::from_positions(positions, indices);
        mesh.validate()
            .map_err(|e| GenerationError::Simplifier(e.to_string()))?;

        Ok(self.latest_mesh.insert(mesh))
    }

    /// Rebuild the stock mesh for `settings`. The subdivision count per
    /// axis is the density scaled by that axis's stretch, rounded, and
    /// never below 1.
    fn build_stock_mesh(&mut self, settings: &RockGenerationSettings) -> Result<TriangleMesh> {
        self.stock_generator.subdivisions = [
            subdivisions_for(settings.stock_density, settings.scale.x),
            subdivisions_for(settings.stock_density, settings.scale.y),
            subdivisions_for(settings.stock_density, settings.scale.z),
        ];
        debug!(
            "rebuilding stock mesh: subdivisions {:?}",
            self.stock_generator.subdivisions
        );

        let mesh = self.stock_generator.make_sphere();
        mesh.validate()
            .map_err(|e| GenerationError::StockProvider(e.to_string()))?;
        Ok(mesh)
    }
}

impl Default for RockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn subdivisions_for(density: f64, scale: f64) -> u32 {
    (density * scale).round().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rockgen_grid::VoronoiGridSettings;
    use rockgen_math::Transform;
    use crate::policy::Invalidation;

    fn base_settings() -> RockGenerationSettings {
        RockGenerationSettings::default()
            .with_stock_density(4.0)
            .with_target_triangle_count(2000)
            .with_distortion(0.3)
            .with_grid_settings(VoronoiGridSettings {
                randomness: 0.0,
                seed: 0,
            })
    }

    #[test]
    fn test_generate_before_settings_fails() {
        let mut generator = RockGenerator::new();
        assert!(matches!(
            generator.generate(),
            Err(GenerationError::NotInitialized)
        ));
    }

    #[test]
    fn test_invalid_settings_leave_state_untouched() {
        let mut generator = RockGenerator::new();
        generator.set_settings(base_settings()).unwrap();
        let stock_ptr = generator.stock_mesh().unwrap().vertices.as_ptr();

        let bad = base_settings().with_stock_density(-1.0);
        assert!(matches!(
            generator.set_settings(bad),
            Err(GenerationError::InvalidSettings(_))
        ));
        assert_eq!(generator.settings(), &base_settings());
        assert_eq!(generator.stock_mesh().unwrap().vertices.as_ptr(), stock_ptr);
    }

    #[test]
    fn test_determinism() {
        let mut generator = RockGenerator::new();
        generator
            .set_settings(base_settings().with_grid_settings(VoronoiGridSettings {
                randomness: 0.8,
                seed: 11,
            }))
            .unwrap();
        let first = generator.generate().unwrap().clone();
        let second = generator.generate().unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stock_cache_survives_unrelated_changes() {
        let mut generator = RockGenerator::new();
        generator.set_settings(base_settings()).unwrap();
        let stock_ptr = generator.stock_mesh().unwrap().vertices.as_ptr();

        generator
            .set_settings(base_settings().with_distortion(0.9))
            .unwrap();
        assert_eq!(generator.stock_mesh().unwrap().vertices.as_ptr(), stock_ptr);
    }

    #[test]
    fn test_density_change_rebuilds_stock_with_new_counts() {
        let mut generator = RockGenerator::new();
        generator.set_settings(base_settings()).unwrap();
        // density 4, unit scale: 6 * 4^2 + 2 welded vertices
        assert_eq!(generator.stock_mesh().unwrap().num_vertices(), 6 * 16 + 2);

        generator
            .set_settings(base_settings().with_stock_density(6.0))
            .unwrap();
        assert_eq!(generator.stock_mesh().unwrap().num_vertices(), 6 * 36 + 2);
    }

    #[test]
    fn test_scale_only_change_keeps_stale_stock() {
        // The density-keyed policy ignores scale, so the subdivision
        // counts stay at their previous values.
        let mut generator = RockGenerator::new();
        generator.set_settings(base_settings()).unwrap();
        let stock_ptr = generator.stock_mesh().unwrap().vertices.as_ptr();

        generator
            .set_settings(base_settings().with_scale(Vec3::new(2.0, 2.0, 2.0)))
            .unwrap();
        assert_eq!(generator.stock_mesh().unwrap().vertices.as_ptr(), stock_ptr);
        assert_eq!(generator.stock_mesh().unwrap().num_vertices(), 6 * 16 + 2);
    }

    #[test]
    fn test_swapped_policy_rebuilds_on_scale() {
        struct RebuildOnAnyChange;
        impl InvalidationPolicy for RebuildOnAnyChange {
            fn decide(
                &self,
                old: &RockGenerationSettings,
                new: &RockGenerationSettings,
            ) -> Invalidation {
                let changed = old != new;
                Invalidation {
                    rebuild_stock: changed,
                    rebuild_grid: changed,
                }
            }
        }

        let mut generator = RockGenerator::with_policy(Box::new(RebuildOnAnyChange));
        generator.set_settings(base_settings()).unwrap();
        generator
            .set_settings(base_settings().with_scale(Vec3::new(2.0, 2.0, 2.0)))
            .unwrap();
        // density 4 * scale 2 = 8 subdivisions per axis
        assert_eq!(generator.stock_mesh().unwrap().num_vertices(), 6 * 64 + 2);
    }

    #[test]
    fn test_recentering_ignores_lattice_translations() {
        // Same rotation and scale, translations one lattice period
        // apart: the re-centered outputs coincide (randomness 0 keeps
        // the distance field lattice-periodic).
        let run = |translation: Vec3| {
            let mut generator = RockGenerator::new();
            generator
                .set_settings(base_settings().with_transform(Transform::translation(
                    translation.x,
                    translation.y,
                    translation.z,
                )))
                .unwrap();
            generator.generate().unwrap().clone()
        };

        let a = run(Vec3::new(2.5, 2.5, 2.5));
        let b = run(Vec3::new(3.5, 4.5, 5.5));

        assert_eq!(a.num_vertices(), b.num_vertices());
        for (va, vb) in a.vertices.iter().zip(&b.vertices) {
            assert!((va - vb).norm() < 1e-9);
        }
    }

    #[test]
    fn test_zero_distortion_keeps_stock_shape() {
        let mut generator = RockGenerator::new();
        generator
            .set_settings(base_settings().with_distortion(0.0))
            .unwrap();
        let mesh = generator.generate().unwrap();
        // Budget above the stock count: every vertex is an undisplaced
        // stock vertex, still exactly on the stock sphere.
        for v in &mesh.vertices {
            assert!((v.coords.norm() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_opposite_distortions_mirror_displacement() {
        struct Capture(Vec<Point3>);
        impl VertexSink for Capture {
            fn found_nearest(&mut self, position: &Point3, _: &Vec3, _: &Point3) {
                self.0.push(*position);
            }
        }

        let run = |distortion: f64| {
            let mut generator = RockGenerator::new();
            generator
                .set_settings(base_settings().with_distortion(distortion))
                .unwrap();
            let mut capture = Capture(Vec::new());
            generator.generate_with(&mut capture).unwrap();
            let stock = generator.stock_mesh().unwrap().clone();
            (capture.0, stock)
        };

        let (plus, stock) = run(0.3);
        let (minus, _) = run(-0.3);
        assert_eq!(plus.len(), stock.num_vertices());
        assert_eq!(plus.len(), minus.len());

        // Identity transform: the undisplaced position is the stock
        // vertex itself, so displacements mirror exactly.
        for ((p, m), v) in plus.iter().zip(&minus).zip(&stock.vertices) {
            let dp = p - v;
            let dm = m - v;
            assert!((dp + dm).norm() < 1e-12);
        }
    }

    #[test]
    fn test_triangle_budget_enforced() {
        let mut generator = RockGenerator::new();
        generator
            .set_settings(base_settings().with_target_triangle_count(100))
            .unwrap();
        let mesh = generator.generate().unwrap();
        assert!(mesh.num_triangles() <= 100);
    }

    #[test]
    fn test_triangle_budget_above_count_is_noop() {
        let mut generator = RockGenerator::new();
        generator.set_settings(base_settings()).unwrap();
        // density 4, unit scale: 4 subdivisions per axis, 16 quads *
        // 2 triangles * 6 faces
        let mesh = generator.generate().unwrap();
        assert_eq!(mesh.num_triangles(), 192);
    }

    #[test]
    fn test_end_to_end_bounded_rock() {
        let mut generator = RockGenerator::new();
        generator
            .set_settings(
                base_settings()
                    .with_stock_density(6.0)
                    .with_distortion(0.1)
                    .with_target_triangle_count(200),
            )
            .unwrap();
        let mesh = generator.generate().unwrap().clone();

        assert!(mesh.num_triangles() <= 200);
        assert!(mesh.validate().is_ok());
        // (distance - 0.5) * 0.1 displaces at most 0.05 off the 0.5
        // sphere; midpoint collapses can pull slightly inward.
        for v in &mesh.vertices {
            let r = v.coords.norm();
            assert!((0.44..=0.56).contains(&r), "vertex at radius {r}");
        }
        assert_eq!(generator.latest_mesh(), Some(&mesh));
    }

    #[test]
    fn test_sink_sees_every_vertex_in_order() {
        struct CountingSink {
            count: usize,
            sites: Vec<Point3>,
        }
        impl VertexSink for CountingSink {
            fn found_nearest(&mut self, _: &Point3, _: &Vec3, site: &Point3) {
                self.count += 1;
                self.sites.push(*site);
            }
        }

        let mut generator = RockGenerator::new();
        generator.set_settings(base_settings()).unwrap();
        let mut sink = CountingSink {
            count: 0,
            sites: Vec::new(),
        };
        generator.generate_with(&mut sink).unwrap();
        assert_eq!(sink.count, generator.stock_mesh().unwrap().num_vertices());
        // Randomness 0 pins every site to a cell center.
        for site in &sink.sites {
            assert!((site.x - site.x.floor() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_observer_does_not_change_output() {
        struct Noisy;
        impl VertexSink for Noisy {
            fn found_nearest(&mut self, _: &Point3, _: &Vec3, _: &Point3) {}
        }

        let mut generator = RockGenerator::new();
        generator.set_settings(base_settings()).unwrap();
        let observed = generator.generate_with(&mut Noisy).unwrap().clone();
        let plain = generator.generate().unwrap().clone();
        assert_eq!(observed, plain);
    }
}
