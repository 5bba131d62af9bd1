#![warn(missing_docs)]

//! Cellular (Voronoi) grid for rockgen.
//!
//! Sites live on an implicit infinite unit lattice: every integer cell
//! owns one site, placed at the cell center and displaced by a seeded,
//! per-cell jitter. A nearest-site query scans the 27 cells around the
//! query point; since a site never leaves its cell, that neighborhood
//! always contains the nearest one.
//!
//! The grid is a pure function of its settings: no state is built at
//! construction time, and equal settings answer every query identically.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rockgen_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};

/// Parameters of the cellular grid. Structural equality over all fields
/// decides whether a cached grid may be reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoronoiGridSettings {
    /// Site jitter in `[0, 1]`: 0 keeps sites on the regular lattice,
    /// 1 lets them roam their whole cell.
    pub randomness: f64,
    /// Seed for the per-cell jitter.
    pub seed: u64,
}

impl Default for VoronoiGridSettings {
    fn default() -> Self {
        Self {
            randomness: 0.75,
            seed: 0,
        }
    }
}

/// A spatial partition answering nearest-site queries, producing the
/// cellular pattern that drives the rock distortion pass.
#[derive(Debug, Clone)]
pub struct VoronoiGrid {
    settings: VoronoiGridSettings,
}

impl VoronoiGrid {
    /// Create a grid. Construction is cheap; sites are derived on demand.
    pub fn new(settings: VoronoiGridSettings) -> Self {
        Self { settings }
    }

    /// The settings this grid was built from.
    pub fn settings(&self) -> &VoronoiGridSettings {
        &self.settings
    }

    /// Find the site nearest to `p`.
    ///
    /// Returns the site position and the Euclidean distance to it. The
    /// distance is continuous in `p` and bounded by `sqrt(3)/2` on the
    /// regular lattice, growing mildly with the jitter, roughly the
    /// `[0, 1]` range the displacement formula recenters around 0.5.
    pub fn nearest(&self, p: &Point3) -> (Point3, f64) {
        let cx = p.x.floor() as i64;
        let cy = p.y.floor() as i64;
        let cz = p.z.floor() as i64;

        let mut best_site = Point3::origin();
        let mut best_sq = f64::INFINITY;

        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let site = self.site(cx + dx, cy + dy, cz + dz);
                    let d_sq = (site - *p).norm_squared();
                    if d_sq < best_sq {
                        best_sq = d_sq;
                        best_site = site;
                    }
                }
            }
        }

        (best_site, best_sq.sqrt())
    }

    /// The site of cell `(x, y, z)`: cell center plus seeded jitter,
    /// scaled by the randomness coefficient. Always inside the cell.
    fn site(&self, x: i64, y: i64, z: i64) -> Point3 {
        let mut rng = Pcg64Mcg::seed_from_u64(cell_seed(self.settings.seed, x, y, z));
        let jitter = Vec3::new(
            rng.random_range(-0.5..0.5),
            rng.random_range(-0.5..0.5),
            rng.random_range(-0.5..0.5),
        ) * self.settings.randomness;

        Point3::new(
            x as f64 + 0.5 + jitter.x,
            y as f64 + 0.5 + jitter.y,
            z as f64 + 0.5 + jitter.z,
        )
    }
}

/// Mix the grid seed with a cell coordinate into a per-cell RNG seed
/// (splitmix64 finalizer over each packed coordinate).
fn cell_seed(seed: u64, x: i64, y: i64, z: i64) -> u64 {
    let mut h = mix(seed);
    h = mix(h ^ x as u64);
    h = mix(h ^ y as u64);
    mix(h ^ z as u64)
}

fn mix(v: u64) -> u64 {
    let mut z = v.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
