//! Change-driven invalidation of the generator's cached structures.

use crate::settings::RockGenerationSettings;

/// What a settings replacement invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    /// Rebuild the cached stock mesh.
    pub rebuild_stock: bool,
    /// Rebuild the cached cellular grid.
    pub rebuild_grid: bool,
}

impl Invalidation {
    /// Rebuild nothing.
    pub const NONE: Self = Self {
        rebuild_stock: false,
        rebuild_grid: false,
    };
}

/// Decides, on settings replacement, which cached structures to rebuild.
///
/// Implementations only diff old against new; the generator itself
/// forces a rebuild of caches that do not exist yet.
pub trait InvalidationPolicy {
    /// Diff `old` against `new` and report what to rebuild.
    fn decide(&self, old: &RockGenerationSettings, new: &RockGenerationSettings) -> Invalidation;
}

/// The stock invalidation rule: the stock mesh is keyed on
/// `stock_density` alone, the grid on structural `grid_settings`
/// equality.
///
/// A scale-only change does NOT rebuild the stock mesh, even though
/// scale feeds the subdivision counts of the next rebuild. Swap in a
/// different policy to change that without touching the generation
/// pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DensityKeyedPolicy;

impl InvalidationPolicy for DensityKeyedPolicy {
    fn decide(&self, old: &RockGenerationSettings, new: &RockGenerationSettings) -> Invalidation {
        Invalidation {
            rebuild_stock: old.stock_density != new.stock_density,
            rebuild_grid: old.grid_settings != new.grid_settings,
        }
    }
}
