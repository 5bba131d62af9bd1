//! The settings value object driving rock generation.

use rockgen_grid::VoronoiGridSettings;
use rockgen_math::{Transform, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// All tunable parameters of a generation run.
///
/// A settings value is immutable once published: edits construct a new
/// value (via the `with_*` methods or struct update syntax) and hand it
/// to [`crate::RockGenerator::set_settings`], which diffs it against the
/// previous value to decide what cached state to rebuild. Structural
/// equality is exact: nudging a field by any amount counts as a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RockGenerationSettings {
    /// Subdivisions per unit of scale for the stock mesh. Must be > 0.
    pub stock_density: f64,
    /// Triangle budget handed to the simplifier. Must be > 0.
    pub target_triangle_count: u32,
    /// Displacement magnitude multiplier. Negative inverts the
    /// displacement direction.
    pub distortion: f64,
    /// Scales world positions before the cellular grid query, so it
    /// controls feature frequency. Must be > 0.
    pub pattern_size: f64,
    /// Per-axis stretch, folded into the stock subdivision counts.
    /// Every component must be > 0.
    pub scale: Vec3,
    /// Placement of the rock in world space. The translation column is
    /// the generation's reference origin.
    pub transform: Transform,
    /// Parameters of the cellular grid.
    pub grid_settings: VoronoiGridSettings,
}

impl Default for RockGenerationSettings {
    fn default() -> Self {
        Self {
            stock_density: 8.0,
            target_triangle_count: 400,
            distortion: 0.5,
            pattern_size: 1.0,
            scale: Vec3::new(1.0, 1.0, 1.0),
            transform: Transform::identity(),
            grid_settings: VoronoiGridSettings::default(),
        }
    }
}

impl RockGenerationSettings {
    /// Copy with a new stock density.
    pub fn with_stock_density(mut self, stock_density: f64) -> Self {
        self.stock_density = stock_density;
        self
    }

    /// Copy with a new triangle budget.
    pub fn with_target_triangle_count(mut self, target_triangle_count: u32) -> Self {
        self.target_triangle_count = target_triangle_count;
        self
    }

    /// Copy with a new distortion multiplier.
    pub fn with_distortion(mut self, distortion: f64) -> Self {
        self.distortion = distortion;
        self
    }

    /// Copy with a new pattern size.
    pub fn with_pattern_size(mut self, pattern_size: f64) -> Self {
        self.pattern_size = pattern_size;
        self
    }

    /// Copy with a new per-axis scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Copy with a new transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Copy with new grid settings.
    pub fn with_grid_settings(mut self, grid_settings: VoronoiGridSettings) -> Self {
        self.grid_settings = grid_settings;
        self
    }

    /// Check every field constraint. Called by
    /// [`crate::RockGenerator::set_settings`] before any cache mutation.
    pub fn validate(&self) -> Result<()> {
        if !(self.stock_density > 0.0 && self.stock_density.is_finite()) {
            return Err(GenerationError::InvalidSettings(format!(
                "stock_density must be a positive finite number, got {}",
                self.stock_density
            )));
        }
        if self.target_triangle_count == 0 {
            return Err(GenerationError::InvalidSettings(
                "target_triangle_count must be positive".into(),
            ));
        }
        if !self.distortion.is_finite() {
            return Err(GenerationError::InvalidSettings(format!(
                "distortion must be finite, got {}",
                self.distortion
            )));
        }
        if !(self.pattern_size > 0.0 && self.pattern_size.is_finite()) {
            return Err(GenerationError::InvalidSettings(format!(
                "pattern_size must be a positive finite number, got {}",
                self.pattern_size
            )));
        }
        for (axis, component) in ["x", "y", "z"].iter().zip(self.scale.iter()) {
            if !(*component > 0.0 && component.is_finite()) {
                return Err(GenerationError::InvalidSettings(format!(
                    "scale.{axis} must be a positive finite number, got {component}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.grid_settings.randomness) {
            return Err(GenerationError::InvalidSettings(format!(
                "grid randomness must be in [0, 1], got {}",
                self.grid_settings.randomness
            )));
        }
        Ok(())
    }
}
