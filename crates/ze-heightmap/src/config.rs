//! Height-map editing settings

use serde::{Deserialize, Serialize};

/// Brush size and strength shared by the painting tools
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrushConfig {
    pub radius: f32,
    /// Width of the falloff ring outside `radius`
    pub feather_radius: f32,
    pub strength: f32,
    /// Radius change per scroll notch with Shift held
    pub scroll_step: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            feather_radius: 1.0,
            strength: 0.1,
            scroll_step: 0.1,
        }
    }
}

/// Settings for a height map and the tools editing it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeightMapConfig {
    /// Cells along each side of a patch
    pub cells_per_patch: i32,
    /// Local units along each side of a patch
    pub units_per_patch: f32,
    /// Pixels along each side of a patch's weight texture
    pub weight_texture_size: u32,
    /// Strokes recorded per key frame before a new snapshot is taken
    pub frames_between_keys: usize,
    /// Height given to newly created patches
    pub base_height: f32,
    /// Seed for the smoothing tool's random samples
    pub smooth_seed: u64,
    pub brush: BrushConfig,
}

impl Default for HeightMapConfig {
    fn default() -> Self {
        Self {
            cells_per_patch: 32,
            units_per_patch: 20.0,
            weight_texture_size: 128,
            frames_between_keys: 10,
            base_height: 0.0,
            smooth_seed: 1234,
            brush: BrushConfig::default(),
        }
    }
}
