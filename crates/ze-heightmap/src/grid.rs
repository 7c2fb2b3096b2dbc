//! Height grid access
//!
//! A height map is a sparse set of square patches. Each patch holds
//! `cells_per_patch²` heights and a weight texture used for texture
//! blending. Patch `p` is centered at local position `p * units_per_patch`
//! on the XZ plane, reported here as a `Vec2`.
//!
//! Cells are addressed either by [`GridCell`] (patch index + cell index in
//! the patch) or by an absolute index counted from the cell at the center
//! of patch (0, 0).

use std::collections::HashMap;

use glam::{IVec2, UVec2, Vec2};

use crate::config::HeightMapConfig;

/// RGBA blend weights of one weight-texture pixel
pub type WeightColor = [u8; 4];

/// Weight of a fresh patch: fully the first texture
pub const DEFAULT_WEIGHT: WeightColor = [255, 0, 0, 0];

/// A cell addressed by its patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub patch: IVec2,
    pub cell: IVec2,
}

impl GridCell {
    pub fn new(patch: IVec2, cell: IVec2) -> Self {
        Self { patch, cell }
    }
}

/// Read/write access to height-map storage.
///
/// Coordinates handed to the accessor are not re-validated by the tools;
/// implementations return `None`/`false` for cells outside existing
/// patches.
pub trait HeightGrid {
    fn cells_per_patch(&self) -> i32;

    fn units_per_patch(&self) -> f32;

    fn weight_texture_size(&self) -> u32;

    /// Every existing patch
    fn patch_indices(&self) -> Vec<IVec2>;

    fn has_patch(&self, patch: IVec2) -> bool;

    /// Create a patch filled with `height`. Returns false if it exists.
    fn create_patch(&mut self, patch: IVec2, height: f32) -> bool;

    /// Remove a patch, returning its heights
    fn destroy_patch(&mut self, patch: IVec2) -> Option<Vec<f32>>;

    /// Copy of all heights of a patch, row by row
    fn patch_heights(&self, patch: IVec2) -> Option<Vec<f32>>;

    fn set_patch_heights(&mut self, patch: IVec2, heights: &[f32]) -> bool;

    fn height(&self, cell: GridCell) -> Option<f32>;

    fn set_height(&mut self, cell: GridCell, height: f32) -> bool;

    fn weight(&self, patch: IVec2, pixel: UVec2) -> Option<WeightColor>;

    fn set_weight(&mut self, patch: IVec2, pixel: UVec2, color: WeightColor) -> bool;

    /// Called after a tool changed a patch
    fn patch_modified(&mut self, _patch: IVec2) {}

    /// Local size of one cell
    fn cell_size(&self) -> f32 {
        self.units_per_patch() / self.cells_per_patch() as f32
    }

    /// Absolute index of the cell nearest a local position
    fn absolute_from_local(&self, local: Vec2) -> IVec2 {
        (local / self.cell_size()).round().as_ivec2()
    }

    fn local_from_absolute(&self, absolute: IVec2) -> Vec2 {
        absolute.as_vec2() * self.cell_size()
    }

    fn cell_from_absolute(&self, absolute: IVec2) -> GridCell {
        let size = self.cells_per_patch();
        let shifted = absolute + IVec2::splat(size / 2);
        GridCell {
            patch: IVec2::new(shifted.x.div_euclid(size), shifted.y.div_euclid(size)),
            cell: IVec2::new(shifted.x.rem_euclid(size), shifted.y.rem_euclid(size)),
        }
    }

    fn absolute_from_cell(&self, cell: GridCell) -> IVec2 {
        let size = self.cells_per_patch();
        cell.patch * size + cell.cell - IVec2::splat(size / 2)
    }

    fn patch_index_from_local(&self, local: Vec2) -> IVec2 {
        self.cell_from_absolute(self.absolute_from_local(local)).patch
    }

    /// Local position of a patch's center
    fn patch_local_position(&self, patch: IVec2) -> Vec2 {
        patch.as_vec2() * self.units_per_patch()
    }

    fn absolute_height(&self, absolute: IVec2) -> Option<f32> {
        self.height(self.cell_from_absolute(absolute))
    }

    fn set_absolute_height(&mut self, absolute: IVec2, height: f32) -> bool {
        let cell = self.cell_from_absolute(absolute);
        self.set_height(cell, height)
    }

    /// Bilinear height at a local position; `None` if any of the four
    /// surrounding cells is missing
    fn sample_height(&self, local: Vec2) -> Option<f32> {
        let scaled = local / self.cell_size();
        let base = scaled.floor();
        let t = scaled - base;
        let base = base.as_ivec2();

        let h00 = self.absolute_height(base)?;
        let h10 = self.absolute_height(base + IVec2::X)?;
        let h01 = self.absolute_height(base + IVec2::Y)?;
        let h11 = self.absolute_height(base + IVec2::ONE)?;

        let bottom = h00 + (h10 - h00) * t.x;
        let top = h01 + (h11 - h01) * t.x;
        Some(bottom + (top - bottom) * t.y)
    }
}

#[derive(Debug, Clone)]
struct HeightPatch {
    heights: Vec<f32>,
    weights: Vec<WeightColor>,
}

/// In-memory height map
#[derive(Debug, Clone)]
pub struct SparseHeightMap {
    cells_per_patch: i32,
    units_per_patch: f32,
    weight_texture_size: u32,
    patches: HashMap<IVec2, HeightPatch>,
    modified: Vec<IVec2>,
}

impl SparseHeightMap {
    pub fn new(cells_per_patch: i32, units_per_patch: f32, weight_texture_size: u32) -> Self {
        Self {
            cells_per_patch: cells_per_patch.max(1),
            units_per_patch,
            weight_texture_size,
            patches: HashMap::new(),
            modified: Vec::new(),
        }
    }

    pub fn from_config(config: &HeightMapConfig) -> Self {
        Self::new(
            config.cells_per_patch,
            config.units_per_patch,
            config.weight_texture_size,
        )
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    /// Patches reported modified since the last call, without repeats
    pub fn take_modified(&mut self) -> Vec<IVec2> {
        let mut modified = std::mem::take(&mut self.modified);
        modified.sort_by_key(|p| (p.y, p.x));
        modified.dedup();
        modified
    }

    fn cell_slot(&self, cell: IVec2) -> Option<usize> {
        let size = self.cells_per_patch;
        if cell.x < 0 || cell.y < 0 || cell.x >= size || cell.y >= size {
            return None;
        }
        Some((cell.y * size + cell.x) as usize)
    }

    fn pixel_slot(&self, pixel: UVec2) -> Option<usize> {
        let size = self.weight_texture_size;
        if pixel.x >= size || pixel.y >= size {
            return None;
        }
        Some((pixel.y * size + pixel.x) as usize)
    }
}

impl HeightGrid for SparseHeightMap {
    fn cells_per_patch(&self) -> i32 {
        self.cells_per_patch
    }

    fn units_per_patch(&self) -> f32 {
        self.units_per_patch
    }

    fn weight_texture_size(&self) -> u32 {
        self.weight_texture_size
    }

    fn patch_indices(&self) -> Vec<IVec2> {
        let mut indices: Vec<IVec2> = self.patches.keys().copied().collect();
        indices.sort_by_key(|p| (p.y, p.x));
        indices
    }

    fn has_patch(&self, patch: IVec2) -> bool {
        self.patches.contains_key(&patch)
    }

    fn create_patch(&mut self, patch: IVec2, height: f32) -> bool {
        if self.patches.contains_key(&patch) {
            return false;
        }
        let cells = (self.cells_per_patch * self.cells_per_patch) as usize;
        let pixels = (self.weight_texture_size * self.weight_texture_size) as usize;
        self.patches.insert(
            patch,
            HeightPatch {
                heights: vec![height; cells],
                weights: vec![DEFAULT_WEIGHT; pixels],
            },
        );
        true
    }

    fn destroy_patch(&mut self, patch: IVec2) -> Option<Vec<f32>> {
        self.patches.remove(&patch).map(|p| p.heights)
    }

    fn patch_heights(&self, patch: IVec2) -> Option<Vec<f32>> {
        self.patches.get(&patch).map(|p| p.heights.clone())
    }

    fn set_patch_heights(&mut self, patch: IVec2, heights: &[f32]) -> bool {
        match self.patches.get_mut(&patch) {
            Some(p) if p.heights.len() == heights.len() => {
                p.heights.copy_from_slice(heights);
                true
            }
            _ => false,
        }
    }

    fn height(&self, cell: GridCell) -> Option<f32> {
        let slot = self.cell_slot(cell.cell)?;
        self.patches.get(&cell.patch).map(|p| p.heights[slot])
    }

    fn set_height(&mut self, cell: GridCell, height: f32) -> bool {
        let Some(slot) = self.cell_slot(cell.cell) else {
            return false;
        };
        match self.patches.get_mut(&cell.patch) {
            Some(p) => {
                p.heights[slot] = height;
                true
            }
            None => false,
        }
    }

    fn weight(&self, patch: IVec2, pixel: UVec2) -> Option<WeightColor> {
        let slot = self.pixel_slot(pixel)?;
        self.patches.get(&patch).map(|p| p.weights[slot])
    }

    fn set_weight(&mut self, patch: IVec2, pixel: UVec2, color: WeightColor) -> bool {
        let Some(slot) = self.pixel_slot(pixel) else {
            return false;
        };
        match self.patches.get_mut(&patch) {
            Some(p) => {
                p.weights[slot] = color;
                true
            }
            None => false,
        }
    }

    fn patch_modified(&mut self, patch: IVec2) {
        self.modified.push(patch);
    }
}
