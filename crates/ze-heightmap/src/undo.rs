//! Undo records for height-map edits
//!
//! Each record keeps a sparse map from grid coordinate to the values it
//! changed. The first time a coordinate is touched its
//! value before the edit is kept as the original; later touches only move
//! the applied value forward. Undo and redo write the stored values back,
//! so repeating either has no further effect.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use glam::{IVec2, UVec2};
use ze_core::Operation;

use crate::grid::{HeightGrid, WeightColor};
use crate::range::{CellRect, HeightMapCellRange};

/// Value of one coordinate before and after an edit
#[derive(Debug, Clone, PartialEq)]
pub struct ModifiedValue<T> {
    pub original: T,
    pub applied: T,
}

/// Sparse map of modified values keyed by grid coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct SparseDiff<T> {
    values: HashMap<IVec2, ModifiedValue<T>>,
}

impl<T> Default for SparseDiff<T> {
    fn default() -> Self {
        Self { values: HashMap::new() }
    }
}

impl<T> SparseDiff<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit; a coordinate's first original is kept
    pub fn record(&mut self, x: i32, y: i32, original: T, applied: T) {
        match self.values.entry(IVec2::new(x, y)) {
            Entry::Occupied(mut entry) => entry.get_mut().applied = applied,
            Entry::Vacant(entry) => {
                entry.insert(ModifiedValue { original, applied });
            }
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&ModifiedValue<T>> {
        self.values.get(&IVec2::new(x, y))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec2, &ModifiedValue<T>)> {
        self.values.iter().map(|(&coord, value)| (coord, value))
    }
}

/// Height changes of one brush stroke, keyed by absolute cell index
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMapUndoRedo {
    pub name: String,
    cells: SparseDiff<f32>,
    bounds: CellRect,
}

impl Default for HeightMapUndoRedo {
    fn default() -> Self {
        Self::new("HeightMapEdit")
    }
}

impl HeightMapUndoRedo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: SparseDiff::new(),
            bounds: CellRect::EMPTY,
        }
    }

    /// Record a cell's height before and after an edit
    pub fn add_cell(&mut self, absolute: IVec2, pre_delta_height: f32, height: f32) {
        self.cells.record(absolute.x, absolute.y, pre_delta_height, height);
    }

    pub fn cell(&self, absolute: IVec2) -> Option<&ModifiedValue<f32>> {
        self.cells.get(absolute.x, absolute.y)
    }

    pub fn cells(&self) -> &SparseDiff<f32> {
        &self.cells
    }

    /// Start the touched area at a brush's cells
    pub fn set_aabb(&mut self, range: &HeightMapCellRange) {
        self.bounds = range.bounds();
    }

    /// Grow the touched area by a brush's cells
    pub fn update_aabb(&mut self, range: &HeightMapCellRange) {
        self.bounds = self.bounds.union(&range.bounds());
    }

    /// Area that needs refreshing after undo or redo
    pub fn bounds(&self) -> CellRect {
        self.bounds
    }

    fn write(&self, grid: &mut dyn HeightGrid, applied: bool) {
        let mut patches: Vec<IVec2> = Vec::new();
        for (absolute, value) in self.cells.iter() {
            let height = if applied { value.applied } else { value.original };
            let cell = grid.cell_from_absolute(absolute);
            if grid.set_height(cell, height) && !patches.contains(&cell.patch) {
                patches.push(cell.patch);
            }
        }
        for patch in patches {
            grid.patch_modified(patch);
        }
    }
}

impl Operation<dyn HeightGrid> for HeightMapUndoRedo {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&self, grid: &mut (dyn HeightGrid + 'static)) {
        self.write(grid, false);
    }

    fn redo(&self, grid: &mut (dyn HeightGrid + 'static)) {
        self.write(grid, true);
    }
}

/// Patch creations and destructions, keyed by patch index.
///
/// A value of `None` means no patch; `Some` holds the patch's heights.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightPatchUndoRedo {
    pub name: String,
    patches: SparseDiff<Option<Vec<f32>>>,
}

impl Default for HeightPatchUndoRedo {
    fn default() -> Self {
        Self::new("HeightPatchEdit")
    }
}

impl HeightPatchUndoRedo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patches: SparseDiff::new(),
        }
    }

    /// Record a patch's state before and after a create or destroy
    pub fn add_patch(&mut self, patch: IVec2, before: Option<Vec<f32>>, after: Option<Vec<f32>>) {
        self.patches.record(patch.x, patch.y, before, after);
    }

    pub fn patch(&self, patch: IVec2) -> Option<&ModifiedValue<Option<Vec<f32>>>> {
        self.patches.get(patch.x, patch.y)
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    fn write(&self, grid: &mut dyn HeightGrid, applied: bool) {
        for (patch, value) in self.patches.iter() {
            let state = if applied { &value.applied } else { &value.original };
            match state {
                Some(heights) => {
                    grid.create_patch(patch, 0.0);
                    if !grid.set_patch_heights(patch, heights) {
                        tracing::warn!("Patch ({}, {}) heights do not fit the grid", patch.x, patch.y);
                    }
                    grid.patch_modified(patch);
                }
                None => {
                    grid.destroy_patch(patch);
                }
            }
        }
    }
}

impl Operation<dyn HeightGrid> for HeightPatchUndoRedo {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&self, grid: &mut (dyn HeightGrid + 'static)) {
        self.write(grid, false);
    }

    fn redo(&self, grid: &mut (dyn HeightGrid + 'static)) {
        self.write(grid, true);
    }
}

/// Weight-texture changes of one paint stroke, per patch and pixel
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMapUndoRedo {
    pub name: String,
    patches: HashMap<IVec2, SparseDiff<WeightColor>>,
}

impl Default for WeightMapUndoRedo {
    fn default() -> Self {
        Self::new("WeightMapPaint")
    }
}

impl WeightMapUndoRedo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patches: HashMap::new(),
        }
    }

    /// Record a pixel's weight before and after painting
    pub fn add_pixel(&mut self, patch: IVec2, pixel: UVec2, pre_delta_weight: WeightColor, weight: WeightColor) {
        self.patches
            .entry(patch)
            .or_default()
            .record(pixel.x as i32, pixel.y as i32, pre_delta_weight, weight);
    }

    pub fn pixel(&self, patch: IVec2, pixel: UVec2) -> Option<&ModifiedValue<WeightColor>> {
        self.patches.get(&patch)?.get(pixel.x as i32, pixel.y as i32)
    }

    /// Number of recorded pixels over all patches
    pub fn len(&self) -> usize {
        self.patches.values().map(SparseDiff::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self, grid: &mut dyn HeightGrid, applied: bool) {
        for (&patch, pixels) in &self.patches {
            for (pixel, value) in pixels.iter() {
                let color = if applied { value.applied } else { value.original };
                grid.set_weight(patch, pixel.as_uvec2(), color);
            }
            grid.patch_modified(patch);
        }
    }
}

impl Operation<dyn HeightGrid> for WeightMapUndoRedo {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&self, grid: &mut (dyn HeightGrid + 'static)) {
        self.write(grid, false);
    }

    fn redo(&self, grid: &mut (dyn HeightGrid + 'static)) {
        self.write(grid, true);
    }
}
