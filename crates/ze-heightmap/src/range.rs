//! Cells under a brush

use glam::{IVec2, Vec2};

use crate::grid::{GridCell, HeightGrid};

/// Inclusive rectangle of absolute cell indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl Default for CellRect {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl CellRect {
    /// Contains nothing; any union replaces it
    pub const EMPTY: Self = Self {
        min: IVec2::MAX,
        max: IVec2::MIN,
    };

    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    pub fn from_point(point: IVec2) -> Self {
        Self::new(point, point)
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn include(&mut self, point: IVec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &CellRect) -> CellRect {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        CellRect::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn contains(&self, point: IVec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Brush weight at `distance` from its center: full inside `radius`,
/// fading linearly to zero across the feather ring
pub fn feather_influence(distance: f32, radius: f32, feather_radius: f32) -> f32 {
    if distance <= radius {
        return 1.0;
    }
    if feather_radius <= 0.0 {
        return 0.0;
    }
    (1.0 - (distance - radius) / feather_radius).clamp(0.0, 1.0)
}

/// One cell covered by a brush
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeCell {
    pub cell: GridCell,
    pub absolute: IVec2,
    pub influence: f32,
}

/// Every existing cell within `radius + feather_radius` of a local position
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMapCellRange {
    pub center: Vec2,
    pub radius: f32,
    pub feather_radius: f32,
    cells: Vec<RangeCell>,
    bounds: CellRect,
}

impl HeightMapCellRange {
    pub fn new(grid: &dyn HeightGrid, center: Vec2, radius: f32, feather_radius: f32) -> Self {
        let total = radius + feather_radius;
        let cell_size = grid.cell_size();
        let lo = ((center - Vec2::splat(total)) / cell_size).floor().as_ivec2();
        let hi = ((center + Vec2::splat(total)) / cell_size).ceil().as_ivec2();

        let mut cells = Vec::new();
        let mut bounds = CellRect::EMPTY;
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                let absolute = IVec2::new(x, y);
                let distance = grid.local_from_absolute(absolute).distance(center);
                if distance > radius && distance >= total {
                    continue;
                }
                let cell = grid.cell_from_absolute(absolute);
                if !grid.has_patch(cell.patch) {
                    continue;
                }
                cells.push(RangeCell {
                    cell,
                    absolute,
                    influence: feather_influence(distance, radius, feather_radius),
                });
                bounds.include(absolute);
            }
        }

        Self {
            center,
            radius,
            feather_radius,
            cells,
            bounds,
        }
    }

    pub fn cells(&self) -> &[RangeCell] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &RangeCell> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bounding rectangle of the covered cells
    pub fn bounds(&self) -> CellRect {
        self.bounds
    }

    /// Patches touched by the range, without repeats
    pub fn patches(&self) -> Vec<IVec2> {
        let mut patches: Vec<IVec2> = Vec::new();
        for cell in &self.cells {
            if !patches.contains(&cell.cell.patch) {
                patches.push(cell.cell.patch);
            }
        }
        patches
    }

    pub fn signal_patches_modified(&self, grid: &mut dyn HeightGrid) {
        for patch in self.patches() {
            grid.patch_modified(patch);
        }
    }
}
