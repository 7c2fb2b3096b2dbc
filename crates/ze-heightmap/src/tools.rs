//! Height-map editing tools
//!
//! [`HeightMapTool`] turns viewport input into brush positions on the map's
//! local XZ plane and forwards them to the active [`HeightSubTool`]. Each
//! sub-tool edits the grid immediately and queues one undo record per
//! stroke when the mouse is released.

use glam::{IVec2, Mat4, UVec2, Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use ze_core::{InputEvent, Modifiers, MouseButton, OperationQueue, Plane, Ray};

use crate::config::HeightMapConfig;
use crate::grid::{DEFAULT_WEIGHT, HeightGrid, WeightColor};
use crate::range::{HeightMapCellRange, feather_influence};
use crate::state::{HeightMapBrushStroke, HeightMapStateManager};
use crate::undo::{HeightMapUndoRedo, HeightPatchUndoRedo, WeightMapUndoRedo};

/// Smallest brush and feather radius
pub const MIN_RADIUS: f32 = 0.001;

/// Weight of the brush center in each random smoothing sample
const MIDDLE_INFLUENCE: f32 = 0.25;
const SHARPEN_SCALE: f32 = 0.2;

/// Grow both radii by `scroll` steps, clamped to [`MIN_RADIUS`]
fn scroll_radii(radius: &mut f32, feather_radius: &mut f32, scroll: f32, step: f32) {
    *radius = (*radius + scroll * step).max(MIN_RADIUS);
    *feather_radius = (*feather_radius + scroll * step).max(MIN_RADIUS);
}

/// What a [`HeightManipulationTool`] does to the cells under the brush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightToolKind {
    /// Raise, or lower with Shift
    RaiseLower,
    /// Smooth, or sharpen with Shift
    SmoothSharpen,
    /// Pull toward a target height
    Flatten,
}

/// Neighbourhood sampled by the smoothing brush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothSamples {
    /// Half-width of the uniform sample grid
    pub uniform: i32,
    pub random: i32,
    /// Cells a random sample may reach
    pub random_distance: i32,
    /// Derive the counts from the brush radius
    pub auto_determine: bool,
}

impl Default for SmoothSamples {
    fn default() -> Self {
        Self {
            uniform: 0,
            random: 0,
            random_distance: 0,
            auto_determine: true,
        }
    }
}

/// Brush that changes cell heights
#[derive(Debug, Clone)]
pub struct HeightManipulationTool {
    pub kind: HeightToolKind,
    radius: f32,
    feather_radius: f32,
    pub strength: f32,
    pub scroll_step: f32,
    /// Target of the flatten brush
    pub flatten_height: f32,
    /// Flatten samples its target height at the mouse-down position
    pub sample_on_mouse_down: bool,
    pub samples: SmoothSamples,
    seed: u64,
    rng: ChaCha8Rng,
    local_position: Vec2,
    operation: Option<HeightMapUndoRedo>,
    state: HeightMapStateManager,
}

impl HeightManipulationTool {
    pub fn new(kind: HeightToolKind, config: &HeightMapConfig) -> Self {
        Self {
            kind,
            radius: config.brush.radius.max(MIN_RADIUS),
            feather_radius: config.brush.feather_radius.max(MIN_RADIUS),
            strength: config.brush.strength,
            scroll_step: config.brush.scroll_step,
            flatten_height: 0.0,
            sample_on_mouse_down: true,
            samples: SmoothSamples::default(),
            seed: config.smooth_seed,
            rng: ChaCha8Rng::seed_from_u64(config.smooth_seed),
            local_position: Vec2::ZERO,
            operation: None,
            state: HeightMapStateManager::new(config.frames_between_keys),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(MIN_RADIUS);
    }

    pub fn feather_radius(&self) -> f32 {
        self.feather_radius
    }

    pub fn set_feather_radius(&mut self, feather_radius: f32) {
        self.feather_radius = feather_radius.max(MIN_RADIUS);
    }

    /// Stroke history recorded by this tool
    pub fn state(&self) -> &HeightMapStateManager {
        &self.state
    }

    /// Undo record of the stroke in progress
    pub fn pending_operation(&self) -> Option<&HeightMapUndoRedo> {
        self.operation.as_ref()
    }

    /// Recompute the smoothing samples for the brush size on `grid`
    pub fn refresh(&mut self, grid: &dyn HeightGrid) {
        if self.samples.auto_determine {
            self.determine_samples(grid);
        }
    }

    fn determine_samples(&mut self, grid: &dyn HeightGrid) {
        let samples =
            ((self.radius / grid.units_per_patch()) * 0.1 * grid.cells_per_patch() as f32) as i32;

        // Random samples start once the base count reaches 3
        let random = (samples - 3).max(0);
        let mut uniform = (samples.min(4) - random).max(1);
        if random > 0 {
            uniform = uniform.max(2);
        }

        self.samples.random = random;
        self.samples.uniform = uniform;
        self.samples.random_distance = (samples as f32 * 1.5) as i32;
    }

    pub fn left_mouse_down(&mut self, grid: &mut dyn HeightGrid, local: Vec2, modifiers: Modifiers) -> bool {
        self.local_position = local;
        if self.kind == HeightToolKind::Flatten && self.sample_on_mouse_down {
            return match grid.sample_height(local) {
                Some(height) => {
                    self.flatten_height = height;
                    true
                }
                None => false,
            };
        }
        self.refresh(grid);
        self.perform_query(grid, modifiers);
        true
    }

    pub fn left_mouse_move(&mut self, grid: &mut dyn HeightGrid, local: Vec2, modifiers: Modifiers) {
        self.local_position = local;
        self.perform_query(grid, modifiers);
    }

    /// Commit the stroke's undo record
    pub fn left_mouse_up(&mut self, queue: &mut OperationQueue<dyn HeightGrid>) -> bool {
        if let Some(operation) = self.operation.take() {
            queue.queue(Box::new(operation));
        }
        if self.state.is_in_stroke() {
            if let Err(err) = self.state.end_brush_stroke() {
                tracing::warn!("Failed to end brush stroke: {}", err);
            }
        }
        true
    }

    /// Shift+scroll resizes the brush. Returns true if handled.
    pub fn mouse_scroll(&mut self, grid: &dyn HeightGrid, scroll: f32, modifiers: Modifiers) -> bool {
        if modifiers.shift {
            scroll_radii(&mut self.radius, &mut self.feather_radius, scroll, self.scroll_step);
        }
        self.refresh(grid);
        modifiers.shift
    }

    /// Apply a recorded stroke again without recording undo
    pub fn replay_stroke(&mut self, grid: &mut dyn HeightGrid, stroke: &HeightMapBrushStroke, modifiers: Modifiers) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        for &point in &stroke.points {
            let range = HeightMapCellRange::new(grid, point, stroke.radius, stroke.feather_radius);
            self.apply_to_cells(grid, &range, modifiers.shift, false);
            range.signal_patches_modified(grid);
        }
    }

    fn perform_query(&mut self, grid: &mut dyn HeightGrid, modifiers: Modifiers) {
        let range = HeightMapCellRange::new(grid, self.local_position, self.radius, self.feather_radius);

        match self.operation.as_mut() {
            Some(operation) => operation.update_aabb(&range),
            None => {
                let mut operation = HeightMapUndoRedo::default();
                operation.set_aabb(&range);
                self.operation = Some(operation);
                self.rng = ChaCha8Rng::seed_from_u64(self.seed);
                if let Err(err) = self.state.start_brush_stroke(grid, self.radius, self.feather_radius) {
                    tracing::warn!("Failed to start brush stroke: {}", err);
                }
            }
        }
        if let Err(err) = self.state.add_point_to_stroke(self.local_position) {
            tracing::warn!("Failed to record brush point: {}", err);
        }

        self.apply_to_cells(grid, &range, modifiers.shift, true);
        range.signal_patches_modified(grid);
    }

    fn apply_to_cells(&mut self, grid: &mut dyn HeightGrid, range: &HeightMapCellRange, shift: bool, record: bool) {
        let name = match (self.kind, shift) {
            (HeightToolKind::RaiseLower, false) => "HeightMapRaise",
            (HeightToolKind::RaiseLower, true) => "HeightMapLower",
            (HeightToolKind::SmoothSharpen, false) => "HeightMapSmooth",
            (HeightToolKind::SmoothSharpen, true) => "HeightMapSharpen",
            (HeightToolKind::Flatten, _) => "HeightMapFlatten",
        };
        let mut operation = if record { self.operation.as_mut() } else { None };
        if let Some(operation) = operation.as_mut() {
            operation.name = name.to_string();
        }

        let sharpen_average = if self.kind == HeightToolKind::SmoothSharpen && shift {
            let (total, weight) = range
                .iter()
                .filter_map(|c| grid.height(c.cell).map(|h| (h * c.influence, c.influence)))
                .fold((0.0, 0.0), |acc, (h, w)| (acc.0 + h, acc.1 + w));
            if weight == 0.0 {
                return;
            }
            Some(total / weight)
        } else {
            None
        };

        for cell in range.iter() {
            let Some(height) = grid.height(cell.cell) else {
                continue;
            };

            let new_height = match self.kind {
                HeightToolKind::RaiseLower => {
                    let direction = if shift { -1.0 } else { 1.0 };
                    height + direction * self.strength * cell.influence
                }
                HeightToolKind::SmoothSharpen => match sharpen_average {
                    Some(average) => {
                        let diff = (height - average) * self.strength;
                        height + diff * cell.influence * SHARPEN_SCALE
                    }
                    None => {
                        let Some(average) = smooth_average(grid, cell.absolute, height, &self.samples, &mut self.rng)
                        else {
                            continue;
                        };
                        let smoothed = height + (average - height) * self.strength;
                        height + (smoothed - height) * cell.influence
                    }
                },
                HeightToolKind::Flatten => {
                    let smoothed = height + (self.flatten_height - height) * self.strength;
                    height + (smoothed - height) * cell.influence
                }
            };

            grid.set_height(cell.cell, new_height);
            if let Some(operation) = operation.as_mut() {
                operation.add_cell(cell.absolute, height, new_height);
            }
        }
    }
}

/// Weighted average of the heights around `absolute`; `None` without
/// samples
fn smooth_average(
    grid: &dyn HeightGrid,
    absolute: IVec2,
    height: f32,
    samples: &SmoothSamples,
    rng: &mut ChaCha8Rng,
) -> Option<f32> {
    let mut total_height = 0.0;
    let mut total_weight = 0.0;

    for dy in -samples.uniform..=samples.uniform {
        for dx in -samples.uniform..=samples.uniform {
            if let Some(h) = grid.absolute_height(absolute + IVec2::new(dx, dy)) {
                total_height += h;
                total_weight += 1.0;
            }
        }
    }

    let distance = samples.random_distance;
    if distance > 0 {
        let max_distance = ((2 * distance * distance) as f32).sqrt();
        for _ in 0..samples.random {
            let dx = rng.random_range(0..distance * 2) - distance;
            let dy = rng.random_range(0..distance * 2) - distance;
            let offset = IVec2::new(dx, dy);
            if let Some(h) = grid.absolute_height(absolute + offset) {
                let influence = (max_distance - offset.as_vec2().length()) / max_distance;
                total_height += h * influence;
                total_weight += influence;
            }

            // The center pulls random samples toward itself
            total_height += height * MIDDLE_INFLUENCE;
            total_weight += MIDDLE_INFLUENCE;
        }
    }

    (total_weight != 0.0).then(|| total_height / total_weight)
}

/// Click creates a patch, Shift-click destroys one
#[derive(Debug, Clone, Default)]
pub struct CreateDestroyTool {
    /// Height of every cell of a created patch
    pub base_height: f32,
    operation: Option<HeightPatchUndoRedo>,
}

impl CreateDestroyTool {
    pub fn new(config: &HeightMapConfig) -> Self {
        Self {
            base_height: config.base_height,
            operation: None,
        }
    }

    pub fn left_mouse_down(&mut self, grid: &mut dyn HeightGrid, local: Vec2, modifiers: Modifiers) -> bool {
        let operation = self.operation.get_or_insert_with(HeightPatchUndoRedo::default);
        let patch = grid.patch_index_from_local(local);

        if !modifiers.shift {
            if !grid.create_patch(patch, self.base_height) {
                return true;
            }
            operation.name = "CreateHeightPatch".to_string();
            operation.add_patch(patch, None, grid.patch_heights(patch));
            grid.patch_modified(patch);
            tracing::debug!("Created height patch ({}, {})", patch.x, patch.y);
        } else if let Some(heights) = grid.destroy_patch(patch) {
            operation.name = "DestroyHeightPatch".to_string();
            operation.add_patch(patch, Some(heights), None);
            tracing::debug!("Destroyed height patch ({}, {})", patch.x, patch.y);
        }
        true
    }

    pub fn left_mouse_move(&mut self, grid: &mut dyn HeightGrid, local: Vec2, modifiers: Modifiers) {
        self.left_mouse_down(grid, local, modifiers);
    }

    pub fn left_mouse_up(&mut self, queue: &mut OperationQueue<dyn HeightGrid>) -> bool {
        match self.operation.take() {
            Some(operation) if !operation.is_empty() => {
                queue.queue(Box::new(operation));
            }
            _ => {}
        }
        true
    }
}

/// Move weight into `channel` by `change`, taking it from the other
/// channels in proportion to their weights
pub fn change_weights(current: WeightColor, channel: usize, change: f32) -> WeightColor {
    let mut weights = current.map(|c| c as f32 / 255.0);
    let channel = channel.min(3);

    let original = weights[channel];
    let other_total = 1.0 - original;
    let target = (original + change).clamp(0.0, 1.0);
    let target_change = target - original;
    let other_change = if other_total != 0.0 {
        -target_change / other_total
    } else {
        0.0
    };

    for (i, weight) in weights.iter_mut().enumerate() {
        if i == channel {
            *weight = target;
        } else {
            *weight += *weight * other_change;
        }
    }

    // Every cell carries some weight; an emptied cell falls back to the base layer
    let total: f32 = weights.iter().sum();
    if total <= f32::EPSILON {
        return DEFAULT_WEIGHT;
    }
    for weight in &mut weights {
        *weight /= total;
    }
    weights.map(|w| (w * 255.0).round().clamp(0.0, 255.0) as u8)
}

/// Paints texture blend weights
#[derive(Debug, Clone)]
pub struct WeightPainterTool {
    /// Texture channel painted, 0 to 3
    pub channel: usize,
    pub strength: f32,
    pub radius: f32,
    pub feather_radius: f32,
    pub scroll_step: f32,
    operation: Option<WeightMapUndoRedo>,
}

impl WeightPainterTool {
    pub fn new(config: &HeightMapConfig) -> Self {
        Self {
            channel: 0,
            strength: config.brush.strength,
            radius: config.brush.radius.max(MIN_RADIUS),
            feather_radius: config.brush.feather_radius.max(MIN_RADIUS),
            scroll_step: config.brush.scroll_step,
            operation: None,
        }
    }

    pub fn left_mouse_down(&mut self, grid: &mut dyn HeightGrid, local: Vec2) -> bool {
        self.paint(grid, local);
        true
    }

    pub fn left_mouse_move(&mut self, grid: &mut dyn HeightGrid, local: Vec2) {
        self.paint(grid, local);
    }

    pub fn left_mouse_up(&mut self, queue: &mut OperationQueue<dyn HeightGrid>) -> bool {
        match self.operation.take() {
            Some(operation) if !operation.is_empty() => {
                queue.queue(Box::new(operation));
            }
            _ => {}
        }
        true
    }

    pub fn mouse_scroll(&mut self, scroll: f32, modifiers: Modifiers) -> bool {
        if modifiers.shift {
            scroll_radii(&mut self.radius, &mut self.feather_radius, scroll, self.scroll_step);
        }
        modifiers.shift
    }

    fn paint(&mut self, grid: &mut dyn HeightGrid, brush: Vec2) {
        let operation = self.operation.get_or_insert_with(WeightMapUndoRedo::default);
        let center = grid.patch_index_from_local(brush);
        let units = grid.units_per_patch();
        let total_radius = self.radius + self.feather_radius;
        let index_radius = (total_radius / units).ceil() as i32;

        let texture_size = grid.weight_texture_size();
        let pixel_to_unit = units / texture_size as f32;

        for y in -index_radius..=index_radius {
            for x in -index_radius..=index_radius {
                let patch = center + IVec2::new(x, y);
                if !grid.has_patch(patch) {
                    continue;
                }
                let corner = grid.patch_local_position(patch) - Vec2::splat(units * 0.5);
                let mut painted = false;

                for py in 0..texture_size {
                    for px in 0..texture_size {
                        let pixel = UVec2::new(px, py);
                        let position = corner + pixel.as_vec2() * pixel_to_unit;
                        let distance = position.distance(brush);
                        if distance >= total_radius {
                            continue;
                        }
                        let Some(current) = grid.weight(patch, pixel) else {
                            continue;
                        };
                        let influence = feather_influence(distance, self.radius, self.feather_radius);
                        let weight = change_weights(current, self.channel, influence * self.strength);
                        grid.set_weight(patch, pixel, weight);
                        operation.add_pixel(patch, pixel, current, weight);
                        painted = true;
                    }
                }

                if painted {
                    grid.patch_modified(patch);
                }
            }
        }
    }
}

/// The sub-tools of the height-map tool
#[derive(Debug, Clone)]
pub enum HeightSubTool {
    CreateDestroy(CreateDestroyTool),
    Manipulation(HeightManipulationTool),
    WeightPainter(WeightPainterTool),
}

impl HeightSubTool {
    pub fn left_mouse_down(&mut self, grid: &mut dyn HeightGrid, local: Vec2, modifiers: Modifiers) -> bool {
        match self {
            HeightSubTool::CreateDestroy(tool) => tool.left_mouse_down(grid, local, modifiers),
            HeightSubTool::Manipulation(tool) => tool.left_mouse_down(grid, local, modifiers),
            HeightSubTool::WeightPainter(tool) => tool.left_mouse_down(grid, local),
        }
    }

    pub fn left_mouse_move(&mut self, grid: &mut dyn HeightGrid, local: Vec2, modifiers: Modifiers) {
        match self {
            HeightSubTool::CreateDestroy(tool) => tool.left_mouse_move(grid, local, modifiers),
            HeightSubTool::Manipulation(tool) => tool.left_mouse_move(grid, local, modifiers),
            HeightSubTool::WeightPainter(tool) => tool.left_mouse_move(grid, local),
        }
    }

    pub fn left_mouse_up(&mut self, queue: &mut OperationQueue<dyn HeightGrid>) -> bool {
        match self {
            HeightSubTool::CreateDestroy(tool) => tool.left_mouse_up(queue),
            HeightSubTool::Manipulation(tool) => tool.left_mouse_up(queue),
            HeightSubTool::WeightPainter(tool) => tool.left_mouse_up(queue),
        }
    }

    pub fn mouse_scroll(&mut self, grid: &dyn HeightGrid, scroll: f32, modifiers: Modifiers) -> bool {
        match self {
            HeightSubTool::CreateDestroy(_) => false,
            HeightSubTool::Manipulation(tool) => tool.mouse_scroll(grid, scroll, modifiers),
            HeightSubTool::WeightPainter(tool) => tool.mouse_scroll(scroll, modifiers),
        }
    }

    pub fn refresh(&mut self, grid: &dyn HeightGrid) {
        if let HeightSubTool::Manipulation(tool) = self {
            tool.refresh(grid);
        }
    }
}

/// Selectable sub-tools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightTool {
    #[default]
    CreateDestroy,
    RaiseLower,
    SmoothSharpen,
    Flatten,
    WeightPainter,
}

impl HeightTool {
    const ALL: [HeightTool; 5] = [
        HeightTool::CreateDestroy,
        HeightTool::RaiseLower,
        HeightTool::SmoothSharpen,
        HeightTool::Flatten,
        HeightTool::WeightPainter,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Routes viewport input to the active height-map sub-tool
#[derive(Debug, Clone)]
pub struct HeightMapTool {
    current: HeightTool,
    sub_tools: Vec<HeightSubTool>,
    /// Local-to-world matrix of the edited map
    pub map_transform: Mat4,
    capturing: bool,
}

impl HeightMapTool {
    pub fn new(config: &HeightMapConfig) -> Self {
        let sub_tools = HeightTool::ALL
            .iter()
            .map(|tool| match tool {
                HeightTool::CreateDestroy => HeightSubTool::CreateDestroy(CreateDestroyTool::new(config)),
                HeightTool::RaiseLower => {
                    HeightSubTool::Manipulation(HeightManipulationTool::new(HeightToolKind::RaiseLower, config))
                }
                HeightTool::SmoothSharpen => {
                    HeightSubTool::Manipulation(HeightManipulationTool::new(HeightToolKind::SmoothSharpen, config))
                }
                HeightTool::Flatten => {
                    HeightSubTool::Manipulation(HeightManipulationTool::new(HeightToolKind::Flatten, config))
                }
                HeightTool::WeightPainter => HeightSubTool::WeightPainter(WeightPainterTool::new(config)),
            })
            .collect();

        Self {
            current: HeightTool::default(),
            sub_tools,
            map_transform: Mat4::IDENTITY,
            capturing: false,
        }
    }

    pub fn current_tool(&self) -> HeightTool {
        self.current
    }

    /// Switch sub-tools. Refused while a stroke is in progress.
    pub fn set_current_tool(&mut self, tool: HeightTool) -> bool {
        if self.capturing {
            return false;
        }
        self.current = tool;
        true
    }

    pub fn sub_tool(&self) -> &HeightSubTool {
        &self.sub_tools[self.current.index()]
    }

    pub fn sub_tool_mut(&mut self) -> &mut HeightSubTool {
        &mut self.sub_tools[self.current.index()]
    }

    /// Whether a stroke is in progress
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Where a world ray meets the map's local ground plane
    pub fn local_position(&self, ray: &Ray) -> Option<Vec2> {
        let inverse = self.map_transform.inverse();
        let local_ray = Ray::new(
            inverse.transform_point3(ray.origin),
            inverse.transform_vector3(ray.direction),
        );
        let t = Plane::new(Vec3::ZERO, Vec3::Y).intersect_ray(&local_ray)?;
        if t < 0.0 {
            return None;
        }
        let point = local_ray.at(t);
        Some(Vec2::new(point.x, point.z))
    }

    /// Handle one input event. Returns true if it was consumed.
    pub fn handle_input(
        &mut self,
        input: &InputEvent,
        grid: &mut dyn HeightGrid,
        queue: &mut OperationQueue<dyn HeightGrid>,
    ) -> bool {
        match input {
            InputEvent::MouseDown(MouseButton::Left, mouse) => {
                let Some(local) = self.local_position(&mouse.ray) else {
                    return false;
                };
                let handled = self.sub_tool_mut().left_mouse_down(grid, local, mouse.modifiers);
                self.capturing = handled;
                handled
            }
            InputEvent::MouseMove(mouse) => {
                let Some(local) = self.local_position(&mouse.ray) else {
                    return false;
                };
                if self.capturing {
                    self.sub_tool_mut().left_mouse_move(grid, local, mouse.modifiers);
                }
                true
            }
            InputEvent::MouseUp(MouseButton::Left, _) => {
                if !self.capturing {
                    return false;
                }
                self.capturing = false;
                self.sub_tool_mut().left_mouse_up(queue)
            }
            InputEvent::MouseScroll(mouse) => {
                self.sub_tool_mut()
                    .mouse_scroll(grid, mouse.scroll, mouse.modifiers)
            }
            _ => false,
        }
    }
}
