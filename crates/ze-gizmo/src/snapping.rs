//! Grid snapping for gizmo output.
//!
//! All snapping reduces to `round(value / distance) * distance`. A distance
//! of zero or less disables snapping and returns the value untouched.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::drag::GizmoDragMode;
use crate::drag_math::GIZMO_EPSILON;

/// How translation and scale output is quantized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GizmoSnapMode {
    /// Snap the distance moved since the drag began
    Relative,
    /// Snap the resulting position, only on axes that moved
    #[default]
    WorldAxes,
    /// Snap the resulting position on every axis
    WorldGrid,
}

/// Round `value` to the nearest multiple of `distance`
pub fn snap(value: f32, distance: f32) -> f32 {
    if distance <= 0.0 {
        return value;
    }
    (value / distance).round() * distance
}

/// [`snap`] applied per component
pub fn snap_vec3(value: Vec3, distance: f32) -> Vec3 {
    Vec3::new(
        snap(value.x, distance),
        snap(value.y, distance),
        snap(value.z, distance),
    )
}

/// Snap only the components that moved more than [`GIZMO_EPSILON`].
fn snap_moved_axes(start: Vec3, movement: Vec3, distance: f32) -> Vec3 {
    let mut result = start + movement;
    for i in 0..3 {
        if movement[i].abs() > GIZMO_EPSILON {
            result[i] = snap(result[i], distance);
        }
    }
    result
}

/// Snap the length of a movement, keeping its direction
fn snap_length(movement: Vec3, distance: f32) -> Vec3 {
    let length = snap(movement.length(), distance);
    movement.normalize_or_zero() * length
}

/// Position after applying `world_movement` to `current_position`, snapped.
///
/// `bases` orients the per-axis snapping of relative plane drags.
pub fn get_snapped_position(
    current_position: Vec3,
    world_movement: Vec3,
    bases: Quat,
    drag_mode: GizmoDragMode,
    snap_mode: GizmoSnapMode,
    snap_distance: f32,
) -> Vec3 {
    if snap_distance <= 0.0 {
        return current_position + world_movement;
    }

    match snap_mode {
        GizmoSnapMode::Relative => {
            let movement = match drag_mode {
                GizmoDragMode::Line => snap_length(world_movement, snap_distance),
                GizmoDragMode::Plane | GizmoDragMode::ViewPlane => {
                    let m = Mat3::from_quat(bases);
                    (0..3)
                        .map(|i| {
                            let axis = m.col(i).normalize_or_zero();
                            axis * snap(axis.dot(world_movement), snap_distance)
                        })
                        .sum()
                }
            };
            current_position + movement
        }
        GizmoSnapMode::WorldAxes => {
            snap_moved_axes(current_position, world_movement, snap_distance)
        }
        GizmoSnapMode::WorldGrid => snap_vec3(current_position + world_movement, snap_distance),
    }
}

/// Scale after applying `movement` to `start_scale`, snapped.
pub fn get_snapped_scale(
    start_scale: Vec3,
    movement: Vec3,
    snap_mode: GizmoSnapMode,
    snap_distance: f32,
    drag_mode: GizmoDragMode,
) -> Vec3 {
    if snap_distance <= 0.0 {
        return start_scale + movement;
    }

    match snap_mode {
        GizmoSnapMode::Relative => {
            let movement = match drag_mode {
                GizmoDragMode::Line => snap_length(movement, snap_distance),
                GizmoDragMode::Plane | GizmoDragMode::ViewPlane => {
                    snap_vec3(movement, snap_distance)
                }
            };
            start_scale + movement
        }
        GizmoSnapMode::WorldAxes => snap_moved_axes(start_scale, movement, snap_distance),
        GizmoSnapMode::WorldGrid => snap_vec3(start_scale + movement, snap_distance),
    }
}

/// Snap `end` to world axes, only where it differs from `start`.
pub fn get_snapped_vector_world_axes(start: Vec3, end: Vec3, snap_distance: f32) -> Vec3 {
    snap_moved_axes(start, end - start, snap_distance)
}
