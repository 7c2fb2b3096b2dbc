//! Axis selection and scale conversion helpers.
//!
//! Pure functions shared by the scale and translate components.

use glam::{Mat3, Quat, Vec3};

/// Movements at or below this magnitude count as "no movement".
pub const GIZMO_EPSILON: f32 = 0.0001;

/// Index of the component with the largest absolute value.
///
/// Exact ties go to the earlier axis, so the zero vector yields `0` (X).
pub fn get_drag_axis(local_movement: Vec3) -> usize {
    let abs = local_movement.abs();
    let mut axis = 0;
    for i in 1..3 {
        if abs[i] > abs[axis] {
            axis = i;
        }
    }
    axis
}

/// Movement with the dominant axis zeroed out
pub fn off_axis_movement(local_movement: Vec3) -> Vec3 {
    let mut v = local_movement;
    v[get_drag_axis(local_movement)] = 0.0;
    v
}

/// Moves the dragged axis' amount onto the two other axes.
///
/// Used when Ctrl-dragging a single scale handle, which scales everything
/// except the handle's own axis.
pub fn single_axis_to_off_axes_scale(drag_axis: usize, movement: Vec3) -> Vec3 {
    let mut off_axis = Vec3::ONE;
    off_axis[drag_axis] = 0.0;
    off_axis * movement[drag_axis]
}

/// Sign of the movement along each basis axis: `1`, `-1`, or `0` where the
/// movement along that axis is negligible.
pub fn movement_direction(movement: Vec3, bases: Mat3) -> Vec3 {
    let mut direction = Vec3::ZERO;
    for axis in 0..3 {
        let basis = bases.col(axis).normalize_or_zero();
        let amount = basis.dot(movement);
        if amount.abs() > GIZMO_EPSILON {
            direction[axis] = if amount >= 0.0 { 1.0 } else { -1.0 };
        }
    }
    direction
}

/// World movement brought into local space, with every component given
/// the sign from `scale_direction`.
///
/// Mixed-sign scale changes are not allowed: a drag either grows or shrinks
/// on all affected axes.
pub fn movement_to_uniform_signed_local_scale(
    scale_direction: Vec3,
    world_movement: Vec3,
    world_to_local: Quat,
) -> Vec3 {
    (world_to_local * world_movement).abs() * scale_direction
}

/// New scale for one axis.
///
/// The drag is measured relative to how far from the pivot the handle was
/// grabbed, so grabbing far out scales slowly and grabbing close in scales
/// quickly.
pub fn process_scale(movement: f32, start_distance: f32, starting: f32) -> f32 {
    if start_distance.abs() <= f32::EPSILON {
        return starting.abs();
    }
    (starting + (movement / start_distance) * starting).abs()
}

/// [`process_scale`] applied per component
pub fn scale_vector(delta: Vec3, distance: f32, start: Vec3) -> Vec3 {
    Vec3::new(
        process_scale(delta.x, distance, start.x),
        process_scale(delta.y, distance, start.y),
        process_scale(delta.z, distance, start.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_drag_axis_dominant_component() {
        assert_eq!(get_drag_axis(Vec3::new(3.0, 1.0, 1.0)), 0);
        assert_eq!(get_drag_axis(Vec3::new(1.0, 3.0, 1.0)), 1);
        assert_eq!(get_drag_axis(Vec3::new(1.0, -1.0, -4.0)), 2);
    }

    #[test]
    fn test_drag_axis_zero_and_ties() {
        assert_eq!(get_drag_axis(Vec3::ZERO), 0);
        assert_eq!(get_drag_axis(Vec3::new(0.0, 2.0, -2.0)), 1);
        assert_eq!(get_drag_axis(Vec3::splat(1.0)), 0);
    }

    #[test]
    fn test_off_axis_movement() {
        let v = off_axis_movement(Vec3::new(0.5, 4.0, -1.0));
        assert_eq!(v, Vec3::new(0.5, 0.0, -1.0));
    }

    #[test]
    fn test_single_axis_to_off_axes() {
        let v = single_axis_to_off_axes_scale(1, Vec3::new(0.2, 2.0, 0.1));
        assert_eq!(v, Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn test_movement_direction_signs() {
        let dir = movement_direction(Vec3::new(1.0, -2.0, 0.00001), Mat3::IDENTITY);
        assert_eq!(dir, Vec3::new(1.0, -1.0, 0.0));
    }

    #[test]
    fn test_uniform_signed_scale() {
        let v = movement_to_uniform_signed_local_scale(
            Vec3::splat(-1.0),
            Vec3::new(1.0, -2.0, 0.0),
            Quat::IDENTITY,
        );
        assert_eq!(v, Vec3::new(-1.0, -2.0, -0.0));
    }

    #[test]
    fn test_process_scale() {
        // Dragging as far again as the grab distance doubles the scale
        assert_relative_eq!(process_scale(2.0, 2.0, 1.5), 3.0);
        // Scale never goes negative
        assert_relative_eq!(process_scale(-4.0, 2.0, 1.0), 1.0);
        assert_relative_eq!(process_scale(1.0, 0.0, 2.0), 2.0);
    }

    #[test]
    fn test_scale_vector() {
        let v = scale_vector(Vec3::new(1.0, 0.0, -0.5), 1.0, Vec3::ONE);
        assert_relative_eq!(v.x, 2.0);
        assert_relative_eq!(v.y, 1.0);
        assert_relative_eq!(v.z, 0.5);
    }
}
