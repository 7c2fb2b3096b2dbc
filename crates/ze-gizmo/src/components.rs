//! Translate, scale and rotate manipulators
//!
//! A manipulator sits on a gizmo and turns raw drag updates (or ring
//! rotation) into translation, scale or rotation events. Object transform
//! gizmos on the same node consume those events and apply them to the
//! selected objects.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use ze_core::Modifiers;

use crate::drag::GizmoDragMode;
use crate::drag_math::{
    get_drag_axis, movement_direction, movement_to_uniform_signed_local_scale,
    scale_vector, single_axis_to_off_axes_scale,
};
use crate::events::{
    GizmoUpdateEvent, RingGizmoEvent, RotateGizmoUpdateEvent, ScaleGizmoUpdateEvent,
    TranslateGizmoUpdateEvent,
};
use crate::object::GizmoBasis;
use crate::snapping::{GizmoSnapMode, get_snapped_position, snap};

/// Whether snapping applies for this update. Shift inverts the setting.
pub fn snapping_active(snapping: bool, modifiers: Modifiers) -> bool {
    snapping != modifiers.shift
}

/// Which gizmo a [`TranslateGizmo`] moves while dragging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateMode {
    /// Leave every gizmo where it is
    None,
    /// Move the gizmo carrying the component
    #[default]
    TranslateSelf,
    /// Move the topmost ancestor of the gizmo carrying the component
    TranslateRoot,
}

/// Turns drag movement into (optionally snapped) translation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateGizmo {
    /// Which gizmo the translation moves
    pub update_mode: UpdateMode,
    /// Snap the translation
    pub snapping: bool,
    /// Grid the snapped translation lands on
    pub snap_mode: GizmoSnapMode,
    /// Snap increment in world units
    pub snap_distance: f32,
    #[serde(skip)]
    pub(crate) start_position: Vec3,
}

impl Default for TranslateGizmo {
    fn default() -> Self {
        Self {
            update_mode: UpdateMode::TranslateSelf,
            snapping: false,
            snap_mode: GizmoSnapMode::default(),
            snap_distance: 0.25,
            start_position: Vec3::ZERO,
        }
    }
}

impl TranslateGizmo {
    /// World position of the moved gizmo when the drag started
    pub fn start_position(&self) -> Vec3 {
        self.start_position
    }

    /// Record the world position of the gizmo this component moves
    pub fn on_drag_start(&mut self, world_translation: Vec3) {
        self.start_position = world_translation;
    }

    /// Position after moving `start` by `movement`, snapped if snapping is
    /// active for `modifiers`.
    pub fn translate_from_drag(
        &self,
        drag_mode: GizmoDragMode,
        start: Vec3,
        movement: Vec3,
        bases: Quat,
        modifiers: Modifiers,
    ) -> Vec3 {
        if snapping_active(self.snapping, modifiers) {
            get_snapped_position(start, movement, bases, drag_mode, self.snap_mode, self.snap_distance)
        } else {
            start + movement
        }
    }

    /// New world position for the moved gizmo and the translation event.
    ///
    /// `bases` is the moved gizmo's world rotation, used for relative
    /// plane snapping.
    pub fn on_gizmo_modified(
        &self,
        update: &GizmoUpdateEvent,
        bases: Quat,
    ) -> (Vec3, TranslateGizmoUpdateEvent) {
        let new_position = self.translate_from_drag(
            update.drag.drag_mode,
            self.start_position,
            update.drag.constrained_world_movement,
            bases,
            update.mouse.modifiers,
        );
        let event = TranslateGizmoUpdateEvent {
            update: *update,
            gizmo_world_translation: new_position - self.start_position,
        };
        (new_position, event)
    }
}

/// Turns drag movement into a scale change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleGizmo {
    /// Snap the scale
    pub snapping: bool,
    /// Grid the snapped scale lands on
    pub snap_mode: GizmoSnapMode,
    /// Snap increment of the scale
    pub snap_distance: f32,
    #[serde(skip)]
    pub(crate) eye_direction: Vec3,
    #[serde(skip)]
    pub(crate) direction: Vec3,
    #[serde(skip)]
    pub(crate) change_in_scale: Vec3,
    #[serde(skip)]
    pub(crate) view_plane_move: f32,
}

impl Default for ScaleGizmo {
    fn default() -> Self {
        Self {
            snapping: false,
            snap_mode: GizmoSnapMode::default(),
            snap_distance: 1.0,
            eye_direction: Vec3::NEG_Z,
            direction: Vec3::ZERO,
            change_in_scale: Vec3::ZERO,
            view_plane_move: 0.0,
        }
    }
}

impl ScaleGizmo {
    /// Sign of the scale change per axis for the latest update
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Drag movement scaled by the grab distance, for the latest update
    pub fn change_in_scale(&self) -> Vec3 {
        self.change_in_scale
    }

    /// Record the camera direction used by view-plane drags
    pub fn on_drag_start(&mut self, eye_direction: Vec3) {
        self.eye_direction = eye_direction;
    }

    /// Compute the scale change for one update.
    ///
    /// The speed of scaling depends on how far from the gizmo's center the
    /// handle was grabbed. View-plane drags scale up towards the top right
    /// of the screen and down towards the bottom left.
    pub fn on_gizmo_modified(
        &mut self,
        update: &GizmoUpdateEvent,
        gizmo_translation: Vec3,
        gizmo_rotation: Quat,
    ) -> ScaleGizmoUpdateEvent {
        let movement = update.drag.constrained_world_movement;
        let distance = (update.drag.initial_grab_point - gizmo_translation).length();
        self.view_plane_move = 0.0;

        if update.drag.drag_mode == GizmoDragMode::ViewPlane {
            let side = Vec3::Y.cross(self.eye_direction);
            let screen_up = side.cross(self.eye_direction);
            self.view_plane_move = -(side.dot(movement) + screen_up.dot(movement)) * distance;

            let sign = if self.view_plane_move >= 0.0 { 1.0 } else { -1.0 };
            self.direction = Vec3::splat(sign);
            self.change_in_scale =
                scale_vector(Vec3::splat(self.view_plane_move), distance, Vec3::ONE);
        } else {
            let bases = Mat3::from_quat(gizmo_rotation);
            self.direction = movement_direction(movement, bases);
            let local = bases.transpose() * movement;
            self.change_in_scale = scale_vector(local, distance, Vec3::ONE);
        }

        let new_scale = self.scale_from_drag(
            GizmoBasis::Local,
            update.drag.drag_mode,
            distance,
            movement,
            Vec3::ONE,
            gizmo_rotation,
            update.mouse.modifiers,
        );
        ScaleGizmoUpdateEvent {
            update: *update,
            gizmo_world_scale: new_scale - Vec3::ONE,
        }
    }

    /// New scale for an object that started at `start_scale`.
    ///
    /// Must follow [`ScaleGizmo::on_gizmo_modified`] for the same update,
    /// which computes the drag direction. Ctrl on a line drag scales every
    /// axis except the dragged one.
    #[allow(clippy::too_many_arguments)]
    pub fn scale_from_drag(
        &self,
        basis: GizmoBasis,
        drag_mode: GizmoDragMode,
        distance: f32,
        movement: Vec3,
        start_scale: Vec3,
        world_rotation: Quat,
        modifiers: Modifiers,
    ) -> Vec3 {
        let single_axis = drag_mode == GizmoDragMode::Line;
        let off_axes = single_axis && modifiers.ctrl;

        let new_scale = match drag_mode {
            GizmoDragMode::ViewPlane => {
                scale_vector(Vec3::splat(self.view_plane_move), distance, start_scale)
            }
            GizmoDragMode::Line => {
                if self.direction == Vec3::ZERO {
                    return start_scale;
                }
                let world_to_local = world_rotation.inverse();
                let axis = get_drag_axis(self.direction);
                let sign = Vec3::splat(self.direction[axis]);

                let mut local = movement;
                // World axes have to be picked before rotating into local space
                if basis == GizmoBasis::World && off_axes {
                    local = single_axis_to_off_axes_scale(axis, local);
                }
                local = movement_to_uniform_signed_local_scale(sign, local, world_to_local);
                if basis == GizmoBasis::Local && off_axes {
                    local = single_axis_to_off_axes_scale(axis, local);
                }
                scale_vector(local, distance, start_scale)
            }
            GizmoDragMode::Plane => {
                let world_to_local = world_rotation.inverse();
                let local = match basis {
                    GizmoBasis::Local => movement_to_uniform_signed_local_scale(
                        self.direction,
                        movement,
                        world_to_local,
                    ),
                    GizmoBasis::World => (0..3)
                        .filter(|&axis| self.direction[axis] != 0.0)
                        .map(|axis| {
                            let mut v = Vec3::ZERO;
                            v[axis] = movement[axis];
                            movement_to_uniform_signed_local_scale(
                                Vec3::splat(self.direction[axis]),
                                v,
                                world_to_local,
                            )
                        })
                        .sum(),
                };
                scale_vector(local, distance, start_scale)
            }
        };

        if !snapping_active(self.snapping, modifiers) {
            return new_scale;
        }
        // Off-axis scaling snaps each remaining axis on its own
        let snap_drag_mode = if off_axes {
            GizmoDragMode::Plane
        } else {
            drag_mode
        };
        get_snapped_position(
            start_scale,
            new_scale - start_scale,
            Quat::IDENTITY,
            snap_drag_mode,
            self.snap_mode,
            self.snap_distance,
        )
    }
}

/// Turns ring rotation into (optionally snapped) rotation steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateGizmo {
    /// Snap the rotation to `snap_angle` steps
    pub snapping: bool,
    /// Snap increment in degrees
    pub snap_angle: f32,
    #[serde(skip)]
    pub(crate) previous_snap: f32,
}

impl Default for RotateGizmo {
    fn default() -> Self {
        Self {
            snapping: false,
            snap_angle: 15.0,
            previous_snap: 0.0,
        }
    }
}

impl RotateGizmo {
    /// Reset snapping progress
    pub fn on_drag_start(&mut self) {
        self.previous_snap = 0.0;
    }

    /// Rotation step for a ring update.
    ///
    /// With snapping active the accumulated angle is rounded to
    /// `snap_angle` and a step is only produced when the snapped angle
    /// changes; the step is the signed difference to the last snapped
    /// angle. Returns `None` when there is nothing to rotate.
    pub fn on_ring_modified(&mut self, ring: &RingGizmoEvent) -> Option<RotateGizmoUpdateEvent> {
        let mut delta = ring.delta_radians_around_axis;

        if snapping_active(self.snapping, ring.update.mouse.modifiers) {
            let rotation = snap(ring.radians_around_axis, self.snap_angle.to_radians());
            let step = rotation - self.previous_snap;
            self.previous_snap = rotation;
            if step.abs() <= f32::EPSILON {
                return None;
            }
            delta = step;
        }

        Some(RotateGizmoUpdateEvent {
            update: ring.update,
            gizmo_rotation: delta,
            gizmo_world_rotation_axis: ring.world_rotation_axis,
        })
    }
}

/// The manipulator carried by a gizmo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Manipulator {
    /// Moves gizmos and objects
    Translate(TranslateGizmo),
    /// Scales objects
    Scale(ScaleGizmo),
    /// Rotates gizmos and objects
    Rotate(RotateGizmo),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DragMovement;
    use approx::assert_relative_eq;
    use glam::Vec2;
    use ze_core::{Camera, Handle, ViewportMouseEvent};

    fn update(drag_mode: GizmoDragMode, grab: Vec3, movement: Vec3, modifiers: Modifiers) -> GizmoUpdateEvent {
        let camera = Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec2::new(800.0, 600.0));
        GizmoUpdateEvent {
            gizmo: Handle::from_raw_parts(0, 0),
            mouse: ViewportMouseEvent::at(camera, Vec2::new(400.0, 300.0)).with_modifiers(modifiers),
            drag: DragMovement {
                drag_mode,
                initial_grab_point: grab,
                constrained_world_movement: movement,
                constrained_world_delta: movement,
                mouse_world_movement: movement,
                mouse_world_delta: movement,
            },
        }
    }

    fn ring(radians: f32, delta: f32, modifiers: Modifiers) -> RingGizmoEvent {
        RingGizmoEvent {
            update: update(GizmoDragMode::Line, Vec3::X, Vec3::ZERO, modifiers),
            world_rotation: Quat::from_rotation_z(radians),
            world_rotation_axis: Vec3::Z,
            radians_around_axis: radians,
            delta_radians_around_axis: delta,
        }
    }

    #[test]
    fn test_shift_inverts_snapping() {
        assert!(!snapping_active(false, Modifiers::NONE));
        assert!(snapping_active(false, Modifiers::SHIFT));
        assert!(snapping_active(true, Modifiers::NONE));
        assert!(!snapping_active(true, Modifiers::SHIFT));
    }

    #[test]
    fn test_translate_unsnapped() {
        let mut gizmo = TranslateGizmo::default();
        gizmo.on_drag_start(Vec3::new(1.0, 0.0, 0.0));

        let event = update(GizmoDragMode::Line, Vec3::ZERO, Vec3::new(0.3, 0.0, 0.0), Modifiers::NONE);
        let (position, translated) = gizmo.on_gizmo_modified(&event, Quat::IDENTITY);
        assert_relative_eq!(position.x, 1.3);
        assert_relative_eq!(translated.gizmo_world_translation.x, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_translate_snaps_with_shift() {
        let mut gizmo = TranslateGizmo::default();
        gizmo.on_drag_start(Vec3::ZERO);

        let event = update(GizmoDragMode::Line, Vec3::ZERO, Vec3::new(0.3, 0.0, 0.0), Modifiers::SHIFT);
        let (position, translated) = gizmo.on_gizmo_modified(&event, Quat::IDENTITY);
        assert_relative_eq!(position.x, 0.25);
        assert_relative_eq!(translated.gizmo_world_translation.x, 0.25);
    }

    #[test]
    fn test_scale_line_drag() {
        let mut gizmo = ScaleGizmo::default();
        let event = update(GizmoDragMode::Line, Vec3::X, Vec3::X, Modifiers::NONE);
        let scaled = gizmo.on_gizmo_modified(&event, Vec3::ZERO, Quat::IDENTITY);

        assert_eq!(gizmo.direction(), Vec3::X);
        assert_relative_eq!(scaled.gizmo_world_scale.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(scaled.gizmo_world_scale.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(scaled.gizmo_world_scale.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_scale_ctrl_scales_off_axes() {
        let mut gizmo = ScaleGizmo::default();
        let event = update(GizmoDragMode::Line, Vec3::X, Vec3::X, Modifiers::CTRL);
        gizmo.on_gizmo_modified(&event, Vec3::ZERO, Quat::IDENTITY);

        for basis in [GizmoBasis::Local, GizmoBasis::World] {
            let scale = gizmo.scale_from_drag(
                basis,
                GizmoDragMode::Line,
                1.0,
                Vec3::X,
                Vec3::ONE,
                Quat::IDENTITY,
                Modifiers::CTRL,
            );
            assert_relative_eq!(scale.x, 1.0, epsilon = 1e-6);
            assert_relative_eq!(scale.y, 2.0, epsilon = 1e-6);
            assert_relative_eq!(scale.z, 2.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_scale_shrinks_when_dragged_inwards() {
        let mut gizmo = ScaleGizmo::default();
        let event = update(GizmoDragMode::Line, Vec3::new(2.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), Modifiers::NONE);
        gizmo.on_gizmo_modified(&event, Vec3::ZERO, Quat::IDENTITY);

        let scale = gizmo.scale_from_drag(
            GizmoBasis::World,
            GizmoDragMode::Line,
            2.0,
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::splat(4.0),
            Quat::IDENTITY,
            Modifiers::NONE,
        );
        assert_relative_eq!(scale.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(scale.y, 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_scale_without_movement_keeps_start() {
        let mut gizmo = ScaleGizmo::default();
        let event = update(GizmoDragMode::Line, Vec3::X, Vec3::ZERO, Modifiers::NONE);
        gizmo.on_gizmo_modified(&event, Vec3::ZERO, Quat::IDENTITY);

        let start = Vec3::new(1.0, 2.0, 3.0);
        let scale = gizmo.scale_from_drag(
            GizmoBasis::Local,
            GizmoDragMode::Line,
            1.0,
            Vec3::ZERO,
            start,
            Quat::IDENTITY,
            Modifiers::NONE,
        );
        assert_eq!(scale, start);
    }

    #[test]
    fn test_scale_snapping() {
        let mut gizmo = ScaleGizmo {
            snapping: true,
            ..ScaleGizmo::default()
        };
        let event = update(GizmoDragMode::Line, Vec3::X, Vec3::new(0.8, 0.0, 0.0), Modifiers::NONE);
        let scaled = gizmo.on_gizmo_modified(&event, Vec3::ZERO, Quat::IDENTITY);
        assert_relative_eq!(scaled.gizmo_world_scale.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotate_passes_delta_through() {
        let mut gizmo = RotateGizmo::default();
        gizmo.on_drag_start();
        let event = gizmo.on_ring_modified(&ring(0.3, 0.1, Modifiers::NONE)).unwrap();
        assert_relative_eq!(event.gizmo_rotation, 0.1);
        assert_eq!(event.gizmo_world_rotation_axis, Vec3::Z);
    }

    #[test]
    fn test_rotate_snapping_only_emits_on_change() {
        let mut gizmo = RotateGizmo {
            snapping: true,
            ..RotateGizmo::default()
        };
        gizmo.on_drag_start();
        let step = 15f32.to_radians();

        // Still inside the first snap bucket
        assert!(gizmo.on_ring_modified(&ring(0.1, 0.1, Modifiers::NONE)).is_none());

        let first = gizmo.on_ring_modified(&ring(0.2, 0.1, Modifiers::NONE)).unwrap();
        assert_relative_eq!(first.gizmo_rotation, step, epsilon = 1e-6);

        assert!(gizmo.on_ring_modified(&ring(0.3, 0.1, Modifiers::NONE)).is_none());

        let back = gizmo.on_ring_modified(&ring(-0.2, -0.5, Modifiers::NONE)).unwrap();
        assert_relative_eq!(back.gizmo_rotation, -2.0 * step, epsilon = 1e-6);
    }
}
