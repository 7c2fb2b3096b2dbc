//! Pickable gizmo shapes
//!
//! Squares, arrows and rings. Each shape hit-tests the mouse ray during the
//! hover ray test, may adjust the drag axis right before a drag starts, and
//! (for rings) turns raw drag movement into rotation.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use ze_core::{Camera, ViewportMouseEvent};

use crate::collision::{ray_capsule_intersection, ray_rectangle_intersection, ray_ring_intersection};
use crate::events::{GizmoUpdateEvent, RingGizmoEvent};
use crate::gizmo::GizmoId;
use crate::ray_test::GizmoRayTest;

/// World placement of a gizmo, as seen by its shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoPlacement {
    /// World translation
    pub translation: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// World translation of the parent gizmo, if there is one
    pub parent_translation: Option<Vec3>,
}

impl GizmoPlacement {
    /// Placement of a root gizmo
    pub fn root(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            parent_translation: None,
        }
    }
}

/// Settings shared by every shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeCommon {
    /// Whether the shape takes part in hover tests
    pub mouse_input: bool,
    /// Higher priority wins hover regardless of distance
    pub picking_priority: i32,
    /// Keep a constant on-screen size
    pub view_scaled: bool,
    /// Scale offsets from the parent gizmo rather than from the shape itself
    pub use_parent_as_view_scale_origin: bool,
}

impl Default for ShapeCommon {
    fn default() -> Self {
        Self {
            mouse_input: true,
            picking_priority: 0,
            view_scaled: true,
            use_parent_as_view_scale_origin: false,
        }
    }
}

impl ShapeCommon {
    /// View scale and the scaled world center for a placement
    fn scaled_center(&self, placement: &GizmoPlacement, camera: &Camera) -> (f32, Vec3) {
        let center = placement.translation;
        let pivot = if self.use_parent_as_view_scale_origin {
            placement.parent_translation.unwrap_or(center)
        } else {
            center
        };
        let view_scale = if self.view_scaled {
            camera.view_scale(pivot)
        } else {
            1.0
        };
        (view_scale, pivot + (center - pivot) * view_scale)
    }
}

/// Flat rectangle, used for plane and view-plane handles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquareGizmo {
    /// Settings shared by all shapes
    pub common: ShapeCommon,
    /// Edge lengths in local X and Y
    pub size: Vec2,
    /// Billboard the square towards the camera
    pub view_aligned: bool,
}

impl Default for SquareGizmo {
    fn default() -> Self {
        Self {
            common: ShapeCommon::default(),
            size: Vec2::splat(0.4),
            view_aligned: true,
        }
    }
}

impl SquareGizmo {
    fn ray_test(&self, gizmo: GizmoId, placement: &GizmoPlacement, test: &mut GizmoRayTest) {
        let (view_scale, center) = self.common.scaled_center(placement, &test.camera);

        let (right, up) = if self.view_aligned {
            let forward = test.camera.eye_direction();
            let right = forward.cross(test.camera.up).normalize_or_zero();
            (right, right.cross(forward).normalize_or_zero())
        } else {
            (placement.rotation * Vec3::X, placement.rotation * Vec3::Y)
        };

        if let Some(t) = ray_rectangle_intersection(
            test.ray.origin,
            test.ray.direction,
            center,
            right,
            up,
            self.size * 0.5 * view_scale,
        ) {
            test.register_result(gizmo, t, self.common.picking_priority);
        }
    }
}

/// Shaft with a head, used for single-axis handles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowGizmo {
    /// Settings shared by all shapes
    pub common: ShapeCommon,
    /// Local direction the arrow points in
    pub direction: Vec3,
    /// Length from the gizmo origin to the tip
    pub length: f32,
    /// Pick radius around the shaft
    pub select_radius: f32,
}

impl Default for ArrowGizmo {
    fn default() -> Self {
        Self {
            common: ShapeCommon::default(),
            direction: Vec3::X,
            length: 2.8,
            select_radius: 0.25,
        }
    }
}

impl ArrowGizmo {
    /// World direction of the arrow
    pub fn world_direction(&self, placement: &GizmoPlacement) -> Vec3 {
        (placement.rotation * self.direction).normalize_or_zero()
    }

    fn ray_test(&self, gizmo: GizmoId, placement: &GizmoPlacement, test: &mut GizmoRayTest) {
        let start = placement.translation;
        let view_scale = if self.common.view_scaled {
            test.camera.view_scale(start)
        } else {
            1.0
        };
        let end = start + self.world_direction(placement) * self.length * view_scale;

        if let Some(t) = ray_capsule_intersection(
            test.ray.origin,
            test.ray.direction,
            start,
            end,
            self.select_radius * view_scale,
        ) {
            test.register_result(gizmo, t, self.common.picking_priority);
        }
    }
}

/// Circle around an axis, used for rotation handles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingGizmo {
    /// Settings shared by all shapes
    pub common: ShapeCommon,
    /// Local axis the ring turns around
    pub axis: Vec3,
    /// Radius of the circle
    pub radius: f32,
    /// Pick distance from the ring's circle
    pub select_radius: f32,
    /// Radians of rotation per pixel dragged along the ring's tangent
    pub drag_radians_per_pixel: f32,
    /// Face the ring towards the camera
    pub view_aligned: bool,
    #[serde(skip)]
    pub(crate) grab: RingGrab,
}

/// Where a ring was grabbed and how the current drag has progressed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RingGrab {
    grab_point: Vec3,
    grab_move_axis: Vec3,
    hit_axis: Vec3,
    world_rotation_axis: Vec3,
    mouse_drag_start: Vec2,
    previous_mouse: Vec2,
    radians_around_axis: f32,
}

impl Default for RingGizmo {
    fn default() -> Self {
        Self {
            common: ShapeCommon::default(),
            axis: Vec3::Z,
            radius: 1.0,
            select_radius: 0.25,
            drag_radians_per_pixel: 0.01,
            view_aligned: false,
            grab: RingGrab::default(),
        }
    }
}

impl RingGizmo {
    /// Point on the ring picked by the last successful hover test
    pub fn grab_point(&self) -> Vec3 {
        self.grab.grab_point
    }

    /// Tangent of the ring at the grab point
    pub fn grab_move_axis(&self) -> Vec3 {
        self.grab.grab_move_axis
    }

    /// Rotation since the drag started
    pub fn radians_around_axis(&self) -> f32 {
        self.grab.radians_around_axis
    }

    fn world_axis(&self, placement: &GizmoPlacement, center: Vec3, camera: &Camera) -> Vec3 {
        if self.view_aligned {
            (camera.position - center).normalize_or_zero()
        } else {
            (placement.rotation * self.axis).normalize_or_zero()
        }
    }

    fn ray_test(&mut self, gizmo: GizmoId, placement: &GizmoPlacement, test: &mut GizmoRayTest) {
        let (view_scale, center) = self.common.scaled_center(placement, &test.camera);
        let radius = self.radius * view_scale;
        let axis = self.world_axis(placement, center, &test.camera);

        let Some(t) = ray_ring_intersection(
            test.ray.origin,
            test.ray.direction,
            center,
            axis,
            radius,
            self.select_radius * view_scale,
        ) else {
            return;
        };
        test.register_result(gizmo, t, self.common.picking_priority);

        // Snap the hit onto the ring's circle
        let radial = (test.ray.at(t) - center).normalize_or_zero();
        self.grab.grab_point = center + radial * radius;
        self.grab.grab_move_axis = axis.cross(radial).normalize_or_zero();
        self.grab.hit_axis = axis;
    }

    fn pre_drag(&mut self, mouse: &ViewportMouseEvent) -> Vec3 {
        self.grab.mouse_drag_start = mouse.position;
        self.grab.previous_mouse = mouse.position;
        self.grab.world_rotation_axis = self.grab.hit_axis;
        self.grab.radians_around_axis = 0.0;
        self.grab.grab_move_axis
    }

    /// Turn drag movement into rotation around the ring's axis.
    ///
    /// The ring's tangent at the grab point is projected to the screen and
    /// the mouse travel along it, in pixels, is scaled by
    /// `drag_radians_per_pixel`. Returns `None` if the tangent cannot be
    /// projected this frame.
    pub fn on_gizmo_modified(&mut self, update: &GizmoUpdateEvent) -> Option<RingGizmoEvent> {
        let camera = &update.mouse.camera;
        let on_screen0 = camera.world_to_screen(self.grab.grab_point)?;
        let on_screen1 =
            camera.world_to_screen(self.grab.grab_point + self.grab.grab_move_axis * 0.01)?;
        let screen_dir = (on_screen1 - on_screen0).normalize_or_zero();
        if screen_dir == Vec2::ZERO {
            tracing::trace!("Ring tangent is edge-on to the camera");
            return None;
        }

        let position = update.mouse.position;
        let radians = (position - self.grab.mouse_drag_start).dot(screen_dir)
            * self.drag_radians_per_pixel;
        let delta = (position - self.grab.previous_mouse).dot(screen_dir) * self.drag_radians_per_pixel;
        self.grab.previous_mouse = position;
        self.grab.radians_around_axis = radians;

        let axis = self.grab.world_rotation_axis;
        Some(RingGizmoEvent {
            update: *update,
            world_rotation: Quat::from_axis_angle(axis, radians),
            world_rotation_axis: axis,
            radians_around_axis: radians,
            delta_radians_around_axis: delta,
        })
    }

    /// Prepare a grab as if the hover test had hit `grab_point`.
    #[cfg(test)]
    pub(crate) fn set_grab(&mut self, grab_point: Vec3, center: Vec3, axis: Vec3) {
        let radial = (grab_point - center).normalize_or_zero();
        self.grab.grab_point = grab_point;
        self.grab.grab_move_axis = axis.cross(radial).normalize_or_zero();
        self.grab.hit_axis = axis;
    }
}

/// The shape of a pickable gizmo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GizmoShape {
    Square(SquareGizmo),
    Arrow(ArrowGizmo),
    Ring(RingGizmo),
}

impl GizmoShape {
    /// Settings shared by every shape
    pub fn common(&self) -> &ShapeCommon {
        match self {
            GizmoShape::Square(square) => &square.common,
            GizmoShape::Arrow(arrow) => &arrow.common,
            GizmoShape::Ring(ring) => &ring.common,
        }
    }

    /// Hit-test the ray and register a result on a hit
    pub fn ray_test(&mut self, gizmo: GizmoId, placement: &GizmoPlacement, test: &mut GizmoRayTest) {
        if !self.common().mouse_input {
            return;
        }
        match self {
            GizmoShape::Square(square) => square.ray_test(gizmo, placement, test),
            GizmoShape::Arrow(arrow) => arrow.ray_test(gizmo, placement, test),
            GizmoShape::Ring(ring) => ring.ray_test(gizmo, placement, test),
        }
    }

    /// Called right before a drag starts. Returns the world line the drag
    /// should follow instead of the drag component's own axis.
    pub fn pre_drag(&mut self, placement: &GizmoPlacement, mouse: &ViewportMouseEvent) -> Option<Vec3> {
        match self {
            GizmoShape::Square(_) => None,
            GizmoShape::Arrow(arrow) => Some(arrow.world_direction(placement)),
            GizmoShape::Ring(ring) => Some(ring.pre_drag(mouse)),
        }
    }

    /// Refine a drag update into a shape-specific event
    pub fn on_gizmo_modified(&mut self, update: &GizmoUpdateEvent) -> Option<RingGizmoEvent> {
        match self {
            GizmoShape::Ring(ring) => ring.on_gizmo_modified(update),
            GizmoShape::Square(_) | GizmoShape::Arrow(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::{DragMovement, GizmoDragMode};
    use approx::assert_relative_eq;
    use ze_core::Handle;

    fn camera() -> Camera {
        Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec2::new(800.0, 600.0))
    }

    fn id(index: u32) -> GizmoId {
        Handle::from_raw_parts(index, 0)
    }

    fn unscaled() -> ShapeCommon {
        ShapeCommon {
            view_scaled: false,
            ..ShapeCommon::default()
        }
    }

    fn ray_test_at(world: Vec3) -> GizmoRayTest {
        let cam = camera();
        let screen = cam.world_to_screen(world).unwrap();
        GizmoRayTest::new(&ViewportMouseEvent::at(cam, screen))
    }

    fn update_at(mouse: ViewportMouseEvent) -> GizmoUpdateEvent {
        GizmoUpdateEvent {
            gizmo: id(0),
            mouse,
            drag: DragMovement {
                drag_mode: GizmoDragMode::Line,
                initial_grab_point: Vec3::ZERO,
                constrained_world_movement: Vec3::ZERO,
                constrained_world_delta: Vec3::ZERO,
                mouse_world_movement: Vec3::ZERO,
                mouse_world_delta: Vec3::ZERO,
            },
        }
    }

    #[test]
    fn test_arrow_hit_along_shaft() {
        let mut shape = GizmoShape::Arrow(ArrowGizmo {
            common: unscaled(),
            length: 2.0,
            ..ArrowGizmo::default()
        });
        let placement = GizmoPlacement::root(Vec3::ZERO, Quat::IDENTITY);

        let mut hit = ray_test_at(Vec3::new(1.5, 0.0, 0.0));
        shape.ray_test(id(1), &placement, &mut hit);
        assert_eq!(hit.winner(), Some(id(1)));

        let mut miss = ray_test_at(Vec3::new(3.0, 0.0, 0.0));
        shape.ray_test(id(1), &placement, &mut miss);
        assert!(miss.winner().is_none());
    }

    #[test]
    fn test_arrow_follows_rotation() {
        let arrow = ArrowGizmo::default();
        let placement = GizmoPlacement::root(
            Vec3::ZERO,
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        );
        let dir = arrow.world_direction(&placement);
        assert!((dir - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_square_hit_test() {
        let mut shape = GizmoShape::Square(SquareGizmo {
            common: unscaled(),
            size: Vec2::splat(1.0),
            view_aligned: false,
        });
        let placement = GizmoPlacement::root(Vec3::new(1.0, 1.0, 0.0), Quat::IDENTITY);

        let mut hit = ray_test_at(Vec3::new(1.4, 0.7, 0.0));
        shape.ray_test(id(2), &placement, &mut hit);
        assert_eq!(hit.winner(), Some(id(2)));

        let mut miss = ray_test_at(Vec3::new(1.6, 1.0, 0.0));
        shape.ray_test(id(2), &placement, &mut miss);
        assert!(miss.winner().is_none());
    }

    #[test]
    fn test_disabled_mouse_input_never_hits() {
        let mut shape = GizmoShape::Square(SquareGizmo {
            common: ShapeCommon {
                mouse_input: false,
                ..unscaled()
            },
            ..SquareGizmo::default()
        });
        let mut test = ray_test_at(Vec3::ZERO);
        shape.ray_test(id(0), &GizmoPlacement::root(Vec3::ZERO, Quat::IDENTITY), &mut test);
        assert!(test.winner().is_none());
    }

    #[test]
    fn test_ring_hit_records_grab_tangent() {
        let mut ring = RingGizmo {
            common: unscaled(),
            ..RingGizmo::default()
        };
        let mut test = ray_test_at(Vec3::new(1.0, 0.0, 0.0));
        ring.ray_test(id(3), &GizmoPlacement::root(Vec3::ZERO, Quat::IDENTITY), &mut test);

        assert_eq!(test.winner(), Some(id(3)));
        assert!((ring.grab_point() - Vec3::X).length() < 1e-3);
        assert!((ring.grab_move_axis() - Vec3::Y).length() < 1e-3);
    }

    #[test]
    fn test_ring_rotation_from_pixels() {
        let cam = camera();
        let mut ring = RingGizmo {
            common: unscaled(),
            drag_radians_per_pixel: 0.01,
            ..RingGizmo::default()
        };
        ring.set_grab(Vec3::X, Vec3::ZERO, Vec3::Z);

        let start_screen = cam.world_to_screen(Vec3::X).unwrap();
        let start = ViewportMouseEvent::at(cam, start_screen);
        let line = ring.pre_drag(&start);
        assert!((line - Vec3::Y).length() < 1e-5);

        // Move 100 pixels along the ring's on-screen tangent
        let tangent_screen = cam.world_to_screen(Vec3::X + Vec3::Y * 0.01).unwrap();
        let screen_dir = (tangent_screen - start_screen).normalize();
        let halfway = ViewportMouseEvent::at(cam, start_screen + screen_dir * 40.0);
        let end = ViewportMouseEvent::at(cam, start_screen + screen_dir * 100.0);

        ring.on_gizmo_modified(&update_at(halfway)).unwrap();
        let event = ring.on_gizmo_modified(&update_at(end)).unwrap();

        assert_relative_eq!(event.radians_around_axis, 1.0, epsilon = 1e-3);
        assert_relative_eq!(event.delta_radians_around_axis, 0.6, epsilon = 1e-3);
        assert_relative_eq!(ring.radians_around_axis(), 1.0, epsilon = 1e-3);
        assert!((event.world_rotation_axis - Vec3::Z).length() < 1e-5);
    }
}
