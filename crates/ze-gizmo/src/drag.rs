//! Mouse-to-world drag tracking
//!
//! A [`GizmoDrag`] turns a stream of viewport mouse events into constrained
//! world movement. At drag start it picks a drag plane (and, for line drags,
//! a line inside that plane) from the gizmo's orientation and the camera;
//! every later mouse event is re-projected onto that geometry.
//!
//! # State machine
//!
//! ```text
//! Idle --mouse down (auto drag)--> PendingAutoDrag --moved past threshold--> Dragging
//!  ^                                     |                                      |
//!  +------------- mouse up / exit -------+------------ mouse up / cancel -------+
//! ```

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use ze_core::math::{Plane, closest_point_on_line};
use ze_core::ViewportMouseEvent;

use crate::drag_math::get_drag_axis;

/// Geometric constraint a drag is projected onto
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GizmoDragMode {
    /// Along a single axis
    #[default]
    Line,
    /// On a plane given by a normal
    Plane,
    /// On the camera-facing plane through the gizmo
    ViewPlane,
}

/// How the mouse button controls a drag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GizmoGrabMode {
    /// Drag while the button is held
    #[default]
    Hold,
    /// Click to pick up, click again to drop
    Toggle,
}

/// Geometry and progress of an active drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveDrag {
    /// World point grabbed when the drag started, on the drag geometry
    pub initial_grab_point: Vec3,
    /// Plane every mouse ray is intersected with
    pub drag_plane: Plane,
    /// World line for [`GizmoDragMode::Line`] drags
    pub line_direction: Option<Vec3>,
    /// Camera direction at drag start
    pub eye_direction: Vec3,
    initial_mouse_point: Vec3,
    previous_point: Vec3,
    previous_mouse_point: Vec3,
    release_armed: bool,
}

/// Drag state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    /// No button is held
    #[default]
    Idle,
    /// Mouse is down and waiting to move far enough to start dragging
    PendingAutoDrag {
        /// The mouse-down that armed the drag
        mouse_down: ViewportMouseEvent,
    },
    /// A drag is running
    Dragging(ActiveDrag),
}

/// World movement produced by one mouse event during a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragMovement {
    /// Constraint the movement was projected with
    pub drag_mode: GizmoDragMode,
    /// World point grabbed when the drag started
    pub initial_grab_point: Vec3,
    /// Projected point minus the initial grab point
    pub constrained_world_movement: Vec3,
    /// Projected point minus last event's projected point
    pub constrained_world_delta: Vec3,
    /// Unconstrained drag-plane hit minus the initial hit
    pub mouse_world_movement: Vec3,
    /// Unconstrained drag-plane hit minus last event's hit
    pub mouse_world_delta: Vec3,
}

/// Result of a mouse-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragRelease {
    /// Nothing was in progress
    Ignored,
    /// A pending drag never started
    PendingCleared,
    /// Toggle mode swallowed the release of the starting click
    Continue,
    /// The drag is over
    Ended,
}

/// Pick the drag plane normal for a line drag.
///
/// Both candidates contain the line. The one facing the camera more
/// directly gives the most stable projection; exact ties keep the first.
pub fn get_line_drag_plane(candidates: [Vec3; 2], eye_direction: Vec3) -> Vec3 {
    let first = candidates[0].dot(eye_direction).abs();
    let second = candidates[1].dot(eye_direction).abs();
    if second > first {
        candidates[1]
    } else {
        candidates[0]
    }
}

/// Per-gizmo drag component
#[derive(Debug, Clone, PartialEq)]
pub struct GizmoDrag {
    /// Whether this component reacts to mouse input at all
    pub mouse_input: bool,
    /// Constraint applied to the mouse movement
    pub drag_mode: GizmoDragMode,
    /// How a press turns into a drag
    pub grab_mode: GizmoGrabMode,
    /// Local axis used by [`GizmoDragMode::Line`]
    pub line_direction: Vec3,
    /// Normal used by [`GizmoDragMode::Plane`]
    pub plane_normal: Vec3,
    /// `plane_normal` is in world space rather than local space
    pub normal_in_world: bool,
    /// Start dragging automatically once the mouse moves after a press
    pub auto_drag: bool,
    /// Pixels the mouse must travel before an auto drag starts
    pub drag_distance: f32,
    pub(crate) state: DragState,
}

impl Default for GizmoDrag {
    fn default() -> Self {
        Self {
            mouse_input: true,
            drag_mode: GizmoDragMode::Line,
            grab_mode: GizmoGrabMode::Hold,
            line_direction: Vec3::X,
            plane_normal: Vec3::Z,
            normal_in_world: false,
            auto_drag: true,
            drag_distance: 0.0,
            state: DragState::Idle,
        }
    }
}

impl GizmoDrag {
    /// Line drag along a local axis
    pub fn line(direction: Vec3) -> Self {
        Self {
            drag_mode: GizmoDragMode::Line,
            line_direction: direction,
            ..Self::default()
        }
    }

    /// Plane drag with a local normal
    pub fn plane(normal: Vec3) -> Self {
        Self {
            drag_mode: GizmoDragMode::Plane,
            plane_normal: normal,
            ..Self::default()
        }
    }

    /// Camera-facing plane drag
    pub fn view_plane() -> Self {
        Self {
            drag_mode: GizmoDragMode::ViewPlane,
            ..Self::default()
        }
    }

    /// Current state
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Whether a drag is in progress
    pub fn drag_active(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Whether a mouse-down is waiting to become a drag
    pub fn is_pending(&self) -> bool {
        matches!(self.state, DragState::PendingAutoDrag { .. })
    }

    /// Point grabbed at drag start
    pub fn grab_point(&self) -> Option<Vec3> {
        match &self.state {
            DragState::Dragging(active) => Some(active.initial_grab_point),
            _ => None,
        }
    }

    /// Camera direction recorded at drag start
    pub fn eye_direction(&self) -> Option<Vec3> {
        match &self.state {
            DragState::Dragging(active) => Some(active.eye_direction),
            _ => None,
        }
    }

    /// Arm an auto drag. Returns true if the press was taken.
    pub fn on_mouse_down(&mut self, event: &ViewportMouseEvent) -> bool {
        if !self.mouse_input || self.drag_active() {
            return false;
        }
        if self.auto_drag {
            self.state = DragState::PendingAutoDrag { mouse_down: *event };
            return true;
        }
        false
    }

    /// The armed mouse-down, once `event` has moved far enough from it to
    /// start the drag.
    pub fn pending_start(&self, event: &ViewportMouseEvent) -> Option<ViewportMouseEvent> {
        match &self.state {
            DragState::PendingAutoDrag { mouse_down }
                if mouse_down.position.distance(event.position) >= self.drag_distance =>
            {
                Some(*mouse_down)
            }
            _ => None,
        }
    }

    /// Start dragging.
    ///
    /// `origin`/`rotation` are the gizmo's world placement. `world_line`
    /// overrides the line axis for shapes that supply their own (arrows and
    /// rings). Returns the initial grab point, or `None` when the mouse ray
    /// cannot hit the drag geometry; the drag then stays idle.
    pub fn start_drag(
        &mut self,
        event: &ViewportMouseEvent,
        origin: Vec3,
        rotation: Quat,
        world_line: Option<Vec3>,
    ) -> Option<Vec3> {
        let eye_direction = event.camera.eye_direction();

        let (normal, line_direction) = match self.drag_mode {
            GizmoDragMode::Line => {
                let line = world_line
                    .unwrap_or(rotation * self.line_direction)
                    .normalize_or_zero();
                if line == Vec3::ZERO {
                    self.state = DragState::Idle;
                    return None;
                }
                let candidates = line_plane_candidates(line, rotation);
                (get_line_drag_plane(candidates, eye_direction), Some(line))
            }
            GizmoDragMode::Plane => {
                let normal = if self.normal_in_world {
                    self.plane_normal
                } else {
                    rotation * self.plane_normal
                };
                (normal, None)
            }
            GizmoDragMode::ViewPlane => (-eye_direction, None),
        };

        let drag_plane = Plane::new(origin, normal);
        let Some(hit) = drag_plane.intersect_ray_point(&event.ray) else {
            tracing::trace!("Drag start ray is parallel to the drag plane");
            self.state = DragState::Idle;
            return None;
        };
        let grab = match line_direction {
            Some(line) => closest_point_on_line(origin, line, hit),
            None => hit,
        };

        self.state = DragState::Dragging(ActiveDrag {
            initial_grab_point: grab,
            drag_plane,
            line_direction,
            eye_direction,
            initial_mouse_point: hit,
            previous_point: grab,
            previous_mouse_point: hit,
            release_armed: self.grab_mode == GizmoGrabMode::Hold,
        });
        Some(grab)
    }

    /// Project a mouse event onto the drag geometry.
    ///
    /// Returns `None` outside a drag or when the ray is parallel to the drag
    /// plane; that frame simply produces no movement.
    pub fn update(&mut self, event: &ViewportMouseEvent) -> Option<DragMovement> {
        let drag_mode = self.drag_mode;
        let DragState::Dragging(active) = &mut self.state else {
            return None;
        };

        let Some(hit) = active.drag_plane.intersect_ray_point(&event.ray) else {
            tracing::trace!("Skipping drag update, ray is parallel to the drag plane");
            return None;
        };
        let point = match active.line_direction {
            Some(line) => closest_point_on_line(active.initial_grab_point, line, hit),
            None => hit,
        };

        let movement = DragMovement {
            drag_mode,
            initial_grab_point: active.initial_grab_point,
            constrained_world_movement: point - active.initial_grab_point,
            constrained_world_delta: point - active.previous_point,
            mouse_world_movement: hit - active.initial_mouse_point,
            mouse_world_delta: hit - active.previous_mouse_point,
        };
        active.previous_point = point;
        active.previous_mouse_point = hit;
        Some(movement)
    }

    /// Handle a mouse release
    pub fn on_mouse_up(&mut self) -> DragRelease {
        match &mut self.state {
            DragState::Idle => DragRelease::Ignored,
            DragState::PendingAutoDrag { .. } => {
                self.state = DragState::Idle;
                DragRelease::PendingCleared
            }
            DragState::Dragging(active) => {
                if !active.release_armed {
                    active.release_armed = true;
                    return DragRelease::Continue;
                }
                self.state = DragState::Idle;
                DragRelease::Ended
            }
        }
    }

    /// The mouse left the gizmo's hit area.
    ///
    /// Hold mode forgets a pending press; a started drag always continues.
    pub fn on_mouse_exit(&mut self) {
        if self.grab_mode == GizmoGrabMode::Hold && self.is_pending() {
            self.state = DragState::Idle;
        }
    }

    /// Drop any drag state. Returns true if a drag was active.
    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.drag_active();
        self.state = DragState::Idle;
        was_dragging
    }
}

/// Two plane normals that contain `line`, taken from the gizmo axes that are
/// not the line's own axis.
fn line_plane_candidates(line: Vec3, rotation: Quat) -> [Vec3; 2] {
    let local_line = rotation.inverse() * line;
    let axis = get_drag_axis(local_line);
    let others = [(axis + 1) % 3, (axis + 2) % 3];

    others.map(|i| {
        let mut basis = Vec3::ZERO;
        basis[i] = 1.0;
        let world = rotation * basis;
        let normal = (world - line * world.dot(line)).normalize_or_zero();
        if normal == Vec3::ZERO {
            line.any_orthonormal_vector()
        } else {
            normal
        }
    })
}
