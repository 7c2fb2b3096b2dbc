//! Events raised by gizmos.
//!
//! The update events form a chain: every drag produces a
//! [`GizmoUpdateEvent`], which the shape and manipulator components refine
//! into the more specific events below. Listeners receive all of them as
//! [`GizmoEvent`]s drained from the [`GizmoSpace`](crate::GizmoSpace).

use glam::{Quat, Vec3};
use ze_core::{EntityId, ViewportMouseEvent};

use crate::drag::DragMovement;
use crate::gizmo::GizmoId;

/// Raw drag movement of one gizmo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoUpdateEvent {
    /// The gizmo being dragged
    pub gizmo: GizmoId,
    /// Mouse event that produced the movement
    pub mouse: ViewportMouseEvent,
    /// Projected movement
    pub drag: DragMovement,
}

/// Translation produced by a [`TranslateGizmo`](crate::TranslateGizmo)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslateGizmoUpdateEvent {
    /// The drag update this was refined from
    pub update: GizmoUpdateEvent,
    /// Snapped world translation since drag start
    pub gizmo_world_translation: Vec3,
}

/// Scale produced by a [`ScaleGizmo`](crate::ScaleGizmo)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleGizmoUpdateEvent {
    /// The drag update this was refined from
    pub update: GizmoUpdateEvent,
    /// Change of a unit scale since drag start
    pub gizmo_world_scale: Vec3,
}

/// Rotation produced by a [`RotateGizmo`](crate::RotateGizmo)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateGizmoUpdateEvent {
    /// The drag update this was refined from
    pub update: GizmoUpdateEvent,
    /// Radians to rotate by this update
    pub gizmo_rotation: f32,
    /// World axis of the rotation
    pub gizmo_world_rotation_axis: Vec3,
}

/// Angular movement around a ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingGizmoEvent {
    /// The drag update this was refined from
    pub update: GizmoUpdateEvent,
    /// Rotation since drag start
    pub world_rotation: Quat,
    /// World axis of the ring
    pub world_rotation_axis: Vec3,
    /// Radians since drag start
    pub radians_around_axis: f32,
    /// Radians since the previous update
    pub delta_radians_around_axis: f32,
}

/// Which manipulator is changing an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectModification {
    /// A translate drag moved the object
    Translate,
    /// A scale drag resized the object or pushed it from the pivot
    Scale,
    /// A rotate drag turned the object or orbited it around the pivot
    Rotate,
}

/// Local transform one object is about to take during a drag.
///
/// Object transform gizmos hand this to their hook before writing the
/// object, so the hook may rewrite the `final_local_*` values. Only the
/// values the manipulator changes are read back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransformGizmoEvent {
    /// Manipulator behind the change
    pub kind: ObjectModification,
    /// Object being written
    pub object: EntityId,
    /// Translation relative to the object's parent
    pub final_local_translation: Vec3,
    /// Scale relative to the object's parent
    pub final_local_scale: Vec3,
    /// Rotation relative to the object's parent
    pub final_local_rotation: Quat,
}

/// Everything a [`GizmoSpace`](crate::GizmoSpace) reports to listeners
#[derive(Debug, Clone, PartialEq)]
pub enum GizmoEvent {
    /// Result of the hover ray test for a mouse move
    RayTest {
        /// Gizmo that won the test, if any
        winner: Option<GizmoId>,
    },
    /// The mouse moved onto a gizmo
    MouseEnter(GizmoId),
    /// The mouse left a gizmo
    MouseExit(GizmoId),
    /// Raised on the hovered gizmo and each of its ancestors
    MouseEnterHierarchy {
        /// Gizmo receiving the event
        gizmo: GizmoId,
        /// Gizmo under the mouse
        hovered: GizmoId,
    },
    /// Raised on the previously hovered gizmo and each of its ancestors
    MouseExitHierarchy {
        /// Gizmo receiving the event
        gizmo: GizmoId,
        /// Gizmo the mouse left
        hovered: GizmoId,
    },
    /// A gizmo was attached to, or detached from, a scene object
    TargetSet {
        /// Gizmo whose target changed
        gizmo: GizmoId,
        /// New target
        target: Option<EntityId>,
    },
    /// A drag is about to start; raised before any state is captured
    PreDrag(GizmoId),
    /// A drag started
    DragStart(GizmoId),
    /// A drag finished and its edits were committed
    DragEnd(GizmoId),
    /// The drag was abandoned and its edits reverted
    DragCancelled(GizmoId),
    /// Raw movement of the dragged gizmo
    Modified(GizmoUpdateEvent),
    /// Angular movement around a dragged ring
    RingModified(RingGizmoEvent),
    /// A translate manipulator produced a translation
    TranslateModified(TranslateGizmoUpdateEvent),
    /// A scale manipulator produced a scale change
    ScaleModified(ScaleGizmoUpdateEvent),
    /// A rotate manipulator produced a rotation step
    RotateModified(RotateGizmoUpdateEvent),
    /// Ctrl-drag cloned the selection; the gizmo now edits `objects`
    ObjectsDuplicated {
        /// Object transform gizmo that cloned the selection
        gizmo: GizmoId,
        /// The clones
        objects: Vec<EntityId>,
    },
    /// An object transform gizmo wrote one object's transform
    ObjectModified {
        /// Gizmo carrying the object transform gizmo
        gizmo: GizmoId,
        /// Transform written, after the hook ran
        event: ObjectTransformGizmoEvent,
    },
}

