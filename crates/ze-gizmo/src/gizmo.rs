//! Gizmo nodes
//!
//! A gizmo is a node in a [`GizmoSpace`](crate::GizmoSpace) tree. It has a
//! local placement relative to its parent and optional parts: a pickable
//! shape, a drag component, a manipulator and an object transform gizmo.

use glam::{Quat, Vec3};
use ze_core::{EntityId, Handle};

use crate::components::Manipulator;
use crate::drag::GizmoDrag;
use crate::object::ObjectTransformGizmo;
use crate::shapes::GizmoShape;

/// Handle to a gizmo inside a [`GizmoSpace`](crate::GizmoSpace)
pub type GizmoId = Handle<Gizmo>;

/// A node in the gizmo tree
#[derive(Debug, Clone)]
pub struct Gizmo {
    /// Display name, used in logs
    pub name: String,
    /// Translation relative to the parent gizmo
    pub translation: Vec3,
    /// Rotation relative to the parent gizmo
    pub rotation: Quat,
    /// Pass drag events on to the parent gizmo
    pub forward_events: bool,
    /// Pickable geometry
    pub shape: Option<GizmoShape>,
    /// Turns mouse input into drag movement
    pub drag: Option<GizmoDrag>,
    /// Turns drag movement into translation, scale or rotation
    pub manipulator: Option<Manipulator>,
    /// Applies the manipulator output to scene objects
    pub object_gizmo: Option<ObjectTransformGizmo>,
    pub(crate) active: bool,
    pub(crate) mouse_over: bool,
    pub(crate) parent: Option<GizmoId>,
    pub(crate) children: Vec<GizmoId>,
    pub(crate) target: Option<EntityId>,
}

impl Gizmo {
    /// An active root gizmo with no parts
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            forward_events: true,
            shape: None,
            drag: None,
            manipulator: None,
            object_gizmo: None,
            active: true,
            mouse_over: false,
            parent: None,
            children: Vec::new(),
            target: None,
        }
    }

    /// Set the translation relative to the parent
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Set the rotation relative to the parent
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Give the gizmo a pickable shape
    pub fn with_shape(mut self, shape: GizmoShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Make the gizmo draggable
    pub fn with_drag(mut self, drag: GizmoDrag) -> Self {
        self.drag = Some(drag);
        self
    }

    /// Add a manipulator
    pub fn with_manipulator(mut self, manipulator: Manipulator) -> Self {
        self.manipulator = Some(manipulator);
        self
    }

    /// Let the gizmo edit scene objects
    pub fn with_object_gizmo(mut self, object_gizmo: ObjectTransformGizmo) -> Self {
        self.object_gizmo = Some(object_gizmo);
        self
    }

    /// Whether the gizmo takes part in hover tests and input
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the mouse is over this gizmo
    pub fn is_mouse_over(&self) -> bool {
        self.mouse_over
    }

    /// Parent gizmo, `None` for roots
    pub fn parent(&self) -> Option<GizmoId> {
        self.parent
    }

    /// Child gizmos in creation order
    pub fn children(&self) -> &[GizmoId] {
        &self.children
    }

    /// Scene object the gizmo is attached to
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Whether a drag on this gizmo is in progress
    pub fn drag_active(&self) -> bool {
        self.drag.as_ref().is_some_and(GizmoDrag::drag_active)
    }
}
