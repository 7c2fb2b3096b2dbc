//! Multi-object transform gizmos
//!
//! An [`ObjectTransformGizmo`] edits a set of scene objects. When a drag
//! starts it captures an [`ObjectTransformState`] per object; every update
//! recomputes all objects from their captured state so the whole selection
//! moves in lock-step, and the drag end pushes one undo batch covering
//! every changed object.

use glam::{Mat3, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use ze_core::math::Aabb;
use ze_core::{EntityId, Modifiers, OperationQueue, TransformAccess};

use crate::components::{ScaleGizmo, TranslateGizmo};
use crate::error::GizmoError;
use crate::events::{
    ObjectModification, ObjectTransformGizmoEvent, RotateGizmoUpdateEvent, ScaleGizmoUpdateEvent,
    TranslateGizmoUpdateEvent,
};
use crate::operations::{CreateObjectOperation, TransformChange, TransformChangeOperation};

/// Objects this close to the pivot are not orbited or pushed by scaling
const PIVOT_DISTANCE_THRESHOLD: f32 = 0.001;

/// Radians a drag must turn an object before the rotation is recorded
const ROTATION_THRESHOLD: f32 = 1e-4;

/// Called for every object a drag update is about to write. It may
/// rewrite the final transform in the event.
pub type ObjectModifiedHook = dyn FnMut(&mut ObjectTransformGizmoEvent);

/// Where the gizmo sits relative to the selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GizmoPivot {
    /// Origin of the first selected object
    Primary,
    /// Center of the selection's combined bounds
    Center,
    /// Mean of the selected objects' origins
    #[default]
    Average,
}

/// Orientation of the gizmo's axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GizmoBasis {
    /// Rotation of the first selected object
    Local,
    /// World axes
    #[default]
    World,
}

/// What an object transform gizmo changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectGizmoKind {
    /// Moves the objects
    Translate {
        /// Ctrl at drag start clones the selection and drags the clones
        duplicate_on_ctrl_drag: bool,
    },
    /// Scales the objects
    Scale {
        /// Push objects away from the pivot when scaling several at once
        affect_translation: bool,
        /// Scale each object when scaling several at once
        affect_scale: bool,
    },
    /// Rotates the objects
    Rotate {
        /// Orbit objects around the pivot when rotating several at once
        affect_translation: bool,
        /// Rotate each object when rotating several at once
        affect_rotation: bool,
    },
}

/// Transform of one object captured at drag start, plus its latest values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransformState {
    /// Object the state belongs to
    pub target: EntityId,
    /// World translation at drag start
    pub start_world_translation: Vec3,
    /// Local translation at drag start
    pub start_translation: Vec3,
    /// Local rotation at drag start
    pub start_rotation: Quat,
    /// Local scale at drag start
    pub start_scale: Vec3,
    /// Size at drag start, zero for objects without one
    pub start_size: Vec2,
    /// Latest local translation written
    pub end_translation: Vec3,
    /// Latest local rotation written
    pub end_rotation: Quat,
    /// Latest local scale written
    pub end_scale: Vec3,
    /// Size the drag ended with
    pub end_size: Vec2,
}

impl ObjectTransformState {
    fn capture(world: &dyn TransformAccess, target: EntityId) -> Option<Self> {
        let local = world.local_transform(target)?;
        let size = world.size(target).unwrap_or(Vec2::ZERO);
        Some(Self {
            target,
            start_world_translation: world.world_translation(target)?,
            start_translation: local.translation,
            start_rotation: local.rotation,
            start_scale: local.scale,
            start_size: size,
            end_translation: local.translation,
            end_rotation: local.rotation,
            end_scale: local.scale,
            end_size: size,
        })
    }

    fn modified_event(&self, kind: ObjectModification) -> ObjectTransformGizmoEvent {
        ObjectTransformGizmoEvent {
            kind,
            object: self.target,
            final_local_translation: self.end_translation,
            final_local_scale: self.end_scale,
            final_local_rotation: self.end_rotation,
        }
    }

    fn restore(&self, world: &mut dyn TransformAccess) {
        world.set_local_translation(self.target, self.start_translation);
        world.set_local_rotation(self.target, self.start_rotation);
        world.set_local_scale(self.target, self.start_scale);
        if world.size(self.target).is_some() {
            world.set_size(self.target, self.start_size);
        }
    }
}

/// Applies translate, scale or rotate updates to a set of objects
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTransformGizmo {
    /// What the gizmo changes
    pub kind: ObjectGizmoKind,
    /// Where the gizmo sits relative to its objects
    pub pivot: GizmoPivot,
    /// Orientation of the gizmo axes
    pub basis: GizmoBasis,
    objects: Vec<EntityId>,
    states: Vec<ObjectTransformState>,
    new_objects: Vec<EntityId>,
    replaced_objects: Vec<EntityId>,
    dragging: bool,
}

impl ObjectTransformGizmo {
    /// An empty gizmo with average pivot and world axes
    pub fn new(kind: ObjectGizmoKind) -> Self {
        Self {
            kind,
            pivot: GizmoPivot::default(),
            basis: GizmoBasis::default(),
            objects: Vec::new(),
            states: Vec::new(),
            new_objects: Vec::new(),
            replaced_objects: Vec::new(),
            dragging: false,
        }
    }

    /// Translate gizmo that duplicates on Ctrl-drag
    pub fn translate() -> Self {
        Self::new(ObjectGizmoKind::Translate {
            duplicate_on_ctrl_drag: true,
        })
    }

    /// Scale gizmo affecting both scale and translation
    pub fn scale() -> Self {
        Self::new(ObjectGizmoKind::Scale {
            affect_translation: true,
            affect_scale: true,
        })
    }

    /// Rotate gizmo affecting both rotation and translation
    pub fn rotate() -> Self {
        Self::new(ObjectGizmoKind::Rotate {
            affect_translation: true,
            affect_rotation: true,
        })
    }

    /// Add an object to edit. Objects already present are ignored.
    pub fn add_object(&mut self, object: EntityId) {
        if !self.objects.contains(&object) {
            self.objects.push(object);
        }
    }

    /// Stop editing an object
    pub fn remove_object(&mut self, object: EntityId) {
        self.objects.retain(|&o| o != object);
    }

    /// Stop editing every object
    pub fn clear_objects(&mut self) {
        self.objects.clear();
    }

    /// Number of objects being edited
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Objects in selection order; the first is the primary
    pub fn objects(&self) -> &[EntityId] {
        &self.objects
    }

    /// The `index`th object being edited
    pub fn object_at(&self, index: usize) -> Result<EntityId, GizmoError> {
        self.objects
            .get(index)
            .copied()
            .ok_or(GizmoError::IndexOutOfRange {
                index,
                len: self.objects.len(),
            })
    }

    /// Captured state of the `index`th object being dragged
    pub fn object_state_at(&self, index: usize) -> Result<&ObjectTransformState, GizmoError> {
        self.states.get(index).ok_or(GizmoError::IndexOutOfRange {
            index,
            len: self.states.len(),
        })
    }

    /// States captured for the current or last drag
    pub fn states(&self) -> &[ObjectTransformState] {
        &self.states
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Switch between local and world axes
    pub fn toggle_coordinate_mode(&mut self) {
        self.basis = match self.basis {
            GizmoBasis::Local => GizmoBasis::World,
            GizmoBasis::World => GizmoBasis::Local,
        };
    }

    /// Objects no longer alive in `world`
    pub fn dead_objects(&self, world: &dyn TransformAccess) -> Vec<EntityId> {
        self.objects
            .iter()
            .copied()
            .filter(|&o| !world.is_alive(o))
            .collect()
    }

    /// Whether any object captured for the current drag has died
    pub fn drag_target_lost(&self, world: &dyn TransformAccess) -> bool {
        self.dragging && self.states.iter().any(|s| !world.is_alive(s.target))
    }

    /// World placement the gizmo should take for the current selection.
    ///
    /// `None` while dragging (the gizmo follows the drag instead) or when
    /// the primary object is gone.
    pub fn gizmo_basis(&self, world: &dyn TransformAccess) -> Option<(Vec3, Quat)> {
        if self.dragging {
            return None;
        }
        let primary = *self.objects.first()?;
        if !world.is_alive(primary) {
            return None;
        }

        let rotation = match self.basis {
            GizmoBasis::Local => world.world_rotation(primary).unwrap_or(Quat::IDENTITY),
            GizmoBasis::World => Quat::IDENTITY,
        };

        let center = match self.pivot {
            GizmoPivot::Primary => world.world_translation(primary)?,
            GizmoPivot::Center => {
                let bounds = self
                    .objects
                    .iter()
                    .filter_map(|&o| world.world_aabb(o))
                    .fold(Aabb::empty(), |acc, aabb| acc.union(&aabb));
                if bounds.is_empty() {
                    world.world_translation(primary)?
                } else {
                    bounds.center()
                }
            }
            GizmoPivot::Average => {
                let origins: Vec<Vec3> = self
                    .objects
                    .iter()
                    .filter_map(|&o| world.world_translation(o))
                    .collect();
                if origins.is_empty() {
                    Vec3::ZERO
                } else {
                    origins.iter().sum::<Vec3>() / origins.len() as f32
                }
            }
        };

        Some((center, rotation))
    }

    /// Capture the selection for a new drag.
    ///
    /// A translate gizmo with Ctrl held first clones every selected object
    /// and edits the clones instead; the clones are returned.
    pub fn on_drag_start(
        &mut self,
        world: &mut dyn TransformAccess,
        modifiers: Modifiers,
    ) -> Option<Vec<EntityId>> {
        self.states.clear();
        self.new_objects.clear();
        self.replaced_objects.clear();

        let duplicate = matches!(
            self.kind,
            ObjectGizmoKind::Translate {
                duplicate_on_ctrl_drag: true
            }
        ) && modifiers.ctrl;

        let duplicated = if duplicate {
            let clones: Vec<EntityId> = self
                .objects
                .iter()
                .filter_map(|&o| world.duplicate(o))
                .collect();
            tracing::debug!("Duplicated {} objects for Ctrl-drag", clones.len());
            self.replaced_objects = std::mem::replace(&mut self.objects, clones.clone());
            self.new_objects = clones.clone();
            Some(clones)
        } else {
            None
        };

        // Children move with their selected ancestors
        let roots: Vec<EntityId> = self
            .objects
            .iter()
            .copied()
            .filter(|&o| world.is_alive(o) && !world.has_ancestor_in(o, &self.objects))
            .collect();
        self.states = roots
            .into_iter()
            .filter_map(|o| ObjectTransformState::capture(world, o))
            .collect();

        self.dragging = true;
        duplicated
    }

    /// Apply a translation update.
    ///
    /// A single object takes the (already snapped) gizmo translation. With
    /// several objects each is snapped on its own in its parent's space.
    pub fn on_translate(
        &mut self,
        event: &TranslateGizmoUpdateEvent,
        translate: &TranslateGizmo,
        world: &mut dyn TransformAccess,
        hook: &mut dyn FnMut(&mut ObjectTransformGizmoEvent),
    ) -> Vec<ObjectTransformGizmoEvent> {
        let multi = self.states.len() > 1;
        let movement = if multi {
            event.update.drag.constrained_world_movement
        } else {
            event.gizmo_world_translation
        };

        let mut modified = Vec::with_capacity(self.states.len());
        for state in &mut self.states {
            if !world.is_alive(state.target) {
                continue;
            }
            let parent_inverse = world.parent_world_matrix(state.target).inverse();
            let local_movement = parent_inverse.transform_vector3(movement);

            let translation = if multi {
                translate.translate_from_drag(
                    event.update.drag.drag_mode,
                    state.start_translation,
                    local_movement,
                    state.start_rotation,
                    event.update.mouse.modifiers,
                )
            } else {
                state.start_translation + local_movement
            };
            let mut object_event = ObjectTransformGizmoEvent {
                final_local_translation: translation,
                ..state.modified_event(ObjectModification::Translate)
            };
            hook(&mut object_event);

            state.end_translation = object_event.final_local_translation;
            world.set_local_translation(state.target, state.end_translation);
            modified.push(object_event);
        }
        modified
    }

    /// Apply a scale update about the gizmo's pivot
    pub fn on_scale(
        &mut self,
        event: &ScaleGizmoUpdateEvent,
        scale: &ScaleGizmo,
        gizmo_translation: Vec3,
        gizmo_rotation: Quat,
        world: &mut dyn TransformAccess,
        hook: &mut dyn FnMut(&mut ObjectTransformGizmoEvent),
    ) -> Vec<ObjectTransformGizmoEvent> {
        let (affect_translation, affect_scale) = match self.kind {
            ObjectGizmoKind::Scale {
                affect_translation,
                affect_scale,
            } => (affect_translation, affect_scale),
            _ => (false, true),
        };
        let drag = &event.update.drag;
        let distance = (drag.initial_grab_point - gizmo_translation).length();
        let bases = Mat3::from_quat(gizmo_rotation);
        let multi = self.states.len() > 1;
        let writes_scale = affect_scale || !multi;
        let writes_translation = multi && affect_translation;

        let mut modified = Vec::with_capacity(self.states.len());
        for state in &mut self.states {
            let Some(object_rotation) = world.world_rotation(state.target) else {
                continue;
            };
            let new_scale = scale.scale_from_drag(
                self.basis,
                drag.drag_mode,
                distance,
                drag.constrained_world_movement,
                state.start_scale,
                object_rotation,
                event.update.mouse.modifiers,
            );

            let mut object_event = state.modified_event(ObjectModification::Scale);
            if writes_scale {
                object_event.final_local_scale = new_scale;
            }
            let offset = state.start_world_translation - gizmo_translation;
            let pushed = writes_translation && offset.length() > PIVOT_DISTANCE_THRESHOLD;
            if pushed {
                let ratio = new_scale / state.start_scale;
                let local_offset = (bases.transpose() * offset) * ratio;
                let new_world = gizmo_translation + bases * local_offset;
                let parent_inverse = world.parent_world_matrix(state.target).inverse();
                object_event.final_local_translation = parent_inverse.transform_point3(new_world);
            }
            hook(&mut object_event);

            if writes_scale {
                state.end_scale = object_event.final_local_scale;
                world.set_local_scale(state.target, state.end_scale);
            }
            if pushed {
                state.end_translation = object_event.final_local_translation;
                world.set_local_translation(state.target, state.end_translation);
            }
            modified.push(object_event);
        }
        modified
    }

    /// Apply a rotation step about the gizmo's pivot
    pub fn on_rotate(
        &mut self,
        event: &RotateGizmoUpdateEvent,
        gizmo_translation: Vec3,
        world: &mut dyn TransformAccess,
        hook: &mut dyn FnMut(&mut ObjectTransformGizmoEvent),
    ) -> Vec<ObjectTransformGizmoEvent> {
        let (affect_translation, affect_rotation) = match self.kind {
            ObjectGizmoKind::Rotate {
                affect_translation,
                affect_rotation,
            } => (affect_translation, affect_rotation),
            _ => (false, true),
        };
        let delta = event.gizmo_rotation;
        let axis = event.gizmo_world_rotation_axis;
        let multi = self.states.len() > 1;
        let writes_translation = multi && affect_translation;

        let mut modified = Vec::with_capacity(self.states.len());
        for state in &mut self.states {
            let (Some(local), Some(world_translation)) = (
                world.local_transform(state.target),
                world.world_translation(state.target),
            ) else {
                continue;
            };
            let parent_inverse = world.parent_world_matrix(state.target).inverse();
            let mut object_event = state.modified_event(ObjectModification::Rotate);

            let local_axis = parent_inverse.transform_vector3(axis).normalize_or_zero();
            let rotated = (affect_rotation || !multi) && local_axis != Vec3::ZERO;
            if rotated {
                object_event.final_local_rotation =
                    (Quat::from_axis_angle(local_axis, delta) * local.rotation).normalize();
            }
            let offset = world_translation - gizmo_translation;
            let orbited = writes_translation && offset.length() > PIVOT_DISTANCE_THRESHOLD;
            if orbited {
                let new_world = gizmo_translation + Quat::from_axis_angle(axis, delta) * offset;
                object_event.final_local_translation = parent_inverse.transform_point3(new_world);
            }
            hook(&mut object_event);

            if rotated {
                state.end_rotation = object_event.final_local_rotation;
                world.set_local_rotation(state.target, state.end_rotation);
            }
            if orbited {
                state.end_translation = object_event.final_local_translation;
                world.set_local_translation(state.target, state.end_translation);
            }
            modified.push(object_event);
        }
        modified
    }

    /// Record the size each object ends the drag with
    pub fn sync_sizes(&mut self, world: &dyn TransformAccess) {
        for state in &mut self.states {
            if let Some(size) = world.size(state.target) {
                state.end_size = size;
            }
        }
    }

    /// Finish the drag and queue one undo step for every changed object.
    ///
    /// Values are already applied, so the queued operations only record
    /// them. Nothing is queued when nothing changed.
    pub fn on_drag_end(
        &mut self,
        world: &mut dyn TransformAccess,
        queue: &mut OperationQueue<dyn TransformAccess>,
    ) {
        self.dragging = false;
        self.replaced_objects.clear();
        if self.states.is_empty() {
            self.new_objects.clear();
            return;
        }
        self.sync_sizes(world);

        queue.begin_batch();
        queue.set_active_batch_name("MultiTransform");

        let rotates = matches!(self.kind, ObjectGizmoKind::Rotate { .. });
        for state in &self.states {
            if !world.is_alive(state.target) {
                continue;
            }
            let name = world
                .name(state.target)
                .unwrap_or_else(|| "Object".to_string());

            if self.new_objects.contains(&state.target) {
                queue.set_active_batch_name(format!("Create {name}"));
                queue.queue(Box::new(CreateObjectOperation::new(
                    state.target,
                    format!("Create {name}"),
                )));
            }

            if state.start_translation.distance_squared(state.end_translation) > f32::EPSILON {
                let label = format!("Translate '{name}'");
                queue.queue(Box::new(TransformChangeOperation::new(
                    state.target,
                    TransformChange::Translation {
                        from: state.start_translation,
                        to: state.end_translation,
                    },
                    label.clone(),
                )));
                queue.set_active_batch_name(label);
            }

            if rotates && state.start_rotation.angle_between(state.end_rotation) > ROTATION_THRESHOLD {
                let label = format!("Rotate '{name}'");
                queue.queue(Box::new(TransformChangeOperation::new(
                    state.target,
                    TransformChange::Rotation {
                        from: state.start_rotation,
                        to: state.end_rotation,
                    },
                    label.clone(),
                )));
                queue.set_active_batch_name(label);
            }

            if state.start_scale.distance_squared(state.end_scale) > f32::EPSILON {
                let label = format!("Scale '{name}'");
                queue.queue(Box::new(TransformChangeOperation::new(
                    state.target,
                    TransformChange::Scale {
                        from: state.start_scale,
                        to: state.end_scale,
                    },
                    label.clone(),
                )));
                queue.set_active_batch_name(label);
            }

            if state.start_size != state.end_size {
                let label = format!("'{name}' size change");
                queue.queue(Box::new(TransformChangeOperation::new(
                    state.target,
                    TransformChange::Size {
                        from: state.start_size,
                        to: state.end_size,
                    },
                    label.clone(),
                )));
                queue.set_active_batch_name(label);
            }
        }

        let committed = queue.end_batch();
        tracing::debug!(
            "Committed transform of {} objects ({:?})",
            self.states.len(),
            committed
        );
        self.new_objects.clear();
    }

    /// Abandon the drag: restore every captured object and discard clones
    pub fn cancel(&mut self, world: &mut dyn TransformAccess) {
        if !self.dragging {
            return;
        }
        for state in &self.states {
            if world.is_alive(state.target) {
                state.restore(world);
            }
        }
        for &clone in &self.new_objects {
            world.set_detached(clone, true);
        }
        if !self.replaced_objects.is_empty() {
            self.objects = std::mem::take(&mut self.replaced_objects);
        }
        tracing::debug!("Cancelled transform of {} objects", self.states.len());
        self.new_objects.clear();
        self.states.clear();
        self.dragging = false;
    }
}
