//! Gizmo tree and input routing
//!
//! The [`GizmoSpace`] owns every gizmo in a viewport. Input is processed in
//! a fixed order: hover ray test, hover transitions, press/drag start, drag
//! update and finally dispatch of the update up the gizmo's ancestor chain,
//! where manipulators and object transform gizmos react to it.
//!
//! A pressed or dragged gizmo captures the mouse: hover tests pause until
//! the button is released so a fast drag never loses its handle.

use glam::{Quat, Vec3};
use ze_core::{
    Arena, EntityId, InputEvent, Key, MouseButton, OperationQueue, TransformAccess,
    ViewportMouseEvent,
};

use crate::components::{Manipulator, ScaleGizmo, TranslateGizmo, UpdateMode};
use crate::drag::DragRelease;
use crate::error::GizmoError;
use crate::events::{
    GizmoEvent, GizmoUpdateEvent, ObjectTransformGizmoEvent, RingGizmoEvent, RotateGizmoUpdateEvent,
    ScaleGizmoUpdateEvent, TranslateGizmoUpdateEvent,
};
use crate::gizmo::{Gizmo, GizmoId};
use crate::object::ObjectModifiedHook;
use crate::ray_test::GizmoRayTest;
use crate::shapes::GizmoPlacement;

/// Output of a manipulator, carried up to the object transform gizmo
enum ManipulatorOutput {
    Translate(TranslateGizmoUpdateEvent, TranslateGizmo),
    Scale(ScaleGizmoUpdateEvent, ScaleGizmo),
    Rotate(RotateGizmoUpdateEvent),
}

/// All gizmos of one viewport
#[derive(Default)]
pub struct GizmoSpace {
    gizmos: Arena<Gizmo>,
    roots: Vec<GizmoId>,
    mouse_over: Option<GizmoId>,
    pressed: Option<GizmoId>,
    dragging: Option<GizmoId>,
    events: Vec<GizmoEvent>,
    object_hook: Option<Box<ObjectModifiedHook>>,
}

impl std::fmt::Debug for GizmoSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GizmoSpace")
            .field("gizmos", &self.gizmos)
            .field("roots", &self.roots)
            .field("mouse_over", &self.mouse_over)
            .field("pressed", &self.pressed)
            .field("dragging", &self.dragging)
            .field("events", &self.events)
            .field("object_hook", &self.object_hook.is_some())
            .finish()
    }
}

impl GizmoSpace {
    /// An empty space
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of gizmos
    pub fn len(&self) -> usize {
        self.gizmos.len()
    }

    /// Whether the space holds no gizmos
    pub fn is_empty(&self) -> bool {
        self.gizmos.is_empty()
    }

    /// Look up a gizmo
    pub fn get(&self, id: GizmoId) -> Option<&Gizmo> {
        self.gizmos.get(id)
    }

    /// Look up a gizmo for editing
    pub fn get_mut(&mut self, id: GizmoId) -> Option<&mut Gizmo> {
        self.gizmos.get_mut(id)
    }

    /// Root gizmos in creation order
    pub fn roots(&self) -> &[GizmoId] {
        &self.roots
    }

    /// Gizmo currently under the mouse
    pub fn mouse_over(&self) -> Option<GizmoId> {
        self.mouse_over
    }

    /// Gizmo currently being dragged
    pub fn dragging(&self) -> Option<GizmoId> {
        self.dragging
    }

    /// Add a root gizmo
    pub fn create(&mut self, gizmo: Gizmo) -> GizmoId {
        let id = self.gizmos.insert(gizmo);
        if let Some(g) = self.gizmos.get_mut(id) {
            g.parent = None;
            g.children.clear();
        }
        self.roots.push(id);
        id
    }

    /// Add a gizmo under `parent`
    pub fn create_child(&mut self, parent: GizmoId, gizmo: Gizmo) -> Result<GizmoId, GizmoError> {
        if !self.gizmos.contains(parent) {
            return Err(GizmoError::UnknownGizmo(parent));
        }
        let id = self.create(gizmo);
        self.attach(id, parent)?;
        Ok(id)
    }

    /// Move `child` (with its subtree) under `parent`
    pub fn attach(&mut self, child: GizmoId, parent: GizmoId) -> Result<(), GizmoError> {
        for id in [child, parent] {
            if !self.gizmos.contains(id) {
                return Err(GizmoError::UnknownGizmo(id));
            }
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(GizmoError::HierarchyCycle { child, parent });
        }

        self.unlink(child);
        if let Some(p) = self.gizmos.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.gizmos.get_mut(child) {
            c.parent = Some(parent);
        }
        Ok(())
    }

    /// Make `child` a root gizmo
    pub fn detach(&mut self, child: GizmoId) -> Result<(), GizmoError> {
        if !self.gizmos.contains(child) {
            return Err(GizmoError::UnknownGizmo(child));
        }
        self.unlink(child);
        self.roots.push(child);
        Ok(())
    }

    /// Destroy a gizmo and its subtree. A drag inside the subtree is
    /// cancelled first.
    pub fn destroy(&mut self, id: GizmoId, world: &mut dyn TransformAccess) -> Result<(), GizmoError> {
        if !self.gizmos.contains(id) {
            return Err(GizmoError::UnknownGizmo(id));
        }
        if let Some(dragged) = self.dragging {
            if dragged == id || self.is_ancestor(id, dragged) {
                self.cancel_drag(world);
            }
        }

        self.unlink(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(gizmo) = self.gizmos.remove(current) {
                stack.extend(gizmo.children);
            }
            if self.mouse_over == Some(current) {
                self.mouse_over = None;
            }
            if self.pressed == Some(current) {
                self.pressed = None;
            }
        }
        tracing::debug!("Destroyed gizmo {:?}", id);
        Ok(())
    }

    /// Enable or disable a gizmo and its subtree. Disabling drops the
    /// hover and cancels any press or drag inside the subtree.
    pub fn set_active(
        &mut self,
        id: GizmoId,
        active: bool,
        world: &mut dyn TransformAccess,
    ) -> Result<(), GizmoError> {
        let gizmo = self.gizmos.get_mut(id).ok_or(GizmoError::UnknownGizmo(id))?;
        gizmo.active = active;
        if active {
            return Ok(());
        }

        let in_subtree = |space: &Self, other: Option<GizmoId>| {
            other.is_some_and(|other| other == id || space.is_ancestor(id, other))
        };
        if in_subtree(self, self.pressed) || in_subtree(self, self.dragging) {
            self.cancel_drag(world);
        }
        if in_subtree(self, self.mouse_over) {
            self.clear_hover();
        }
        Ok(())
    }

    /// Attach a gizmo to a scene object. Object transform gizmos start
    /// editing that object.
    pub fn set_target(&mut self, id: GizmoId, target: Option<EntityId>) -> Result<(), GizmoError> {
        let gizmo = self.gizmos.get_mut(id).ok_or(GizmoError::UnknownGizmo(id))?;
        gizmo.target = target;
        if let Some(object_gizmo) = gizmo.object_gizmo.as_mut() {
            object_gizmo.clear_objects();
            if let Some(target) = target {
                object_gizmo.add_object(target);
            }
        }
        self.events.push(GizmoEvent::TargetSet { gizmo: id, target });
        Ok(())
    }

    /// Install a hook that sees, and may rewrite, every object transform
    /// before an object transform gizmo writes it during a drag
    pub fn set_object_hook(&mut self, hook: impl FnMut(&mut ObjectTransformGizmoEvent) + 'static) {
        self.object_hook = Some(Box::new(hook));
    }

    /// Remove the hook installed by [`GizmoSpace::set_object_hook`]
    pub fn clear_object_hook(&mut self) {
        self.object_hook = None;
    }

    /// Take every event raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GizmoEvent> {
        std::mem::take(&mut self.events)
    }

    /// World placement of a gizmo
    pub fn world_placement(&self, id: GizmoId) -> Option<GizmoPlacement> {
        let gizmo = self.gizmos.get(id)?;
        match gizmo.parent {
            None => Some(GizmoPlacement::root(gizmo.translation, gizmo.rotation)),
            Some(parent) => {
                let parent = self.world_placement(parent)?;
                Some(GizmoPlacement {
                    translation: parent.translation + parent.rotation * gizmo.translation,
                    rotation: parent.rotation * gizmo.rotation,
                    parent_translation: Some(parent.translation),
                })
            }
        }
    }

    /// Move a gizmo to a world position
    pub fn set_world_translation(&mut self, id: GizmoId, translation: Vec3) {
        let parent = self.parent_placement(id);
        if let Some(gizmo) = self.gizmos.get_mut(id) {
            gizmo.translation = match parent {
                Some(p) => p.rotation.inverse() * (translation - p.translation),
                None => translation,
            };
        }
    }

    /// Turn a gizmo to a world rotation
    pub fn set_world_rotation(&mut self, id: GizmoId, rotation: Quat) {
        let parent = self.parent_placement(id);
        if let Some(gizmo) = self.gizmos.get_mut(id) {
            gizmo.rotation = match parent {
                Some(p) => p.rotation.inverse() * rotation,
                None => rotation,
            };
        }
    }

    /// Topmost ancestor of a gizmo
    pub fn find_root(&self, id: GizmoId) -> GizmoId {
        let mut current = id;
        while let Some(parent) = self.gizmos.get(current).and_then(|g| g.parent) {
            current = parent;
        }
        current
    }

    /// Route one input event.
    ///
    /// `world` is the object table edited by object transform gizmos and
    /// `queue` receives the undo batch when a drag ends.
    pub fn handle_input(
        &mut self,
        input: &InputEvent,
        world: &mut dyn TransformAccess,
        queue: &mut OperationQueue<dyn TransformAccess>,
    ) {
        match input {
            InputEvent::MouseMove(mouse) => {
                self.update_hover(mouse);

                if let Some(id) = self.pressed {
                    let down = self
                        .gizmos
                        .get(id)
                        .and_then(|g| g.drag.as_ref())
                        .and_then(|d| d.pending_start(mouse));
                    if let Some(down) = down {
                        self.pressed = None;
                        self.begin_drag(id, &down, world);
                    }
                }

                if let Some(id) = self.dragging {
                    self.update_drag(id, mouse, world);
                }
            }
            InputEvent::MouseDown(MouseButton::Left, mouse) => {
                if self.dragging.is_some() {
                    return;
                }
                self.update_hover(mouse);
                let Some(id) = self.mouse_over else {
                    return;
                };
                let taken = self
                    .gizmos
                    .get_mut(id)
                    .and_then(|g| g.drag.as_mut())
                    .is_some_and(|d| d.on_mouse_down(mouse));
                if taken {
                    self.pressed = Some(id);
                }
            }
            InputEvent::MouseUp(MouseButton::Left, _) => {
                if let Some(id) = self.pressed.take() {
                    if let Some(drag) = self.gizmos.get_mut(id).and_then(|g| g.drag.as_mut()) {
                        drag.on_mouse_up();
                    }
                }
                if let Some(id) = self.dragging {
                    let release = self
                        .gizmos
                        .get_mut(id)
                        .and_then(|g| g.drag.as_mut())
                        .map(|d| d.on_mouse_up());
                    match release {
                        Some(DragRelease::Ended) | None => self.end_drag(id, world, queue),
                        Some(_) => {}
                    }
                }
            }
            InputEvent::KeyDown(Key::Escape, _) => {
                self.cancel_drag(world);
            }
            _ => {}
        }
    }

    /// Start dragging a gizmo without a mouse press, for gizmos with auto
    /// drag turned off. Returns `Ok(false)` if another drag is running or
    /// the drag geometry cannot be hit.
    pub fn start_drag(
        &mut self,
        id: GizmoId,
        mouse: &ViewportMouseEvent,
        world: &mut dyn TransformAccess,
    ) -> Result<bool, GizmoError> {
        let gizmo = self.gizmos.get(id).ok_or(GizmoError::UnknownGizmo(id))?;
        if gizmo.drag.is_none() {
            return Err(GizmoError::NotDraggable(id));
        }
        if self.dragging.is_some() {
            return Ok(false);
        }
        Ok(self.begin_drag(id, mouse, world))
    }

    /// Abandon the current drag, restoring every edited object. Returns
    /// true if a drag was cancelled.
    pub fn cancel_drag(&mut self, world: &mut dyn TransformAccess) -> bool {
        if let Some(id) = self.pressed.take() {
            if let Some(drag) = self.gizmos.get_mut(id).and_then(|g| g.drag.as_mut()) {
                drag.cancel();
            }
        }
        let Some(id) = self.dragging.take() else {
            return false;
        };
        if let Some(drag) = self.gizmos.get_mut(id).and_then(|g| g.drag.as_mut()) {
            drag.cancel();
        }
        if let Some(owner) = self.object_gizmo_owner(id) {
            if let Some(object_gizmo) = self.gizmos.get_mut(owner).and_then(|g| g.object_gizmo.as_mut()) {
                object_gizmo.cancel(world);
            }
            self.refresh_basis(owner, world);
        }
        self.events.push(GizmoEvent::DragCancelled(id));
        tracing::debug!("Drag cancelled on gizmo {:?}", id);
        true
    }

    /// Per-frame upkeep.
    ///
    /// Cancels a drag whose objects died, destroys gizmos whose target
    /// died, drops dead objects from object transform gizmos and moves
    /// those gizmos to their selection.
    pub fn frame_update(&mut self, world: &mut dyn TransformAccess) {
        if let Some(id) = self.dragging {
            let lost = self.forward_chain(id).into_iter().any(|node| {
                self.gizmos.get(node).is_some_and(|g| {
                    g.target.is_some_and(|t| !world.is_alive(t))
                        || g.object_gizmo.as_ref().is_some_and(|o| o.drag_target_lost(world))
                })
            });
            if lost {
                tracing::debug!("Drag target destroyed, cancelling drag");
                self.cancel_drag(world);
            }
        }

        let orphaned: Vec<GizmoId> = self
            .gizmos
            .iter()
            .filter(|(_, g)| g.target.is_some_and(|t| !world.is_alive(t)))
            .map(|(id, _)| id)
            .collect();
        for id in orphaned {
            if self.gizmos.contains(id) && self.destroy(id, world).is_ok() {
                tracing::debug!("Destroyed gizmo {:?} with its target", id);
            }
        }

        for id in self.gizmos.handles() {
            if let Some(object_gizmo) = self.gizmos.get_mut(id).and_then(|g| g.object_gizmo.as_mut()) {
                if !object_gizmo.is_dragging() {
                    for dead in object_gizmo.dead_objects(world) {
                        object_gizmo.remove_object(dead);
                    }
                }
            }
            self.refresh_basis(id, world);
        }
    }

    fn parent_placement(&self, id: GizmoId) -> Option<GizmoPlacement> {
        let parent = self.gizmos.get(id)?.parent?;
        self.world_placement(parent)
    }

    /// True if `ancestor` is above `id` in the tree
    fn is_ancestor(&self, ancestor: GizmoId, id: GizmoId) -> bool {
        let mut current = self.gizmos.get(id).and_then(|g| g.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.gizmos.get(parent).and_then(|g| g.parent);
        }
        false
    }

    /// Remove a gizmo from its parent's children or from the roots
    fn unlink(&mut self, id: GizmoId) {
        let parent = self.gizmos.get_mut(id).and_then(|g| g.parent.take());
        match parent {
            Some(parent) => {
                if let Some(p) = self.gizmos.get_mut(parent) {
                    p.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }
    }

    /// The gizmo and the ancestors its events are forwarded to
    fn forward_chain(&self, id: GizmoId) -> Vec<GizmoId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(gizmo) = self.gizmos.get(current) {
            match gizmo.parent {
                Some(parent) if gizmo.forward_events => {
                    chain.push(parent);
                    current = parent;
                }
                _ => break,
            }
        }
        chain
    }

    fn self_and_ancestors(&self, id: GizmoId) -> Vec<GizmoId> {
        let mut out = vec![id];
        let mut current = self.gizmos.get(id).and_then(|g| g.parent);
        while let Some(parent) = current {
            out.push(parent);
            current = self.gizmos.get(parent).and_then(|g| g.parent);
        }
        out
    }

    /// First object transform gizmo on the forward chain
    fn object_gizmo_owner(&self, id: GizmoId) -> Option<GizmoId> {
        self.forward_chain(id)
            .into_iter()
            .find(|&node| self.gizmos.get(node).is_some_and(|g| g.object_gizmo.is_some()))
    }

    fn refresh_basis(&mut self, id: GizmoId, world: &dyn TransformAccess) {
        let basis = self
            .gizmos
            .get(id)
            .and_then(|g| g.object_gizmo.as_ref())
            .and_then(|o| o.gizmo_basis(world));
        if let Some((translation, rotation)) = basis {
            self.set_world_translation(id, translation);
            self.set_world_rotation(id, rotation);
        }
    }

    /// Hit-test every active gizmo, depth first from the roots
    fn ray_test(&mut self, mouse: &ViewportMouseEvent) -> Option<GizmoId> {
        let mut test = GizmoRayTest::new(mouse);
        let mut stack: Vec<GizmoId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let Some(gizmo) = self.gizmos.get(id) else {
                continue;
            };
            if !gizmo.active {
                continue;
            }
            stack.extend(gizmo.children.iter().rev().copied());
            if gizmo.shape.is_none() {
                continue;
            }
            let Some(placement) = self.world_placement(id) else {
                continue;
            };
            if let Some(shape) = self.gizmos.get_mut(id).and_then(|g| g.shape.as_mut()) {
                shape.ray_test(id, &placement, &mut test);
            }
        }

        let winner = test.winner();
        self.events.push(GizmoEvent::RayTest { winner });
        winner
    }

    fn update_hover(&mut self, mouse: &ViewportMouseEvent) {
        if self.pressed.is_some() || self.dragging.is_some() {
            return;
        }
        let winner = self.ray_test(mouse);
        if winner == self.mouse_over {
            return;
        }

        self.clear_hover();

        if let Some(new) = winner {
            if let Some(gizmo) = self.gizmos.get_mut(new) {
                gizmo.mouse_over = true;
            }
            self.events.push(GizmoEvent::MouseEnter(new));
            for gizmo in self.self_and_ancestors(new) {
                self.events.push(GizmoEvent::MouseEnterHierarchy { gizmo, hovered: new });
            }
            tracing::trace!("Mouse over gizmo {:?}", new);
        }
        self.mouse_over = winner;
    }

    fn clear_hover(&mut self) {
        let Some(old) = self.mouse_over.take() else {
            return;
        };
        if let Some(gizmo) = self.gizmos.get_mut(old) {
            gizmo.mouse_over = false;
            if let Some(drag) = gizmo.drag.as_mut() {
                drag.on_mouse_exit();
            }
        }
        self.events.push(GizmoEvent::MouseExit(old));
        for gizmo in self.self_and_ancestors(old) {
            self.events.push(GizmoEvent::MouseExitHierarchy { gizmo, hovered: old });
        }
    }

    fn begin_drag(&mut self, id: GizmoId, down: &ViewportMouseEvent, world: &mut dyn TransformAccess) -> bool {
        let Some(placement) = self.world_placement(id) else {
            return false;
        };
        self.events.push(GizmoEvent::PreDrag(id));

        let Some(gizmo) = self.gizmos.get_mut(id) else {
            return false;
        };
        let world_line = gizmo.shape.as_mut().and_then(|s| s.pre_drag(&placement, down));
        let Some(drag) = gizmo.drag.as_mut() else {
            return false;
        };
        if drag
            .start_drag(down, placement.translation, placement.rotation, world_line)
            .is_none()
        {
            drag.cancel();
            tracing::trace!("Drag on gizmo {:?} could not start", id);
            return false;
        }
        self.dragging = Some(id);

        for node in self.forward_chain(id) {
            let moved = self.translated_gizmo(node);
            let moved_translation = moved
                .and_then(|m| self.world_placement(m))
                .map(|p| p.translation)
                .unwrap_or(placement.translation);

            let Some(gizmo) = self.gizmos.get_mut(node) else {
                continue;
            };
            match gizmo.manipulator.as_mut() {
                Some(Manipulator::Translate(translate)) => translate.on_drag_start(moved_translation),
                Some(Manipulator::Scale(scale)) => scale.on_drag_start(down.camera.eye_direction()),
                Some(Manipulator::Rotate(rotate)) => rotate.on_drag_start(),
                None => {}
            }
            if let Some(object_gizmo) = gizmo.object_gizmo.as_mut() {
                if let Some(objects) = object_gizmo.on_drag_start(world, down.modifiers) {
                    self.events.push(GizmoEvent::ObjectsDuplicated { gizmo: node, objects });
                }
                break;
            }
        }

        self.events.push(GizmoEvent::DragStart(id));
        tracing::debug!("Drag started on gizmo {:?}", id);
        true
    }

    /// Gizmo moved by a translate manipulator on `node`
    fn translated_gizmo(&self, node: GizmoId) -> Option<GizmoId> {
        match self.gizmos.get(node)?.manipulator? {
            Manipulator::Translate(translate) => match translate.update_mode {
                UpdateMode::None => None,
                UpdateMode::TranslateSelf => Some(node),
                UpdateMode::TranslateRoot => Some(self.find_root(node)),
            },
            _ => None,
        }
    }

    fn update_drag(&mut self, id: GizmoId, mouse: &ViewportMouseEvent, world: &mut dyn TransformAccess) {
        let movement = self
            .gizmos
            .get_mut(id)
            .and_then(|g| g.drag.as_mut())
            .and_then(|d| d.update(mouse));
        let Some(movement) = movement else {
            return;
        };

        let update = GizmoUpdateEvent {
            gizmo: id,
            mouse: *mouse,
            drag: movement,
        };
        self.events.push(GizmoEvent::Modified(update));

        let ring = self
            .gizmos
            .get_mut(id)
            .and_then(|g| g.shape.as_mut())
            .and_then(|s| s.on_gizmo_modified(&update));
        if let Some(ring) = ring {
            self.events.push(GizmoEvent::RingModified(ring));
        }

        let mut output = None;
        for node in self.forward_chain(id) {
            if output.is_none() {
                output = self.run_manipulator(node, &update, ring.as_ref());
            }
            if let Some(output) = &output {
                if self.apply_to_objects(node, output, world) {
                    break;
                }
            }
        }
    }

    fn run_manipulator(
        &mut self,
        node: GizmoId,
        update: &GizmoUpdateEvent,
        ring: Option<&RingGizmoEvent>,
    ) -> Option<ManipulatorOutput> {
        let manipulator = self.gizmos.get(node)?.manipulator?;
        match manipulator {
            Manipulator::Translate(translate) => {
                let moved = self.translated_gizmo(node);
                let bases = moved
                    .and_then(|m| self.world_placement(m))
                    .map(|p| p.rotation)
                    .unwrap_or(Quat::IDENTITY);
                let (position, event) = translate.on_gizmo_modified(update, bases);
                if let Some(moved) = moved {
                    self.set_world_translation(moved, position);
                }
                self.events.push(GizmoEvent::TranslateModified(event));
                Some(ManipulatorOutput::Translate(event, translate))
            }
            Manipulator::Scale(mut scale) => {
                let placement = self.world_placement(node)?;
                let event = scale.on_gizmo_modified(update, placement.translation, placement.rotation);
                if let Some(gizmo) = self.gizmos.get_mut(node) {
                    gizmo.manipulator = Some(Manipulator::Scale(scale));
                }
                self.events.push(GizmoEvent::ScaleModified(event));
                Some(ManipulatorOutput::Scale(event, scale))
            }
            Manipulator::Rotate(mut rotate) => {
                let ring = ring?;
                let event = rotate.on_ring_modified(ring);
                if let Some(gizmo) = self.gizmos.get_mut(node) {
                    gizmo.manipulator = Some(Manipulator::Rotate(rotate));
                }
                let event = event?;

                let axis = event.gizmo_world_rotation_axis.normalize_or_zero();
                if axis != Vec3::ZERO {
                    if let Some(placement) = self.world_placement(node) {
                        let delta = Quat::from_axis_angle(axis, event.gizmo_rotation);
                        self.set_world_rotation(node, (delta * placement.rotation).normalize());
                    }
                }
                self.events.push(GizmoEvent::RotateModified(event));
                Some(ManipulatorOutput::Rotate(event))
            }
        }
    }

    /// Hand a manipulator's output to the object gizmo on `node`. Returns
    /// true if the node has one.
    fn apply_to_objects(
        &mut self,
        node: GizmoId,
        output: &ManipulatorOutput,
        world: &mut dyn TransformAccess,
    ) -> bool {
        let Some(placement) = self.world_placement(node) else {
            return false;
        };
        let Some(object_gizmo) = self.gizmos.get_mut(node).and_then(|g| g.object_gizmo.as_mut()) else {
            return false;
        };
        let mut no_hook = |_: &mut ObjectTransformGizmoEvent| {};
        let hook: &mut dyn FnMut(&mut ObjectTransformGizmoEvent) = match self.object_hook.as_deref_mut() {
            Some(hook) => hook,
            None => &mut no_hook,
        };
        let modified = match output {
            ManipulatorOutput::Translate(event, translate) => {
                object_gizmo.on_translate(event, translate, world, hook)
            }
            ManipulatorOutput::Scale(event, scale) => {
                object_gizmo.on_scale(event, scale, placement.translation, placement.rotation, world, hook)
            }
            ManipulatorOutput::Rotate(event) => object_gizmo.on_rotate(event, placement.translation, world, hook),
        };
        self.events.extend(
            modified
                .into_iter()
                .map(|event| GizmoEvent::ObjectModified { gizmo: node, event }),
        );
        true
    }

    fn end_drag(
        &mut self,
        id: GizmoId,
        world: &mut dyn TransformAccess,
        queue: &mut OperationQueue<dyn TransformAccess>,
    ) {
        self.dragging = None;
        if let Some(owner) = self.object_gizmo_owner(id) {
            if let Some(object_gizmo) = self.gizmos.get_mut(owner).and_then(|g| g.object_gizmo.as_mut()) {
                object_gizmo.on_drag_end(world, queue);
            }
            self.refresh_basis(owner, world);
        }
        self.events.push(GizmoEvent::DragEnd(id));
        tracing::debug!("Drag ended on gizmo {:?}", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GizmoConfig;
    use crate::drag::{GizmoDrag, GizmoGrabMode};
    use crate::object::ObjectTransformGizmo;
    use crate::presets::{rotate_tool, translate_tool};
    use crate::shapes::{ArrowGizmo, GizmoShape, ShapeCommon};
    use approx::assert_relative_eq;
    use glam::Vec2;
    use ze_core::{Camera, Modifiers, Scene, Transform};

    fn camera() -> Camera {
        Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec2::new(800.0, 600.0))
    }

    fn mouse_at(world: Vec3) -> ViewportMouseEvent {
        let cam = camera();
        ViewportMouseEvent::at(cam, cam.world_to_screen(world).unwrap())
    }

    fn config() -> GizmoConfig {
        GizmoConfig {
            view_scaled: false,
            ..GizmoConfig::default()
        }
    }

    fn arrow(direction: Vec3) -> Gizmo {
        Gizmo::new("arrow")
            .with_shape(GizmoShape::Arrow(ArrowGizmo {
                common: ShapeCommon {
                    view_scaled: false,
                    ..ShapeCommon::default()
                },
                direction,
                ..ArrowGizmo::default()
            }))
            .with_drag(GizmoDrag::line(direction))
    }

    struct Harness {
        space: GizmoSpace,
        scene: Scene,
        queue: OperationQueue<dyn TransformAccess>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                space: GizmoSpace::new(),
                scene: Scene::new(),
                queue: OperationQueue::new(),
            }
        }

        fn send(&mut self, input: InputEvent) {
            self.space.handle_input(&input, &mut self.scene, &mut self.queue);
        }

        fn drag(&mut self, from: Vec3, to: Vec3, modifiers: Modifiers) {
            self.send(InputEvent::MouseMove(mouse_at(from)));
            self.send(InputEvent::MouseDown(
                MouseButton::Left,
                mouse_at(from).with_modifiers(modifiers),
            ));
            self.send(InputEvent::MouseMove(mouse_at(to).with_modifiers(modifiers)));
        }

        fn release(&mut self, at: Vec3) {
            self.send(InputEvent::MouseUp(MouseButton::Left, mouse_at(at)));
        }

        fn frame(&mut self) {
            self.space.frame_update(&mut self.scene);
        }
    }

    #[test]
    fn test_hover_raises_enter_and_exit() {
        let mut space = GizmoSpace::new();
        let mut scene = Scene::new();
        let mut queue = OperationQueue::new();
        let root = space.create(Gizmo::new("root"));
        let x = space.create_child(root, arrow(Vec3::X)).unwrap();

        space.handle_input(&InputEvent::MouseMove(mouse_at(Vec3::new(1.0, 0.0, 0.0))), &mut scene, &mut queue);
        assert_eq!(space.mouse_over(), Some(x));
        let events = space.drain_events();
        assert!(events.contains(&GizmoEvent::MouseEnter(x)));
        assert!(events.contains(&GizmoEvent::MouseEnterHierarchy { gizmo: root, hovered: x }));

        space.handle_input(&InputEvent::MouseMove(mouse_at(Vec3::new(0.0, 2.0, 0.0))), &mut scene, &mut queue);
        assert_eq!(space.mouse_over(), None);
        let events = space.drain_events();
        assert!(events.contains(&GizmoEvent::MouseExit(x)));
        assert!(events.contains(&GizmoEvent::MouseExitHierarchy { gizmo: root, hovered: x }));
    }

    #[test]
    fn test_inactive_gizmo_is_not_hovered() {
        let mut h = Harness::new();
        let x = h.space.create(arrow(Vec3::X));
        h.space.set_active(x, false, &mut h.scene).unwrap();
        h.send(InputEvent::MouseMove(mouse_at(Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(h.space.mouse_over(), None);
    }

    #[test]
    fn test_deactivating_parent_clears_hover() {
        let mut h = Harness::new();
        let root = h.space.create(Gizmo::new("root"));
        let x = h.space.create_child(root, arrow(Vec3::X)).unwrap();
        h.send(InputEvent::MouseMove(mouse_at(Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(h.space.mouse_over(), Some(x));
        h.space.drain_events();

        h.space.set_active(root, false, &mut h.scene).unwrap();
        assert_eq!(h.space.mouse_over(), None);
        assert!(!h.space.get(x).unwrap().is_mouse_over());
        let events = h.space.drain_events();
        assert!(events.contains(&GizmoEvent::MouseExit(x)));
        assert!(events.contains(&GizmoEvent::MouseExitHierarchy { gizmo: root, hovered: x }));

        // Pressing where the arrow was starts nothing
        h.send(InputEvent::MouseDown(MouseButton::Left, mouse_at(Vec3::new(1.0, 0.0, 0.0))));
        assert!(h.space.dragging().is_none());
    }

    #[test]
    fn test_deactivating_dragged_gizmo_cancels_drag() {
        let mut h = Harness::new();
        let object = h.scene.spawn("crate", Transform::IDENTITY);
        let tool = translate_tool(&mut h.space, &config());
        h.space.set_target(tool, Some(object)).unwrap();
        h.frame();

        h.drag(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.5, 0.0, 0.0), Modifiers::NONE);
        assert!(h.space.dragging().is_some());

        h.space.set_active(tool, false, &mut h.scene).unwrap();
        assert!(h.space.dragging().is_none());
        assert!(h.space.mouse_over().is_none());
        assert_eq!(h.scene.local_translation(object), Some(Vec3::ZERO));
        assert!(h.space.drain_events().iter().any(|e| matches!(e, GizmoEvent::DragCancelled(_))));

        h.release(Vec3::new(2.5, 0.0, 0.0));
        assert!(!h.queue.can_undo());
    }

    #[test]
    fn test_tree_edits() {
        let mut h = Harness::new();
        let a = h.space.create(Gizmo::new("a"));
        let b = h.space.create_child(a, Gizmo::new("b")).unwrap();
        let c = h.space.create_child(b, Gizmo::new("c")).unwrap();

        assert_eq!(
            h.space.attach(a, c),
            Err(GizmoError::HierarchyCycle { child: a, parent: c })
        );
        assert_eq!(h.space.find_root(c), a);

        h.space.detach(b).unwrap();
        assert_eq!(h.space.roots(), &[a, b]);
        assert!(h.space.get(a).unwrap().children().is_empty());

        h.space.destroy(b, &mut h.scene).unwrap();
        assert!(h.space.get(c).is_none());
        assert_eq!(h.space.len(), 1);
        assert_eq!(h.space.destroy(b, &mut h.scene), Err(GizmoError::UnknownGizmo(b)));
    }

    #[test]
    fn test_child_placement_follows_parent() {
        let mut space = GizmoSpace::new();
        let root = space.create(
            Gizmo::new("root")
                .with_translation(Vec3::new(1.0, 0.0, 0.0))
                .with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)),
        );
        let child = space
            .create_child(root, Gizmo::new("child").with_translation(Vec3::X))
            .unwrap();

        let placement = space.world_placement(child).unwrap();
        assert_relative_eq!(placement.translation.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(placement.translation.y, 1.0, epsilon = 1e-5);
        assert_eq!(placement.parent_translation, Some(Vec3::new(1.0, 0.0, 0.0)));

        space.set_world_translation(child, Vec3::new(1.0, 3.0, 0.0));
        assert!((space.get(child).unwrap().translation - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_translate_drag_moves_object_and_commits() {
        let mut h = Harness::new();
        let object = h.scene.spawn("crate", Transform::IDENTITY);
        let tool = translate_tool(&mut h.space, &config());
        h.space.set_target(tool, Some(object)).unwrap();
        h.frame();

        h.drag(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.5, 0.3, 0.0), Modifiers::NONE);
        assert!(h.space.dragging().is_some());
        let moved = h.scene.local_translation(object).unwrap();
        // Perspective puts the closest point on the axis slightly short of 2.5
        assert_relative_eq!(moved.x, 1.0, epsilon = 1e-2);
        assert_relative_eq!(moved.y, 0.0, epsilon = 1e-5);

        h.release(Vec3::new(2.5, 0.3, 0.0));
        assert!(h.space.dragging().is_none());
        assert_eq!(h.queue.undo_len(), 1);
        let events = h.space.drain_events();
        assert!(events.iter().any(|e| matches!(e, GizmoEvent::TranslateModified(_))));
        assert!(events.iter().any(|e| matches!(e, GizmoEvent::DragEnd(_))));

        h.queue.undo(&mut h.scene);
        assert_eq!(h.scene.local_translation(object), Some(Vec3::ZERO));
        h.queue.redo(&mut h.scene);
        assert_eq!(h.scene.local_translation(object), Some(moved));
    }

    #[test]
    fn test_selection_moves_together() {
        let mut h = Harness::new();
        let ids = [
            h.scene.spawn("a", Transform::from_translation(Vec3::new(-1.0, 0.0, 0.0))),
            h.scene.spawn("b", Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))),
            h.scene.spawn("c", Transform::from_translation(Vec3::new(1.0, -1.0, 0.0))),
        ];
        let tool = translate_tool(&mut h.space, &config());
        let object_gizmo = h.space.get_mut(tool).unwrap().object_gizmo.as_mut().unwrap();
        for id in ids {
            object_gizmo.add_object(id);
        }
        h.frame();
        let starts: Vec<Vec3> = ids.iter().map(|&id| h.scene.local_translation(id).unwrap()).collect();

        h.drag(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.5, 0.0, 0.0), Modifiers::NONE);

        let first = h.scene.local_translation(ids[0]).unwrap() - starts[0];
        assert_relative_eq!(first.x, 1.0, epsilon = 1e-3);
        for (id, start) in ids.iter().zip(&starts) {
            let delta = h.scene.local_translation(*id).unwrap() - *start;
            assert!((delta - first).length() < 1e-5);
        }
    }

    #[test]
    fn test_destroyed_target_cancels_drag() {
        let mut h = Harness::new();
        let ids = [
            h.scene.spawn("a", Transform::from_translation(Vec3::new(-1.0, 0.0, 0.0))),
            h.scene.spawn("b", Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))),
            h.scene.spawn("c", Transform::from_translation(Vec3::new(1.0, -1.0, 0.0))),
        ];
        let tool = translate_tool(&mut h.space, &config());
        let object_gizmo = h.space.get_mut(tool).unwrap().object_gizmo.as_mut().unwrap();
        for id in ids {
            object_gizmo.add_object(id);
        }
        h.frame();

        h.drag(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.5, 0.0, 0.0), Modifiers::NONE);
        assert_ne!(h.scene.local_translation(ids[0]), Some(Vec3::new(-1.0, 0.0, 0.0)));

        h.scene.despawn(ids[2]);
        h.frame();

        assert!(h.space.dragging().is_none());
        assert_eq!(h.scene.local_translation(ids[0]), Some(Vec3::new(-1.0, 0.0, 0.0)));
        assert_eq!(h.scene.local_translation(ids[1]), Some(Vec3::new(0.0, 1.0, 0.0)));
        assert!(!h.queue.can_undo());
        assert!(h.space.drain_events().iter().any(|e| matches!(e, GizmoEvent::DragCancelled(_))));
        let object_gizmo = h.space.get(tool).unwrap().object_gizmo.as_ref().unwrap();
        assert_eq!(object_gizmo.object_count(), 2);

        // Releasing afterwards commits nothing
        h.release(Vec3::new(2.5, 0.0, 0.0));
        assert!(!h.queue.can_undo());
    }

    #[test]
    fn test_escape_cancels_drag() {
        let mut h = Harness::new();
        let object = h.scene.spawn("crate", Transform::IDENTITY);
        let tool = translate_tool(&mut h.space, &config());
        h.space.set_target(tool, Some(object)).unwrap();
        h.frame();

        h.drag(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.5, 0.0, 0.0), Modifiers::NONE);
        h.send(InputEvent::KeyDown(Key::Escape, Modifiers::NONE));

        assert_eq!(h.scene.local_translation(object), Some(Vec3::ZERO));
        assert!(h.space.dragging().is_none());
        assert!(!h.queue.can_undo());
        // Gizmo is back on the object
        let placement = h.space.world_placement(tool).unwrap();
        assert!(placement.translation.length() < 1e-5);
    }

    #[test]
    fn test_object_hook_limits_drag() {
        let mut h = Harness::new();
        let object = h.scene.spawn("crate", Transform::IDENTITY);
        let tool = translate_tool(&mut h.space, &config());
        h.space.set_target(tool, Some(object)).unwrap();
        h.space.set_object_hook(|event: &mut ObjectTransformGizmoEvent| {
            event.final_local_translation.x = event.final_local_translation.x.min(0.5);
        });
        h.frame();

        h.drag(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.5, 0.0, 0.0), Modifiers::NONE);
        assert_relative_eq!(h.scene.local_translation(object).unwrap().x, 0.5, epsilon = 1e-5);
        let modified: Vec<_> = h
            .space
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GizmoEvent::ObjectModified { gizmo, event } => Some((gizmo, event)),
                _ => None,
            })
            .collect();
        assert!(!modified.is_empty());
        assert!(modified.iter().all(|(gizmo, event)| *gizmo == tool && event.object == object));

        h.release(Vec3::new(2.5, 0.0, 0.0));
        assert!(h.queue.undo(&mut h.scene));
        assert_eq!(h.scene.local_translation(object), Some(Vec3::ZERO));
        assert!(h.queue.redo(&mut h.scene));
        assert_relative_eq!(h.scene.local_translation(object).unwrap().x, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_destroyed_target_destroys_gizmo() {
        let mut h = Harness::new();
        let object = h.scene.spawn("crate", Transform::IDENTITY);
        let tool = translate_tool(&mut h.space, &config());
        h.space.set_target(tool, Some(object)).unwrap();
        assert!(
            h.space
                .drain_events()
                .contains(&GizmoEvent::TargetSet { gizmo: tool, target: Some(object) })
        );

        h.scene.despawn(object);
        h.frame();
        assert!(h.space.get(tool).is_none());
        assert!(h.space.is_empty());
    }

    #[test]
    fn test_ctrl_drag_duplicates_selection() {
        let mut h = Harness::new();
        let object = h.scene.spawn("crate", Transform::IDENTITY);
        let tool = translate_tool(&mut h.space, &config());
        h.space
            .get_mut(tool)
            .unwrap()
            .object_gizmo
            .as_mut()
            .unwrap()
            .add_object(object);
        h.frame();

        h.drag(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.5, 0.0, 0.0), Modifiers::CTRL);
        h.release(Vec3::new(2.5, 0.0, 0.0));

        let events = h.space.drain_events();
        let clones = events
            .iter()
            .find_map(|e| match e {
                GizmoEvent::ObjectsDuplicated { objects, .. } => Some(objects.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(clones.len(), 1);
        assert_eq!(h.scene.local_translation(object), Some(Vec3::ZERO));
        assert_relative_eq!(h.scene.local_translation(clones[0]).unwrap().x, 1.0, epsilon = 1e-3);

        h.queue.undo(&mut h.scene);
        assert!(!h.scene.is_alive(clones[0]));
    }

    #[test]
    fn test_toggle_grab_mode_needs_second_click() {
        let mut h = Harness::new();
        let object = h.scene.spawn("crate", Transform::IDENTITY);
        let config = GizmoConfig {
            grab_mode: GizmoGrabMode::Toggle,
            ..config()
        };
        let tool = translate_tool(&mut h.space, &config);
        h.space.set_target(tool, Some(object)).unwrap();
        h.frame();

        h.drag(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Modifiers::NONE);
        h.release(Vec3::new(2.0, 0.0, 0.0));
        assert!(h.space.dragging().is_some());

        h.send(InputEvent::MouseMove(mouse_at(Vec3::new(3.0, 0.0, 0.0))));
        assert_relative_eq!(h.scene.local_translation(object).unwrap().x, 1.5, epsilon = 1e-3);

        h.send(InputEvent::MouseDown(MouseButton::Left, mouse_at(Vec3::new(3.0, 0.0, 0.0))));
        h.release(Vec3::new(3.0, 0.0, 0.0));
        assert!(h.space.dragging().is_none());
        assert_eq!(h.queue.undo_len(), 1);
    }

    #[test]
    fn test_manual_start_without_auto_drag() {
        let mut h = Harness::new();
        let object = h.scene.spawn("crate", Transform::IDENTITY);
        let tool = translate_tool(&mut h.space, &config());
        h.space.set_target(tool, Some(object)).unwrap();
        h.frame();
        let x_arrow = h.space.get(tool).unwrap().children()[0];
        h.space.get_mut(x_arrow).unwrap().drag.as_mut().unwrap().auto_drag = false;

        h.drag(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.5, 0.0, 0.0), Modifiers::NONE);
        assert!(h.space.dragging().is_none());

        let started = h
            .space
            .start_drag(x_arrow, &mouse_at(Vec3::new(1.5, 0.0, 0.0)), &mut h.scene)
            .unwrap();
        assert!(started);
        assert_eq!(h.space.start_drag(tool, &mouse_at(Vec3::ZERO), &mut h.scene), Err(GizmoError::NotDraggable(tool)));
    }

    #[test]
    fn test_rotate_tool_ring_drag() {
        let mut h = Harness::new();
        let object = h.scene.spawn("wheel", Transform::IDENTITY);
        let mut config = config();
        config.ring.view_ring_radius = 1.6;
        let tool = rotate_tool(&mut h.space, &config);
        h.space.set_target(tool, Some(object)).unwrap();
        h.frame();

        let cam = camera();
        let start = cam.world_to_screen(Vec3::X).unwrap();
        let tangent = (cam.world_to_screen(Vec3::new(1.0, 0.01, 0.0)).unwrap() - start).normalize();
        let down = ViewportMouseEvent::at(cam, start);

        h.send(InputEvent::MouseMove(down));
        h.send(InputEvent::MouseDown(MouseButton::Left, down));
        h.send(InputEvent::MouseMove(ViewportMouseEvent::at(cam, start + tangent * 40.0)));
        h.send(InputEvent::MouseMove(ViewportMouseEvent::at(cam, start + tangent * 100.0)));
        h.release(Vec3::X);

        let rotation = h.scene.local_transform(object).unwrap().rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_z(1.0), 1e-3));
        assert_eq!(h.queue.undo_len(), 1);
        assert_eq!(h.queue.undo_names()[0].1, "Rotate 'wheel'");
    }

    #[test]
    fn test_object_gizmo_on_plain_root() {
        let mut h = Harness::new();
        let object = h.scene.spawn("crate", Transform::from_translation(Vec3::new(0.0, 0.0, 0.0)));
        let root = h.space.create(
            Gizmo::new("root")
                .with_manipulator(Manipulator::Translate(TranslateGizmo::default()))
                .with_object_gizmo(ObjectTransformGizmo::translate()),
        );
        h.space.create_child(root, arrow(Vec3::Y)).unwrap();
        h.space.set_target(root, Some(object)).unwrap();
        h.frame();

        h.drag(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 2.0, 0.0), Modifiers::NONE);
        assert_relative_eq!(h.scene.local_translation(object).unwrap().y, 1.0, epsilon = 1e-3);
        // The root follows the drag
        assert_relative_eq!(h.space.world_placement(root).unwrap().translation.y, 1.0, epsilon = 1e-3);
    }
}
