//! Transform data and the scene accessor used by editing tools.

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::handle::Handle;
use crate::math::Aabb;

/// Brand for handles into the external object table.
#[derive(Debug)]
pub enum EntityTag {}

/// Handle to an object owned by the scene.
pub type EntityId = Handle<EntityTag>;

/// Local translation, rotation and scale of an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation relative to the parent
    pub translation: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Scale relative to the parent
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Identity transform moved to `translation`
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Local matrix (scale, then rotation, then translation)
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Read/write access to the transforms of scene objects.
///
/// Editing tools only ever talk to objects through this trait, so they work
/// against any object table that can answer these questions. Setters return
/// `false` when the handle no longer resolves.
pub trait TransformAccess {
    /// Whether the handle still refers to a live, attached object
    fn is_alive(&self, id: EntityId) -> bool;

    /// Display name, used for undo labels
    fn name(&self, id: EntityId) -> Option<String>;

    /// Parent object, if any
    fn parent(&self, id: EntityId) -> Option<EntityId>;

    /// Local transform relative to the parent
    fn local_transform(&self, id: EntityId) -> Option<Transform>;

    /// Overwrite the local transform
    fn set_local_transform(&mut self, id: EntityId, transform: Transform) -> bool;

    /// World matrix of the parent (identity for root objects)
    fn parent_world_matrix(&self, id: EntityId) -> Mat4;

    /// World-space bounds of the object
    fn world_aabb(&self, id: EntityId) -> Option<Aabb>;

    /// 2D size for objects that have one (sprites, UI areas)
    fn size(&self, id: EntityId) -> Option<Vec2>;

    /// Overwrite the 2D size. Objects without a size ignore this.
    fn set_size(&mut self, id: EntityId, size: Vec2) -> bool;

    /// Clone an object next to the original, returning the clone.
    fn duplicate(&mut self, id: EntityId) -> Option<EntityId>;

    /// Detach an object from the scene without destroying it, or reattach
    /// a previously detached one. Detached objects are not alive.
    fn set_detached(&mut self, id: EntityId, detached: bool) -> bool;

    /// World matrix of the object
    fn world_matrix(&self, id: EntityId) -> Option<Mat4> {
        let local = self.local_transform(id)?;
        Some(self.parent_world_matrix(id) * local.matrix())
    }

    /// World translation of the object
    fn world_translation(&self, id: EntityId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    /// World rotation of the object
    fn world_rotation(&self, id: EntityId) -> Option<Quat> {
        let (_, rotation, _) = self.world_matrix(id)?.to_scale_rotation_translation();
        Some(rotation)
    }

    /// Local translation of the object
    fn local_translation(&self, id: EntityId) -> Option<Vec3> {
        self.local_transform(id).map(|t| t.translation)
    }

    /// Overwrite only the local translation
    fn set_local_translation(&mut self, id: EntityId, translation: Vec3) -> bool {
        match self.local_transform(id) {
            Some(mut transform) => {
                transform.translation = translation;
                self.set_local_transform(id, transform)
            }
            None => false,
        }
    }

    /// Overwrite only the local rotation
    fn set_local_rotation(&mut self, id: EntityId, rotation: Quat) -> bool {
        match self.local_transform(id) {
            Some(mut transform) => {
                transform.rotation = rotation;
                self.set_local_transform(id, transform)
            }
            None => false,
        }
    }

    /// Overwrite only the local scale
    fn set_local_scale(&mut self, id: EntityId, scale: Vec3) -> bool {
        match self.local_transform(id) {
            Some(mut transform) => {
                transform.scale = scale;
                self.set_local_transform(id, transform)
            }
            None => false,
        }
    }

    /// True if any ancestor of `id` is contained in `set`
    fn has_ancestor_in(&self, id: EntityId, set: &[EntityId]) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if set.contains(&parent) {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }
}
