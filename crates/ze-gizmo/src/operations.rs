//! Undo records produced by object transform gizmos

use glam::{Quat, Vec2, Vec3};
use ze_core::{EntityId, Operation, TransformAccess};

/// One changed transform property with its values before and after
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformChange {
    /// Local translation
    Translation {
        /// Value restored by undo
        from: Vec3,
        /// Value restored by redo
        to: Vec3,
    },
    /// Local rotation
    Rotation {
        /// Value restored by undo
        from: Quat,
        /// Value restored by redo
        to: Quat,
    },
    /// Local scale
    Scale {
        /// Value restored by undo
        from: Vec3,
        /// Value restored by redo
        to: Vec3,
    },
    /// Size of a sized object
    Size {
        /// Value restored by undo
        from: Vec2,
        /// Value restored by redo
        to: Vec2,
    },
}

impl TransformChange {
    fn apply(&self, world: &mut dyn TransformAccess, target: EntityId, forward: bool) -> bool {
        match *self {
            TransformChange::Translation { from, to } => {
                world.set_local_translation(target, if forward { to } else { from })
            }
            TransformChange::Rotation { from, to } => {
                world.set_local_rotation(target, if forward { to } else { from })
            }
            TransformChange::Scale { from, to } => {
                world.set_local_scale(target, if forward { to } else { from })
            }
            TransformChange::Size { from, to } => world.set_size(target, if forward { to } else { from }),
        }
    }
}

/// Change of a single transform property of one object
#[derive(Debug, Clone)]
pub struct TransformChangeOperation {
    /// Object whose property changed
    pub target: EntityId,
    /// Property and its two values
    pub change: TransformChange,
    name: String,
}

impl TransformChangeOperation {
    /// An operation named `name` in undo history
    pub fn new(target: EntityId, change: TransformChange, name: impl Into<String>) -> Self {
        Self {
            target,
            change,
            name: name.into(),
        }
    }
}

impl Operation<dyn TransformAccess> for TransformChangeOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&self, world: &mut (dyn TransformAccess + 'static)) {
        if !self.change.apply(world, self.target, false) {
            tracing::warn!("Undo of '{}' skipped, object {:?} is gone", self.name, self.target);
        }
    }

    fn redo(&self, world: &mut (dyn TransformAccess + 'static)) {
        if !self.change.apply(world, self.target, true) {
            tracing::warn!("Redo of '{}' skipped, object {:?} is gone", self.name, self.target);
        }
    }
}

/// Creation of an object, undone by detaching it from the scene
#[derive(Debug, Clone)]
pub struct CreateObjectOperation {
    /// Object that was created
    pub target: EntityId,
    name: String,
}

impl CreateObjectOperation {
    /// An operation named `name` in undo history
    pub fn new(target: EntityId, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
        }
    }
}

impl Operation<dyn TransformAccess> for CreateObjectOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&self, world: &mut (dyn TransformAccess + 'static)) {
        world.set_detached(self.target, true);
    }

    fn redo(&self, world: &mut (dyn TransformAccess + 'static)) {
        world.set_detached(self.target, false);
    }
}
