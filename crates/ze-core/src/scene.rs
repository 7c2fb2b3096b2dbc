//! In-memory object table
//!
//! A small hierarchical scene implementing [`TransformAccess`]. Editors
//! embedding the tools bring their own object table; this one backs the
//! tests and headless tooling.

use glam::{Mat4, Vec2, Vec3};

use crate::handle::Arena;
use crate::math::Aabb;
use crate::transform::{EntityId, EntityTag, Transform, TransformAccess};

/// An object in the [`Scene`]
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Display name
    pub name: String,
    /// Local transform
    pub transform: Transform,
    /// Bounds in local space. Empty means "a point at the origin".
    pub local_bounds: Aabb,
    /// Optional 2D size
    pub size: Option<Vec2>,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    detached: bool,
}

impl SceneObject {
    fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
            local_bounds: Aabb::empty(),
            size: None,
            parent: None,
            children: Vec::new(),
            detached: false,
        }
    }

    /// Parent object
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Child objects in insertion order
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Whether the object is currently detached from the scene
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

/// Hierarchical object table
#[derive(Default)]
pub struct Scene {
    objects: Arena<SceneObject, EntityTag>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects, detached ones included
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Add a root object
    pub fn spawn(&mut self, name: impl Into<String>, transform: Transform) -> EntityId {
        self.objects.insert(SceneObject::new(name, transform))
    }

    /// Add an object under `parent`. Falls back to a root object if the
    /// parent no longer exists.
    pub fn spawn_child(
        &mut self,
        parent: EntityId,
        name: impl Into<String>,
        transform: Transform,
    ) -> EntityId {
        let id = self.spawn(name, transform);
        if let Some(parent_object) = self.objects.get_mut(parent) {
            parent_object.children.push(id);
            if let Some(object) = self.objects.get_mut(id) {
                object.parent = Some(parent);
            }
        }
        id
    }

    /// Set the local-space bounds of an object
    pub fn set_local_bounds(&mut self, id: EntityId, bounds: Aabb) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.local_bounds = bounds;
                true
            }
            None => false,
        }
    }

    /// Give an object a 2D size
    pub fn enable_size(&mut self, id: EntityId, size: Vec2) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.size = Some(size);
                true
            }
            None => false,
        }
    }

    /// Look up an object, detached or not
    pub fn get(&self, id: EntityId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    /// Handles of every object
    pub fn ids(&self) -> Vec<EntityId> {
        self.objects.handles()
    }

    /// Destroy an object and its children. Handles to them go stale.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(object) = self.objects.remove(id) else {
            return false;
        };
        if let Some(parent) = object.parent.and_then(|p| self.objects.get_mut(p)) {
            parent.children.retain(|child| *child != id);
        }
        for child in object.children {
            self.despawn(child);
        }
        true
    }

    fn duplicate_under(&mut self, id: EntityId, parent: Option<EntityId>) -> Option<EntityId> {
        let source = self.objects.get(id)?.clone();
        let mut copy = SceneObject::new(source.name.clone(), source.transform);
        copy.local_bounds = source.local_bounds;
        copy.size = source.size;
        copy.parent = parent;

        let copy_id = self.objects.insert(copy);
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(p)) {
            parent.children.push(copy_id);
        }
        for child in source.children {
            self.duplicate_under(child, Some(copy_id));
        }
        Some(copy_id)
    }
}

impl TransformAccess for Scene {
    fn is_alive(&self, id: EntityId) -> bool {
        self.objects.get(id).is_some_and(|o| !o.detached)
    }

    fn name(&self, id: EntityId) -> Option<String> {
        self.objects.get(id).map(|o| o.name.clone())
    }

    fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.objects.get(id).and_then(|o| o.parent)
    }

    fn local_transform(&self, id: EntityId) -> Option<Transform> {
        self.objects.get(id).map(|o| o.transform)
    }

    fn set_local_transform(&mut self, id: EntityId, transform: Transform) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.transform = transform;
                true
            }
            None => false,
        }
    }

    fn parent_world_matrix(&self, id: EntityId) -> Mat4 {
        match self.parent(id) {
            Some(parent) => self.world_matrix(parent).unwrap_or(Mat4::IDENTITY),
            None => Mat4::IDENTITY,
        }
    }

    fn world_aabb(&self, id: EntityId) -> Option<Aabb> {
        let object = self.objects.get(id)?;
        let world = self.world_matrix(id)?;
        if object.local_bounds.is_empty() {
            let origin = world.transform_point3(Vec3::ZERO);
            return Some(Aabb::new(origin, origin));
        }
        Some(object.local_bounds.transform(&world))
    }

    fn size(&self, id: EntityId) -> Option<Vec2> {
        self.objects.get(id).and_then(|o| o.size)
    }

    fn set_size(&mut self, id: EntityId, size: Vec2) -> bool {
        match self.objects.get_mut(id) {
            Some(SceneObject {
                size: Some(current),
                ..
            }) => {
                *current = size;
                true
            }
            _ => false,
        }
    }

    fn duplicate(&mut self, id: EntityId) -> Option<EntityId> {
        let parent = self.parent(id);
        self.duplicate_under(id, parent)
    }

    fn set_detached(&mut self, id: EntityId, detached: bool) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.detached = detached;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Quat;

    #[test]
    fn test_world_translation_follows_parent() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let child = scene.spawn_child(
            parent,
            "child",
            Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)),
        );

        let world = scene.world_translation(child).unwrap();
        assert_relative_eq!(world.x, 1.0);
        assert_relative_eq!(world.y, 2.0);
    }

    #[test]
    fn test_world_rotation_composes() {
        let mut scene = Scene::new();
        let rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let parent = scene.spawn(
            "parent",
            Transform {
                rotation,
                ..Transform::IDENTITY
            },
        );
        let child = scene.spawn_child(
            parent,
            "child",
            Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        );

        let world = scene.world_translation(child).unwrap();
        assert!((world - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_despawn_makes_handles_stale() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", Transform::IDENTITY);
        let child = scene.spawn_child(parent, "child", Transform::IDENTITY);

        assert!(scene.despawn(parent));
        assert!(!scene.is_alive(parent));
        assert!(!scene.is_alive(child));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_detached_objects_are_not_alive() {
        let mut scene = Scene::new();
        let id = scene.spawn("box", Transform::IDENTITY);

        scene.set_detached(id, true);
        assert!(!scene.is_alive(id));
        scene.set_detached(id, false);
        assert!(scene.is_alive(id));
    }

    #[test]
    fn test_duplicate_copies_children() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Transform::from_translation(Vec3::X));
        scene.spawn_child(root, "leaf", Transform::IDENTITY);

        let copy = scene.duplicate(root).unwrap();
        assert_ne!(copy, root);
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.get(copy).unwrap().children().len(), 1);
        assert_eq!(scene.local_translation(copy), Some(Vec3::X));
    }

    #[test]
    fn test_world_aabb_of_point_object() {
        let mut scene = Scene::new();
        let id = scene.spawn("p", Transform::from_translation(Vec3::new(3.0, 4.0, 5.0)));
        let bounds = scene.world_aabb(id).unwrap();
        assert_eq!(bounds.min, Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_set_size_requires_size() {
        let mut scene = Scene::new();
        let id = scene.spawn("sprite", Transform::IDENTITY);
        assert!(!scene.set_size(id, Vec2::ONE));

        scene.enable_size(id, Vec2::new(2.0, 1.0));
        assert!(scene.set_size(id, Vec2::new(4.0, 2.0)));
        assert_eq!(scene.size(id), Some(Vec2::new(4.0, 2.0)));
    }
}
