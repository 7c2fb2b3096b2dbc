//! Ready-made tool gizmos
//!
//! Each builder creates a root gizmo carrying the manipulator and the
//! object transform gizmo, plus its pickable handles as children. The
//! handles forward their drags to the root.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use crate::components::Manipulator;
use crate::config::GizmoConfig;
use crate::drag::GizmoDrag;
use crate::gizmo::{Gizmo, GizmoId};
use crate::object::ObjectTransformGizmo;
use crate::shapes::GizmoShape;
use crate::space::GizmoSpace;

const AXES: [(&str, Vec3); 3] = [("X", Vec3::X), ("Y", Vec3::Y), ("Z", Vec3::Z)];

fn configure(config: &GizmoConfig, drag: GizmoDrag) -> GizmoDrag {
    GizmoDrag {
        grab_mode: config.grab_mode,
        drag_distance: config.drag_distance,
        ..drag
    }
}

fn create_root(
    space: &mut GizmoSpace,
    config: &GizmoConfig,
    name: &str,
    manipulator: Manipulator,
    mut object_gizmo: ObjectTransformGizmo,
) -> GizmoId {
    object_gizmo.pivot = config.pivot;
    object_gizmo.basis = config.basis;
    space.create(
        Gizmo::new(name)
            .with_manipulator(manipulator)
            .with_object_gizmo(object_gizmo),
    )
}

fn add_handle(space: &mut GizmoSpace, root: GizmoId, handle: Gizmo) {
    if let Err(err) = space.create_child(root, handle) {
        tracing::error!("Failed to add gizmo handle: {}", err);
    }
}

fn add_axis_arrows(space: &mut GizmoSpace, root: GizmoId, config: &GizmoConfig) {
    for (label, axis) in AXES {
        add_handle(
            space,
            root,
            Gizmo::new(format!("{label} Arrow"))
                .with_shape(GizmoShape::Arrow(config.arrow(axis)))
                .with_drag(configure(config, GizmoDrag::line(axis))),
        );
    }
}

fn add_view_square(space: &mut GizmoSpace, root: GizmoId, config: &GizmoConfig) {
    add_handle(
        space,
        root,
        Gizmo::new("View Square")
            .with_shape(GizmoShape::Square(config.view_square()))
            .with_drag(configure(config, GizmoDrag::view_plane())),
    );
}

/// Translate tool: axis arrows, plane squares and a view-plane square
pub fn translate_tool(space: &mut GizmoSpace, config: &GizmoConfig) -> GizmoId {
    let root = create_root(
        space,
        config,
        "Translate Gizmo",
        Manipulator::Translate(config.snap.translate_gizmo()),
        ObjectTransformGizmo::translate(),
    );
    add_axis_arrows(space, root, config);

    // Squares lie in their local XY plane
    let o = config.square.plane_offset;
    let planes = [
        ("XY", Vec3::new(o, o, 0.0), Quat::IDENTITY),
        ("XZ", Vec3::new(o, 0.0, o), Quat::from_rotation_x(FRAC_PI_2)),
        ("YZ", Vec3::new(0.0, o, o), Quat::from_rotation_y(-FRAC_PI_2)),
    ];
    for (label, translation, rotation) in planes {
        add_handle(
            space,
            root,
            Gizmo::new(format!("{label} Plane"))
                .with_translation(translation)
                .with_rotation(rotation)
                .with_shape(GizmoShape::Square(config.plane_square()))
                .with_drag(configure(config, GizmoDrag::plane(Vec3::Z))),
        );
    }

    add_view_square(space, root, config);
    tracing::debug!("Created translate tool {:?}", root);
    root
}

/// Scale tool: axis arrows and a uniform view-plane square
pub fn scale_tool(space: &mut GizmoSpace, config: &GizmoConfig) -> GizmoId {
    let root = create_root(
        space,
        config,
        "Scale Gizmo",
        Manipulator::Scale(config.snap.scale_gizmo()),
        ObjectTransformGizmo::scale(),
    );
    add_axis_arrows(space, root, config);
    add_view_square(space, root, config);
    tracing::debug!("Created scale tool {:?}", root);
    root
}

/// Rotate tool: one ring per axis and a camera-facing ring
pub fn rotate_tool(space: &mut GizmoSpace, config: &GizmoConfig) -> GizmoId {
    let root = create_root(
        space,
        config,
        "Rotate Gizmo",
        Manipulator::Rotate(config.snap.rotate_gizmo()),
        ObjectTransformGizmo::rotate(),
    );

    // The ring replaces the line direction with its grab tangent
    for (label, axis) in AXES {
        add_handle(
            space,
            root,
            Gizmo::new(format!("{label} Ring"))
                .with_shape(GizmoShape::Ring(config.ring(axis)))
                .with_drag(configure(config, GizmoDrag::line(Vec3::X))),
        );
    }
    add_handle(
        space,
        root,
        Gizmo::new("View Ring")
            .with_shape(GizmoShape::Ring(config.view_ring()))
            .with_drag(configure(config, GizmoDrag::line(Vec3::X))),
    );

    tracing::debug!("Created rotate tool {:?}", root);
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::{GizmoDragMode, GizmoGrabMode};
    use glam::Vec2;
    use ze_core::{Camera, InputEvent, OperationQueue, Scene, TransformAccess, ViewportMouseEvent};

    fn camera() -> Camera {
        Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec2::new(800.0, 600.0))
    }

    fn hover(space: &mut GizmoSpace, world: Vec3) -> Option<GizmoId> {
        let cam = camera();
        let mut scene = Scene::new();
        let mut queue: OperationQueue<dyn TransformAccess> = OperationQueue::new();
        let mouse = ViewportMouseEvent::at(cam, cam.world_to_screen(world).unwrap());
        space.handle_input(&InputEvent::MouseMove(mouse), &mut scene, &mut queue);
        space.mouse_over()
    }

    fn name_of(space: &GizmoSpace, id: Option<GizmoId>) -> Option<String> {
        id.and_then(|id| space.get(id)).map(|g| g.name.clone())
    }

    #[test]
    fn test_translate_tool_layout() {
        let mut space = GizmoSpace::new();
        let config = GizmoConfig {
            grab_mode: GizmoGrabMode::Toggle,
            drag_distance: 3.0,
            ..GizmoConfig::default()
        };
        let root = translate_tool(&mut space, &config);

        let children = space.get(root).unwrap().children().to_vec();
        assert_eq!(children.len(), 7);
        for child in &children {
            let drag = space.get(*child).unwrap().drag.as_ref().unwrap();
            assert_eq!(drag.grab_mode, GizmoGrabMode::Toggle);
            assert_eq!(drag.drag_distance, 3.0);
        }
        let view = space.get(children[6]).unwrap();
        assert_eq!(view.drag.as_ref().unwrap().drag_mode, GizmoDragMode::ViewPlane);
    }

    #[test]
    fn test_view_square_wins_at_center() {
        let config = GizmoConfig {
            view_scaled: false,
            ..GizmoConfig::default()
        };
        let mut space = GizmoSpace::new();
        translate_tool(&mut space, &config);

        // The Z arrow points at the camera and overlaps the center square
        let center = hover(&mut space, Vec3::ZERO);
        assert_eq!(name_of(&space, center).as_deref(), Some("View Square"));

        let on_x = hover(&mut space, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(name_of(&space, on_x).as_deref(), Some("X Arrow"));
    }

    #[test]
    fn test_plane_square_hit() {
        let config = GizmoConfig {
            view_scaled: false,
            ..GizmoConfig::default()
        };
        let mut space = GizmoSpace::new();
        translate_tool(&mut space, &config);

        let hit = hover(&mut space, Vec3::new(0.6, 0.6, 0.0));
        assert_eq!(name_of(&space, hit).as_deref(), Some("XY Plane"));
    }

    #[test]
    fn test_scale_and_rotate_tools() {
        let config = GizmoConfig::default();
        let mut space = GizmoSpace::new();
        let scale = scale_tool(&mut space, &config);
        let rotate = rotate_tool(&mut space, &config);

        assert_eq!(space.get(scale).unwrap().children().len(), 4);
        assert_eq!(space.get(rotate).unwrap().children().len(), 4);
        assert!(matches!(
            space.get(rotate).unwrap().manipulator,
            Some(Manipulator::Rotate(_))
        ));
        assert_eq!(space.roots(), &[scale, rotate]);
    }
}
