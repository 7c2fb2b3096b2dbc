//! Zero Editor Gizmos
//!
//! Interactive viewport handles for moving, scaling and rotating scene
//! objects.
//!
//! # Module Structure
//!
//! ```text
//! ze-gizmo/
//! ├── space.rs       # GizmoSpace: gizmo tree, hover tests and input routing
//! ├── gizmo.rs       # Gizmo nodes and their parts
//! ├── shapes.rs      # Pickable arrow, square and ring shapes
//! ├── drag.rs        # Mouse drag projection onto lines and planes
//! ├── components.rs  # Translate, scale and rotate manipulators
//! ├── object.rs      # Multi-object transform gizmos
//! ├── operations.rs  # Undo records for transform edits
//! ├── events.rs      # Events raised to listeners
//! ├── presets.rs     # Ready-made translate, scale and rotate tools
//! ├── config.rs      # Serializable gizmo settings
//! ├── snapping.rs    # Snapping of positions, scales and angles
//! ├── drag_math.rs   # Drag axis and scale helpers
//! ├── collision.rs   # Ray intersection tests for the shapes
//! ├── ray_test.rs    # Hover test accumulation
//! └── error.rs       # Error type
//! ```
//!
//! # Example
//!
//! ```
//! use glam::{Vec2, Vec3};
//! use ze_core::{Camera, InputEvent, OperationQueue, Scene, Transform, TransformAccess, ViewportMouseEvent};
//! use ze_gizmo::{presets, GizmoConfig, GizmoSpace};
//!
//! let mut scene = Scene::new();
//! let object = scene.spawn("crate", Transform::IDENTITY);
//! let mut queue: OperationQueue<dyn TransformAccess> = OperationQueue::new();
//!
//! let mut space = GizmoSpace::new();
//! let tool = presets::translate_tool(&mut space, &GizmoConfig::default());
//! space.set_target(tool, Some(object)).unwrap();
//! space.frame_update(&mut scene);
//!
//! let camera = Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec2::new(800.0, 600.0));
//! let mouse = ViewportMouseEvent::at(camera, Vec2::new(400.0, 300.0));
//! space.handle_input(&InputEvent::MouseMove(mouse), &mut scene, &mut queue);
//! for event in space.drain_events() {
//!     println!("{event:?}");
//! }
//! ```

pub mod collision;
pub mod components;
pub mod config;
pub mod drag;
pub mod drag_math;
pub mod error;
pub mod events;
pub mod gizmo;
pub mod object;
pub mod operations;
pub mod presets;
pub mod ray_test;
pub mod shapes;
pub mod snapping;
pub mod space;

pub use components::{Manipulator, RotateGizmo, ScaleGizmo, TranslateGizmo, UpdateMode};
pub use config::GizmoConfig;
pub use drag::{DragMovement, GizmoDrag, GizmoDragMode, GizmoGrabMode};
pub use error::GizmoError;
pub use events::{
    GizmoEvent, GizmoUpdateEvent, ObjectModification, ObjectTransformGizmoEvent, RingGizmoEvent,
    RotateGizmoUpdateEvent, ScaleGizmoUpdateEvent, TranslateGizmoUpdateEvent,
};
pub use gizmo::{Gizmo, GizmoId};
pub use object::{
    GizmoBasis, GizmoPivot, ObjectGizmoKind, ObjectModifiedHook, ObjectTransformGizmo, ObjectTransformState,
};
pub use operations::{CreateObjectOperation, TransformChange, TransformChangeOperation};
pub use ray_test::GizmoRayTest;
pub use shapes::{ArrowGizmo, GizmoPlacement, GizmoShape, RingGizmo, ShapeCommon, SquareGizmo};
pub use snapping::GizmoSnapMode;
pub use space::GizmoSpace;
