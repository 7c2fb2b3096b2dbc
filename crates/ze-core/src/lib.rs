//! Zero Editor Core
//!
//! Shared building blocks for the editor's interactive tools.
//!
//! # Module Structure
//!
//! ```text
//! ze-core/
//! ├── handle.rs      # Generational handles and arena storage
//! ├── transform.rs   # Transform data and the TransformAccess scene accessor
//! ├── scene.rs       # In-memory hierarchical object table
//! ├── operation.rs   # Undo/redo operations, batches and the queue
//! ├── math.rs        # Ray, Plane, Aabb
//! ├── camera.rs      # Viewport camera snapshot
//! ├── input.rs       # Viewport input events
//! └── config.rs      # RON settings helpers
//! ```

pub mod camera;
pub mod config;
pub mod handle;
pub mod input;
pub mod math;
pub mod operation;
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use config::ConfigError;
pub use handle::{Arena, Handle};
pub use input::{InputEvent, Key, Modifiers, MouseButton, ViewportMouseEvent};
pub use math::{Aabb, Plane, Ray};
pub use operation::{Operation, OperationBatch, OperationQueue};
pub use scene::{Scene, SceneObject};
pub use transform::{EntityId, EntityTag, Transform, TransformAccess};
