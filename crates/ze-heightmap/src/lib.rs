//! Zero Editor Height Maps
//!
//! Brush tools for sculpting and painting sparse height maps, with
//! per-stroke undo records and a key-framed stroke history.
//!
//! # Module Structure
//!
//! ```text
//! ze-heightmap/
//! ├── grid.rs    # HeightGrid accessor, cell addressing, SparseHeightMap
//! ├── range.rs   # Cells under a brush and their feathered influence
//! ├── undo.rs    # Height, patch and weight undo records
//! ├── state.rs   # Key-framed brush stroke history
//! ├── tools.rs   # Create/destroy, sculpt and weight-paint tools
//! ├── config.rs  # Serializable brush and map settings
//! └── error.rs   # Error type
//! ```
//!
//! # Example
//!
//! ```
//! use glam::{IVec2, Vec2};
//! use ze_core::{Modifiers, OperationQueue};
//! use ze_heightmap::{HeightGrid, HeightManipulationTool, HeightMapConfig, HeightToolKind, SparseHeightMap};
//!
//! let config = HeightMapConfig::default();
//! let mut map = SparseHeightMap::from_config(&config);
//! map.create_patch(IVec2::ZERO, 0.0);
//!
//! let mut queue: OperationQueue<dyn HeightGrid> = OperationQueue::new();
//! let mut raise = HeightManipulationTool::new(HeightToolKind::RaiseLower, &config);
//! raise.left_mouse_down(&mut map, Vec2::ZERO, Modifiers::NONE);
//! raise.left_mouse_up(&mut queue);
//!
//! assert!(map.absolute_height(IVec2::ZERO).unwrap() > 0.0);
//! queue.undo(&mut map);
//! assert_eq!(map.absolute_height(IVec2::ZERO), Some(0.0));
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod range;
pub mod state;
pub mod tools;
pub mod undo;

pub use config::{BrushConfig, HeightMapConfig};
pub use error::HeightMapError;
pub use grid::{DEFAULT_WEIGHT, GridCell, HeightGrid, SparseHeightMap, WeightColor};
pub use range::{CellRect, HeightMapCellRange, RangeCell, feather_influence};
pub use state::{HeightMapBrushStroke, HeightMapKeyFrame, HeightMapStateManager};
pub use tools::{
    CreateDestroyTool, HeightManipulationTool, HeightMapTool, HeightSubTool, HeightTool, HeightToolKind,
    MIN_RADIUS, SmoothSamples, WeightPainterTool, change_weights,
};
pub use undo::{HeightMapUndoRedo, HeightPatchUndoRedo, ModifiedValue, SparseDiff, WeightMapUndoRedo};
