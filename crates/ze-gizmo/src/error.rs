//! Gizmo API errors
//!
//! Interactive paths never fail; these are only returned for misuse of the
//! programmatic API.

use crate::gizmo::GizmoId;

/// Errors returned by gizmo queries and tree edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GizmoError {
    /// An object index past the end of an object transform gizmo's set
    #[error("Index {index} is out of range for {len} objects")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of objects
        len: usize,
    },
    /// The id names no live gizmo
    #[error("Unknown gizmo {0:?}")]
    UnknownGizmo(GizmoId),
    /// Attaching would make a gizmo its own ancestor
    #[error("Gizmo {child:?} cannot be attached under its own descendant {parent:?}")]
    HierarchyCycle {
        /// Gizmo being attached
        child: GizmoId,
        /// Requested parent
        parent: GizmoId,
    },
    /// A drag was requested on a gizmo without a drag component
    #[error("Gizmo {0:?} has no drag component")]
    NotDraggable(GizmoId),
}
