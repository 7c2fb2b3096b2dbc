//! Gizmo settings
//!
//! Serializable settings used to build the preset tool gizmos. Every
//! section falls back to its defaults when missing from a settings file.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::components::{RotateGizmo, ScaleGizmo, TranslateGizmo, UpdateMode};
use crate::drag::GizmoGrabMode;
use crate::object::{GizmoBasis, GizmoPivot};
use crate::shapes::{ArrowGizmo, RingGizmo, ShapeCommon, SquareGizmo};
use crate::snapping::GizmoSnapMode;

/// Snapping defaults for the three tools
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnapConfig {
    /// Snap translation drags
    pub translate_snapping: bool,
    /// Grid translation snaps to
    pub translate_snap_mode: GizmoSnapMode,
    /// World units
    pub translate_snap_distance: f32,
    /// Snap scale drags
    pub scale_snapping: bool,
    /// Grid scale snaps to
    pub scale_snap_mode: GizmoSnapMode,
    /// Scale increment
    pub scale_snap_distance: f32,
    /// Snap rotation drags
    pub rotate_snapping: bool,
    /// Degrees
    pub rotate_snap_angle: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            translate_snapping: false,
            translate_snap_mode: GizmoSnapMode::WorldAxes,
            translate_snap_distance: 0.25,
            scale_snapping: false,
            scale_snap_mode: GizmoSnapMode::WorldAxes,
            scale_snap_distance: 1.0,
            rotate_snapping: false,
            rotate_snap_angle: 15.0,
        }
    }
}

impl SnapConfig {
    /// Translate manipulator with these snap settings
    pub fn translate_gizmo(&self) -> TranslateGizmo {
        TranslateGizmo {
            update_mode: UpdateMode::TranslateSelf,
            snapping: self.translate_snapping,
            snap_mode: self.translate_snap_mode,
            snap_distance: self.translate_snap_distance,
            ..TranslateGizmo::default()
        }
    }

    /// Scale manipulator with these snap settings
    pub fn scale_gizmo(&self) -> ScaleGizmo {
        ScaleGizmo {
            snapping: self.scale_snapping,
            snap_mode: self.scale_snap_mode,
            snap_distance: self.scale_snap_distance,
            ..ScaleGizmo::default()
        }
    }

    /// Rotate manipulator with these snap settings
    pub fn rotate_gizmo(&self) -> RotateGizmo {
        RotateGizmo {
            snapping: self.rotate_snapping,
            snap_angle: self.rotate_snap_angle,
            ..RotateGizmo::default()
        }
    }
}

/// Arrow handle settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArrowConfig {
    /// Length of each axis arrow
    pub length: f32,
    /// Pick distance around the arrow shaft
    pub select_radius: f32,
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            length: 2.8,
            select_radius: 0.25,
        }
    }
}

/// Square handle settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SquareConfig {
    /// Edge length of the square handles
    pub size: f32,
    /// Offset of the plane handles from the gizmo center, along both axes
    pub plane_offset: f32,
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            size: 0.4,
            plane_offset: 0.6,
        }
    }
}

/// Ring handle settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RingConfig {
    /// Radius of the axis rings
    pub radius: f32,
    /// Radius of the camera-facing ring
    pub view_ring_radius: f32,
    /// Pick distance around the ring
    pub select_radius: f32,
    /// Rotation per pixel when the ring is dragged edge-on
    pub drag_radians_per_pixel: f32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            view_ring_radius: 1.2,
            select_radius: 0.25,
            drag_radians_per_pixel: 0.01,
        }
    }
}

/// Settings for the preset tool gizmos
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GizmoConfig {
    /// Where the tool sits relative to its objects
    pub pivot: GizmoPivot,
    /// Orientation of the tool axes
    pub basis: GizmoBasis,
    /// How a press turns into a drag
    pub grab_mode: GizmoGrabMode,
    /// Pixels the mouse must move after a press before a drag starts
    pub drag_distance: f32,
    /// Keep handles a constant size on screen
    pub view_scaled: bool,
    /// Snapping defaults
    pub snap: SnapConfig,
    /// Axis arrow handles
    pub arrow: ArrowConfig,
    /// Plane and view square handles
    pub square: SquareConfig,
    /// Rotation rings
    pub ring: RingConfig,
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            pivot: GizmoPivot::Average,
            basis: GizmoBasis::World,
            grab_mode: GizmoGrabMode::Hold,
            drag_distance: 0.0,
            view_scaled: true,
            snap: SnapConfig::default(),
            arrow: ArrowConfig::default(),
            square: SquareConfig::default(),
            ring: RingConfig::default(),
        }
    }
}

impl GizmoConfig {
    fn common(&self, picking_priority: i32) -> ShapeCommon {
        ShapeCommon {
            picking_priority,
            view_scaled: self.view_scaled,
            ..ShapeCommon::default()
        }
    }

    /// Arrow pointing along a local axis
    pub fn arrow(&self, direction: Vec3) -> ArrowGizmo {
        ArrowGizmo {
            common: self.common(0),
            direction,
            length: self.arrow.length,
            select_radius: self.arrow.select_radius,
        }
    }

    /// Plane handle; wins over arrows it overlaps
    pub fn plane_square(&self) -> SquareGizmo {
        SquareGizmo {
            common: ShapeCommon {
                use_parent_as_view_scale_origin: true,
                ..self.common(1)
            },
            size: Vec2::splat(self.square.size),
            view_aligned: false,
        }
    }

    /// Camera-facing center handle; wins over everything it overlaps
    pub fn view_square(&self) -> SquareGizmo {
        SquareGizmo {
            common: self.common(2),
            size: Vec2::splat(self.square.size),
            view_aligned: true,
        }
    }

    /// Ring around a local axis
    pub fn ring(&self, axis: Vec3) -> RingGizmo {
        RingGizmo {
            common: self.common(0),
            axis,
            radius: self.ring.radius,
            select_radius: self.ring.select_radius,
            drag_radians_per_pixel: self.ring.drag_radians_per_pixel,
            view_aligned: false,
            ..RingGizmo::default()
        }
    }

    /// Camera-facing ring
    pub fn view_ring(&self) -> RingGizmo {
        RingGizmo {
            radius: self.ring.view_ring_radius,
            view_aligned: true,
            ..self.ring(Vec3::Z)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ze_core::config::{from_ron_str, to_ron_string};

    #[test]
    fn test_default_distances() {
        let config = GizmoConfig::default();
        assert_eq!(config.snap.translate_gizmo().snap_distance, 0.25);
        assert_eq!(config.snap.scale_gizmo().snap_distance, 1.0);
        assert_eq!(config.snap.rotate_gizmo().snap_angle, 15.0);
        assert_eq!(config.ring(Vec3::X).drag_radians_per_pixel, 0.01);
    }

    #[test]
    fn test_built_parts_keep_drag_state_defaults() {
        let mut config = GizmoConfig::default();
        config.snap.scale_snapping = true;
        config.snap.scale_snap_distance = 0.5;
        config.snap.rotate_snapping = true;
        config.ring.view_ring_radius = 2.0;

        let mut scale = ScaleGizmo::default();
        scale.snapping = true;
        scale.snap_distance = 0.5;
        assert_eq!(config.snap.scale_gizmo(), scale);

        let mut rotate = RotateGizmo::default();
        rotate.snapping = true;
        assert_eq!(config.snap.rotate_gizmo(), rotate);
        assert_eq!(config.snap.translate_gizmo(), TranslateGizmo::default());

        let view_ring = config.view_ring();
        assert!(view_ring.view_aligned);
        assert_eq!(view_ring.radius, 2.0);
        assert_eq!(view_ring.axis, config.ring(Vec3::Z).axis);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = GizmoConfig::default();
        config.basis = GizmoBasis::Local;
        config.snap.translate_snap_mode = GizmoSnapMode::WorldGrid;

        let text = to_ron_string(&config).unwrap();
        let loaded: GizmoConfig = from_ron_str(&text).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded: GizmoConfig = from_ron_str("(pivot: Center, snap: (rotate_snap_angle: 45.0))").unwrap();
        assert_eq!(loaded.pivot, GizmoPivot::Center);
        assert_eq!(loaded.snap.rotate_snap_angle, 45.0);
        assert_eq!(loaded.snap.translate_snap_distance, 0.25);
        assert_eq!(loaded.ring, RingConfig::default());
    }
}
