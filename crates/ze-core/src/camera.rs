//! Viewport camera
//!
//! Snapshot of the camera that produced an input event. Gizmos use it to
//! turn screen positions into rays and back, and to keep handles a constant
//! size on screen.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::math::Ray;

/// Fraction of the visible half-height a view-scaled handle of size 1 spans.
pub const VIEW_SCALE_FACTOR: f32 = 0.15;

/// Viewport camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Orthographic projection instead of perspective
    pub orthographic: bool,
    /// Visible height in world units for orthographic cameras
    pub ortho_size: f32,
    /// Viewport size in pixels
    pub viewport_size: Vec2,
}

impl Camera {
    /// Perspective camera looking from `position` at `target`
    pub fn look_at(position: Vec3, target: Vec3, viewport_size: Vec2) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fov: 45.0_f32.to_radians(),
            near: 0.1,
            far: 10000.0,
            orthographic: false,
            ortho_size: 10.0,
            viewport_size,
        }
    }

    /// Switch to an orthographic projection showing `size` world units
    /// vertically
    pub fn with_orthographic(mut self, size: f32) -> Self {
        self.orthographic = true;
        self.ortho_size = size;
        self
    }

    /// Width over height of the viewport
    pub fn aspect(&self) -> f32 {
        if self.viewport_size.y <= 0.0 {
            return 1.0;
        }
        self.viewport_size.x / self.viewport_size.y
    }

    /// Normalized view direction
    pub fn eye_direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        if self.orthographic {
            let half_height = self.ortho_size * 0.5;
            let half_width = half_height * self.aspect();
            Mat4::orthographic_rh(
                -half_width,
                half_width,
                -half_height,
                half_height,
                self.near,
                self.far,
            )
        } else {
            Mat4::perspective_rh(self.fov, self.aspect(), self.near, self.far)
        }
    }

    /// Projection times view
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Convert a pixel position to a world ray
    pub fn screen_to_ray(&self, screen: Vec2) -> Ray {
        // Convert to normalized device coordinates
        let ndc_x = (2.0 * screen.x / self.viewport_size.x) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / self.viewport_size.y);

        let inv_view_proj = self.view_projection().inverse();

        // Near and far points in NDC (depth range 0..1)
        let near = inv_view_proj * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inv_view_proj * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;

        Ray::new(near, far - near)
    }

    /// Convert a world position to a pixel position. `None` when the point
    /// is behind a perspective camera.
    pub fn world_to_screen(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport_size.x,
            (1.0 - ndc.y) * 0.5 * self.viewport_size.y,
        ))
    }

    /// World size of a handle at `location` that should appear the same
    /// size on screen regardless of distance.
    pub fn view_scale(&self, location: Vec3) -> f32 {
        let half_height = if self.orthographic {
            self.ortho_size * 0.5
        } else {
            let depth = (location - self.position).dot(self.eye_direction()).max(self.near);
            depth * (self.fov * 0.5).tan()
        };
        half_height * VIEW_SCALE_FACTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_target_projects_to_center() {
        let screen = camera().world_to_screen(Vec3::ZERO).unwrap();
        assert_relative_eq!(screen.x, 400.0, epsilon = 1e-3);
        assert_relative_eq!(screen.y, 300.0, epsilon = 1e-3);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let ray = camera().screen_to_ray(Vec2::new(400.0, 300.0));
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-4);
        assert_relative_eq!(ray.origin.x, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_screen_ray_round_trip() {
        let cam = camera();
        let point = Vec3::new(1.5, -0.5, 0.0);
        let screen = cam.world_to_screen(point).unwrap();
        let ray = cam.screen_to_ray(screen);
        let t = ray.closest_t(point);
        assert!((ray.at(t) - point).length() < 1e-3);
    }

    #[test]
    fn test_screen_y_points_down() {
        let cam = camera();
        let above = cam.world_to_screen(Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(above.y < 300.0);
    }

    #[test]
    fn test_behind_camera_is_none() {
        assert!(camera().world_to_screen(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn test_view_scale_grows_with_distance() {
        let cam = camera();
        assert!(cam.view_scale(Vec3::new(0.0, 0.0, -10.0)) > cam.view_scale(Vec3::ZERO));
    }

    #[test]
    fn test_orthographic_view_scale_is_constant() {
        let cam = camera().with_orthographic(20.0);
        assert_relative_eq!(
            cam.view_scale(Vec3::ZERO),
            cam.view_scale(Vec3::new(0.0, 0.0, -50.0))
        );
    }
}
