//! Rays, planes and bounding boxes.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Tolerance used when deciding a ray is parallel to a plane.
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// World-space ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: Vec3,
    /// Direction (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t`
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray parameter of the point on the ray closest to `point`.
    pub fn closest_t(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.direction)
    }
}

/// Infinite plane through `point` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Any point on the plane
    pub point: Vec3,
    /// Unit normal
    pub normal: Vec3,
}

impl Plane {
    /// Create a plane, normalizing the normal
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize_or_zero(),
        }
    }

    /// Signed distance from the plane to `point`
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.point).dot(self.normal)
    }

    /// Project a point onto the plane
    pub fn project(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }

    /// Intersect a ray with this plane.
    ///
    /// Returns the ray parameter, or `None` when the ray is parallel to
    /// the plane. Hits behind the origin are returned as negative values;
    /// drag projection relies on that when the camera looks away.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let denom = ray.direction.dot(self.normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        Some((self.point - ray.origin).dot(self.normal) / denom)
    }

    /// Intersect a ray with this plane and return the hit point.
    pub fn intersect_ray_point(&self, ray: &Ray) -> Option<Vec3> {
        self.intersect_ray(ray).map(|t| ray.at(t))
    }
}

/// Closest point to `point` on the infinite line through `origin` along
/// unit `direction`.
pub fn closest_point_on_line(origin: Vec3, direction: Vec3, point: Vec3) -> Vec3 {
    origin + direction * (point - origin).dot(direction)
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Creates a new box from min and max points.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates an empty (inverted) box.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Creates a box from a center point and half-extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Creates a box that contains all given points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .fold(Self::empty(), |bbox, point| bbox.expand_to_include(point))
    }

    /// True when no point has been added yet
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Returns the center of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the full extents of the box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the union of two boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns a new box expanded to include the given point.
    pub fn expand_to_include(&self, point: Vec3) -> Aabb {
        Aabb {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Transforms the box by the given matrix.
    ///
    /// The result contains the transformed corners, which may be larger
    /// than the tightest fit.
    pub fn transform(&self, transform: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];
        Aabb::from_points(corners.map(|c| transform.transform_point3(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plane_intersection() {
        let plane = Plane::new(Vec3::ZERO, Vec3::Z);
        let ray = Ray::new(Vec3::new(1.0, 2.0, 5.0), Vec3::NEG_Z);

        let hit = plane.intersect_ray_point(&ray).unwrap();
        assert_relative_eq!(hit.x, 1.0);
        assert_relative_eq!(hit.y, 2.0);
        assert_relative_eq!(hit.z, 0.0);
    }

    #[test]
    fn test_parallel_ray_misses_plane() {
        let plane = Plane::new(Vec3::ZERO, Vec3::Z);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::X);
        assert!(plane.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_closest_point_on_line() {
        let p = closest_point_on_line(Vec3::ZERO, Vec3::X, Vec3::new(3.0, 4.0, -2.0));
        assert_eq!(p, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_aabb_union_and_center() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(2.0), Vec3::splat(4.0));
        let u = a.union(&b);

        assert_eq!(u.min, Vec3::ZERO);
        assert_eq!(u.max, Vec3::splat(4.0));
        assert_eq!(u.center(), Vec3::splat(2.0));
    }

    #[test]
    fn test_empty_aabb() {
        assert!(Aabb::empty().is_empty());
        assert!(!Aabb::from_points([Vec3::ZERO]).is_empty());
    }

    #[test]
    fn test_aabb_transform_translation() {
        let a = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let moved = a.transform(&Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        assert_relative_eq!(moved.center().x, 5.0);
    }
}
