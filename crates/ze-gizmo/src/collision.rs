//! Gizmo collision detection utilities
//!
//! Ray-casting tests used to pick gizmo handles: capsules around arrow
//! shafts, annuli for rings and rectangles for squares.

use glam::{Vec2, Vec3};

const PARALLEL_EPSILON: f32 = 1e-6;

/// Closest approach between a ray and a line segment.
///
/// # Arguments
///
/// * `ray_origin` - The starting point of the ray.
/// * `ray_dir` - The direction of the ray (should be normalized).
/// * `segment_start` - First end of the segment.
/// * `segment_end` - Second end of the segment.
///
/// # Returns
///
/// `(t, distance)` where `t >= 0` is the ray parameter of the closest point
/// and `distance` is the gap between the ray and the segment there.
pub fn ray_segment_closest(
    ray_origin: Vec3,
    ray_dir: Vec3,
    segment_start: Vec3,
    segment_end: Vec3,
) -> (f32, f32) {
    let segment = segment_end - segment_start;
    let r = ray_origin - segment_start;

    let a = ray_dir.dot(ray_dir);
    let e = segment.dot(segment);
    let b = ray_dir.dot(segment);
    let c = ray_dir.dot(r);
    let f = segment.dot(r);

    let (s, t) = if e <= PARALLEL_EPSILON {
        // Degenerate segment, treat it as a point
        ((-c / a).max(0.0), 0.0)
    } else {
        let denom = a * e - b * b;
        let s = if denom.abs() > PARALLEL_EPSILON {
            ((b * f - c * e) / denom).max(0.0)
        } else {
            0.0
        };
        let t = (b * s + f) / e;
        if t < 0.0 {
            ((-c / a).max(0.0), 0.0)
        } else if t > 1.0 {
            (((b - c) / a).max(0.0), 1.0)
        } else {
            (s, t)
        }
    };

    let on_ray = ray_origin + ray_dir * s;
    let on_segment = segment_start + segment * t;
    (s, on_ray.distance(on_segment))
}

/// Ray-capsule intersection test.
///
/// The capsule is the set of points within `radius` of the segment from
/// `start` to `end`, which is how arrow shafts are picked.
///
/// # Returns
///
/// * `Some(t)` - Ray parameter of the closest approach to the shaft.
/// * `None` - If the ray passes farther than `radius` from the shaft.
pub fn ray_capsule_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    start: Vec3,
    end: Vec3,
    radius: f32,
) -> Option<f32> {
    let (t, distance) = ray_segment_closest(ray_origin, ray_dir, start, end);
    (distance <= radius).then_some(t)
}

/// Ray-ring intersection test.
///
/// Tests if a ray intersects with a ring (circle with thickness) in 3D space.
/// The ring is defined by its center, normal (axis), radius, and thickness.
///
/// # Algorithm
///
/// 1. Find intersection of ray with the ring's plane
/// 2. Check if the intersection point is within the ring's annular region
///    (distance from center is close to ring radius, within thickness)
///
/// # Arguments
///
/// * `ray_origin` - The starting point of the ray.
/// * `ray_dir` - The direction of the ray (should be normalized).
/// * `ring_center` - The center point of the ring.
/// * `ring_normal` - The normal vector of the ring's plane (axis of rotation).
/// * `ring_radius` - The radius of the ring (distance from center to ring center line).
/// * `thickness` - The thickness of the ring (hit tolerance).
///
/// # Returns
///
/// * `Some(t)` - The ray parameter at the intersection point.
/// * `None` - If the ray does not intersect the ring.
pub fn ray_ring_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    ring_center: Vec3,
    ring_normal: Vec3,
    ring_radius: f32,
    thickness: f32,
) -> Option<f32> {
    let denom = ray_dir.dot(ring_normal);

    // Ray is nearly parallel to the plane
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = (ring_center - ray_origin).dot(ring_normal) / denom;

    // Intersection is behind the ray origin
    if t < 0.0 {
        return None;
    }

    let hit_point = ray_origin + ray_dir * t;
    let distance_from_ring = ((hit_point - ring_center).length() - ring_radius).abs();

    (distance_from_ring <= thickness).then_some(t)
}

/// Ray-rectangle intersection test.
///
/// The rectangle lies in the plane spanned by the unit vectors `right` and
/// `up` through `center`, extending `half_size` along each.
///
/// # Returns
///
/// * `Some(t)` - The ray parameter at the intersection point.
/// * `None` - If the ray misses the rectangle or runs parallel to it.
pub fn ray_rectangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    center: Vec3,
    right: Vec3,
    up: Vec3,
    half_size: Vec2,
) -> Option<f32> {
    let normal = right.cross(up).normalize_or_zero();
    let denom = ray_dir.dot(normal);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = (center - ray_origin).dot(normal) / denom;
    if t < 0.0 {
        return None;
    }

    let offset = ray_origin + ray_dir * t - center;
    let inside = offset.dot(right).abs() <= half_size.x && offset.dot(up).abs() <= half_size.y;
    inside.then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_hits_capsule() {
        // Ray pointing straight at X-axis shaft
        let ray_origin = Vec3::new(0.5, 0.05, 1.0);
        let ray_dir = Vec3::new(0.0, 0.0, -1.0);

        let result = ray_capsule_intersection(ray_origin, ray_dir, Vec3::ZERO, Vec3::X, 0.1);
        assert_relative_eq!(result.unwrap(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_misses_capsule() {
        // Ray pointing away from the shaft
        let ray_origin = Vec3::new(0.5, 0.0, 1.0);
        let ray_dir = Vec3::new(0.0, 0.0, 1.0);

        let result = ray_capsule_intersection(ray_origin, ray_dir, Vec3::ZERO, Vec3::X, 0.1);
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_outside_capsule_bounds() {
        // Ray passes the infinite line but beyond the end cap
        let ray_origin = Vec3::new(2.0, 0.0, 1.0);
        let ray_dir = Vec3::new(0.0, 0.0, -1.0);

        let result = ray_capsule_intersection(ray_origin, ray_dir, Vec3::ZERO, Vec3::X, 0.1);
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_parallel_to_segment() {
        let (_, distance) =
            ray_segment_closest(Vec3::new(-1.0, 0.2, 0.0), Vec3::X, Vec3::ZERO, Vec3::X);
        assert_relative_eq!(distance, 0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_hits_ring() {
        let result = ray_ring_intersection(
            Vec3::new(1.0, 0.0, 5.0),
            Vec3::NEG_Z,
            Vec3::ZERO,
            Vec3::Z,
            1.0,
            0.1,
        );
        assert_relative_eq!(result.unwrap(), 5.0);
    }

    #[test]
    fn test_ray_through_ring_center_misses() {
        let result =
            ray_ring_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, Vec3::ZERO, Vec3::Z, 1.0, 0.1);
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_rectangle() {
        let hit = ray_rectangle_intersection(
            Vec3::new(0.4, -0.4, 3.0),
            Vec3::NEG_Z,
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec2::splat(0.5),
        );
        assert!(hit.is_some());

        let miss = ray_rectangle_intersection(
            Vec3::new(0.6, 0.0, 3.0),
            Vec3::NEG_Z,
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec2::splat(0.5),
        );
        assert!(miss.is_none());
    }
}
