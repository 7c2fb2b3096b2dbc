//! Hover arbitration between overlapping gizmos.

use ze_core::{Camera, Ray, ViewportMouseEvent};

use crate::gizmo::GizmoId;

/// A gizmo hit by the mouse ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayTestHit {
    /// Gizmo that was hit
    pub gizmo: GizmoId,
    /// Distance along the ray
    pub distance: f32,
    /// Higher values win regardless of distance
    pub priority: i32,
}

/// Collects hits from every gizmo for one mouse ray and keeps the winner.
///
/// A higher picking priority always beats a lower one. Among equal
/// priorities the closer hit wins, and an exact tie keeps whichever gizmo
/// registered first. Gizmos register in tree order (roots in creation order,
/// children depth first), so ties are deterministic.
#[derive(Debug, Clone)]
pub struct GizmoRayTest {
    /// World-space mouse ray
    pub ray: Ray,
    /// Camera the ray was cast from
    pub camera: Camera,
    best: Option<RayTestHit>,
}

impl GizmoRayTest {
    /// Start a ray test for a mouse event
    pub fn new(mouse: &ViewportMouseEvent) -> Self {
        Self {
            ray: mouse.ray,
            camera: mouse.camera,
            best: None,
        }
    }

    /// Offer a hit
    pub fn register_result(&mut self, gizmo: GizmoId, distance: f32, priority: i32) {
        let candidate = RayTestHit {
            gizmo,
            distance,
            priority,
        };
        let replace = match &self.best {
            None => true,
            Some(best) => {
                priority > best.priority || (priority == best.priority && distance < best.distance)
            }
        };
        if replace {
            self.best = Some(candidate);
        }
    }

    /// Winning hit so far
    pub fn best(&self) -> Option<&RayTestHit> {
        self.best.as_ref()
    }

    /// Winning gizmo so far
    pub fn winner(&self) -> Option<GizmoId> {
        self.best.map(|hit| hit.gizmo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use ze_core::Handle;

    fn ray_test() -> GizmoRayTest {
        let camera = Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec2::new(100.0, 100.0));
        GizmoRayTest::new(&ViewportMouseEvent::at(camera, Vec2::new(50.0, 50.0)))
    }

    fn id(index: u32) -> GizmoId {
        Handle::from_raw_parts(index, 0)
    }

    #[test]
    fn test_priority_beats_distance() {
        let mut test = ray_test();
        test.register_result(id(0), 10.0, 5);
        test.register_result(id(1), 1.0, 1);
        assert_eq!(test.winner(), Some(id(0)));

        // Same result in the other registration order
        let mut test = ray_test();
        test.register_result(id(1), 1.0, 1);
        test.register_result(id(0), 10.0, 5);
        assert_eq!(test.winner(), Some(id(0)));
    }

    #[test]
    fn test_closer_wins_at_equal_priority() {
        let mut test = ray_test();
        test.register_result(id(0), 4.0, 0);
        test.register_result(id(1), 2.0, 0);
        assert_eq!(test.winner(), Some(id(1)));
    }

    #[test]
    fn test_exact_tie_keeps_first_registered() {
        let mut test = ray_test();
        test.register_result(id(0), 3.0, 2);
        test.register_result(id(1), 3.0, 2);
        assert_eq!(test.winner(), Some(id(0)));
    }

    #[test]
    fn test_no_hits() {
        assert!(ray_test().winner().is_none());
    }
}
