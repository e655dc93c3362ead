//! Geometry kernel
//!
//! Pure distance/overlap queries plus the one side-effecting contact
//! resolver used by the simulation step. Every query degrades to a
//! documented fallback on degenerate or non-finite input instead of
//! producing NaN.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::RigidBody;
use crate::consts::CONTACT_EPSILON;

/// Below this distance the contact normal is taken from the segment direction
const NORMAL_EPSILON: f32 = 1e-4;

/// Result of projecting a point onto a segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentDistance {
    /// Distance from the point to `closest`
    pub distance: f32,
    /// Closest point on the segment
    pub closest: Vec2,
    /// Projection parameter along `a -> b`, clamped to [0, 1]
    pub t: f32,
}

/// Distance from `p` to the segment `a -> b`.
///
/// A degenerate segment (`a == b`) is treated as the point `a` with `t = 0`.
/// Non-finite input yields an infinite distance with `closest = p`, which
/// can never register as a collision.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> SegmentDistance {
    if !(p.is_finite() && a.is_finite() && b.is_finite()) {
        return SegmentDistance {
            distance: f32::INFINITY,
            closest: p,
            t: 0.0,
        };
    }

    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return SegmentDistance {
            distance: p.distance(a),
            closest: a,
            t: 0.0,
        };
    }

    let t = (p - a).dot(ab) / len_sq;
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let closest = a + ab * t;
    SegmentDistance {
        distance: p.distance(closest),
        closest,
        t,
    }
}

/// Reflect a velocity off a surface with unit normal `n`.
///
/// Standard reflection: v' = v - 2(v·n)n. A zero-length or non-finite
/// normal returns `v` unchanged.
#[inline]
pub fn reflect(v: Vec2, n: Vec2) -> Vec2 {
    if !n.is_finite() || n.length_squared() <= f32::EPSILON {
        return v;
    }
    v - 2.0 * v.dot(n) * n
}

/// Resolve a circle against a segment, bouncing and pushing the body out.
///
/// Returns whether the body overlapped the segment. On contact the
/// velocity is reflected (if approaching) and scaled by `restitution`, so
/// the resulting speed never exceeds `restitution * |v|`, and the body is
/// moved to `radius + CONTACT_EPSILON` from the closest point.
pub fn circle_segment_collision(body: &mut RigidBody, a: Vec2, b: Vec2, restitution: f32) -> bool {
    resolve_segment_contact(body, None, a, b, restitution, true)
}

/// Swept form of [`circle_segment_collision`].
///
/// `from` is the body position at the start of the substep. If the centre
/// crossed the segment since then, the contact normal is oriented back
/// toward `from` so the body is pushed to the side it came from.
///
/// With `bounce == false` only positional correction is applied and the
/// approaching component of the velocity is removed (no reflection).
pub fn resolve_segment_contact(
    body: &mut RigidBody,
    from: Option<Vec2>,
    a: Vec2,
    b: Vec2,
    restitution: f32,
    bounce: bool,
) -> bool {
    let hit = point_segment_distance(body.position, a, b);
    if !hit.distance.is_finite() {
        return false;
    }

    let crossed = from.is_some_and(|from| segments_cross(from, body.position, a, b));
    if !crossed && hit.distance >= body.radius {
        return false;
    }

    let normal = contact_normal(body, from, a, b, &hit, crossed);
    body.position = hit.closest + normal * (body.radius + CONTACT_EPSILON);

    let restitution = restitution.max(0.0).min(1.0);
    let v = body.velocity;
    let approach = v.dot(normal);
    body.velocity = if bounce {
        if approach < 0.0 {
            reflect(v, normal) * restitution
        } else {
            v * restitution
        }
    } else if approach < 0.0 {
        v - normal * approach
    } else {
        v
    };

    true
}

/// Unit normal pointing from the segment toward the side the body belongs on
fn contact_normal(
    body: &RigidBody,
    from: Option<Vec2>,
    a: Vec2,
    b: Vec2,
    hit: &SegmentDistance,
    crossed: bool,
) -> Vec2 {
    if !crossed && hit.distance > NORMAL_EPSILON {
        return (body.position - hit.closest) / hit.distance;
    }

    let ab = b - a;
    if ab.length_squared() <= f32::EPSILON {
        // Centre sits on a point obstacle: back out against the motion
        let back = -body.velocity.normalize_or_zero();
        return if back == Vec2::ZERO { Vec2::NEG_Y } else { back };
    }

    let perp = ab.perp().normalize();
    let reference = from.unwrap_or(body.position);
    let side = (reference - a).dot(perp);
    if side > NORMAL_EPSILON {
        perp
    } else if side < -NORMAL_EPSILON {
        -perp
    } else if body.velocity.dot(perp) > 0.0 {
        -perp
    } else {
        perp
    }
}

/// Whether the motion `p0 -> p1` strictly crosses the segment `a -> b`
pub fn segments_cross(p0: Vec2, p1: Vec2, a: Vec2, b: Vec2) -> bool {
    let ab = b - a;
    let motion = p1 - p0;
    if ab.length_squared() <= f32::EPSILON || motion.length_squared() <= f32::EPSILON {
        return false;
    }
    let d1 = ab.perp_dot(p0 - a);
    let d2 = ab.perp_dot(p1 - a);
    let d3 = motion.perp_dot(a - p0);
    let d4 = motion.perp_dot(b - p0);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Axis-aligned box overlap.
///
/// Bounds are inclusive: boxes that only touch along an edge overlap.
/// Any NaN coordinate makes the comparisons fail, so it never overlaps.
#[allow(clippy::too_many_arguments)]
#[inline]
pub fn box_overlap(ax: f32, ay: f32, aw: f32, ah: f32, bx: f32, by: f32, bw: f32, bh: f32) -> bool {
    ax <= bx + bw && ax + aw >= bx && ay <= by + bh && ay + ah >= by
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_point_segment_distance_interior() {
        let d = point_segment_distance(Vec2::new(5.0, 3.0), Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!((d.distance - 3.0).abs() < 1e-5);
        assert!((d.t - 0.5).abs() < 1e-5);
        assert_eq!(d.closest, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_point_segment_distance_clamps_to_endpoint() {
        let d = point_segment_distance(Vec2::new(-4.0, 3.0), Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert_eq!(d.t, 0.0);
        assert!((d.distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_point_segment_distance_degenerate() {
        let a = Vec2::new(2.0, 2.0);
        let d = point_segment_distance(Vec2::new(5.0, 6.0), a, a);
        assert_eq!(d.t, 0.0);
        assert_eq!(d.closest, a);
        assert!((d.distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_point_segment_distance_nan_never_collides() {
        let d = point_segment_distance(Vec2::new(f32::NAN, 0.0), Vec2::ZERO, Vec2::X);
        assert!(d.distance.is_infinite());
        assert_eq!(d.t, 0.0);
    }

    #[test]
    fn test_reflect() {
        let r = reflect(Vec2::new(100.0, 50.0), Vec2::new(-1.0, 0.0));
        assert!((r.x + 100.0).abs() < 1e-4);
        assert!((r.y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_reflect_zero_normal_is_identity() {
        let v = Vec2::new(3.0, -4.0);
        assert_eq!(reflect(v, Vec2::ZERO), v);
        assert_eq!(reflect(v, Vec2::new(f32::NAN, 1.0)), v);
    }

    #[test]
    fn test_circle_segment_collision_bounces_and_pushes_out() {
        let mut body = RigidBody {
            position: Vec2::new(200.0, 295.0),
            velocity: Vec2::new(0.0, 300.0),
            radius: 10.0,
        };
        let hit = circle_segment_collision(
            &mut body,
            Vec2::new(100.0, 300.0),
            Vec2::new(300.0, 300.0),
            0.72,
        );
        assert!(hit);
        assert!(body.velocity.y < 0.0);
        assert!((body.velocity.y + 216.0).abs() < 1e-3);
        assert!(body.position.y <= 300.0 - 10.0);
    }

    #[test]
    fn test_circle_segment_collision_miss() {
        let mut body = RigidBody {
            position: Vec2::new(200.0, 250.0),
            velocity: Vec2::new(0.0, 300.0),
            radius: 10.0,
        };
        let before = body;
        assert!(!circle_segment_collision(
            &mut body,
            Vec2::new(100.0, 300.0),
            Vec2::new(300.0, 300.0),
            0.72
        ));
        assert_eq!(body, before);
    }

    #[test]
    fn test_centre_on_line_backs_out_against_motion() {
        let mut body = RigidBody {
            position: Vec2::new(0.0, 0.0),
            velocity: Vec2::new(0.0, 50.0),
            radius: 5.0,
        };
        assert!(circle_segment_collision(
            &mut body,
            Vec2::new(-10.0, 0.0),
            Vec2::new(10.0, 0.0),
            1.0
        ));
        // Moving down, so the body is pushed up
        assert!(body.position.y < 0.0);
        assert!(body.velocity.y < 0.0);
    }

    #[test]
    fn test_swept_contact_pushes_back_to_origin_side() {
        // Centre jumped from above the line to below it within one substep
        let from = Vec2::new(0.0, -4.0);
        let mut body = RigidBody {
            position: Vec2::new(0.0, 3.0),
            velocity: Vec2::new(0.0, 400.0),
            radius: 5.0,
        };
        let hit = resolve_segment_contact(
            &mut body,
            Some(from),
            Vec2::new(-50.0, 0.0),
            Vec2::new(50.0, 0.0),
            0.5,
            true,
        );
        assert!(hit);
        assert!(body.position.y < -5.0);
        assert!(body.velocity.y < 0.0);
    }

    #[test]
    fn test_correction_only_does_not_reflect() {
        let mut body = RigidBody {
            position: Vec2::new(0.0, -2.0),
            velocity: Vec2::new(30.0, 40.0),
            radius: 5.0,
        };
        let hit = resolve_segment_contact(
            &mut body,
            None,
            Vec2::new(-50.0, 0.0),
            Vec2::new(50.0, 0.0),
            1.0,
            false,
        );
        assert!(hit);
        assert!(body.position.y < -5.0);
        assert!(body.velocity.y.abs() < 1e-4);
        assert!((body.velocity.x - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_box_overlap_edge_touching_counts() {
        // Right edge of A touches left edge of B
        assert!(box_overlap(0.0, 0.0, 10.0, 10.0, 10.0, 0.0, 5.0, 5.0));
        // Corner touch
        assert!(box_overlap(0.0, 0.0, 10.0, 10.0, 10.0, 10.0, 5.0, 5.0));
        // Separated by a hair
        assert!(!box_overlap(0.0, 0.0, 10.0, 10.0, 10.01, 0.0, 5.0, 5.0));
        assert!(!box_overlap(f32::NAN, 0.0, 10.0, 10.0, 0.0, 0.0, 5.0, 5.0));
    }

    proptest! {
        #[test]
        fn reflection_never_gains_energy(
            vx in -900.0f32..900.0,
            vy in -900.0f32..900.0,
            px in -90.0f32..90.0,
            py in -9.9f32..9.9,
            restitution in 0.0f32..=1.0,
        ) {
            let mut body = RigidBody {
                position: Vec2::new(px, py),
                velocity: Vec2::new(vx, vy),
                radius: 10.0,
            };
            let before = body.velocity.length();
            let hit = circle_segment_collision(
                &mut body,
                Vec2::new(-100.0, 0.0),
                Vec2::new(100.0, 0.0),
                restitution,
            );
            prop_assert!(hit);
            prop_assert!(body.velocity.length() <= restitution * before + 1e-3);
            prop_assert!(body.position.is_finite());
        }
    }
}
