//! The simulated actor

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_BODY_RADIUS;

/// A circular body with position and velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
}

impl RigidBody {
    /// Create a body at rest. The radius is clamped to `MIN_BODY_RADIUS`.
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius: radius.max(MIN_BODY_RADIUS),
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Cap the velocity magnitude
    pub fn clamp_velocity(&mut self, max_velocity: f32) {
        self.velocity = self.velocity.clamp_length_max(max_velocity.max(0.0));
    }

    /// Apply gravity and damping, clamp speed, then move by `dt`
    pub fn integrate(&mut self, gravity: f32, damping: f32, max_velocity: f32, dt: f32) {
        self.velocity.y += gravity * dt;
        if damping > 0.0 {
            self.velocity *= (1.0 - damping * dt).max(0.0);
        }
        self.clamp_velocity(max_velocity);
        self.position += self.velocity * dt;
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.radius.is_finite()
    }

    /// Bounding box as (x, y, width, height)
    pub fn aabb(&self) -> (f32, f32, f32, f32) {
        let d = self.radius * 2.0;
        (self.position.x - self.radius, self.position.y - self.radius, d, d)
    }

    /// Lowest point of the body (screen space)
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_is_clamped() {
        let body = RigidBody::new(Vec2::ZERO, -3.0);
        assert_eq!(body.radius, MIN_BODY_RADIUS);
    }

    #[test]
    fn test_integrate_clamps_speed() {
        let mut body = RigidBody::new(Vec2::ZERO, 10.0);
        body.velocity = Vec2::new(0.0, 5000.0);
        body.integrate(900.0, 0.0, 900.0, 1.0 / 60.0);
        assert!(body.speed() <= 900.0 + 1e-3);
        assert!((body.position.y - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_damping_never_reverses() {
        let mut body = RigidBody::new(Vec2::ZERO, 10.0);
        body.velocity = Vec2::new(10.0, 0.0);
        body.integrate(0.0, 1000.0, 900.0, 0.1);
        assert_eq!(body.velocity, Vec2::ZERO);
    }
}
