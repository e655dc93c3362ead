//! Difficulty curve
//!
//! Pure mapping from the running score to the numeric parameters of a
//! round. Every field is clamped into a documented range so no tuning
//! mistake can produce a degenerate round.
//!
//! Directions as score grows:
//! - `target_width`: non-increasing, approaches `min_target_width`
//! - `gravity`, `lane_speed`, `spawn_rate`, `lane_count`: non-decreasing, capped
//! - `restitution_line`, `restitution_wall`, `max_velocity`: constant

use serde::{Deserialize, Serialize};

use crate::consts::{LANE_BOX_WIDTH, MAX_LANES, MAX_VELOCITY, MIN_GAP};

/// Parameters for one round, immutable while it lasts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundParameters {
    pub tier: u32,
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    pub restitution_line: f32,
    pub restitution_wall: f32,
    pub max_velocity: f32,
    /// Width of the goal region
    pub target_width: f32,
    /// Traffic spawns per second per lane
    pub spawn_rate: f32,
    /// Base traffic speed (pixels/s)
    pub lane_speed: f32,
    pub lane_count: u32,
}

/// Tunable curve, stateless and shared across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyCurve {
    /// Points per tier
    pub tier_step: u32,
    pub max_tier: u32,

    pub base_gravity: f32,
    pub gravity_per_tier: f32,
    pub max_gravity: f32,

    pub restitution_line: f32,
    pub restitution_wall: f32,
    pub max_velocity: f32,

    pub base_target_width: f32,
    pub min_target_width: f32,
    /// Fraction of the remaining shrinkable width kept per point
    pub target_decay: f32,

    pub base_lane_speed: f32,
    pub lane_speed_per_tier: f32,
    pub max_lane_speed: f32,

    pub base_spawn_rate: f32,
    pub spawn_rate_per_tier: f32,
    pub max_spawn_rate: f32,

    pub base_lanes: u32,
    /// Tiers per extra lane
    pub tiers_per_lane: u32,
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        Self {
            tier_step: 3,
            max_tier: 8,

            base_gravity: 900.0,
            gravity_per_tier: 60.0,
            max_gravity: 1400.0,

            restitution_line: 0.72,
            restitution_wall: 0.35,
            max_velocity: MAX_VELOCITY,

            base_target_width: 160.0,
            min_target_width: 56.0,
            target_decay: 0.92,

            base_lane_speed: 90.0,
            lane_speed_per_tier: 25.0,
            max_lane_speed: 320.0,

            base_spawn_rate: 0.5,
            spawn_rate_per_tier: 0.12,
            max_spawn_rate: 1.6,

            base_lanes: 3,
            tiers_per_lane: 2,
        }
    }
}

/// Clamp into `[min, max]` without panicking on inverted bounds; NaN maps to `min`
#[inline]
fn clamp_param(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

impl DifficultyCurve {
    /// Coarse difficulty bucket: floor(score / tier_step), capped at max_tier
    pub fn tier(&self, score: u32) -> u32 {
        (score / self.tier_step.max(1)).min(self.max_tier)
    }

    /// Parameters for a round played at `score`
    pub fn generate_round(&self, score: u32) -> RoundParameters {
        let tier = self.tier(score);
        let t = tier as f32;

        let gravity = clamp_param(
            self.base_gravity + self.gravity_per_tier * t,
            0.0,
            self.max_gravity,
        );

        let min_width = self.min_target_width.max(1.0);
        let base_width = self.base_target_width.max(min_width);
        let decay = clamp_param(self.target_decay, 0.0, 1.0);
        let shrink = decay.powi(score.min(i32::MAX as u32) as i32);
        let target_width = clamp_param(
            min_width + (base_width - min_width) * shrink,
            min_width,
            base_width,
        );

        let lane_speed = clamp_param(
            self.base_lane_speed + self.lane_speed_per_tier * t,
            1.0,
            self.max_lane_speed.max(1.0),
        );

        // Spacing between consecutive boxes must stay at least MIN_GAP
        let gap_limited_rate = lane_speed / (LANE_BOX_WIDTH + MIN_GAP);
        let spawn_rate = clamp_param(
            self.base_spawn_rate + self.spawn_rate_per_tier * t,
            0.05,
            self.max_spawn_rate.min(gap_limited_rate),
        );

        let lane_count = (self.base_lanes + tier / self.tiers_per_lane.max(1)).clamp(1, MAX_LANES);

        let params = RoundParameters {
            tier,
            gravity,
            restitution_line: clamp_param(self.restitution_line, 0.0, 1.0),
            restitution_wall: clamp_param(self.restitution_wall, 0.0, 1.0),
            max_velocity: clamp_param(self.max_velocity, 1.0, MAX_VELOCITY),
            target_width,
            spawn_rate,
            lane_speed,
            lane_count,
        };

        log::debug!("Round params for score {}: {:?}", score, params);
        params
    }
}

/// Parameters from the default curve
pub fn generate_round(score: u32) -> RoundParameters {
    DifficultyCurve::default().generate_round(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tier_is_capped() {
        let curve = DifficultyCurve::default();
        assert_eq!(curve.tier(0), 0);
        assert_eq!(curve.tier(5), 1);
        assert_eq!(curve.tier(10_000), curve.max_tier);
    }

    #[test]
    fn test_zero_tier_step_does_not_divide_by_zero() {
        let curve = DifficultyCurve {
            tier_step: 0,
            ..Default::default()
        };
        assert_eq!(curve.tier(4), 4);
    }

    #[test]
    fn test_degenerate_tuning_is_clamped() {
        let curve = DifficultyCurve {
            min_target_width: -10.0,
            base_target_width: f32::NAN,
            base_gravity: -500.0,
            restitution_line: 3.0,
            max_lane_speed: -1.0,
            ..Default::default()
        };
        let params = curve.generate_round(7);
        assert!(params.target_width >= 1.0);
        assert!(params.gravity >= 0.0);
        assert_eq!(params.restitution_line, 1.0);
        assert!(params.lane_speed >= 1.0);
        assert!(params.spawn_rate > 0.0);
    }

    #[test]
    fn test_spawn_rate_respects_min_gap() {
        let params = generate_round(1000);
        let spacing = params.lane_speed / params.spawn_rate - LANE_BOX_WIDTH;
        assert!(spacing >= MIN_GAP - 1e-3);
    }

    proptest! {
        #[test]
        fn parameters_stay_within_bounds(score in 0u32..100_000) {
            let curve = DifficultyCurve::default();
            let p = curve.generate_round(score);
            prop_assert!(p.target_width >= curve.min_target_width);
            prop_assert!(p.target_width <= curve.base_target_width);
            prop_assert!(p.gravity <= curve.max_gravity);
            prop_assert!(p.lane_speed <= curve.max_lane_speed);
            prop_assert!(p.spawn_rate <= curve.max_spawn_rate);
            prop_assert!(p.lane_count >= 1 && p.lane_count <= MAX_LANES);
            prop_assert!(p.max_velocity <= MAX_VELOCITY);
        }

        #[test]
        fn parameters_move_monotonically(score in 0u32..10_000) {
            let curve = DifficultyCurve::default();
            let a = curve.generate_round(score);
            let b = curve.generate_round(score + 1);
            prop_assert!(b.target_width <= a.target_width);
            prop_assert!(b.gravity >= a.gravity);
            prop_assert!(b.lane_speed >= a.lane_speed);
            prop_assert!(b.spawn_rate >= a.spawn_rate);
            prop_assert!(b.lane_count >= a.lane_count);
        }
    }
}
