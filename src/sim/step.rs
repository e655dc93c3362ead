//! Simulation step
//!
//! Advances one body by one time slice against the obstacle set. The slice
//! is split into substeps so the body never travels more than half its
//! radius between contact checks.
//!
//! Per substep, in this order:
//! 1. gravity, damping, speed clamp, integration
//! 2. line segments, then wall segments (bounce + push-out)
//! 3. traffic boxes (fatal, ends the step)
//! 4. goal test on the corrected position
//!
//! The bounds test runs once after the last substep.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::RigidBody;
use super::geometry::{box_overlap, resolve_segment_contact};
use super::obstacle::{Obstacle, ObstacleSet, Surface, TargetZone};
use super::state::Arena;
use crate::consts::{MAX_SUBSTEPS, SUBSTEP_TRAVEL};

/// Physics inputs for a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub gravity: f32,
    pub restitution_line: f32,
    pub restitution_wall: f32,
    pub max_velocity: f32,
    /// Linear damping per second (0 = none)
    pub damping: f32,
    /// Goal region, if this pass can score
    pub goal: Option<TargetZone>,
    pub arena: Arena,
    pub out_of_bounds_margin: f32,
}

/// What happened during a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Obstacles that bounced the body this step
    pub contacts: u32,
    /// Box the body ran into
    pub fatal: Option<u32>,
    pub reached_goal: bool,
    pub out_of_bounds: bool,
    pub substeps: u32,
}

/// Number of substeps needed to keep travel under `SUBSTEP_TRAVEL` radii
pub fn substep_count(body: &RigidBody, params: &StepParams, dt: f32) -> u32 {
    let top_speed = (body.speed() + params.gravity.abs() * dt).min(params.max_velocity);
    let travel = top_speed * dt;
    let per_substep = body.radius * SUBSTEP_TRAVEL;
    if per_substep <= 0.0 || !travel.is_finite() {
        return 1;
    }
    ((travel / per_substep).ceil() as u32).clamp(1, MAX_SUBSTEPS)
}

/// Advance `body` by `dt` seconds
pub fn step(body: &mut RigidBody, obstacles: &ObstacleSet, params: &StepParams, dt: f32) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    if !dt.is_finite() || dt <= 0.0 {
        return outcome;
    }

    let last_good = *body;
    let substeps = substep_count(body, params, dt);
    let h = dt / substeps as f32;
    // One bounce per obstacle per step; later overlaps only correct position
    let mut bounced = vec![false; obstacles.len()];

    for _ in 0..substeps {
        outcome.substeps += 1;
        let from = body.position;
        body.integrate(params.gravity, params.damping, params.max_velocity, h);

        for (i, obstacle) in obstacles.iter().enumerate() {
            match obstacle {
                Obstacle::Segment { segment, surface } => {
                    let restitution = match surface {
                        Surface::Line => params.restitution_line,
                        Surface::Wall => params.restitution_wall,
                    };
                    let first = !bounced[i];
                    if resolve_segment_contact(body, Some(from), segment.a, segment.b, restitution, first)
                        && first
                    {
                        bounced[i] = true;
                        outcome.contacts += 1;
                    }
                }
                Obstacle::Box(lane_box) => {
                    let (bx, by, bw, bh) = body.aabb();
                    if box_overlap(bx, by, bw, bh, lane_box.x, lane_box.y, lane_box.width, lane_box.height) {
                        outcome.fatal = Some(lane_box.id);
                        break;
                    }
                }
            }
        }

        if outcome.fatal.is_some() {
            break;
        }

        if params.goal.is_some_and(|goal| goal.contains(body.position)) {
            outcome.reached_goal = true;
            break;
        }
    }

    if !body.is_finite() {
        log::warn!("Non-finite body after step, restoring last good state");
        *body = last_good;
        body.velocity = Vec2::ZERO;
    }

    if outcome.fatal.is_none() && !outcome.reached_goal {
        outcome.out_of_bounds = !params
            .arena
            .contains(body.position, params.out_of_bounds_margin);
    }

    if outcome.contacts > 0 {
        log::trace!("Step contacts: {} at {:?}", outcome.contacts, body.position);
    }

    outcome
}
