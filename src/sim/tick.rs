//! Per-frame tick
//!
//! Drives the phase machine: consumes at most one commit, runs the
//! simulation step while the body is live, and commits transitions.
//! Every timed transition compares the accumulated phase time against a
//! threshold, so nothing is scheduled outside the tick.

use serde::{Deserialize, Serialize};

use super::obstacle::Segment;
use super::state::{EndReason, GameEvent, GamePhase, GameState};
use super::step::{StepParams, step};
use crate::clamp_dt;
use crate::consts::*;
use crate::settings::GameMode;

/// A player action, already debounced by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Commit {
    /// Release a drawn line (line bounce)
    Line(Segment),
    /// Release without a line, or hop one lane forward
    Advance,
}

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub commit: Option<Commit>,
}

impl TickInput {
    pub fn line(segment: Segment) -> Self {
        Self {
            commit: Some(Commit::Line(segment)),
        }
    }

    pub fn advance() -> Self {
        Self {
            commit: Some(Commit::Advance),
        }
    }
}

/// Advance the run by one frame of `raw_dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, raw_dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.phase == GamePhase::Ended {
        return events;
    }

    let dt = clamp_dt(raw_dt, state.settings.max_dt);
    state.time_ticks += 1;
    state.phase_elapsed += dt;

    match state.phase {
        GamePhase::Input => handle_input(state, input, &mut events),
        GamePhase::PreRoll => {
            if state.phase_elapsed >= state.timing().pre_roll {
                state.enter_phase(GamePhase::Simulating);
                events.push(GameEvent::Released);
            }
        }
        GamePhase::Simulating => simulate(state, input, dt, &mut events),
        GamePhase::Scored => {
            if state.phase_elapsed >= state.timing().scored_hold {
                if state.mode.settles() {
                    state.enter_phase(GamePhase::Settling);
                } else {
                    next_round(state, &mut events);
                }
            }
        }
        GamePhase::Settling => settle(state, dt, &mut events),
        GamePhase::Ended => {}
    }

    events
}

fn handle_input(state: &mut GameState, input: &TickInput, events: &mut Vec<GameEvent>) {
    if state.mode.auto_advance() {
        release(state, events);
        return;
    }

    match input.commit {
        Some(Commit::Line(segment)) => {
            if !segment.is_finite() {
                log::warn!("Ignoring non-finite line {:?}", segment);
                return;
            }
            state.obstacles.add_line(segment);
            events.push(GameEvent::Committed);
            release(state, events);
        }
        Some(Commit::Advance) => {
            events.push(GameEvent::Committed);
            release(state, events);
        }
        None => {}
    }
}

/// Leave `Input`, through `PreRoll` when the mode has one
fn release(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.timing().pre_roll > 0.0 {
        state.enter_phase(GamePhase::PreRoll);
    } else {
        state.enter_phase(GamePhase::Simulating);
        events.push(GameEvent::Released);
    }
}

fn simulate(state: &mut GameState, input: &TickInput, dt: f32, events: &mut Vec<GameEvent>) {
    let arena = *state.arena();
    state.obstacles.advance(dt, &arena);

    if state.mode == GameMode::LaneCross && input.commit == Some(Commit::Advance) {
        state.body.position.y -= LANE_HEIGHT;
        events.push(GameEvent::Hop);
    }

    let params = StepParams {
        gravity: match state.mode {
            GameMode::LineBounce => state.round.params.gravity,
            GameMode::LaneCross => 0.0,
        },
        restitution_line: state.round.params.restitution_line,
        restitution_wall: state.round.params.restitution_wall,
        max_velocity: state.round.params.max_velocity,
        damping: 0.0,
        goal: Some(state.round.target),
        arena,
        out_of_bounds_margin: state.settings.out_of_bounds_margin,
    };
    let outcome = step(&mut state.body, &state.obstacles, &params, dt);

    if outcome.contacts > 0 {
        events.push(GameEvent::Bounce {
            contacts: outcome.contacts,
        });
    }

    if let Some(obstacle_id) = outcome.fatal {
        end(state, EndReason::Collision { obstacle_id }, events);
    } else if outcome.reached_goal {
        state.score += 1;
        log::info!("Scored! total {}", state.score);
        state.enter_phase(GamePhase::Scored);
        events.push(GameEvent::Scored { score: state.score });
    } else if outcome.out_of_bounds {
        end(state, EndReason::OutOfBounds, events);
    } else if state.phase_elapsed >= state.timing().sim_timeout {
        end(state, EndReason::Timeout, events);
    }
}

/// Phase-local integrator: softer bounces and damping inside the basket
fn settle(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let params = StepParams {
        gravity: state.round.params.gravity,
        restitution_line: SETTLE_RESTITUTION,
        restitution_wall: SETTLE_RESTITUTION,
        max_velocity: state.round.params.max_velocity,
        damping: SETTLE_DAMPING,
        goal: None,
        arena: *state.arena(),
        out_of_bounds_margin: state.settings.out_of_bounds_margin,
    };
    let outcome = step(&mut state.body, &state.obstacles, &params, dt);

    let near_floor = (state.round.floor_y - state.body.bottom()).abs() <= SETTLE_FLOOR_TOLERANCE;
    let resting = near_floor && state.body.speed() < SETTLE_SPEED;
    if resting || outcome.out_of_bounds || state.phase_elapsed >= state.timing().settle_max {
        events.push(GameEvent::Settled);
        next_round(state, events);
    }
}

fn next_round(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.begin_next_round();
    events.push(GameEvent::RoundStarted {
        round: state.round.index,
    });
}

fn end(state: &mut GameState, reason: EndReason, events: &mut Vec<GameEvent>) {
    state.end_run(reason);
    events.push(GameEvent::Ended {
        reason,
        score: state.score,
    });
}
