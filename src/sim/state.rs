//! Game state and core simulation types
//!
//! Everything a run owns lives in `GameState`; `tick` receives it by
//! `&mut` and nothing else is mutated.

use serde::{Deserialize, Serialize};

use super::body::RigidBody;
use super::obstacle::ObstacleSet;
use super::round::{Round, RoundDirector};
use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH};
use crate::settings::{GameMode, ModeTiming, Settings};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player's commit
    Input,
    /// Short frozen beat between commit and release
    PreRoll,
    /// Physics running
    Simulating,
    /// Post-goal pass letting the body come to rest
    Settling,
    /// Goal reached, waiting out the hold before the next round
    Scored,
    /// Run over
    Ended,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Input => "input",
            GamePhase::PreRoll => "pre_roll",
            GamePhase::Simulating => "simulating",
            GamePhase::Settling => "settling",
            GamePhase::Scored => "scored",
            GamePhase::Ended => "ended",
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Body left the playable bounds
    OutOfBounds,
    /// Round took longer than the mode's timeout
    Timeout,
    /// Fatal contact with lane traffic
    Collision { obstacle_id: u32 },
    /// Host ended the run (quit, navigation)
    Abandoned,
}

/// Something the host may want to react to (sound, haptics, UI)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RoundStarted { round: u32 },
    Committed,
    Released,
    Bounce { contacts: u32 },
    Hop,
    Scored { score: u32 },
    Settled,
    Ended { reason: EndReason, score: u32 },
}

/// Playable rectangle, origin at the top-left, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
        }
    }
}

impl Arena {
    /// Whether `p` lies inside the arena grown by `margin` on every side
    pub fn contains(&self, p: glam::Vec2, margin: f32) -> bool {
        p.x >= -margin && p.x <= self.width + margin && p.y >= -margin && p.y <= self.height + margin
    }
}

/// Complete per-run state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub mode: GameMode,
    /// Run seed for reproducible placement
    pub seed: u64,
    pub settings: Settings,
    /// Current round layout and parameters
    pub round: Round,
    pub body: RigidBody,
    pub obstacles: ObstacleSet,
    pub phase: GamePhase,
    /// Seconds spent in the current phase
    pub phase_elapsed: f32,
    /// Successful rounds this run
    pub score: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub end_reason: Option<EndReason>,
    /// Latch so a run's outcome is reported at most once
    pub(crate) outcome_reported: bool,
}

impl GameState {
    /// Create a fresh run with the first round laid out
    pub fn new(mode: GameMode, seed: u64, settings: Settings) -> Self {
        let settings = settings.sanitized();
        let director = RoundDirector::new(&settings);
        let (round, body, obstacles) = director.build(mode, seed, 0, 0);

        Self {
            mode,
            seed,
            settings,
            round,
            body,
            obstacles,
            phase: GamePhase::Input,
            phase_elapsed: 0.0,
            score: 0,
            time_ticks: 0,
            end_reason: None,
            outcome_reported: false,
        }
    }

    /// Back to creation-time values, dropping obstacles and phase timers
    pub fn reset(&mut self) {
        log::info!("Run reset from {} (score {})", self.phase.as_str(), self.score);
        *self = Self::new(self.mode, self.seed, self.settings.clone());
    }

    /// Timing for the active mode
    pub fn timing(&self) -> &ModeTiming {
        self.settings.timing(self.mode)
    }

    pub fn arena(&self) -> &Arena {
        &self.settings.arena
    }

    /// Switch phase and restart the phase timer
    pub fn enter_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::debug!(
                "Phase {} -> {} after {:.2}s",
                self.phase.as_str(),
                phase.as_str(),
                self.phase_elapsed
            );
        }
        self.phase = phase;
        self.phase_elapsed = 0.0;
    }

    /// Lay out the next round from the current score; only called on entry to `Input`
    pub fn begin_next_round(&mut self) {
        let director = RoundDirector::new(&self.settings);
        let (round, body, obstacles) =
            director.build(self.mode, self.seed, self.round.index + 1, self.score);
        log::info!(
            "Round {} (tier {}, score {})",
            round.index,
            round.params.tier,
            self.score
        );
        self.round = round;
        self.body = body;
        self.obstacles = obstacles;
        self.enter_phase(GamePhase::Input);
    }

    /// Commit the terminal transition
    pub fn end_run(&mut self, reason: EndReason) {
        if self.phase == GamePhase::Ended {
            return;
        }
        log::info!(
            "Run ended: {:?} (score {}, round {})",
            reason,
            self.score,
            self.round.index
        );
        self.end_reason = Some(reason);
        self.enter_phase(GamePhase::Ended);
    }

    /// Take the final score once per run, after `Ended` has been committed
    pub fn claim_outcome(&mut self) -> Option<u32> {
        if self.phase != GamePhase::Ended || self.outcome_reported {
            return None;
        }
        self.outcome_reported = true;
        Some(self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_in_input() {
        let state = GameState::new(GameMode::LineBounce, 7, Settings::default());
        assert_eq!(state.phase, GamePhase::Input);
        assert_eq!(state.score, 0);
        assert_eq!(state.round.index, 0);
        assert!(!state.obstacles.is_empty());
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = GameState::new(GameMode::LaneCross, 42, Settings::default());
        let b = GameState::new(GameMode::LaneCross, 42, Settings::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_claim_outcome_once() {
        let mut state = GameState::new(GameMode::LineBounce, 1, Settings::default());
        assert_eq!(state.claim_outcome(), None);
        state.end_run(EndReason::Abandoned);
        assert_eq!(state.claim_outcome(), Some(0));
        assert_eq!(state.claim_outcome(), None);
    }

    #[test]
    fn test_end_run_keeps_first_reason() {
        let mut state = GameState::new(GameMode::LineBounce, 1, Settings::default());
        state.end_run(EndReason::Timeout);
        state.end_run(EndReason::Abandoned);
        assert_eq!(state.end_reason, Some(EndReason::Timeout));
    }
}
