//! Host-facing engine
//!
//! Owns a `GameState` and an `OutcomeReporter`. The host calls `tick`
//! once per frame and reads `snapshot` to draw.

use serde::Serialize;

use crate::outcome::{Outcome, OutcomeReporter};
use crate::settings::{GameMode, Settings};
use crate::sim::{
    self, Commit, EndReason, GameEvent, GamePhase, GameState, ObstacleSet, RigidBody, TargetZone,
    TickInput,
};

/// Read-only view for rendering
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Snapshot<'a> {
    pub body: &'a RigidBody,
    pub obstacles: &'a ObstacleSet,
    pub target: &'a TargetZone,
    pub phase: GamePhase,
    pub score: u32,
    pub round: u32,
}

pub struct Engine<R: OutcomeReporter> {
    state: GameState,
    reporter: R,
    /// Commit queued for the next tick
    pending: Option<Commit>,
}

impl<R: OutcomeReporter> Engine<R> {
    pub fn new(mode: GameMode, seed: u64, settings: Settings, reporter: R) -> Self {
        log::info!("Starting {} run (seed {})", mode.as_str(), seed);
        Self {
            state: GameState::new(mode, seed, settings),
            reporter,
            pending: None,
        }
    }

    /// Queue a commit for the next tick; a later call replaces it
    pub fn commit(&mut self, commit: Commit) {
        self.pending = Some(commit);
    }

    /// Advance one frame; the outcome is reported after the frame that ended the run.
    ///
    /// A commit in `input` takes precedence over a queued one.
    pub fn tick(&mut self, raw_dt: f32, input: &TickInput) -> Vec<GameEvent> {
        let queued = self.pending.take();
        let input = TickInput {
            commit: input.commit.or(queued),
        };
        let events = sim::tick(&mut self.state, &input, raw_dt);
        self.flush_outcome();
        events
    }

    /// End the run from the host side (quit, navigation)
    pub fn end_run(&mut self) {
        self.state.end_run(EndReason::Abandoned);
        self.flush_outcome();
    }

    /// Start over with the same mode, seed and settings
    pub fn reset(&mut self) {
        self.pending = None;
        self.state.reset();
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            body: &self.state.body,
            obstacles: &self.state.obstacles,
            target: &self.state.round.target,
            phase: self.state.phase,
            score: self.state.score,
            round: self.state.round.index,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    /// Hand the reporter back, e.g. to carry a leaderboard into the next run
    pub fn into_reporter(self) -> R {
        self.reporter
    }

    pub fn is_over(&self) -> bool {
        self.state.phase == GamePhase::Ended
    }

    fn flush_outcome(&mut self) {
        if let Some(score) = self.state.claim_outcome() {
            let outcome = Outcome {
                game_id: self.state.mode.game_id().to_string(),
                final_score: i64::from(score),
                rounds: self.state.round.index + 1,
                reason: self.state.end_reason,
            };
            self.reporter.report(&outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::outcome::{NullReporter, PendingOutcome};

    fn engine(mode: GameMode) -> Engine<PendingOutcome> {
        Engine::new(mode, 5, Settings::default(), PendingOutcome::default())
    }

    #[test]
    fn test_outcome_reported_once() {
        let mut engine = engine(GameMode::LineBounce);
        engine.tick(SIM_DT, &TickInput::advance());
        for _ in 0..600 {
            engine.tick(SIM_DT, &TickInput::default());
        }
        assert!(engine.is_over());
        engine.end_run();
        engine.end_run();
        engine.tick(SIM_DT, &TickInput::default());

        assert_eq!(engine.reporter().reported(), 1);
        let outcome = engine.reporter_mut().take().unwrap();
        assert_eq!(outcome.game_id, "line-bounce");
        assert_eq!(outcome.reason, Some(EndReason::OutOfBounds));
    }

    #[test]
    fn test_nothing_reported_before_end() {
        let mut engine = engine(GameMode::LaneCross);
        engine.tick(SIM_DT, &TickInput::default());
        assert!(!engine.is_over());
        assert_eq!(engine.reporter().reported(), 0);
    }

    #[test]
    fn test_abandon_reports() {
        let mut engine = engine(GameMode::LaneCross);
        engine.end_run();
        assert_eq!(engine.reporter().reported(), 1);
        assert_eq!(
            engine.reporter_mut().take().map(|o| o.reason),
            Some(Some(EndReason::Abandoned))
        );
    }

    #[test]
    fn test_reset_allows_a_new_report() {
        let fresh = GameState::new(GameMode::LineBounce, 5, Settings::default());
        let mut engine = engine(GameMode::LineBounce);
        engine.end_run();
        engine.reset();
        assert_eq!(engine.state(), &fresh);
        engine.end_run();
        assert_eq!(engine.reporter().reported(), 2);
    }

    #[test]
    fn test_queued_commit_is_consumed_once() {
        let mut engine = engine(GameMode::LineBounce);
        engine.commit(Commit::Advance);
        let events = engine.tick(SIM_DT, &TickInput::default());
        assert_eq!(events, vec![GameEvent::Committed]);
        assert_eq!(engine.state().phase, GamePhase::PreRoll);
        assert!(engine.pending.is_none());
    }

    #[test]
    fn test_snapshot_serializes() {
        let engine = Engine::new(GameMode::LaneCross, 5, Settings::default(), NullReporter);
        let json = serde_json::to_string(&engine.snapshot()).unwrap();
        assert!(json.contains("\"phase\":\"Input\""));
    }
}
