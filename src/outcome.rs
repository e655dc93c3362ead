//! Run outcome reporting
//!
//! When a run ends the engine hands an `Outcome` to an `OutcomeReporter`
//! exactly once. `ScoreSubmitter` forwards it to a `ScoringService` and
//! keeps the result as a status the host can display; failures never
//! reach gameplay.

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::sim::EndReason;

/// Final result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub game_id: String,
    pub final_score: i64,
    /// Rounds started, including the one the run ended in
    pub rounds: u32,
    pub reason: Option<EndReason>,
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position
    pub pos: usize,
    pub user: String,
    pub score: i64,
}

/// Scoring service reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub saved: bool,
    pub message: String,
    pub ranking: Vec<RankedEntry>,
}

/// Remote (or in-memory) score sink
pub trait ScoringService {
    fn submit_score(
        &mut self,
        user_id: Option<&str>,
        game_id: &str,
        score: i64,
    ) -> Result<SubmitResponse, ScoringError>;
}

/// Receives a run's outcome once it has ended
pub trait OutcomeReporter {
    fn report(&mut self, outcome: &Outcome);
}

/// Discards outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl OutcomeReporter for NullReporter {
    fn report(&mut self, _outcome: &Outcome) {}
}

/// Holds outcomes until the host collects them (web facade)
#[derive(Debug, Clone, Default)]
pub struct PendingOutcome {
    pending: Option<Outcome>,
    reported: u32,
}

impl PendingOutcome {
    pub fn take(&mut self) -> Option<Outcome> {
        self.pending.take()
    }

    /// Take the pending outcome as JSON; it stays pending if serialization fails
    pub fn take_json(&mut self) -> Result<Option<String>, serde_json::Error> {
        let Some(outcome) = &self.pending else {
            return Ok(None);
        };
        let json = serde_json::to_string(outcome)?;
        self.pending = None;
        Ok(Some(json))
    }

    /// Total outcomes received
    pub fn reported(&self) -> u32 {
        self.reported
    }
}

impl OutcomeReporter for PendingOutcome {
    fn report(&mut self, outcome: &Outcome) {
        self.pending = Some(outcome.clone());
        self.reported += 1;
    }
}

/// Result of the last submission, for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubmitStatus {
    Saved { ranking: Vec<RankedEntry> },
    /// Accepted by the service but not stored (guest, not good enough)
    NotSaved {
        message: String,
        ranking: Vec<RankedEntry>,
    },
    /// Service failed; the ranking is unavailable
    Failed { message: String },
}

impl SubmitStatus {
    pub fn ranking(&self) -> &[RankedEntry] {
        match self {
            SubmitStatus::Saved { ranking } | SubmitStatus::NotSaved { ranking, .. } => ranking,
            SubmitStatus::Failed { .. } => &[],
        }
    }
}

/// Forwards outcomes to a scoring service
pub struct ScoreSubmitter<S: ScoringService> {
    service: S,
    user_id: Option<String>,
    status: Option<SubmitStatus>,
}

impl<S: ScoringService> ScoreSubmitter<S> {
    pub fn new(service: S, user_id: Option<String>) -> Self {
        Self {
            service,
            user_id,
            status: None,
        }
    }

    pub fn status(&self) -> Option<&SubmitStatus> {
        self.status.as_ref()
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

impl<S: ScoringService> OutcomeReporter for ScoreSubmitter<S> {
    fn report(&mut self, outcome: &Outcome) {
        let result =
            self.service
                .submit_score(self.user_id.as_deref(), &outcome.game_id, outcome.final_score);

        let status = match result {
            Ok(response) if response.saved => SubmitStatus::Saved {
                ranking: response.ranking,
            },
            Ok(response) => SubmitStatus::NotSaved {
                message: response.message,
                ranking: response.ranking,
            },
            Err(e) => {
                log::warn!("Score submission failed for {}: {}", outcome.game_id, e);
                SubmitStatus::Failed {
                    message: "could not save score".to_string(),
                }
            }
        };
        log::info!("Submitted {} for {}: {:?}", outcome.final_score, outcome.game_id, status);
        self.status = Some(status);
    }
}
