//! Daily leaderboard
//!
//! In-memory scoring service. Each game keeps one ranking per UTC day,
//! capped at `DAILY_CAP` entries with one entry per user.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::outcome::{RankedEntry, ScoringService, SubmitResponse};
use crate::settings::GameMode;

/// Maximum entries per game per day
pub const DAILY_CAP: usize = 20;
/// Days of rankings kept per game, today included
pub const RETAINED_DAYS: u64 = 2;

/// Which direction wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScoreOrder {
    #[default]
    HigherIsBetter,
    /// Times, move counts
    LowerIsBetter,
}

impl ScoreOrder {
    /// Whether `a` strictly beats `b`
    pub fn is_better(&self, a: i64, b: i64) -> bool {
        match self {
            ScoreOrder::HigherIsBetter => a > b,
            ScoreOrder::LowerIsBetter => a < b,
        }
    }
}

/// A stored score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user: String,
    pub score: i64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GameBoard {
    order: ScoreOrder,
    /// Best-first per day
    days: BTreeMap<NaiveDate, Vec<LeaderboardEntry>>,
}

impl GameBoard {
    /// Keep today and the previous `RETAINED_DAYS - 1` days
    fn prune_before(&mut self, today: NaiveDate) {
        let Some(oldest) = today.checked_sub_days(Days::new(RETAINED_DAYS - 1)) else {
            return;
        };
        self.days.retain(|day, _| *day >= oldest);
    }
}

/// Per-game, per-day rankings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyLeaderboard {
    games: BTreeMap<String, GameBoard>,
}

impl DailyLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaderboard with every built-in mode registered
    pub fn with_modes() -> Self {
        let mut board = Self::new();
        for mode in [GameMode::LineBounce, GameMode::LaneCross] {
            board.register_game(mode.game_id(), ScoreOrder::HigherIsBetter);
        }
        board
    }

    pub fn register_game(&mut self, game_id: &str, order: ScoreOrder) {
        self.games.entry(game_id.to_string()).or_default().order = order;
    }

    /// Ranking for `game_id` on `day`, best first
    pub fn ranking(&self, game_id: &str, day: NaiveDate) -> Result<Vec<RankedEntry>, ScoringError> {
        let board = self
            .games
            .get(game_id)
            .ok_or_else(|| ScoringError::UnknownGame(game_id.to_string()))?;
        Ok(board.days.get(&day).map(|e| ranked(e)).unwrap_or_default())
    }

    /// Submit with an explicit clock
    pub fn submit_score_at(
        &mut self,
        user_id: Option<&str>,
        game_id: &str,
        score: i64,
        now: DateTime<Utc>,
    ) -> Result<SubmitResponse, ScoringError> {
        let board = self
            .games
            .get_mut(game_id)
            .ok_or_else(|| ScoringError::UnknownGame(game_id.to_string()))?;
        if score < 0 {
            return Err(ScoringError::InvalidScore {
                game_id: game_id.to_string(),
                score,
            });
        }

        let order = board.order;
        let today = now.date_naive();
        board.prune_before(today);

        let Some(user) = user_id else {
            return Ok(SubmitResponse {
                saved: false,
                message: "Log in to save your score".to_string(),
                ranking: board.days.get(&today).map(|e| ranked(e)).unwrap_or_default(),
            });
        };
        let entries = board.days.entry(today).or_default();

        let (saved, message) = if let Some(i) = entries.iter().position(|e| e.user == user) {
            if order.is_better(score, entries[i].score) {
                entries.remove(i);
                insert_ranked(entries, order, user, score, now);
                (true, "New personal best")
            } else {
                (false, "Your earlier score today was better")
            }
        } else if entries.len() < DAILY_CAP {
            insert_ranked(entries, order, user, score, now);
            (true, "Score saved")
        } else {
            // Full: only a score strictly better than the cutoff gets in
            let beats_cutoff = entries
                .last()
                .is_some_and(|cutoff| order.is_better(score, cutoff.score));
            if beats_cutoff {
                entries.pop();
                insert_ranked(entries, order, user, score, now);
                (true, "Score saved")
            } else {
                (false, "Not in today's top scores")
            }
        };

        log::debug!("{} submitted {} to {}: saved={}", user, score, game_id, saved);
        Ok(SubmitResponse {
            saved,
            message: message.to_string(),
            ranking: ranked(entries),
        })
    }
}

impl ScoringService for DailyLeaderboard {
    fn submit_score(
        &mut self,
        user_id: Option<&str>,
        game_id: &str,
        score: i64,
    ) -> Result<SubmitResponse, ScoringError> {
        self.submit_score_at(user_id, game_id, score, Utc::now())
    }
}

/// Insert after every entry that is at least as good (ties keep the earlier one first)
fn insert_ranked(
    entries: &mut Vec<LeaderboardEntry>,
    order: ScoreOrder,
    user: &str,
    score: i64,
    now: DateTime<Utc>,
) {
    let pos = entries
        .iter()
        .position(|e| order.is_better(score, e.score))
        .unwrap_or(entries.len());
    entries.insert(
        pos,
        LeaderboardEntry {
            user: user.to_string(),
            score,
            submitted_at: now,
        },
    );
    entries.truncate(DAILY_CAP);
}

fn ranked(entries: &[LeaderboardEntry]) -> Vec<RankedEntry> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| RankedEntry {
            pos: i + 1,
            user: e.user.clone(),
            score: e.score,
        })
        .collect()
}
