//! Error types for the fallible boundaries (settings and scoring)
//!
//! The simulation itself never fails; see `sim::step` for how degenerate
//! input is handled.

use thiserror::Error;

/// Settings loading and validation errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file could not be read
    #[error("Failed to read settings from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Malformed JSON
    #[error("Invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// Well-formed but unusable value
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Scoring service errors
#[derive(Debug, Error)]
pub enum ScoringError {
    /// No leaderboard registered for this game id
    #[error("Unknown game: {0}")]
    UnknownGame(String),
    /// Score was not a valid value for the game
    #[error("Invalid score {score} for {game_id}")]
    InvalidScore { game_id: String, score: i64 },
    /// Service could not be reached
    #[error("Scoring service unavailable: {0}")]
    Transport(String),
}
