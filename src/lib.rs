//! Arcade Sim - deterministic 2D simulation core for hypercasual minigames
//!
//! Core modules:
//! - `sim`: Simulation (geometry, physics step, phase machine, round director)
//! - `engine`: Host-facing wrapper driving `tick` and the outcome reporter
//! - `outcome`: Score reporting boundary towards the scoring service
//! - `leaderboard`: In-memory daily leaderboard implementing that service
//! - `settings`: Data-driven configuration
//! - `platform`: Browser facade (wasm32 only)

pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod outcome;
pub mod platform;
pub mod settings;
pub mod sim;

pub use engine::{Engine, Snapshot};
pub use error::{ScoringError, SettingsError};
pub use leaderboard::DailyLeaderboard;
pub use outcome::{
    NullReporter, Outcome, OutcomeReporter, PendingOutcome, ScoreSubmitter, ScoringService, SubmitStatus,
};
pub use settings::{GameMode, Settings};

/// Engine configuration constants
pub mod consts {
    /// Reference frame time for hosts that step at a fixed rate (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest timestep a single tick may integrate
    pub const MAX_DT: f32 = 1.0 / 30.0;
    /// Upper bound on substeps inside one simulation step
    pub const MAX_SUBSTEPS: u32 = 16;
    /// Fraction of the body radius a single substep may travel
    pub const SUBSTEP_TRAVEL: f32 = 0.5;

    /// Body defaults
    pub const BODY_RADIUS: f32 = 12.0;
    pub const MIN_BODY_RADIUS: f32 = 2.0;
    /// Speed cap (pixels/s)
    pub const MAX_VELOCITY: f32 = 900.0;
    /// Extra clearance added when pushing a body out of a segment
    pub const CONTACT_EPSILON: f32 = 0.01;

    /// Arena dimensions (screen space, y grows downward)
    pub const ARENA_WIDTH: f32 = 400.0;
    pub const ARENA_HEIGHT: f32 = 700.0;
    /// Largest accepted arena side
    pub const MAX_ARENA_SIZE: f32 = 4096.0;
    /// Distance past the arena edge before a body counts as lost
    pub const OUT_OF_BOUNDS_MARGIN: f32 = 60.0;
    /// Distance past the arena edge before traffic is despawned
    pub const DESPAWN_MARGIN: f32 = 40.0;

    /// Line bounce timing
    pub const SIM_TIMEOUT: f32 = 8.0;
    pub const PRE_ROLL: f32 = 0.2;

    /// Settling pass
    pub const SETTLE_RESTITUTION: f32 = 0.25;
    pub const SETTLE_DAMPING: f32 = 3.0;
    pub const SETTLE_SPEED: f32 = 12.0;
    pub const SETTLE_FLOOR_TOLERANCE: f32 = 4.0;
    pub const SETTLE_MAX: f32 = 1.5;

    /// Lane geometry
    pub const LANE_HEIGHT: f32 = 56.0;
    pub const LANE_BOX_WIDTH: f32 = 60.0;
    pub const LANE_BOX_HEIGHT: f32 = 34.0;
    /// Smallest horizontal gap allowed between two boxes in a lane
    pub const MIN_GAP: f32 = 70.0;
    pub const MAX_LANES: u32 = 9;
    /// Boxes seeded per lane at round start
    pub const MAX_LANE_TRAFFIC: usize = 12;
    /// Time a lane run may take before it is abandoned
    pub const LANE_TIMEOUT: f32 = 30.0;
    /// Pause after a crossing before the next round starts
    pub const SCORED_HOLD: f32 = 0.35;
}

/// Clamp a raw host frame delta into a usable timestep.
///
/// Negative or non-finite deltas become zero; large ones are capped at `max_dt`.
#[inline]
pub fn clamp_dt(raw_dt: f32, max_dt: f32) -> f32 {
    if !raw_dt.is_finite() || raw_dt <= 0.0 {
        return 0.0;
    }
    raw_dt.min(max_dt.max(0.0))
}

/// Golden-ratio integer hash mapped to [0, 1)
#[inline]
pub fn hash_unit(seed: u32) -> f32 {
    let hash = seed.wrapping_mul(2654435761);
    (hash % 10_000) as f32 / 10_000.0
}
