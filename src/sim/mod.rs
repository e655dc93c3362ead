//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep, clamped before use
//! - Seeded RNG only, keyed by (run seed, round index)
//! - Stable obstacle order (lines, walls, then boxes)
//! - No rendering, scoring service or platform dependencies

pub mod body;
pub mod difficulty;
pub mod geometry;
pub mod obstacle;
pub mod round;
pub mod state;
pub mod step;
pub mod tick;

pub use body::RigidBody;
pub use difficulty::{DifficultyCurve, RoundParameters, generate_round};
pub use geometry::{
    SegmentDistance, box_overlap, circle_segment_collision, point_segment_distance, reflect,
    segments_cross,
};
pub use obstacle::{Lane, LaneBox, Obstacle, ObstacleSet, Segment, Surface, TargetZone};
pub use round::{Round, RoundDirector};
pub use state::{Arena, EndReason, GameEvent, GamePhase, GameState};
pub use step::{StepOutcome, StepParams, step};
pub use tick::{Commit, TickInput, tick};
