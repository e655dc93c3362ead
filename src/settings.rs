//! Engine settings
//!
//! Loaded from JSON (file or embedded string); anything omitted falls back
//! to the defaults below. `sanitized()` clamps values that would make the
//! simulation degenerate.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;
use crate::sim::{Arena, DifficultyCurve};

/// Which minigame the engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Draw a line, bounce the falling body into the basket
    #[default]
    LineBounce,
    /// Hop the body across lanes of traffic
    LaneCross,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::LineBounce => "line-bounce",
            GameMode::LaneCross => "lane-cross",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "line-bounce" | "line_bounce" | "bounce" => Some(GameMode::LineBounce),
            "lane-cross" | "lane_cross" | "lanes" => Some(GameMode::LaneCross),
            _ => None,
        }
    }

    /// Identifier reported to the scoring service
    pub fn game_id(&self) -> &'static str {
        self.as_str()
    }

    /// Whether `Input` advances to `Simulating` without a commit
    pub fn auto_advance(&self) -> bool {
        matches!(self, GameMode::LaneCross)
    }

    /// Whether a scored round runs the settling pass
    pub fn settles(&self) -> bool {
        matches!(self, GameMode::LineBounce)
    }
}

/// Per-mode phase durations (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTiming {
    /// Frozen beat between commit and release (0 skips `PreRoll`)
    pub pre_roll: f32,
    /// Longest a `Simulating` phase may last
    pub sim_timeout: f32,
    /// Time spent in `Scored` before moving on
    pub scored_hold: f32,
    /// Longest a `Settling` phase may last
    pub settle_max: f32,
}

impl Default for ModeTiming {
    fn default() -> Self {
        Self {
            pre_roll: PRE_ROLL,
            sim_timeout: SIM_TIMEOUT,
            scored_hold: 0.0,
            settle_max: SETTLE_MAX,
        }
    }
}

impl ModeTiming {
    pub fn lane_cross() -> Self {
        Self {
            pre_roll: 0.0,
            sim_timeout: LANE_TIMEOUT,
            scored_hold: SCORED_HOLD,
            settle_max: 0.0,
        }
    }

    fn sanitized(&self) -> Self {
        let non_negative = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            pre_roll: non_negative(self.pre_roll),
            // A zero timeout would end every run on its first frame
            sim_timeout: if self.sim_timeout.is_finite() && self.sim_timeout > 0.0 {
                self.sim_timeout
            } else {
                SIM_TIMEOUT
            },
            scored_hold: non_negative(self.scored_hold),
            settle_max: non_negative(self.settle_max),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub arena: Arena,
    pub body_radius: f32,
    /// Largest timestep a tick integrates
    pub max_dt: f32,
    /// Speed cap (pixels/s)
    pub max_velocity: f32,
    pub out_of_bounds_margin: f32,

    pub line_bounce: ModeTiming,
    pub lane_cross: ModeTiming,

    pub curve: DifficultyCurve,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            body_radius: BODY_RADIUS,
            max_dt: MAX_DT,
            max_velocity: MAX_VELOCITY,
            out_of_bounds_margin: OUT_OF_BOUNDS_MARGIN,

            line_bounce: ModeTiming::default(),
            lane_cross: ModeTiming::lane_cross(),

            curve: DifficultyCurve::default(),
        }
    }
}

impl Settings {
    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = |name: &'static str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SettingsError::Invalid {
                    field: name,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        };
        positive("arena.width", self.arena.width)?;
        positive("arena.height", self.arena.height)?;
        positive("body_radius", self.body_radius)?;
        positive("max_dt", self.max_dt)?;
        positive("max_velocity", self.max_velocity)?;
        if self.curve.min_target_width > self.curve.base_target_width {
            return Err(SettingsError::Invalid {
                field: "curve.min_target_width",
                reason: "exceeds curve.base_target_width".to_string(),
            });
        }
        Ok(())
    }

    /// Timing for a mode
    pub fn timing(&self, mode: GameMode) -> &ModeTiming {
        match mode {
            GameMode::LineBounce => &self.line_bounce,
            GameMode::LaneCross => &self.lane_cross,
        }
    }

    /// Clamp into a runnable configuration. Idempotent.
    ///
    /// The speed cap is lowered if needed so that a body at full speed
    /// never travels more than `SUBSTEP_TRAVEL` radii per substep.
    pub fn sanitized(&self) -> Self {
        let mut s = self.clone();
        let defaults = Settings::default();
        let or_default = |v: f32, d: f32| if v.is_finite() && v > 0.0 { v } else { d };

        s.arena.width = or_default(s.arena.width, defaults.arena.width).min(MAX_ARENA_SIZE);
        s.arena.height = or_default(s.arena.height, defaults.arena.height).min(MAX_ARENA_SIZE);
        s.body_radius = or_default(s.body_radius, defaults.body_radius).max(MIN_BODY_RADIUS);
        s.max_dt = or_default(s.max_dt, defaults.max_dt).min(MAX_DT);
        s.out_of_bounds_margin = if s.out_of_bounds_margin.is_finite() {
            s.out_of_bounds_margin.max(0.0)
        } else {
            defaults.out_of_bounds_margin
        };

        let tunnel_cap = s.body_radius * SUBSTEP_TRAVEL * MAX_SUBSTEPS as f32 / s.max_dt;
        let max_velocity = or_default(s.max_velocity, defaults.max_velocity)
            .min(MAX_VELOCITY)
            .min(tunnel_cap);
        if max_velocity < s.max_velocity {
            log::debug!("max_velocity clamped {} -> {}", s.max_velocity, max_velocity);
        }
        s.max_velocity = max_velocity;
        s.curve.max_velocity = s.curve.max_velocity.min(max_velocity);

        s.line_bounce = s.line_bounce.sanitized();
        s.lane_cross = s.lane_cross.sanitized();
        s
    }
}
