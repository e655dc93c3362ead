//! Browser facade
//!
//! JS owns the frame loop and the canvas; it queues commits from pointer
//! events, calls `tick` once per animation frame and draws from the JSON
//! snapshot.

use wasm_bindgen::prelude::*;

use crate::engine::Engine;
use crate::outcome::PendingOutcome;
use crate::settings::{GameMode, Settings};
use crate::sim::{Commit, Segment, TickInput};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // Already initialised by an earlier module instance
        return;
    }
    log::info!("Arcade sim loaded");
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WebEngine {
    engine: Engine<PendingOutcome>,
}

#[wasm_bindgen]
impl WebEngine {
    /// `settings_json` may be omitted for defaults
    #[wasm_bindgen(constructor)]
    pub fn new(mode: &str, seed: u32, settings_json: Option<String>) -> Result<WebEngine, JsValue> {
        let mode = GameMode::from_str(mode)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown game mode: {mode}")))?;
        let settings = match settings_json {
            Some(json) => Settings::from_json(&json).map_err(js_error)?,
            None => Settings::default(),
        };
        Ok(Self {
            engine: Engine::new(mode, u64::from(seed), settings, PendingOutcome::default()),
        })
    }

    /// Queue a drawn line for the next tick
    pub fn commit_line(&mut self, ax: f32, ay: f32, bx: f32, by: f32) {
        let segment = Segment::new(glam::Vec2::new(ax, ay), glam::Vec2::new(bx, by));
        self.engine.commit(Commit::Line(segment));
    }

    /// Queue a release or hop for the next tick
    pub fn advance(&mut self) {
        self.engine.commit(Commit::Advance);
    }

    /// Run one frame; returns the frame's events as JSON
    pub fn tick(&mut self, dt: f32) -> Result<String, JsValue> {
        let events = self.engine.tick(dt, &TickInput::default());
        serde_json::to_string(&events).map_err(js_error)
    }

    pub fn end_run(&mut self) {
        self.engine.end_run();
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.snapshot()).map_err(js_error)
    }

    /// Outcome of the finished run, once, for the page to submit
    pub fn take_outcome_json(&mut self) -> Result<Option<String>, JsValue> {
        self.engine.reporter_mut().take_json().map_err(js_error)
    }
}
