//! Platform layer
//!
//! The simulation is host-agnostic; this module holds the thin browser
//! facade. Native hosts use `Engine` directly (see `main.rs`).

#[cfg(target_arch = "wasm32")]
pub mod web;
