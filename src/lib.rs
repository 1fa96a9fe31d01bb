// THEORY:
// This file is the main entry point for the `waldo_focus` library crate.
// It exposes the auto-framing engine to a rendering host: hand it a frame, get back
// the same frame re-framed around whatever is moving on screen.
//
// The public surface is intentionally small:
// - `pipeline`: the pure `step` reducer, the owning `FocusPipeline` wrapper and the
//   per-frame `FocusReport`.
// - `parallel_pipeline`: an async `FocusService` that feeds frames to a single
//   ordered worker.
// - `config` / `error`: the tunable parameters and the edge-of-crate error type.
//
// The stage implementations (`core_modules`) are public so hosts and tests can drive
// individual stages, but most consumers only need `pipeline`.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::FocusConfig;
pub use error::{FocusError, FocusResult};
pub use pipeline::{FocusPipeline, FocusReport, FrameOutput, PipelineState};
