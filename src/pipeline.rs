// THEORY:
// The `pipeline` module is the top-level API of the auto-framing engine. It chains
// the stages in `core_modules` into a single per-frame transformation:
//
//     frame -> sample -> detect -> aggregate -> resolve focus -> resolve zoom -> render
//
// Key architectural principles:
// 1.  **Explicit State**: everything that survives between frames is a `PipelineState`
//     value. `step` takes the old state by value and returns the new one beside the
//     output, so the whole engine is a reducer over a frame sequence.
// 2.  **Strict Stage Order**: each stage reads only what earlier stages of the same
//     invocation produced plus the previous invocation's stored state. Every stage is
//     internally row-parallel; the stages themselves run one after another.
// 3.  **Session Boundaries**: a change in frame dimensions cannot be blended with the
//     previous frame, so the state is reset to session start and a warning is logged.
// 4.  **Infallible Core**: `step` never fails. Validation happens once, when a
//     `FocusPipeline` is built or reconfigured.

use crate::config::FocusConfig;
use crate::core_modules::audio::{AudioSource, SilentAudio};
use crate::core_modules::debug_view::{self, DebugView};
use crate::core_modules::focus_resolver::{self, FocusResolution};
use crate::core_modules::frame_sampler::{self, ReducedFrame};
use crate::core_modules::motion_detector::{self, MotionField};
use crate::core_modules::point::Point;
use crate::core_modules::spatial_aggregator::{self, FocusStatistics};
use crate::core_modules::viewport::{self, Viewport};
use crate::core_modules::zoom_resolver::{self, ZoomResolution};
use crate::error::{FocusError, FocusResult};
use image::RgbaImage;
use std::sync::Arc;
use tracing::{debug, trace, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::state_store::PipelineState;

/// What the pipeline decided for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusReport {
    /// Zero-based index of the frame within the current session.
    pub frame_index: u64,
    pub statistics: FocusStatistics,
    pub focus: FocusResolution,
    pub zoom: ZoomResolution,
}

impl FocusReport {
    /// The focus point stored for the next frame.
    pub fn focus_point(&self) -> Point {
        self.focus.focus
    }

    /// The transform the output image was rendered through.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.focus.focus, self.zoom.scale)
    }
}

/// The per-frame result: the image to present and the report behind it.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub image: RgbaImage,
    pub report: FocusReport,
}

/// Advances the pipeline by one frame.
///
/// `config` is used as given; call `FocusConfig::validate` beforehand to reject
/// out-of-range values.
pub fn step(
    mut state: PipelineState,
    frame: &RgbaImage,
    config: &FocusConfig,
    audio: &dyn AudioSource,
) -> (PipelineState, FrameOutput) {
    let (width, height) = frame.dimensions();
    let reduced_size = frame_sampler::reduced_dimensions(width, height, config.reduction_factor);
    if let Some(previous) = state.previous_frame() {
        if previous.dimensions() != reduced_size {
            warn!(
                previous = ?previous.dimensions(),
                current = ?reduced_size,
                "frame dimensions changed, starting a new session"
            );
            state.reset();
        }
    }

    // Stage 1: Frame Sampling
    let mut reduced = state
        .take_frame_buffer()
        .unwrap_or_else(|| ReducedFrame::blank(0, 0));
    frame_sampler::sample_into(frame, config.reduction_factor, &mut reduced);
    trace!(width = reduced.width(), height = reduced.height(), "sampled frame");

    // Stage 2: Motion Detection
    let mut motion = state
        .take_motion_buffer()
        .unwrap_or_else(|| MotionField::zeros(0, 0));
    motion_detector::detect_into(
        &reduced,
        state.previous_frame(),
        state.previous_motion(),
        &config.motion_params(),
        &mut motion,
    );
    trace!(peak = motion.peak(), mean = motion.mean(), "detected motion");

    // Stage 3: Spatial Aggregation
    let statistics = spatial_aggregator::aggregate(&motion, config.aggregation_grid);
    trace!(quadrants = ?statistics.quadrants.as_array(), "aggregated motion");

    // Stage 4: Focus Resolution
    let focus = focus_resolver::resolve(
        &statistics,
        state.previous_focus(),
        &config.focus_params(audio),
    );

    // Stage 5: Zoom Resolution
    let zoom = zoom_resolver::resolve(
        &statistics.quadrants,
        focus.distribution_factor,
        &config.zoom_params(audio),
    );

    // Stage 6: Output
    let image = match config.debug_view {
        DebugView::Off => viewport::render(frame, Viewport::new(focus.focus, zoom.scale)),
        DebugView::MotionField => debug_view::render_motion_field(&motion, width, height),
        DebugView::QuadrantStats => {
            debug_view::render_quadrant_statistics(&statistics, focus.focus, width, height)
        }
    };

    // Stage 7: Store
    let frame_index = state.store(reduced, motion, focus.focus);
    debug!(
        frame_index,
        focus_x = focus.focus.x,
        focus_y = focus.focus.y,
        zoom = zoom.amount,
        "frame processed"
    );

    let report = FocusReport {
        frame_index,
        statistics,
        focus,
        zoom,
    };
    (state, FrameOutput { image, report })
}

/// The main, top-level struct for the auto-framing engine.
///
/// Owns a validated configuration, the cross-frame state and the audio source.
pub struct FocusPipeline {
    config: FocusConfig,
    state: PipelineState,
    audio: Arc<dyn AudioSource>,
}

impl FocusPipeline {
    pub fn new(config: FocusConfig) -> FocusResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: PipelineState::new(),
            audio: Arc::new(SilentAudio),
        })
    }

    /// Replaces the audio source that modulates the focus and zoom strengths.
    pub fn with_audio(mut self, audio: Arc<dyn AudioSource>) -> Self {
        self.audio = audio;
        self
    }

    pub fn process_frame(&mut self, frame: &RgbaImage) -> FrameOutput {
        let state = std::mem::take(&mut self.state);
        let (state, output) = step(state, frame, &self.config, self.audio.as_ref());
        self.state = state;
        output
    }

    /// Processes a tightly packed RGBA8 buffer of `width x height` pixels.
    pub fn process_raw(&mut self, width: u32, height: u32, bytes: &[u8]) -> FocusResult<FrameOutput> {
        let expected = width as usize * height as usize * 4;
        let size_error = || FocusError::FrameSize {
            width,
            height,
            expected,
            actual: bytes.len(),
        };
        if bytes.len() != expected {
            return Err(size_error());
        }
        let frame = RgbaImage::from_raw(width, height, bytes.to_vec()).ok_or_else(size_error)?;
        Ok(self.process_frame(&frame))
    }

    /// Drops all cross-frame state; the next frame starts a new session.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// The focus point the next frame will start from.
    pub fn focus(&self) -> Point {
        self.state.previous_focus()
    }

    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    /// Swaps in a new configuration. The session continues unless the new reduction
    /// factor changes the sampled dimensions.
    pub fn set_config(&mut self, config: FocusConfig) -> FocusResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }
}
