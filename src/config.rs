//! Configuration for the auto-framing pipeline.
//!
//! Every tunable the host can expose lives in `FocusConfig`. Values outside their
//! documented ranges are rejected by `validate`; the per-frame math itself saturates
//! instead of failing, so a config that skipped validation still renders.

use crate::core_modules::audio::{AudioModulation, AudioSource};
use crate::core_modules::debug_view::DebugView;
use crate::core_modules::focus_resolver::{FocusParams, PrecisionMode};
use crate::core_modules::frame_sampler::DEFAULT_REDUCTION_FACTOR;
use crate::core_modules::motion_detector::MotionParams;
use crate::core_modules::spatial_aggregator::{DEFAULT_GRID_RESOLUTION, MIN_GRID_RESOLUTION};
use crate::core_modules::zoom_resolver::ZoomParams;
use crate::error::{FocusError, FocusResult};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const FOCUS_STRENGTH_RANGE: RangeInclusive<f32> = 0.0..=5.0;
pub const ZOOM_STRENGTH_RANGE: RangeInclusive<f32> = 0.0..=5.0;
pub const MAX_ZOOM_LEVEL_RANGE: RangeInclusive<f32> = 0.05..=0.85;
pub const ZOOM_INTENSITY_RANGE: RangeInclusive<f32> = 0.1..=5.0;
pub const MOTION_SMOOTHNESS_RANGE: RangeInclusive<f32> = 0.8..=0.999;
pub const MOTION_FADE_RATE_RANGE: RangeInclusive<f32> = 0.8..=0.999;
pub const FADE_SENSITIVITY_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const CHANGE_SENSITIVITY_RANGE: RangeInclusive<f32> = 1.0e3..=1.0e6;
pub const GLOBAL_MOTION_SENSITIVITY_RANGE: RangeInclusive<f32> = 1.0..=20.0;
pub const FOCUS_PRECISION_RANGE: RangeInclusive<f32> = 1.0..=5.0;
pub const FOCUS_SMOOTHNESS_RANGE: RangeInclusive<f32> = 0.5..=0.998;
pub const AUDIO_MULTIPLIER_RANGE: RangeInclusive<f32> = 0.0..=10.0;

/// Configuration for the auto-framing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    // === Focus ===
    /// Scale on the center blend; higher lets the focus leave the screen center sooner (0..5).
    pub focus_strength: f32,

    /// Exponent on the distribution factor; higher favours concentrated motion (1..5).
    pub focus_precision: f32,

    /// Share of last frame's focus kept each frame (0.5..0.998).
    pub focus_smoothness: f32,

    /// Which aggregation strategy locates the focus candidate.
    pub precision_mode: PrecisionMode,

    /// Audio band that boosts `focus_strength`.
    pub focus_audio: AudioModulation,

    // === Zoom ===
    /// Scale on the zoom amount (0..5).
    pub zoom_strength: f32,

    /// Second scale on the zoom amount, for fine-tuning (0.1..5).
    pub zoom_intensity: f32,

    /// Largest allowed zoom amount (0.05..0.85).
    pub max_zoom_level: f32,

    /// How quickly screen-wide motion damps the zoom (1..20).
    pub global_motion_sensitivity: f32,

    /// Audio band that boosts `zoom_strength`.
    pub zoom_audio: AudioModulation,

    // === Motion ===
    /// EMA weight of the previous motion (0.8..0.999).
    pub motion_smoothness: f32,

    /// Base decay of smoothed motion (0.8..0.999).
    pub motion_fade_rate: f32,

    /// How far the decay drops for abrupt changes (0..1).
    pub fade_sensitivity: f32,

    /// How close to a full-range jump counts as abrupt (1e3..1e6).
    pub change_sensitivity: f32,

    // === Sampling ===
    /// Source pixels per reduced sample along each axis (>= 1).
    pub reduction_factor: u32,

    /// Aggregation grid samples per axis (>= 3).
    pub aggregation_grid: u32,

    // === Output ===
    /// Emit a diagnostic view instead of the re-framed image.
    pub debug_view: DebugView,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            focus_strength: 1.0,
            focus_precision: 2.0,
            focus_smoothness: 0.9,
            precision_mode: PrecisionMode::default(),
            focus_audio: AudioModulation::default(),
            zoom_strength: 1.0,
            zoom_intensity: 1.0,
            max_zoom_level: 0.35,
            global_motion_sensitivity: 5.0,
            zoom_audio: AudioModulation::default(),
            motion_smoothness: 0.9,
            motion_fade_rate: 0.95,
            fade_sensitivity: 0.5,
            change_sensitivity: 10_000.0,
            reduction_factor: DEFAULT_REDUCTION_FACTOR,
            aggregation_grid: DEFAULT_GRID_RESOLUTION,
            debug_view: DebugView::default(),
        }
    }
}

fn check(name: &'static str, value: f32, range: &RangeInclusive<f32>) -> FocusResult<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(FocusError::out_of_range(name, value, *range.start(), *range.end()))
    }
}

impl FocusConfig {
    /// Checks every parameter against its documented range.
    pub fn validate(&self) -> FocusResult<()> {
        check("focus_strength", self.focus_strength, &FOCUS_STRENGTH_RANGE)?;
        check("focus_precision", self.focus_precision, &FOCUS_PRECISION_RANGE)?;
        check("focus_smoothness", self.focus_smoothness, &FOCUS_SMOOTHNESS_RANGE)?;
        check("focus_audio.multiplier", self.focus_audio.multiplier, &AUDIO_MULTIPLIER_RANGE)?;
        check("zoom_strength", self.zoom_strength, &ZOOM_STRENGTH_RANGE)?;
        check("zoom_intensity", self.zoom_intensity, &ZOOM_INTENSITY_RANGE)?;
        check("max_zoom_level", self.max_zoom_level, &MAX_ZOOM_LEVEL_RANGE)?;
        check(
            "global_motion_sensitivity",
            self.global_motion_sensitivity,
            &GLOBAL_MOTION_SENSITIVITY_RANGE,
        )?;
        check("zoom_audio.multiplier", self.zoom_audio.multiplier, &AUDIO_MULTIPLIER_RANGE)?;
        check("motion_smoothness", self.motion_smoothness, &MOTION_SMOOTHNESS_RANGE)?;
        check("motion_fade_rate", self.motion_fade_rate, &MOTION_FADE_RATE_RANGE)?;
        check("fade_sensitivity", self.fade_sensitivity, &FADE_SENSITIVITY_RANGE)?;
        check("change_sensitivity", self.change_sensitivity, &CHANGE_SENSITIVITY_RANGE)?;

        if self.reduction_factor == 0 {
            return Err(FocusError::ZeroReduction);
        }
        if self.aggregation_grid < MIN_GRID_RESOLUTION {
            return Err(FocusError::GridTooSmall {
                actual: self.aggregation_grid,
                min: MIN_GRID_RESOLUTION,
            });
        }
        Ok(())
    }

    pub fn motion_params(&self) -> MotionParams {
        MotionParams {
            smoothness: self.motion_smoothness,
            fade_rate: self.motion_fade_rate,
            fade_sensitivity: self.fade_sensitivity,
            change_sensitivity: self.change_sensitivity,
        }
    }

    /// Focus tunables with `focus_strength` modulated by the current audio level.
    pub fn focus_params(&self, audio: &dyn AudioSource) -> FocusParams {
        FocusParams {
            mode: self.precision_mode,
            smoothness: self.focus_smoothness,
            precision: self.focus_precision,
            strength: self.focus_audio.apply(self.focus_strength, audio),
        }
    }

    /// Zoom tunables with `zoom_strength` modulated by the current audio level.
    pub fn zoom_params(&self, audio: &dyn AudioSource) -> ZoomParams {
        ZoomParams {
            strength: self.zoom_audio.apply(self.zoom_strength, audio),
            intensity: self.zoom_intensity,
            max_level: self.max_zoom_level,
            global_motion_sensitivity: self.global_motion_sensitivity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::audio::{AudioBand, SilentAudio};

    #[test]
    fn defaults_are_valid() {
        FocusConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn default_strength_lets_a_lone_subject_pull_the_focus() {
        use crate::core_modules::focus_resolver::{center_blend, distribution_factor};
        use crate::core_modules::spatial_aggregator::QuadrantSums;

        let config = FocusConfig::default();
        // A small subject barely lifts the factor above 1.
        for dominant in [0.005, 0.05, 0.5] {
            let factor = distribution_factor(&QuadrantSums::from_array([0.0, dominant, 0.0, 0.0]));
            let blend = center_blend(factor, config.focus_precision, config.focus_strength);
            assert_eq!(blend, 1.0, "dominant {dominant}");
        }
    }

    #[test]
    fn out_of_range_values_are_named() {
        let config = FocusConfig {
            max_zoom_level: 0.95,
            ..FocusConfig::default()
        };
        match config.validate() {
            Err(FocusError::OutOfRange { name, .. }) => assert_eq!(name, "max_zoom_level"),
            other => panic!("expected a range error, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let config = FocusConfig {
            focus_strength: f32::NAN,
            ..FocusConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn sampling_limits_are_enforced() {
        let no_reduction = FocusConfig {
            reduction_factor: 0,
            ..FocusConfig::default()
        };
        assert!(matches!(no_reduction.validate(), Err(FocusError::ZeroReduction)));

        let tiny_grid = FocusConfig {
            aggregation_grid: 2,
            ..FocusConfig::default()
        };
        assert!(matches!(tiny_grid.validate(), Err(FocusError::GridTooSmall { actual: 2, .. })));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: FocusConfig = serde_json::from_str(
            r#"{ "precision_mode": "nine_zone", "zoom_audio": { "band": "bass", "multiplier": 2.0 } }"#,
        )
        .expect("config parses");
        assert_eq!(config.precision_mode, PrecisionMode::NineZone);
        assert_eq!(config.zoom_audio, AudioModulation::new(AudioBand::Bass, 2.0));
        assert_eq!(config.focus_strength, FocusConfig::default().focus_strength);
    }

    #[test]
    fn audio_only_touches_the_strengths() {
        let config = FocusConfig {
            zoom_audio: AudioModulation::new(AudioBand::Volume, 1.0),
            ..FocusConfig::default()
        };
        let loud = |_: AudioBand| -> f32 { 1.0 };
        assert_eq!(config.zoom_params(&SilentAudio).strength, config.zoom_strength);
        assert_eq!(config.zoom_params(&loud).strength, config.zoom_strength * 2.0);
        assert_eq!(config.focus_params(&loud).strength, config.focus_strength);
    }
}
