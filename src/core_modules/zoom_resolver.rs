// THEORY:
// The `ZoomResolver` decides how far to push in on the focus point. Zoom is transient:
// it is recomputed from scratch every frame from the quadrant statistics and the
// focus resolver's distribution factor, and is never carried across frames.
//
// Zoom grows with the busiest quadrant's intensity and with how concentrated the
// motion is, and shrinks when the whole screen is active (everything moving means
// there is no single subject to push in on). The result is clamped to
// `max_level`, which keeps the zoom scale strictly positive.

use crate::core_modules::spatial_aggregator::QuadrantSums;

/// The largest zoom amount the resolver will ever produce, whatever the configuration.
pub const ZOOM_CEILING: f32 = 0.85;

/// Tunables for zoom resolution. `strength` is already audio-modulated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomParams {
    pub strength: f32,
    pub intensity: f32,
    /// Upper bound on the zoom amount (0.05..0.85).
    pub max_level: f32,
    /// How quickly screen-wide activity damps the zoom (1..20).
    pub global_motion_sensitivity: f32,
}

/// The per-frame zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomResolution {
    /// How far to zoom in, in `[0, max_level]`.
    pub amount: f32,
    /// `1 - amount`; the fraction of the source visible along each axis.
    pub scale: f32,
    /// The damping applied for screen-wide activity (0.5..1).
    pub global_motion_influence: f32,
}

impl ZoomResolution {
    pub const IDENTITY: ZoomResolution = ZoomResolution {
        amount: 0.0,
        scale: 1.0,
        global_motion_influence: 1.0,
    };
}

/// `0.5 * clamp(max(1, 2 - saturate(mean * sensitivity)^3), 1, 2)`.
pub fn global_motion_influence(mean_quadrant: f32, sensitivity: f32) -> f32 {
    let activity = (mean_quadrant * sensitivity).clamp(0.0, 1.0);
    0.5 * (2.0 - activity.powi(3)).max(1.0).clamp(1.0, 2.0)
}

/// Resolves this frame's zoom from the quadrant means and the distribution factor.
pub fn resolve(
    quadrants: &QuadrantSums,
    distribution_factor: f32,
    params: &ZoomParams,
) -> ZoomResolution {
    let influence = global_motion_influence(quadrants.mean(), params.global_motion_sensitivity);
    let raw = quadrants.dominant()
        * distribution_factor.max(0.0)
        * influence
        * params.strength
        * params.intensity;

    let ceiling = if params.max_level.is_nan() {
        0.0
    } else {
        params.max_level.clamp(0.0, ZOOM_CEILING)
    };
    let amount = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, ceiling) };

    ZoomResolution {
        amount,
        scale: 1.0 - amount,
        global_motion_influence: influence,
    }
}
