// THEORY:
// The `FocusResolver` turns one frame's `FocusStatistics` into the stabilized region of
// interest, the `FocusState`. It is the first of two stateful feedback stages (the
// motion filter being the other) and is tuned for camera steadiness rather than
// responsiveness.
//
// Algorithm:
// 1.  **Candidate**: `resolve_center` picks the raw center according to the configured
//     `PrecisionMode`. Quadrant and NineZone modes average their fixed reference
//     positions weighted by each region's intensity; Weighted mode uses the centroid.
//     No motion means the screen center.
// 2.  **Temporal Blend**: the candidate is blended with last frame's focus, moving
//     `1 - smoothness` of the way per frame.
// 3.  **Distribution Factor**: from the quadrant means,
//     `max(1 + dominant - others / 3, 0)`. Concentrated motion scores above 1, motion
//     spread evenly across the screen scores 1.
// 4.  **Center Relaxation**: `centerBlend = saturate(factor^precision * strength)`
//     decides how far the focus may sit from the screen center; weak or diffuse
//     motion pulls the focus back toward the middle.

use crate::core_modules::point::Point;
use crate::core_modules::spatial_aggregator::{
    FocusStatistics, MOTION_EPSILON, Quadrant, QuadrantSums, ZoneSums,
};
use serde::{Deserialize, Serialize};

/// Which aggregation strategy locates the candidate center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionMode {
    /// Weighted average of the four quadrant centers.
    Quadrant,
    /// Weighted average of the nine zone centers.
    NineZone,
    /// The intensity-weighted centroid of the grid.
    #[default]
    Weighted,
}

/// Tunables for focus resolution. `strength` is already audio-modulated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusParams {
    pub mode: PrecisionMode,
    /// Share of last frame's focus kept per frame (0 = follow the candidate directly).
    pub smoothness: f32,
    /// Exponent applied to the distribution factor.
    pub precision: f32,
    /// Scale applied after the exponent.
    pub strength: f32,
}

/// Everything the resolver derived for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusResolution {
    /// The raw center from the selected precision mode.
    pub candidate: Point,
    /// The candidate after blending with last frame's focus.
    pub smoothed: Point,
    /// The new focus state.
    pub focus: Point,
    /// How concentrated the motion is (1 = evenly spread).
    pub distribution_factor: f32,
    /// How far from the screen center the focus was allowed to move (0..1).
    pub center_blend: f32,
}

/// The candidate center for one precision mode.
pub fn resolve_center(mode: PrecisionMode, stats: &FocusStatistics) -> Point {
    if !stats.has_motion() {
        return Point::SCREEN_CENTER;
    }

    match mode {
        PrecisionMode::Quadrant => {
            let weights = stats.quadrants.as_array();
            weighted_reference(Quadrant::ALL.iter().map(|q| q.center()).zip(weights))
        }
        PrecisionMode::NineZone => weighted_reference(
            stats
                .zones
                .zones
                .iter()
                .enumerate()
                .map(|(index, &weight)| (ZoneSums::zone_center(index), weight)),
        ),
        PrecisionMode::Weighted => stats.centroid.center,
    }
}

fn weighted_reference(references: impl Iterator<Item = (Point, f32)>) -> Point {
    let (sum, weight) = references.fold((Point::ORIGIN, 0.0), |(sum, total), (position, weight)| {
        (sum + position * weight, total + weight)
    });
    if weight < MOTION_EPSILON {
        return Point::SCREEN_CENTER;
    }
    sum * (1.0 / weight)
}

/// `max(1 + dominant - others / 3, 0)` over the quadrant means.
pub fn distribution_factor(quadrants: &QuadrantSums) -> f32 {
    (1.0 + quadrants.dominant() - quadrants.sum_of_others() / 3.0).max(0.0)
}

/// `saturate(factor^precision * strength)`.
pub fn center_blend(distribution_factor: f32, precision: f32, strength: f32) -> f32 {
    (distribution_factor.max(0.0).powf(precision) * strength).clamp(0.0, 1.0)
}

/// Resolves the new focus state from this frame's statistics and the previous focus.
pub fn resolve(stats: &FocusStatistics, previous: Point, params: &FocusParams) -> FocusResolution {
    let candidate = resolve_center(params.mode, stats);
    let follow = (1.0 - params.smoothness).clamp(0.0, 1.0);
    let smoothed = previous.lerp(candidate, follow);

    let distribution_factor = distribution_factor(&stats.quadrants);
    let center_blend = center_blend(distribution_factor, params.precision, params.strength);
    let focus = Point::SCREEN_CENTER
        .lerp(smoothed, center_blend)
        .clamp(0.0, 1.0);
    // Stored for the next frame, so it must stay finite.
    let focus = if focus.is_finite() { focus } else { Point::SCREEN_CENTER };

    FocusResolution {
        candidate,
        smoothed,
        focus,
        distribution_factor,
        center_blend,
    }
}
