//! Diagnostic renderings that replace the transformed image when a debug view is
//! selected. Both are drawn at the output resolution so hosts can present them in
//! place of the normal frame.

use crate::core_modules::motion_detector::MotionField;
use crate::core_modules::point::Point;
use crate::core_modules::spatial_aggregator::{FocusStatistics, Quadrant};
use crate::core_modules::viewport::paint;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Selects what the pipeline emits as its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugView {
    /// The re-framed frame.
    #[default]
    Off,
    /// The raw motion field as grayscale.
    MotionField,
    /// Each quadrant filled with its mean intensity, focus point marked in red.
    QuadrantStats,
}

const FOCUS_MARKER_RADIUS: f32 = 0.015;

fn gray(level: f32) -> Rgba<u8> {
    let byte = (level.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([byte, byte, byte, 255])
}

/// The motion field scaled up to `width x height`, nearest-cell.
pub fn render_motion_field(field: &MotionField, width: u32, height: u32) -> RgbaImage {
    paint(width, height, |uv| gray(field.sample_nearest(uv.x, uv.y)))
}

/// The quadrant means as four flat gray regions with the focus point marked.
pub fn render_quadrant_statistics(
    stats: &FocusStatistics,
    focus: Point,
    width: u32,
    height: u32,
) -> RgbaImage {
    paint(width, height, |uv| {
        if uv.distance(focus) < FOCUS_MARKER_RADIUS {
            return Rgba([255, 0, 0, 255]);
        }
        gray(stats.quadrants.get(Quadrant::containing(uv)))
    })
}
