// THEORY:
// The `MotionDetector` is the temporal analysis layer. For every sample of the reduced
// grid it compares the current color with the previous frame's color and folds the
// difference into a persistent per-sample motion intensity, the `MotionField`.
//
// Key architectural principles:
// 1.  **Two-Stage Memory**: The raw frame difference is first blended into the
//     previous motion with an exponential moving average (`smoothness`). The result
//     is then mixed back toward the raw difference by an adaptive `decay`, so a
//     reading that is changing quickly is not held back by its own history.
// 2.  **Adaptive Decay**: The decay drops below `fade_rate` only when the smoothed
//     motion jumps by nearly the full range in one frame; `change_sensitivity`
//     controls how close to a full jump that has to be.
// 3.  **Saturating Arithmetic**: Every sample is clamped to [0, 1]. There are no
//     error conditions; a missing previous frame or previous field reads as zero.
// 4.  **Pure Per-Sample Kernel**: `motion_sample` holds the whole algorithm for one
//     sample; `detect_into` only maps it over the grid in parallel.

use crate::core_modules::frame_sampler::ReducedFrame;
use crate::core_modules::pixel::pixel::Pixel;
use rayon::prelude::*;

/// Tunables for the temporal motion filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    /// EMA weight of the previous motion (0.8..0.999, higher = smoother).
    pub smoothness: f32,
    /// Base weight of the smoothed value against the raw difference (0.8..0.999).
    pub fade_rate: f32,
    /// How far the decay may drop when motion changes abruptly (0..1).
    pub fade_sensitivity: f32,
    /// How close to a full-range jump counts as abrupt (1e3..1e6).
    pub change_sensitivity: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            smoothness: 0.9,
            fade_rate: 0.95,
            fade_sensitivity: 0.5,
            change_sensitivity: 10_000.0,
        }
    }
}

/// A 2D grid of motion intensity in [0, 1], same resolution as the `ReducedFrame`.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionField {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl MotionField {
    /// A field with no motion anywhere.
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width as usize * height as usize],
        }
    }

    /// Builds a field from row-major values, padding or truncating to `width * height`
    /// and clamping every value into [0, 1].
    pub fn from_values(width: u32, height: u32, mut values: Vec<f32>) -> Self {
        values.resize(width as usize * height as usize, 0.0);
        for value in values.iter_mut() {
            *value = saturate(*value);
        }
        Self {
            width,
            height,
            values,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn value(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Nearest-cell lookup at a normalized position. Empty fields read as zero.
    pub fn sample_nearest(&self, u: f32, v: f32) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 0.0;
        }
        let x = ((u * self.width as f32) as i64).clamp(0, self.width as i64 - 1) as u32;
        let y = ((v * self.height as f32) as i64).clamp(0, self.height as i64 - 1) as u32;
        self.value(x, y)
    }

    /// The highest intensity in the field.
    pub fn peak(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }

    pub fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.values.resize(width as usize * height as usize, 0.0);
    }
}

#[inline]
fn saturate(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Exponential moving average of motion: `s * previous + (1 - s) * diff`.
pub fn smooth_motion(previous_motion: f32, frame_diff: f32, smoothness: f32) -> f32 {
    smoothness * previous_motion + (1.0 - smoothness) * frame_diff
}

/// The share of the smoothed value kept in the final motion for a given change.
pub fn adaptive_decay(motion_change: f32, params: &MotionParams) -> f32 {
    let steadiness = (1.0 - motion_change).powi(2) * params.change_sensitivity;
    let agitation = (1.0 - steadiness).max(0.0);
    (params.fade_rate - params.fade_sensitivity * agitation).clamp(0.0, 1.0)
}

/// The full temporal filter for one sample.
pub fn motion_sample(frame_diff: f32, previous_motion: f32, params: &MotionParams) -> f32 {
    let frame_diff = saturate(frame_diff);
    let previous_motion = saturate(previous_motion);

    let smoothed = smooth_motion(previous_motion, frame_diff, params.smoothness);
    let motion_change = (smoothed - previous_motion).abs();
    let decay = adaptive_decay(motion_change, params);

    saturate(decay * smoothed + (1.0 - decay) * frame_diff)
}

/// Computes a new motion field into a freshly allocated buffer.
pub fn detect(
    current: &ReducedFrame,
    previous_frame: Option<&ReducedFrame>,
    previous_motion: Option<&MotionField>,
    params: &MotionParams,
) -> MotionField {
    let mut field = MotionField::zeros(0, 0);
    detect_into(current, previous_frame, previous_motion, params, &mut field);
    field
}

/// Computes a new motion field into `target`.
///
/// Previous buffers whose dimensions differ from `current` are treated as absent.
pub fn detect_into(
    current: &ReducedFrame,
    previous_frame: Option<&ReducedFrame>,
    previous_motion: Option<&MotionField>,
    params: &MotionParams,
    target: &mut MotionField,
) {
    let (width, height) = current.dimensions();
    target.resize(width, height);
    if width == 0 || height == 0 {
        return;
    }

    let previous_frame = previous_frame.filter(|frame| frame.dimensions() == (width, height));
    let previous_motion = previous_motion.filter(|field| field.dimensions() == (width, height));
    let current_pixels = current.pixels();
    let row_width = width as usize;

    target
        .values
        .par_chunks_mut(row_width)
        .enumerate()
        .for_each(|(row, motion_row)| {
            let row_start = row * row_width;
            for (column, motion) in motion_row.iter_mut().enumerate() {
                let index = row_start + column;
                let before = previous_frame.map_or(Pixel::default(), |frame| frame.pixels()[index]);
                let prior = previous_motion.map_or(0.0, |field| field.values()[index]);
                let frame_diff = current_pixels[index].mean_abs_difference(&before);
                *motion = motion_sample(frame_diff, prior, params);
            }
        });
}
