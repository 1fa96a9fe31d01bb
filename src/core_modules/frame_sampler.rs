// THEORY:
// The `FrameSampler` performs the first step of every invocation: it shrinks the live
// host frame into a `ReducedFrame`, a small grid of averaged color samples that the
// motion layer can difference cheaply.
//
// Key architectural principles:
// 1.  **Spatial Pooling**: Each reduced sample is the average of a `factor x factor`
//     block of source pixels (partial blocks at the right/bottom edges included), so
//     every source pixel contributes to exactly one sample. Averaging also cancels
//     single-pixel sensor or compression noise before it can read as motion.
// 2.  **Buffer Reuse**: `sample_into` overwrites an existing `ReducedFrame`. The
//     state store hands back the buffer from two frames ago, so steady-state
//     operation allocates nothing.
// 3.  **Row Parallelism**: Output rows are independent, so the pass runs them
//     concurrently; the pass is complete before any later stage reads the buffer.

use crate::core_modules::pixel::pixel::Pixel;
use image::RgbaImage;
use rayon::prelude::*;

/// The default fraction of source resolution kept for differencing (half width/height).
pub const DEFAULT_REDUCTION_FACTOR: u32 = 2;

/// A 2D grid of averaged color samples at a fixed fraction of the source resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedFrame {
    /// Width of the grid in samples.
    width: u32,
    /// Height of the grid in samples.
    height: u32,
    /// Row-major samples, `width * height` long.
    pixels: Vec<Pixel>,
}

impl ReducedFrame {
    /// A black frame of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::default(); width as usize * height as usize],
        }
    }

    /// A frame where every sample has the same color.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![pixel; width as usize * height as usize],
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

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// The sample at grid position `(x, y)`, or `None` outside the grid.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels
            .resize(width as usize * height as usize, Pixel::default());
    }
}

/// The reduced grid size for a source frame, rounding partial blocks up.
pub fn reduced_dimensions(width: u32, height: u32, factor: u32) -> (u32, u32) {
    let factor = factor.max(1);
    (width.div_ceil(factor), height.div_ceil(factor))
}

/// Samples `frame` into a freshly allocated `ReducedFrame`.
pub fn sample(frame: &RgbaImage, factor: u32) -> ReducedFrame {
    let mut reduced = ReducedFrame::blank(0, 0);
    sample_into(frame, factor, &mut reduced);
    reduced
}

/// Samples `frame` into `target`, resizing it if the source dimensions changed.
pub fn sample_into(frame: &RgbaImage, factor: u32, target: &mut ReducedFrame) {
    let factor = factor.max(1);
    let (frame_width, frame_height) = frame.dimensions();
    let (width, height) = reduced_dimensions(frame_width, frame_height, factor);
    target.resize(width, height);
    if width == 0 || height == 0 {
        return;
    }

    target
        .pixels
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(row, samples)| {
            let y_start = row as u32 * factor;
            let y_end = (y_start + factor).min(frame_height);
            for (column, sample) in samples.iter_mut().enumerate() {
                let x_start = column as u32 * factor;
                let x_end = (x_start + factor).min(frame_width);

                let mut sum = Pixel::default();
                let mut count = 0u32;
                for y in y_start..y_end {
                    for x in x_start..x_end {
                        sum += Pixel::from(*frame.get_pixel(x, y));
                        count += 1;
                    }
                }
                *sample = sum * (1.0 / count.max(1) as f32);
            }
        });
}
