// THEORY:
// The `ViewportTransformer` produces the final image. For every output pixel it maps
// the pixel's normalized position through the zoom/center transform into the source
// frame and samples the source there:
//
//     source = (uv - center) * scale + center
//
// The transform is anchored on the focus point, so the focus stays put on screen
// while everything around it grows. Two guards keep sampling inside the source:
// 1.  **Overscan Correction**: the output corners (0,0) and (1,1) are pushed through
//     the same transform; if the resulting source window pokes out of [0,1] on an
//     axis, the whole window is shifted back inside on that axis.
// 2.  **Final Clamp**: the sampled coordinate is clamped into [EDGE_EPSILON,
//     1 - EDGE_EPSILON] regardless of what the arithmetic above produced.
//
// The transform itself is a pure function. The render pass evaluates it once per
// output pixel, row-parallel, writing straight into the output buffer.

use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::point::Point;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Safety margin kept between sampled coordinates and the source edges.
pub const EDGE_EPSILON: f32 = 1e-5;

/// A zoom centered on a focus point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Point,
    /// Fraction of the source visible along each axis, in (0, 1].
    pub scale: f32,
}

impl Viewport {
    pub const IDENTITY: Viewport = Viewport {
        center: Point::SCREEN_CENTER,
        scale: 1.0,
    };

    pub fn new(center: Point, scale: f32) -> Self {
        Self { center, scale }
    }

    /// Maps an output-space position to the source-space position it samples.
    pub fn to_source(&self, uv: Point) -> Point {
        let source = self.map(uv) + self.overscan_offset();
        source.clamp(EDGE_EPSILON, 1.0 - EDGE_EPSILON)
    }

    fn map(&self, uv: Point) -> Point {
        (uv - self.center) * self.scale + self.center
    }

    /// The shift that moves the sampled window back inside the source.
    fn overscan_offset(&self) -> Point {
        let low = self.map(Point::ORIGIN);
        let high = self.map(Point::UNIT);
        Point::new(axis_offset(low.x, high.x), axis_offset(low.y, high.y))
    }
}

fn axis_offset(low: f32, high: f32) -> f32 {
    if low < 0.0 {
        -low
    } else if high > 1.0 {
        1.0 - high
    } else {
        0.0
    }
}

/// Free-function form of `Viewport::to_source`.
pub fn transform(uv: Point, center: Point, scale: f32) -> Point {
    Viewport::new(center, scale).to_source(uv)
}

/// Runs `shader` once per output pixel (at the pixel's center) and collects the image.
pub fn paint<F>(width: u32, height: u32, shader: F) -> RgbaImage
where
    F: Fn(Point) -> Rgba<u8> + Sync,
{
    let mut output = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return output;
    }

    let stride = width as usize * 4;
    let inverse_width = 1.0 / width as f32;
    let inverse_height = 1.0 / height as f32;
    let buffer: &mut [u8] = &mut output;
    buffer
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(row, bytes)| {
            let v = (row as f32 + 0.5) * inverse_height;
            for (column, texel) in bytes.chunks_exact_mut(4).enumerate() {
                let u = (column as f32 + 0.5) * inverse_width;
                texel.copy_from_slice(&shader(Point::new(u, v)).0);
            }
        });
    output
}

/// Renders `frame` through `viewport`, `output[uv] = frame[viewport(uv)]`.
pub fn render(frame: &RgbaImage, viewport: Viewport) -> RgbaImage {
    let (width, height) = frame.dimensions();
    paint(width, height, |uv| sample_bilinear(frame, viewport.to_source(uv)))
}

/// Bilinear lookup at a normalized position, pixel centers at `(i + 0.5) / size`.
pub fn sample_bilinear(frame: &RgbaImage, uv: Point) -> Rgba<u8> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let x = (uv.x * width as f32 - 0.5).clamp(0.0, (width - 1) as f32);
    let y = (uv.y * height as f32 - 0.5).clamp(0.0, (height - 1) as f32);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let texel = |px: u32, py: u32| Pixel::from(*frame.get_pixel(px, py));
    let top = texel(x0, y0).lerp(&texel(x1, y0), fx);
    let bottom = texel(x0, y1).lerp(&texel(x1, y1), fx);
    top.lerp(&bottom, fy).into()
}
