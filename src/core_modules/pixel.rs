// THEORY:
// The `Pixel` module is the most fundamental unit of the framing engine. It is a
// "dumb" data container for a single color sample plus the one pairwise metric the
// motion layer needs: the mean absolute channel difference between two samples.
//
// Channels are stored normalized (0..1) rather than as bytes. Reduced frames are
// built by averaging blocks of source pixels, and averaging in float keeps the
// fractional part that byte storage would truncate away. Conversion to and from
// `image::Rgba<u8>` happens only at the edges (sampling the host frame, writing the
// output frame).

pub mod pixel {
    use image::Rgba;
    use std::ops::{Add, AddAssign, Mul};

    pub type Byte = u8;
    pub type NormalizedChannel = f32;
    pub type ChannelDelta = f32;

    const BYTE_SCALE: f32 = 255.0;

    /// A "dumb" data container representing a single RGBA sample with channels in 0..1.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pixel {
        /// The red channel value (0.0-1.0).
        pub red: NormalizedChannel,
        /// The green channel value (0.0-1.0).
        pub green: NormalizedChannel,
        /// The blue channel value (0.0-1.0).
        pub blue: NormalizedChannel,
        /// The alpha (transparency) channel value (0.0-1.0).
        pub alpha: NormalizedChannel,
    }

    impl Pixel {
        pub fn new(
            red: NormalizedChannel,
            green: NormalizedChannel,
            blue: NormalizedChannel,
            alpha: NormalizedChannel,
        ) -> Self {
            Self {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// An opaque gray sample at the given level.
        pub fn gray(level: NormalizedChannel) -> Self {
            Self::new(level, level, level, 1.0)
        }

        pub fn from_bytes(red: Byte, green: Byte, blue: Byte, alpha: Byte) -> Self {
            Self::new(
                red as NormalizedChannel / BYTE_SCALE,
                green as NormalizedChannel / BYTE_SCALE,
                blue as NormalizedChannel / BYTE_SCALE,
                alpha as NormalizedChannel / BYTE_SCALE,
            )
        }

        /// Quantizes back to bytes, saturating anything outside 0..1.
        pub fn to_bytes(&self) -> [Byte; 4] {
            [
                Self::quantize(self.red),
                Self::quantize(self.green),
                Self::quantize(self.blue),
                Self::quantize(self.alpha),
            ]
        }

        #[inline]
        fn quantize(channel: NormalizedChannel) -> Byte {
            (channel.clamp(0.0, 1.0) * BYTE_SCALE).round() as Byte
        }

        /// Mean absolute difference of the RGB channels, `(|dR| + |dG| + |dB|) / 3`.
        ///
        /// Alpha is ignored: hosts hand us composited frames where alpha carries no
        /// visual change.
        pub fn mean_abs_difference(&self, other: &Pixel) -> ChannelDelta {
            ((self.red - other.red).abs()
                + (self.green - other.green).abs()
                + (self.blue - other.blue).abs())
                / 3.0
        }

        /// Linear interpolation toward `other` by `t`.
        pub fn lerp(&self, other: &Pixel, t: f32) -> Pixel {
            *self + (*other + *self * -1.0) * t
        }
    }

    impl Add for Pixel {
        type Output = Pixel;

        fn add(self, other: Pixel) -> Pixel {
            Pixel::new(
                self.red + other.red,
                self.green + other.green,
                self.blue + other.blue,
                self.alpha + other.alpha,
            )
        }
    }

    impl AddAssign for Pixel {
        fn add_assign(&mut self, other: Pixel) {
            *self = *self + other;
        }
    }

    impl Mul<f32> for Pixel {
        type Output = Pixel;

        fn mul(self, factor: f32) -> Pixel {
            Pixel::new(
                self.red * factor,
                self.green * factor,
                self.blue * factor,
                self.alpha * factor,
            )
        }
    }

    impl From<Rgba<Byte>> for Pixel {
        fn from(rgba: Rgba<Byte>) -> Self {
            let [red, green, blue, alpha] = rgba.0;
            Pixel::from_bytes(red, green, blue, alpha)
        }
    }

    impl From<Pixel> for Rgba<Byte> {
        fn from(pixel: Pixel) -> Self {
            Rgba(pixel.to_bytes())
        }
    }
}
