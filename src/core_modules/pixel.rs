// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the sorter. It is a "dumb" data
// container for a single RGBA pixel plus the 1-dimensional heuristics the color
// metrics are built from: values computed from this pixel alone, with no knowledge
// of neighbors or of where the pixel sits in the buffer.
//
// Channel forms:
// - raw bytes (0..255), the only form that is ever written back to a buffer
// - normalized (0..1), still gamma-encoded; used for HSV style math
//
// Heuristic families (all single-pixel):
// - Color strength: chroma (max - min), HSV saturation (chroma / value)
// - Hue: position on the color wheel as a fraction of a full turn, [0, 1)
// - Brightness: HSV value (max), Rec. 601 luminance, squared intensity, 8-bit gray
//
// Degenerate input is defined, never an error: a gray pixel has chroma 0 and hue 0,
// a black pixel has saturation 0. Every heuristic is finite for every byte input.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type NormalizedChannel = f64;
    pub type Hue = f64;
    pub type Saturation = f64;
    pub type Value = f64;
    pub type Chroma = f64;
    pub type Luminance = f64;
    pub type Intensity = u32;

    pub const CHANNELS: usize = 4;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// A fully opaque pixel.
        pub fn rgb(red: Channel, green: Channel, blue: Channel) -> Self {
            Self::new(red, green, blue, Channel::MAX)
        }

        pub fn to_bytes(self) -> [Byte; CHANNELS] {
            [self.red, self.green, self.blue, self.alpha]
        }

        fn max_byte(&self) -> Byte {
            self.red.max(self.green.max(self.blue))
        }

        fn min_byte(&self) -> Byte {
            self.red.min(self.green.min(self.blue))
        }

        /// R, G, B scaled to 0..1. Alpha is never part of a color heuristic.
        pub fn normalized(&self) -> (NormalizedChannel, NormalizedChannel, NormalizedChannel) {
            (
                self.red as NormalizedChannel / 255.0,
                self.green as NormalizedChannel / 255.0,
                self.blue as NormalizedChannel / 255.0,
            )
        }

        /// =================================Heuristics==================================

        /// Chroma (C): max(R,G,B) - min(R,G,B) on normalized channels.
        /// Zero exactly when the pixel is gray.
        pub fn chroma(&self) -> Chroma {
            (self.max_byte() - self.min_byte()) as Chroma / 255.0
        }

        /// HSV Value (V): max(R,G,B) on normalized channels.
        pub fn value_hsv(&self) -> Value {
            self.max_byte() as Value / 255.0
        }

        /// HSV Saturation (S): chroma / value, 0 for black.
        pub fn saturation_hsv(&self) -> Saturation {
            let maximum = self.max_byte();
            if maximum == 0 {
                return 0.0;
            }
            (maximum - self.min_byte()) as Saturation / maximum as Saturation
        }

        /// Hue as a fraction of a full turn, [0, 1).
        ///
        /// - Chroma-based HSV derivation on normalized channels.
        /// - Achromatic pixels (R = G = B) take the branch value 0; there is no
        ///   division by a zero chroma.
        pub fn hue(&self) -> Hue {
            let maximum = self.max_byte();
            let minimum = self.min_byte();
            if maximum == minimum {
                return 0.0;
            }

            let (red, green, blue) = self.normalized();
            let chroma = (maximum - minimum) as Hue / 255.0;

            let sector = if self.red == maximum {
                ((green - blue) / chroma).rem_euclid(6.0)
            } else if self.green == maximum {
                (blue - red) / chroma + 2.0
            } else {
                (red - green) / chroma + 4.0
            };

            let turn = sector / 6.0;
            if turn >= 1.0 { 0.0 } else { turn }
        }

        /// Hue angle in degrees [0, 360).
        pub fn hue_degrees(&self) -> Hue {
            self.hue() * 360.0
        }

        /// Luminance estimate (Rec. 601 luma) on the 0..255 scale.
        pub fn luminance(&self) -> Luminance {
            0.299 * self.red as Luminance
                + 0.587 * self.green as Luminance
                + 0.114 * self.blue as Luminance
        }

        /// Unweighted squared magnitude R² + G² + B² of the raw 8-bit channels.
        pub fn intensity(&self) -> Intensity {
            let red = self.red as Intensity;
            let green = self.green as Intensity;
            let blue = self.blue as Intensity;
            red * red + green * green + blue * blue
        }

        /// 8-bit gray level with 16-bit fixed point weights (19595, 38470, 7471).
        pub fn gray(&self) -> Byte {
            let weighted = 19595 * self.red as u32 + 38470 * self.green as u32 + 7471 * self.blue as u32;
            ((weighted + (1 << 15)) >> 16) as Byte
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    impl From<[Byte; CHANNELS]> for Pixel {
        fn from(bytes: [Byte; CHANNELS]) -> Self {
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    impl From<Pixel> for [Byte; CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            pixel.to_bytes()
        }
    }

    impl From<image::Rgba<Byte>> for Pixel {
        fn from(rgba: image::Rgba<Byte>) -> Self {
            Pixel::from(rgba.0)
        }
    }

    impl From<Pixel> for image::Rgba<Byte> {
        fn from(pixel: Pixel) -> Self {
            image::Rgba(pixel.to_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn gray_pixels_have_zero_chroma_and_finite_hue() {
        for level in [0u8, 1, 127, 128, 254, 255] {
            let gray = Pixel::rgb(level, level, level);
            assert_eq!(gray.chroma(), 0.0);
            assert_eq!(gray.saturation_hsv(), 0.0);
            let hue = gray.hue();
            assert!(hue.is_finite());
            assert_eq!(hue, 0.0);
        }
    }

    #[test]
    fn primary_hues_land_on_their_sectors() {
        assert_eq!(Pixel::rgb(255, 0, 0).hue_degrees(), 0.0);
        assert!((Pixel::rgb(0, 255, 0).hue_degrees() - 120.0).abs() < 1e-9);
        assert!((Pixel::rgb(0, 0, 255).hue_degrees() - 240.0).abs() < 1e-9);
        assert!((Pixel::rgb(255, 255, 0).hue_degrees() - 60.0).abs() < 1e-9);
        assert!((Pixel::rgb(255, 0, 255).hue_degrees() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn hue_stays_below_one_turn() {
        // Red maximum with blue just above green sits right below 360 degrees.
        let hue = Pixel::rgb(255, 0, 1).hue();
        assert!(hue < 1.0);
        assert!(hue > 0.99);
    }

    #[test]
    fn saturation_and_value_follow_hsv() {
        let pixel = Pixel::rgb(200, 100, 50);
        assert!((pixel.value_hsv() - 200.0 / 255.0).abs() < 1e-12);
        assert!((pixel.saturation_hsv() - 150.0 / 200.0).abs() < 1e-12);
        assert_eq!(Pixel::rgb(0, 0, 0).saturation_hsv(), 0.0);
    }

    #[test]
    fn intensity_is_unweighted_sum_of_squares() {
        assert_eq!(Pixel::rgb(255, 0, 0).intensity(), 65025);
        assert_eq!(Pixel::rgb(255, 255, 255).intensity(), 3 * 65025);
        assert_eq!(Pixel::new(1, 2, 3, 200).intensity(), 14);
    }

    #[test]
    fn gray_level_matches_fixed_point_weights() {
        assert_eq!(Pixel::rgb(0, 0, 0).gray(), 0);
        assert_eq!(Pixel::rgb(255, 255, 255).gray(), 255);
        assert_eq!(Pixel::rgb(100, 100, 100).gray(), 100);
    }

    #[test]
    fn byte_conversions_keep_every_channel() {
        let pixel = Pixel::new(1, 2, 3, 4);
        let bytes: [Byte; CHANNELS] = pixel.into();
        assert_eq!(bytes, [1, 2, 3, 4]);
        assert_eq!(Pixel::from(&bytes[..]), pixel);
        assert_eq!(Pixel::from(image::Rgba([1, 2, 3, 4])), pixel);
    }

    #[test]
    #[should_panic(expected = "Cannot convert 3 bytes into pixel.")]
    fn short_slices_are_rejected() {
        let _ = Pixel::from(&[1u8, 2, 3][..]);
    }
}
