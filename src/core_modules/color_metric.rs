// THEORY:
// A `ColorMetric` is one "lens" on a pixel: a pure function from a single `Pixel` to
// a scalar key that the region sorter orders by. The sorter never knows which lens
// it holds, so new orderings are added here without touching the sorting code.
//
// The lenses:
// - `HueComposite`: hue * (saturation + value). Hue alone puts black, white and
//   every gray at the same place as pure red; weighting by saturation + value pulls
//   dark and washed-out pixels toward the front of the streak.
// - `HueOnly`: the bare hue fraction, ignoring saturation and value.
// - `Intensity`: R² + G² + B² on raw bytes. Exact in an f64 (max 195075).
// - `Luminance`: Rec. 601 weighted brightness, the perceptual alternative.
//
// All keys are finite for every 8-bit input, so comparisons never meet a NaN.

use crate::core_modules::pixel::pixel::Pixel;
use crate::error::SortError;
use std::fmt;
use std::str::FromStr;

pub type Key = f64;

/// A pure mapping from a pixel to an ordering key.
pub trait ColorMetric {
    fn key(&self, pixel: &Pixel) -> Key;

    /// Whether `a` orders strictly before `b`.
    fn less(&self, a: &Pixel, b: &Pixel) -> bool {
        self.key(a) < self.key(b)
    }
}

impl<M: ColorMetric + ?Sized> ColorMetric for &M {
    fn key(&self, pixel: &Pixel) -> Key {
        (**self).key(pixel)
    }
}

/// Hue weighted by HSV saturation plus value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HueComposite;

impl ColorMetric for HueComposite {
    fn key(&self, pixel: &Pixel) -> Key {
        pixel.hue() * (pixel.saturation_hsv() + pixel.value_hsv())
    }
}

/// Hue alone, as a fraction of a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HueOnly;

impl ColorMetric for HueOnly {
    fn key(&self, pixel: &Pixel) -> Key {
        pixel.hue()
    }
}

/// Unweighted squared channel magnitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intensity;

impl ColorMetric for Intensity {
    fn key(&self, pixel: &Pixel) -> Key {
        pixel.intensity() as Key
    }
}

/// Rec. 601 perceptual luminance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Luminance;

impl ColorMetric for Luminance {
    fn key(&self, pixel: &Pixel) -> Key {
        pixel.luminance()
    }
}

/// The selectable metric, as named in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MetricKind {
    #[default]
    HueComposite,
    HueOnly,
    Intensity,
    Luminance,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::HueComposite,
        MetricKind::HueOnly,
        MetricKind::Intensity,
        MetricKind::Luminance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::HueComposite => "hue",
            MetricKind::HueOnly => "hue-only",
            MetricKind::Intensity => "intensity",
            MetricKind::Luminance => "luminance",
        }
    }
}

impl ColorMetric for MetricKind {
    fn key(&self, pixel: &Pixel) -> Key {
        match self {
            MetricKind::HueComposite => HueComposite.key(pixel),
            MetricKind::HueOnly => HueOnly.key(pixel),
            MetricKind::Intensity => Intensity.key(pixel),
            MetricKind::Luminance => Luminance.key(pixel),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = SortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hue" | "hue-composite" | "hue_composite" => Ok(MetricKind::HueComposite),
            "hue-only" | "hue_only" | "pure-hue" => Ok(MetricKind::HueOnly),
            "intensity" => Ok(MetricKind::Intensity),
            "luminance" | "luma" => Ok(MetricKind::Luminance),
            _ => Err(SortError::InvalidOption {
                option: "metric",
                value: value.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brighter_gray_sorts_after_darker_gray_by_intensity() {
        let dark = Pixel::rgb(10, 10, 10);
        let bright = Pixel::rgb(200, 200, 200);
        assert!(Intensity.less(&dark, &bright));
        assert!(!Intensity.less(&bright, &dark));
        assert_eq!(Intensity.key(&bright), 120000.0);
    }

    #[test]
    fn intensity_ignores_alpha() {
        assert_eq!(
            Intensity.key(&Pixel::new(3, 4, 5, 0)),
            Intensity.key(&Pixel::new(3, 4, 5, 255))
        );
    }

    #[test]
    fn hue_keys_are_finite_for_grays() {
        for metric in MetricKind::ALL {
            for level in [0u8, 64, 255] {
                let key = metric.key(&Pixel::rgb(level, level, level));
                assert!(key.is_finite(), "{metric} produced {key} for gray {level}");
            }
        }
        assert_eq!(HueComposite.key(&Pixel::rgb(90, 90, 90)), 0.0);
    }

    #[test]
    fn composite_hue_weights_by_saturation_and_value() {
        let bright_green = Pixel::rgb(0, 255, 0);
        let dark_green = Pixel::rgb(0, 64, 0);
        // Same hue, so the bare-hue lens cannot tell them apart.
        assert_eq!(HueOnly.key(&bright_green), HueOnly.key(&dark_green));
        assert!(HueComposite.less(&dark_green, &bright_green));
        assert!((HueComposite.key(&bright_green) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn luminance_weights_green_heaviest() {
        assert!(Luminance.less(&Pixel::rgb(0, 0, 255), &Pixel::rgb(255, 0, 0)));
        assert!(Luminance.less(&Pixel::rgb(255, 0, 0), &Pixel::rgb(0, 255, 0)));
    }

    #[test]
    fn metric_kind_dispatches_to_its_lens() {
        let pixel = Pixel::rgb(12, 200, 99);
        assert_eq!(MetricKind::HueComposite.key(&pixel), HueComposite.key(&pixel));
        assert_eq!(MetricKind::HueOnly.key(&pixel), HueOnly.key(&pixel));
        assert_eq!(MetricKind::Intensity.key(&pixel), Intensity.key(&pixel));
        assert_eq!(MetricKind::Luminance.key(&pixel), Luminance.key(&pixel));
    }

    #[test]
    fn metric_names_parse_back() {
        for metric in MetricKind::ALL {
            assert_eq!(metric.name().parse::<MetricKind>().ok(), Some(metric));
        }
        assert_eq!(" Intensity ".parse::<MetricKind>().ok(), Some(MetricKind::Intensity));
        assert!(matches!(
            "sepia".parse::<MetricKind>(),
            Err(SortError::InvalidOption { option: "metric", .. })
        ));
    }
}
