// THEORY:
// Edge segmentation decides where the edge-delimited runs of each row begin and end.
// Sorting whole rows smears every streak across the full image; cutting rows at
// strong edges keeps streaks inside the shapes they belong to.
//
// Pipeline (all single-pass, all on 8-bit gray):
// 1.  **Gray**: each RGBA pixel collapses to one luma byte.
// 2.  **Gradient**: a 3x3 Sobel operator gives a gradient magnitude per pixel,
//     clamped to 0..255. Neighbors outside the image repeat the nearest border pixel,
//     so a flat field has zero gradient right up to its edges.
// 3.  **Histogram**: the 256-bin histogram of magnitudes is gathered on the way.
// 4.  **Threshold**: either a fixed byte, or Otsu's method on the histogram: the bin
//     that maximizes between-class variance of "background" vs "edge" magnitudes.
// 5.  **Edge Map**: magnitude > threshold is an edge (255), anything else is 0.
// 6.  **Runs**: every edge pixel closes the run it sits in (inclusive); whatever is
//     left after the last edge of a row forms a final run. Runs of a row therefore
//     partition it exactly.

use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::error::SortError;
use image::{GrayImage, Luma};
use log::debug;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_Y: [[i32; 3]; 3] = [[1, 2, 1], [0, 0, 0], [-1, -2, -1]];

pub const EDGE: u8 = u8::MAX;
pub const NOT_EDGE: u8 = 0;

/// 256-bin histogram of gradient magnitudes.
pub type Histogram = [u64; 256];

/// How the gradient threshold is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EdgeThreshold {
    /// Magnitudes above this value are edges.
    Absolute(u8),
    /// Otsu's method over the gradient histogram.
    #[default]
    Auto,
}

impl EdgeThreshold {
    pub fn resolve(&self, histogram: &Histogram) -> u8 {
        match self {
            EdgeThreshold::Absolute(value) => *value,
            EdgeThreshold::Auto => otsu_threshold(histogram),
        }
    }
}

impl fmt::Display for EdgeThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeThreshold::Absolute(value) => write!(f, "{value}"),
            EdgeThreshold::Auto => f.write_str("auto"),
        }
    }
}

impl FromStr for EdgeThreshold {
    type Err = SortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("auto") || trimmed.eq_ignore_ascii_case("otsu") {
            return Ok(EdgeThreshold::Auto);
        }
        trimmed
            .parse::<u8>()
            .map(EdgeThreshold::Absolute)
            .map_err(|_| SortError::InvalidOption {
                option: "threshold",
                value: value.to_string(),
            })
    }
}

/// Gradient magnitudes of an image and their histogram.
#[derive(Debug, Clone)]
pub struct GradientMap {
    pub magnitudes: GrayImage,
    pub histogram: Histogram,
}

/// Everything the edge-segmented orientation needs from one image.
#[derive(Debug, Clone)]
pub struct EdgeSegmentation {
    /// The threshold actually applied.
    pub threshold: u8,
    /// 255 where an edge was found.
    pub edges: GrayImage,
    /// Column ranges per row; each row's runs cover it exactly.
    pub runs: Vec<Vec<Range<u32>>>,
}

/// Collapses the buffer to one gray byte per pixel.
pub fn gray_image(buffer: &PixelBuffer) -> GrayImage {
    GrayImage::from_fn(buffer.width(), buffer.height(), |x, y| {
        Luma([buffer.pixel_at(x, y).gray()])
    })
}

/// 3x3 Sobel gradient magnitude of every pixel, plus the magnitude histogram.
pub fn sobel(gray: &GrayImage) -> GradientMap {
    let (width, height) = gray.dimensions();
    let mut histogram = [0u64; 256];
    let mut magnitudes = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut gradient_x = 0i32;
            let mut gradient_y = 0i32;
            for (row, (kernel_x, kernel_y)) in SOBEL_X.iter().zip(SOBEL_Y.iter()).enumerate() {
                for column in 0..3 {
                    let sample_x = (x + column as u32).saturating_sub(1).min(width - 1);
                    let sample_y = (y + row as u32).saturating_sub(1).min(height - 1);
                    let value = gray.get_pixel(sample_x, sample_y).0[0] as i32;
                    gradient_x += value * kernel_x[column];
                    gradient_y += value * kernel_y[column];
                }
            }
            let magnitude = ((gradient_x * gradient_x + gradient_y * gradient_y) as f64).sqrt();
            let magnitude = magnitude.min(255.0) as u8;
            magnitudes.put_pixel(x, y, Luma([magnitude]));
            histogram[magnitude as usize] += 1;
        }
    }

    GradientMap {
        magnitudes,
        histogram,
    }
}

/// Otsu's method: the bin maximizing between-class variance.
///
/// Bins up to and including the result form the background class. Returns 0 for an
/// empty or single-valued histogram.
pub fn otsu_threshold(histogram: &Histogram) -> u8 {
    let total: f64 = histogram.iter().map(|&count| count as f64).sum();
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(bin, &count)| bin as f64 * count as f64)
        .sum();

    let mut background_weight = 0.0;
    let mut background_sum = 0.0;
    let mut best_variance = 0.0;
    let mut best_bin = 0u8;

    for (bin, &count) in histogram.iter().enumerate() {
        background_weight += count as f64;
        if background_weight == 0.0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0.0 {
            break;
        }
        background_sum += bin as f64 * count as f64;
        let background_mean = background_sum / background_weight;
        let foreground_mean = (weighted_sum - background_sum) / foreground_weight;
        let variance = background_weight * foreground_weight * (background_mean - foreground_mean).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_bin = bin as u8;
        }
    }

    best_bin
}

/// Marks every magnitude strictly above `threshold` as an edge.
pub fn edge_map(magnitudes: &GrayImage, threshold: u8) -> GrayImage {
    let mut edges = magnitudes.clone();
    for pixel in edges.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > threshold { EDGE } else { NOT_EDGE };
    }
    edges
}

/// Splits each row into runs, each closed by an edge pixel or by the row end.
pub fn edge_runs(edges: &GrayImage) -> Vec<Vec<Range<u32>>> {
    let (width, height) = edges.dimensions();
    (0..height)
        .map(|y| {
            let mut runs = Vec::new();
            let mut start = 0u32;
            for x in 0..width {
                if edges.get_pixel(x, y).0[0] != NOT_EDGE {
                    runs.push(start..x + 1);
                    start = x + 1;
                }
            }
            if start < width {
                runs.push(start..width);
            }
            runs
        })
        .collect()
}

/// Runs the whole pipeline on one image.
pub fn segment(buffer: &PixelBuffer, threshold: EdgeThreshold) -> EdgeSegmentation {
    let gradient = sobel(&gray_image(buffer));
    let applied = threshold.resolve(&gradient.histogram);
    let edges = edge_map(&gradient.magnitudes, applied);
    let runs = edge_runs(&edges);
    debug!(
        "edge segmentation: threshold {applied} ({threshold}), {} runs over {} rows",
        runs.iter().map(Vec::len).sum::<usize>(),
        runs.len()
    );
    EdgeSegmentation {
        threshold: applied,
        edges,
        runs,
    }
}
