// THEORY:
// "Neighbor settle" is a local relative of region sorting. Instead of ordering whole
// rows, every pixel looks at its 3x3 neighborhood and trades places with the
// neighbor that has the smallest key, if that neighbor orders strictly before it.
// Repeating the sweep lets low-key pixels drift a few steps per pass, which gives a
// dissolving, sand-like texture rather than long streaks.
//
// The sweep is row-major and in place: a pixel moved early in a pass can be moved
// again by a later pixel of the same pass. Windows are clipped at the image border.
// Like the region sorter, it only ever swaps whole pixels.

use crate::core_modules::color_metric::ColorMetric;
use crate::core_modules::pixel_buffer::PixelBuffer;
use log::debug;

pub const DEFAULT_PASSES: usize = 10;

/// Runs `passes` neighborhood sweeps over the buffer and returns the number of swaps.
pub fn settle<M: ColorMetric>(buffer: &mut PixelBuffer, metric: &M, passes: usize) -> usize {
    let (width, height) = (buffer.width(), buffer.height());
    let mut swaps = 0;

    for pass in 0..passes {
        let mut pass_swaps = 0;
        for y in 0..height {
            for x in 0..width {
                if let Some(target) = smallest_neighbor(buffer, metric, x, y) {
                    buffer.swap_pixels((x, y), target);
                    pass_swaps += 1;
                }
            }
        }
        debug!("neighbor settle pass {pass}: {pass_swaps} swaps");
        swaps += pass_swaps;
        if pass_swaps == 0 {
            break;
        }
    }

    swaps
}

/// The neighbor of (x, y) with the smallest key, if it orders strictly before (x, y).
fn smallest_neighbor<M: ColorMetric>(buffer: &PixelBuffer, metric: &M, x: u32, y: u32) -> Option<(u32, u32)> {
    let mut best_key = metric.key(&buffer.pixel_at(x, y));
    let mut best = None;

    for neighbor_y in y.saturating_sub(1)..=(y + 1).min(buffer.height() - 1) {
        for neighbor_x in x.saturating_sub(1)..=(x + 1).min(buffer.width() - 1) {
            if (neighbor_x, neighbor_y) == (x, y) {
                continue;
            }
            let key = metric.key(&buffer.pixel_at(neighbor_x, neighbor_y));
            if key < best_key {
                best_key = key;
                best = Some((neighbor_x, neighbor_y));
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_metric::Intensity;
    use crate::core_modules::pixel::pixel::Pixel;

    #[test]
    fn dark_pixel_drifts_toward_the_origin() {
        let mut buffer = PixelBuffer::filled(4, 4, Pixel::rgb(200, 200, 200));
        buffer.set_pixel(3, 3, Pixel::rgb(0, 0, 0));
        let swaps = settle(&mut buffer, &Intensity, DEFAULT_PASSES);
        assert!(swaps > 0);
        assert_eq!(buffer.pixel_at(0, 0), Pixel::rgb(0, 0, 0));
    }

    #[test]
    fn settling_keeps_the_pixel_multiset() {
        let mut buffer = PixelBuffer::from_fn(5, 4, |x, y| Pixel::rgb((x * 37 + y * 11) as u8, y as u8, 9));
        let mut before: Vec<Pixel> = (0..4).flat_map(|y| (0..5).map(move |x| (x, y))).map(|(x, y)| buffer.pixel_at(x, y)).collect();
        settle(&mut buffer, &Intensity, 3);
        let mut after: Vec<Pixel> = (0..4).flat_map(|y| (0..5).map(move |x| (x, y))).map(|(x, y)| buffer.pixel_at(x, y)).collect();
        before.sort_by_key(|pixel| pixel.to_bytes());
        after.sort_by_key(|pixel| pixel.to_bytes());
        assert_eq!(before, after);
    }

    #[test]
    fn uniform_images_stop_after_one_pass() {
        let mut buffer = PixelBuffer::filled(3, 3, Pixel::rgb(5, 5, 5));
        assert_eq!(settle(&mut buffer, &Intensity, DEFAULT_PASSES), 0);
    }

    #[test]
    fn empty_images_are_a_no_op() {
        let mut buffer = PixelBuffer::filled(0, 0, Pixel::default());
        assert_eq!(settle(&mut buffer, &Intensity, DEFAULT_PASSES), 0);
    }
}
