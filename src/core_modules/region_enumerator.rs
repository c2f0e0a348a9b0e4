// THEORY:
// A `RegionEnumerator` walks an image and hands out one `RegionSpan` at a time. It is
// the partitioning half of the engine: together, the spans it yields must cover
// every pixel of the image exactly once, and no two spans may share a byte.
//
// Every enumerator is the same small state machine:
//
//     BeforeStart --next()--> At(0) --next()--> At(1) ... --next()--> Exhausted
//          ^                                                              |
//          +------------------------------ reset() -----------------------+
//
// `value()` reports the span under the cursor without moving it (`None` before the
// first `next()` and once exhausted). `next()` moves the cursor one unit and returns
// the new `value()`. The final row/column/run is yielded exactly once: the cursor is
// exhausted only after it has *passed* the last unit, never when it reaches it.
//
// Enumerators hold geometry, not pixels. The orchestrator binds each span to the
// buffer for exactly as long as one region sort takes.

use crate::core_modules::pixel::pixel::CHANNELS;
use crate::core_modules::pixel_buffer::ImageBounds;
use crate::core_modules::region::{RegionShape, RegionSpan};
use std::ops::Range;

/// Position of an enumerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    BeforeStart,
    At(usize),
    Exhausted,
}

impl Cursor {
    /// Moves one unit forward within `0..extent`.
    fn advance(self, extent: usize) -> Self {
        let next = match self {
            Cursor::BeforeStart => 0,
            Cursor::At(index) => index + 1,
            Cursor::Exhausted => return Cursor::Exhausted,
        };
        if next < extent {
            Cursor::At(next)
        } else {
            Cursor::Exhausted
        }
    }
}

/// A restartable generator of non-overlapping regions covering an image.
pub trait RegionEnumerator {
    /// Returns to the before-start state.
    fn reset(&mut self);

    /// The span under the cursor, if any.
    fn value(&self) -> Option<RegionSpan>;

    /// Advances one unit and returns the new `value()`.
    fn next(&mut self) -> Option<RegionSpan>;

    /// Current cursor state.
    fn cursor(&self) -> Cursor;

    /// Every span from the start, leaving the enumerator exhausted.
    fn collect_spans(&mut self) -> Vec<RegionSpan> {
        self.reset();
        let mut spans = Vec::new();
        while let Some(span) = self.next() {
            spans.push(span);
        }
        spans
    }
}

/// One region per row, top to bottom.
#[derive(Debug, Clone)]
pub struct RowEnumerator {
    bounds: ImageBounds,
    cursor: Cursor,
}

impl RowEnumerator {
    pub fn new(bounds: ImageBounds) -> Self {
        Self {
            bounds,
            cursor: Cursor::BeforeStart,
        }
    }

    fn span(&self, y: usize) -> RegionSpan {
        RegionSpan {
            shape: RegionShape::Row { y: y as u32 },
            base: y * self.bounds.stride,
            step: CHANNELS,
            len: self.bounds.width as usize,
        }
    }

    fn extent(&self) -> usize {
        // A zero-width image has rows with nothing in them; yield none.
        if self.bounds.width == 0 { 0 } else { self.bounds.height as usize }
    }
}

impl RegionEnumerator for RowEnumerator {
    fn reset(&mut self) {
        self.cursor = Cursor::BeforeStart;
    }

    fn value(&self) -> Option<RegionSpan> {
        match self.cursor {
            Cursor::At(y) => Some(self.span(y)),
            _ => None,
        }
    }

    fn next(&mut self) -> Option<RegionSpan> {
        self.cursor = self.cursor.advance(self.extent());
        self.value()
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }
}

/// One region per column, left to right.
#[derive(Debug, Clone)]
pub struct ColumnEnumerator {
    bounds: ImageBounds,
    cursor: Cursor,
}

impl ColumnEnumerator {
    pub fn new(bounds: ImageBounds) -> Self {
        Self {
            bounds,
            cursor: Cursor::BeforeStart,
        }
    }

    fn span(&self, x: usize) -> RegionSpan {
        RegionSpan {
            shape: RegionShape::Column { x: x as u32 },
            base: x * CHANNELS,
            step: self.bounds.stride,
            len: self.bounds.height as usize,
        }
    }

    fn extent(&self) -> usize {
        if self.bounds.height == 0 { 0 } else { self.bounds.width as usize }
    }
}

impl RegionEnumerator for ColumnEnumerator {
    fn reset(&mut self) {
        self.cursor = Cursor::BeforeStart;
    }

    fn value(&self) -> Option<RegionSpan> {
        match self.cursor {
            Cursor::At(x) => Some(self.span(x)),
            _ => None,
        }
    }

    fn next(&mut self) -> Option<RegionSpan> {
        self.cursor = self.cursor.advance(self.extent());
        self.value()
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }
}

/// One region per edge-delimited run, row by row and left to right within a row.
#[derive(Debug, Clone)]
pub struct RunEnumerator {
    spans: Vec<RegionSpan>,
    cursor: Cursor,
}

impl RunEnumerator {
    /// `runs[y]` lists the column ranges of row `y`. Empty ranges are skipped.
    ///
    /// Panics if a run leaves the image or there are more rows of runs than image rows.
    pub fn new(bounds: ImageBounds, runs: &[Vec<Range<u32>>]) -> Self {
        assert!(
            runs.len() <= bounds.height as usize,
            "{} rows of runs for an image {} rows high",
            runs.len(),
            bounds.height
        );
        let mut spans = Vec::new();
        for (y, row) in runs.iter().enumerate() {
            for run in row.iter().filter(|run| !run.is_empty()) {
                assert!(
                    run.end <= bounds.width,
                    "run {run:?} on row {y} leaves an image {} pixels wide",
                    bounds.width
                );
                spans.push(RegionSpan {
                    shape: RegionShape::Run {
                        y: y as u32,
                        start: run.start,
                        end: run.end,
                    },
                    base: bounds.byte_offset(run.start, y as u32),
                    step: CHANNELS,
                    len: run.len(),
                });
            }
        }
        Self {
            spans,
            cursor: Cursor::BeforeStart,
        }
    }

    /// Number of runs this enumerator yields.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl RegionEnumerator for RunEnumerator {
    fn reset(&mut self) {
        self.cursor = Cursor::BeforeStart;
    }

    fn value(&self) -> Option<RegionSpan> {
        match self.cursor {
            Cursor::At(index) => self.spans.get(index).copied(),
            _ => None,
        }
    }

    fn next(&mut self) -> Option<RegionSpan> {
        self.cursor = self.cursor.advance(self.spans.len());
        self.value()
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }
}

/// The whole image as a single region, row-major.
///
/// Only a packed buffer (`stride == width * 4`) maps onto one affine span; strided
/// images must be sorted through a packed copy.
#[derive(Debug, Clone)]
pub struct ImageEnumerator {
    bounds: ImageBounds,
    cursor: Cursor,
}

impl ImageEnumerator {
    /// Panics if `bounds` carries row padding.
    pub fn new(bounds: ImageBounds) -> Self {
        assert!(
            bounds.stride == bounds.width as usize * CHANNELS,
            "a whole-image region needs a packed buffer, got stride {} for width {}",
            bounds.stride,
            bounds.width
        );
        Self {
            bounds,
            cursor: Cursor::BeforeStart,
        }
    }

    fn span(&self) -> RegionSpan {
        RegionSpan {
            shape: RegionShape::Image {
                width: self.bounds.width,
            },
            base: 0,
            step: CHANNELS,
            len: self.bounds.width as usize * self.bounds.height as usize,
        }
    }

    fn extent(&self) -> usize {
        if self.bounds.width == 0 || self.bounds.height == 0 { 0 } else { 1 }
    }
}

impl RegionEnumerator for ImageEnumerator {
    fn reset(&mut self) {
        self.cursor = Cursor::BeforeStart;
    }

    fn value(&self) -> Option<RegionSpan> {
        match self.cursor {
            Cursor::At(_) => Some(self.span()),
            _ => None,
        }
    }

    fn next(&mut self) -> Option<RegionSpan> {
        self.cursor = self.cursor.advance(self.extent());
        self.value()
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn bounds(width: u32, height: u32) -> ImageBounds {
        ImageBounds {
            width,
            height,
            stride: width as usize * CHANNELS + 8,
        }
    }

    /// Every (x, y) covered by the spans, failing on any repeat.
    fn covered(spans: &[RegionSpan]) -> HashSet<(u32, u32)> {
        let mut seen = HashSet::new();
        for span in spans {
            for n in 0..span.len {
                assert!(seen.insert(span.coordinates(n)), "pixel covered twice");
            }
        }
        seen
    }

    fn every_pixel(width: u32, height: u32) -> HashSet<(u32, u32)> {
        (0..height).flat_map(|y| (0..width).map(move |x| (x, y))).collect()
    }

    #[test]
    fn rows_partition_the_image_including_the_last_row() {
        let mut rows = RowEnumerator::new(bounds(5, 3));
        let spans = rows.collect_spans();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2].shape, RegionShape::Row { y: 2 });
        assert_eq!(covered(&spans), every_pixel(5, 3));
    }

    #[test]
    fn columns_partition_the_image_including_the_last_column() {
        let mut columns = ColumnEnumerator::new(bounds(4, 6));
        let spans = columns.collect_spans();
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[3].shape, RegionShape::Column { x: 3 });
        assert_eq!(spans[3].step, 4 * CHANNELS + 8);
        assert_eq!(covered(&spans), every_pixel(4, 6));
    }

    #[test]
    fn state_machine_walks_before_start_positioned_exhausted() {
        let mut rows = RowEnumerator::new(bounds(2, 2));
        assert_eq!(rows.cursor(), Cursor::BeforeStart);
        assert_eq!(rows.value(), None);

        let first = rows.next().expect("first row");
        assert_eq!(first.shape, RegionShape::Row { y: 0 });
        assert_eq!(rows.value(), Some(first));
        assert_eq!(rows.cursor(), Cursor::At(0));

        assert!(rows.next().is_some());
        assert_eq!(rows.next(), None);
        assert_eq!(rows.cursor(), Cursor::Exhausted);
        assert_eq!(rows.next(), None);

        rows.reset();
        assert_eq!(rows.cursor(), Cursor::BeforeStart);
        assert_eq!(rows.next(), Some(first));
    }

    #[test]
    fn empty_images_enumerate_nothing() {
        assert!(RowEnumerator::new(bounds(0, 4)).next().is_none());
        assert!(RowEnumerator::new(bounds(4, 0)).next().is_none());
        assert!(ColumnEnumerator::new(bounds(0, 4)).next().is_none());
        assert!(ColumnEnumerator::new(bounds(4, 0)).next().is_none());
    }

    #[test]
    fn runs_follow_row_order_and_skip_empty_ranges() {
        let runs = vec![vec![0..2, 2..2, 2..5], vec![0..5]];
        let mut enumerator = RunEnumerator::new(bounds(5, 2), &runs);
        assert_eq!(enumerator.len(), 3);
        let spans = enumerator.collect_spans();
        assert_eq!(spans[1].shape, RegionShape::Run { y: 0, start: 2, end: 5 });
        assert_eq!(spans[1].base, 2 * CHANNELS);
        assert_eq!(spans[2].base, 5 * CHANNELS + 8);
        assert_eq!(covered(&spans), every_pixel(5, 2));
    }

    #[test]
    fn whole_image_is_one_region() {
        let packed = ImageBounds {
            width: 3,
            height: 4,
            stride: 3 * CHANNELS,
        };
        let mut whole = ImageEnumerator::new(packed);
        let spans = whole.collect_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].shape, RegionShape::Image { width: 3 });
        assert_eq!(spans[0].byte_offset(11), 11 * CHANNELS);
        assert_eq!(covered(&spans), every_pixel(3, 4));
        assert_eq!(whole.cursor(), Cursor::Exhausted);

        let empty = ImageBounds {
            width: 0,
            height: 4,
            stride: 0,
        };
        assert!(ImageEnumerator::new(empty).next().is_none());
    }

    #[test]
    #[should_panic(expected = "needs a packed buffer")]
    fn whole_image_rejects_padded_rows() {
        let _ = ImageEnumerator::new(bounds(3, 2));
    }

    #[test]
    #[should_panic(expected = "leaves an image")]
    fn runs_past_the_right_edge_panic() {
        let _ = RunEnumerator::new(bounds(3, 1), &[vec![1..4]]);
    }
}
