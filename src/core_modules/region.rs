// THEORY:
// A `Region` is a one-dimensional window onto the shared pixel buffer: a row, a
// column, or an edge-delimited run inside a row. It never copies pixels. It is
// composed of three numbers and a borrow: the byte offset of its first pixel, the
// byte step between consecutive pixels, and its logical length.
//
//     byte_offset(n) = base + n * step      for n in [0, len)
//
// Rows, runs and the whole-image region step by 4 bytes; columns step by the row
// stride. Because the mapping
// is affine and fixed at construction, two different indices never alias and the
// length never changes.
//
// Regions are described by a `RegionSpan` (plain `Copy` data produced by an
// enumerator) and come to life by binding that span to the buffer bytes. The split
// keeps enumerators free of borrows, so an orchestrator can hold an enumerator and
// still lend the buffer mutably to one region at a time.

use crate::core_modules::pixel::pixel::{Byte, CHANNELS, Pixel};
use crate::core_modules::pixel_buffer::swap_channels;

/// Where a region sits in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionShape {
    /// Row `y`; logical index n is column n.
    Row { y: u32 },
    /// Column `x`; logical index n is row n.
    Column { x: u32 },
    /// Columns `start..end` of row `y`; logical index n is column `start + n`.
    Run { y: u32, start: u32, end: u32 },
    /// Every pixel of a packed image `width` pixels wide, in row-major order.
    Image { width: u32 },
}

/// A borrow-free description of a region: its shape and affine byte mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionSpan {
    pub shape: RegionShape,
    /// Byte offset of logical pixel 0.
    pub base: usize,
    /// Bytes between consecutive logical pixels.
    pub step: usize,
    /// Number of pixels.
    pub len: usize,
}

impl RegionSpan {
    /// Image coordinates of logical pixel `n`.
    pub fn coordinates(&self, n: usize) -> (u32, u32) {
        assert!(n < self.len, "region index {n} out of range for length {}", self.len);
        match self.shape {
            RegionShape::Row { y } => (n as u32, y),
            RegionShape::Column { x } => (x, n as u32),
            RegionShape::Run { y, start, .. } => (start + n as u32, y),
            RegionShape::Image { width } => (n as u32 % width, n as u32 / width),
        }
    }

    /// Byte offset of logical pixel `n`.
    #[inline]
    pub fn byte_offset(&self, n: usize) -> usize {
        assert!(n < self.len, "region index {n} out of range for length {}", self.len);
        self.base + n * self.step
    }

    /// Attaches the span to the bytes it describes.
    ///
    /// Panics if the last pixel of the span does not fit in `bytes`.
    pub fn bind(self, bytes: &mut [Byte]) -> Region<'_> {
        if self.len > 0 {
            let last = self.base + (self.len - 1) * self.step;
            assert!(
                last + CHANNELS <= bytes.len(),
                "region {:?} reaches byte {} of a {} byte buffer",
                self.shape,
                last + CHANNELS,
                bytes.len()
            );
        }
        Region { span: self, bytes }
    }
}

/// A mutable, non-owning view over the pixels of one region.
#[derive(Debug)]
pub struct Region<'a> {
    span: RegionSpan,
    bytes: &'a mut [Byte],
}

impl<'a> Region<'a> {
    pub fn span(&self) -> RegionSpan {
        self.span
    }

    pub fn shape(&self) -> RegionShape {
        self.span.shape
    }

    /// Logical length; constant for the region's lifetime.
    pub fn size(&self) -> usize {
        self.span.len
    }

    pub fn is_empty(&self) -> bool {
        self.span.len == 0
    }

    /// Byte offset of logical pixel `n` in `raw_bytes()`.
    #[inline]
    pub fn byte_offset(&self, n: usize) -> usize {
        self.span.byte_offset(n)
    }

    /// The whole backing buffer, for sorters that work on bytes directly.
    pub fn raw_bytes(&mut self) -> &mut [Byte] {
        &mut *self.bytes
    }

    pub fn at(&self, n: usize) -> Pixel {
        let offset = self.byte_offset(n);
        Pixel::from(&self.bytes[offset..offset + CHANNELS])
    }

    pub fn set(&mut self, n: usize, pixel: Pixel) {
        let offset = self.byte_offset(n);
        self.bytes[offset..offset + CHANNELS].copy_from_slice(&pixel.to_bytes());
    }

    /// Swaps all four channels of logical pixels `i` and `j`.
    #[inline]
    pub fn exchange(&mut self, i: usize, j: usize) {
        let a = self.byte_offset(i);
        let b = self.byte_offset(j);
        swap_channels(&mut *self.bytes, a, b);
    }

    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        (0..self.span.len).map(move |n| self.at(n))
    }
}
