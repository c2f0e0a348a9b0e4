// THEORY:
// The `PixelBuffer` is the single owner of image memory for the duration of a sort.
// It holds a packed, row-major grid of RGBA8 pixels exactly as an external decoder
// hands it over: a flat byte vector plus width, height and a row stride that may be
// wider than `width * 4`.
//
// Key architectural principles:
// 1.  **Byte Addressing**: Every higher layer talks to pixels through byte offsets
//     (`y * stride + x * 4`). The buffer is the only place that formula lives.
// 2.  **Validated Once**: Geometry is checked when the buffer is built. After that,
//     every access is a plain bounds-checked index; an offset outside the buffer is
//     an engine bug and panics instead of being clamped.
// 3.  **Swap Is The Primitive**: Exchanging two pixels swaps their four bytes in
//     place. No color object is constructed on that path.

use crate::core_modules::pixel::pixel::{Byte, CHANNELS, Pixel};
use crate::error::{SortError, SortResult};
use image::RgbaImage;
use std::ops::Range;

/// The geometry of a buffer, without its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
}

impl ImageBounds {
    /// Byte offset of the first channel of pixel (x, y).
    #[inline]
    pub fn byte_offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) is outside a {}x{} image",
            self.width,
            self.height
        );
        y as usize * self.stride + x as usize * CHANNELS
    }
}

/// A packed RGBA8 image with an explicit row stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// The width of the image in pixels.
    width: u32,
    /// The height of the image in pixels.
    height: u32,
    /// The number of bytes between the starts of two consecutive rows.
    stride: usize,
    /// The raw channel bytes.
    data: Vec<Byte>,
}

impl PixelBuffer {
    /// Wraps decoded RGBA bytes, checking that the stride and length cover the bounds.
    pub fn new(width: u32, height: u32, stride: usize, data: Vec<Byte>) -> SortResult<Self> {
        let row_bytes = width as usize * CHANNELS;
        if stride < row_bytes {
            return Err(SortError::StrideTooSmall { stride, width });
        }
        let expected = Self::required_len(width, height, stride);
        if data.len() < expected {
            return Err(SortError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// A tightly packed buffer (`stride == width * 4`).
    pub fn from_packed(width: u32, height: u32, data: Vec<Byte>) -> SortResult<Self> {
        Self::new(width, height, width as usize * CHANNELS, data)
    }

    /// A tightly packed buffer filled with one pixel.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
        let count = width as usize * height as usize;
        let data = pixel.to_bytes().repeat(count);
        Self {
            width,
            height,
            stride: width as usize * CHANNELS,
            data,
        }
    }

    /// Builds a packed buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Pixel) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y).to_bytes());
            }
        }
        Self {
            width,
            height,
            stride: width as usize * CHANNELS,
            data,
        }
    }

    fn required_len(width: u32, height: u32, stride: usize) -> usize {
        if width == 0 || height == 0 {
            return 0;
        }
        stride * (height as usize - 1) + width as usize * CHANNELS
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bounds(&self) -> ImageBounds {
        ImageBounds {
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether rows follow each other without padding.
    pub fn is_packed(&self) -> bool {
        self.stride == self.width as usize * CHANNELS
    }

    /// Total number of addressable pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The raw channel bytes, including any stride padding.
    pub fn as_bytes(&self) -> &[Byte] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [Byte] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<Byte> {
        self.data
    }

    /// Byte offset of the first channel of pixel (x, y).
    #[inline]
    pub fn byte_offset(&self, x: u32, y: u32) -> usize {
        self.bounds().byte_offset(x, y)
    }

    pub fn pixel_at(&self, x: u32, y: u32) -> Pixel {
        let offset = self.byte_offset(x, y);
        Pixel::from(&self.data[offset..offset + CHANNELS])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
        let offset = self.byte_offset(x, y);
        self.data[offset..offset + CHANNELS].copy_from_slice(&pixel.to_bytes());
    }

    /// Swaps all four channels of two pixels in place.
    pub fn swap_pixels(&mut self, first: (u32, u32), second: (u32, u32)) {
        let a = self.byte_offset(first.0, first.1);
        let b = self.byte_offset(second.0, second.1);
        swap_channels(&mut self.data, a, b);
    }

    /// One row of pixels, without stride padding.
    pub fn row(&self, y: u32) -> &[Byte] {
        if self.width == 0 {
            return &[];
        }
        let start = self.byte_offset(0, y);
        &self.data[start..start + self.width as usize * CHANNELS]
    }

    /// A copy with rows and columns exchanged, tightly packed.
    pub fn transposed(&self) -> Self {
        let mut data = Vec::with_capacity(self.pixel_count() * CHANNELS);
        for x in 0..self.width {
            for y in 0..self.height {
                let offset = self.byte_offset(x, y);
                data.extend_from_slice(&self.data[offset..offset + CHANNELS]);
            }
        }
        Self {
            width: self.height,
            height: self.width,
            stride: self.height as usize * CHANNELS,
            data,
        }
    }

    /// Copies the pixels of a tightly packed image of the same bounds into this buffer,
    /// keeping this buffer's stride.
    pub fn copy_pixels_from(&mut self, other: &PixelBuffer) {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "cannot copy pixels between images of different bounds"
        );
        if self.is_empty() {
            return;
        }
        for y in 0..self.height {
            let destination = self.byte_offset(0, y);
            let row = other.row(y);
            self.data[destination..destination + row.len()].copy_from_slice(row);
        }
    }

    /// A tightly packed copy of the rows in `rows`.
    pub fn band(&self, rows: Range<u32>) -> Self {
        assert!(
            rows.start <= rows.end && rows.end <= self.height,
            "rows {rows:?} are outside an image {} rows high",
            self.height
        );
        let mut data = Vec::with_capacity(self.width as usize * rows.len() * CHANNELS);
        for y in rows.clone() {
            data.extend_from_slice(self.row(y));
        }
        Self {
            width: self.width,
            height: rows.end - rows.start,
            stride: self.width as usize * CHANNELS,
            data,
        }
    }

    /// Writes `band` back over the rows starting at `top`, keeping this buffer's stride.
    pub fn paste_band(&mut self, top: u32, band: &PixelBuffer) {
        assert!(
            band.width == self.width && top + band.height <= self.height,
            "a {}x{} band does not fit at row {top} of a {}x{} image",
            band.width,
            band.height,
            self.width,
            self.height
        );
        if self.width == 0 {
            return;
        }
        for y in 0..band.height {
            let destination = self.byte_offset(0, top + y);
            let row = band.row(y);
            self.data[destination..destination + row.len()].copy_from_slice(row);
        }
    }

    /// Converts to an `image::RgbaImage`, dropping stride padding.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut packed = Vec::with_capacity(self.pixel_count() * CHANNELS);
        for y in 0..self.height {
            packed.extend_from_slice(self.row(y));
        }
        RgbaImage::from_raw(self.width, self.height, packed).expect("packed buffer holds width * height * 4 bytes")
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            stride: width as usize * CHANNELS,
            data: image.into_raw(),
        }
    }
}

/// Swaps the four channel bytes starting at offsets `a` and `b`.
///
/// Panics when either pixel reaches past the end of `bytes`.
#[inline]
pub fn swap_channels(bytes: &mut [Byte], a: usize, b: usize) {
    assert!(
        a + CHANNELS <= bytes.len() && b + CHANNELS <= bytes.len(),
        "pixel swap at offsets {a} and {b} is outside a {} byte buffer",
        bytes.len()
    );
    if a == b {
        return;
    }
    for channel in 0..CHANNELS {
        bytes.swap(a + channel, b + channel);
    }
}
