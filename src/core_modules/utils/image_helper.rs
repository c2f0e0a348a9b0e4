pub mod image_helper {
    use crate::core_modules::pixel_buffer::PixelBuffer;
    use crate::error::SortResult;
    use image::{GrayImage, ImageEncoder};
    use std::path::Path;

    /// Decodes any format `image` understands into a packed RGBA buffer.
    pub fn load_rgba(path: impl AsRef<Path>) -> SortResult<PixelBuffer> {
        let decoded = image::open(path)?;
        Ok(PixelBuffer::from(decoded.into_rgba8()))
    }

    /// Encodes the buffer as an RGBA8 PNG, dropping any stride padding.
    pub fn save_png(path: impl AsRef<Path>, buffer: &PixelBuffer) -> SortResult<()> {
        let packed = buffer.to_rgba_image();
        let output = std::fs::File::create(path).map_err(image::ImageError::IoError)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            packed.as_raw(),
            buffer.width(),
            buffer.height(),
            image::ExtendedColorType::Rgba8,
        )?;

        Ok(())
    }

    /// Encodes a single-channel image (an edge map) as an L8 PNG.
    pub fn save_gray(path: impl AsRef<Path>, gray: &GrayImage) -> SortResult<()> {
        let output = std::fs::File::create(path).map_err(image::ImageError::IoError)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            gray.as_raw(),
            gray.width(),
            gray.height(),
            image::ExtendedColorType::L8,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::image_helper::*;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::pixel_buffer::PixelBuffer;
    use image::{GrayImage, Luma};
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pixel_sort_{}_{name}", std::process::id()))
    }

    #[test]
    fn save_then_load_gradient_file() {
        let width = 50u32;
        let height = 20u32;
        let buffer = PixelBuffer::from_fn(width, height, |x, y| Pixel::new(x as u8 * 5, y as u8 * 12, 77, 255 - x as u8));
        let path = scratch("gradient_file.png");

        save_png(&path, &buffer).expect("Error Saving File.");
        let loaded = load_rgba(&path).expect("Error Loading File.");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, buffer);
    }

    #[test]
    fn save_strided_buffer_drops_padding() {
        let mut data = vec![0u8; 2 * 12];
        data[4..8].copy_from_slice(&[1, 2, 3, 255]);
        data[12..16].copy_from_slice(&[9, 9, 9, 255]);
        let buffer = PixelBuffer::new(2, 2, 12, data).expect("valid geometry");
        let path = scratch("strided_file.png");

        save_png(&path, &buffer).expect("Error Saving File.");
        let loaded = load_rgba(&path).expect("Error Loading File.");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.stride(), 8);
        assert_eq!(loaded.pixel_at(1, 0), Pixel::new(1, 2, 3, 255));
        assert_eq!(loaded.pixel_at(0, 1), Pixel::new(9, 9, 9, 255));
    }

    #[test]
    fn save_edge_map_file() {
        let edges = GrayImage::from_fn(8, 8, |x, _| Luma([if x == 4 { 255 } else { 0 }]));
        let path = scratch("edge_map.png");

        save_gray(&path, &edges).expect("Error Saving File.");
        let loaded = image::open(&path).expect("Error Loading File.").into_luma8();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, edges);
    }

    #[test]
    fn loading_a_missing_file_is_an_error() {
        assert!(load_rgba(scratch("does_not_exist.png")).is_err());
    }
}
