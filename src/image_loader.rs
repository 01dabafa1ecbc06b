//! Image decoding into the pipeline's pixel grid
//!
//! Uploaded files arrive as encoded bytes (PNG, JPEG, ...). This module
//! decodes them with the `image` crate into a [`SourceImage`], the immutable
//! RGB/RGBA grid the quantizer works on.
//!
//! ## Supported Formats
//!
//! - JPEG, PNG, GIF (first frame), WebP, TIFF, BMP, ICO, TGA, PNM, QOI
//!
//! Which of these actually decode depends on the `image` crate features
//! enabled at build time; the defaults cover all of them.

use std::path::Path;

use image::{DynamicImage, ImageReader};

use crate::color::Color;
use crate::error::{PaletteError, Result};

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image (first frame only)
    Gif,
    /// WebP image
    WebP,
    /// TIFF image
    Tiff,
    /// BMP image
    Bmp,
    /// ICO image
    Ico,
    /// TGA image
    Tga,
    /// PNM image (PBM, PGM, PPM)
    Pnm,
    /// QOI image
    Qoi,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::WebP),
            "tiff" | "tif" => Some(ImageFormat::Tiff),
            "bmp" => Some(ImageFormat::Bmp),
            "ico" => Some(ImageFormat::Ico),
            "tga" => Some(ImageFormat::Tga),
            "pbm" | "pgm" | "ppm" | "pnm" => Some(ImageFormat::Pnm),
            "qoi" => Some(ImageFormat::Qoi),
            _ => None,
        }
    }
}

/// Get list of all supported file extensions
pub fn supported_extensions() -> &'static [&'static str] {
    &[
        "jpg", "jpeg", "png", "gif", "webp", "tiff", "tif", "bmp", "ico", "tga", "pbm", "pgm",
        "ppm", "pnm", "qoi",
    ]
}

/// Check if a file extension is supported
pub fn is_supported_extension(ext: &str) -> bool {
    let ext_lower = ext.to_lowercase();
    supported_extensions().contains(&ext_lower.as_str())
}

/// A decoded image: row-major 8-bit samples with 3 (RGB) or 4 (RGBA) channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl SourceImage {
    /// Wrap a raw sample buffer.
    ///
    /// # Errors
    ///
    /// Returns `PaletteError::InvalidImage` if:
    /// - width or height is zero
    /// - `channels` is not 3 or 4
    /// - the buffer length does not equal `width * height * channels`
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PaletteError::invalid_image(format!(
                "image has zero area ({}x{})",
                width, height
            )));
        }

        if channels != 3 && channels != 4 {
            return Err(PaletteError::invalid_image(format!(
                "unsupported channel count: {} (expected 3 or 4)",
                channels
            )));
        }

        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(PaletteError::invalid_image(format!(
                "buffer length {} does not match {}x{}x{}",
                data.len(),
                width,
                height,
                channels
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Build an RGB image filled with one color
    pub fn solid(width: u32, height: u32, color: Color) -> Result<Self> {
        let data = color
            .to_array()
            .into_iter()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::from_raw(width, height, 3, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw sample buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Color at (x, y), or `None` when the pixel is fully transparent or
    /// outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.channels as usize;
        let idx = (y as usize * self.width as usize + x as usize) * channels;
        let px = &self.data[idx..idx + channels];
        if channels == 4 && px[3] == 0 {
            return None;
        }
        Some(Color::new(px[0], px[1], px[2]))
    }
}

/// Decode encoded image bytes (PNG, JPEG, ...) into a `SourceImage`
///
/// Images with an alpha channel keep it so transparent pixels can be skipped;
/// everything else is converted to 8-bit RGB.
pub fn decode_image(bytes: &[u8]) -> Result<SourceImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| PaletteError::image_load("Failed to decode image bytes", e))?;
    from_dynamic(img)
}

/// Load an image from disk
///
/// # Errors
///
/// Returns `PaletteError::ImageLoadError` if:
/// - File cannot be opened
/// - Format is not supported
/// - Decoding fails
pub fn load_image(path: &Path) -> Result<SourceImage> {
    if ImageFormat::from_extension(path).is_none() {
        return Err(PaletteError::ImageLoadError {
            message: format!("Unknown image format for file: {}", path.display()),
            source: None,
        });
    }

    let reader = ImageReader::open(path).map_err(|e| {
        PaletteError::image_load(format!("Failed to open image file: {}", path.display()), e)
    })?;

    let img = reader.decode().map_err(|e| {
        PaletteError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;

    from_dynamic(img)
}

fn from_dynamic(img: DynamicImage) -> Result<SourceImage> {
    if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        SourceImage::from_raw(width, height, 4, rgba.into_raw())
    } else {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        SourceImage::from_raw(width, height, 3, rgb.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};
    use std::io::Cursor;

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ImageFormat::from_extension(Path::new("photo.jpg")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_extension(Path::new("photo.JPEG")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_extension(Path::new("photo.png")),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_extension(Path::new("photo.xyz")), None);
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_extension("jpg"));
        assert!(is_supported_extension("PNG"));
        assert!(!is_supported_extension("heic"));
        assert!(!is_supported_extension("doc"));
    }

    #[test]
    fn test_from_raw_rejects_zero_area() {
        let err = SourceImage::from_raw(0, 10, 3, Vec::new()).unwrap_err();
        assert!(matches!(err, PaletteError::InvalidImage { .. }));
    }

    #[test]
    fn test_from_raw_rejects_channel_count() {
        let err = SourceImage::from_raw(1, 1, 2, vec![0, 0]).unwrap_err();
        assert!(matches!(err, PaletteError::InvalidImage { .. }));
    }

    #[test]
    fn test_from_raw_rejects_length_mismatch() {
        let err = SourceImage::from_raw(2, 2, 3, vec![0; 11]).unwrap_err();
        assert!(matches!(err, PaletteError::InvalidImage { .. }));
    }

    #[test]
    fn test_pixel_access_and_transparency() {
        let data = vec![
            255, 0, 0, 255, // opaque red
            0, 255, 0, 0, // transparent green
        ];
        let img = SourceImage::from_raw(2, 1, 4, data).unwrap();
        assert_eq!(img.pixel(0, 0), Some(Color::new(255, 0, 0)));
        assert_eq!(img.pixel(1, 0), None);
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let img = SourceImage::solid(3, 2, Color::new(9, 9, 9)).unwrap();
        assert_eq!(img.pixel(2, 1), Some(Color::new(9, 9, 9)));
        assert_eq!(img.pixel(3, 0), None);
        assert_eq!(img.pixel(0, 2), None);
        assert_eq!(img.pixel(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_decode_rgb_png() {
        let buffer = ImageBuffer::from_pixel(3, 2, Rgb([10u8, 20, 30]));
        let bytes = encode_png(DynamicImage::ImageRgb8(buffer));

        let img = decode_image(&bytes).unwrap();
        assert_eq!((img.width(), img.height(), img.channels()), (3, 2, 3));
        assert_eq!(img.pixel(2, 1), Some(Color::new(10, 20, 30)));
    }

    #[test]
    fn test_decode_rgba_png_keeps_alpha() {
        let buffer = ImageBuffer::from_pixel(2, 2, Rgba([1u8, 2, 3, 0]));
        let bytes = encode_png(DynamicImage::ImageRgba8(buffer));

        let img = decode_image(&bytes).unwrap();
        assert_eq!(img.channels(), 4);
        assert_eq!(img.pixel(0, 0), None);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_image(b"not an image").unwrap_err();
        assert!(matches!(err, PaletteError::ImageLoadError { .. }));
    }

    #[test]
    fn test_load_unknown_extension() {
        let err = load_image(Path::new("palette.xyz")).unwrap_err();
        assert!(matches!(err, PaletteError::ImageLoadError { .. }));
    }
}
