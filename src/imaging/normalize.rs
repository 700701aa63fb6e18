//! Decoding and normalization of uploaded schedule images.
//!
//! Raw bytes are decoded to RGB, resized to a fixed width, converted to
//! grayscale, and binarized with Otsu's global threshold. Every later stage
//! works on the resulting single-channel image.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use imageproc::contrast::otsu_level;

use crate::config::NormalizeConfig;
use crate::error::ParseError;
use crate::layout::Detection;

/// Binarized, fixed-width working image.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Binarized pixels (0 = dark, 255 = light)
    pub pixels: GrayImage,
    /// Width of the decoded input before resizing
    pub original_width: u32,
    /// Height of the decoded input before resizing
    pub original_height: u32,
    /// Otsu level used for binarization
    pub threshold: u8,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Decodes, resizes, grayscales and binarizes raw image bytes.
///
/// Returns `Fallback` when only the single-channel fallback decoder could read
/// the bytes. Fails on empty input or when both decoders reject the data.
pub fn normalize_image(
    bytes: &[u8],
    config: &NormalizeConfig,
) -> Result<Detection<NormalizedImage>, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let decoded = decode_image(bytes)?;
    let (original_width, original_height) = {
        let img = decoded.value();
        img.dimensions()
    };

    Ok(decoded.map(|rgb| {
        let resized = resize_to_width(&rgb, config.target_width);
        let gray = imageops::grayscale(&resized);
        let threshold = otsu_level(&gray);
        log::debug!(
            "Normalized {}x{} -> {}x{} (otsu level {})",
            original_width,
            original_height,
            gray.width(),
            gray.height(),
            threshold
        );

        NormalizedImage {
            pixels: binarize(&gray, threshold),
            original_width,
            original_height,
            threshold,
        }
    }))
}

/// Decodes bytes into a 3-channel image.
///
/// The primary attempt sniffs the format from the header. If that fails, every
/// enabled format is tried explicitly as a single-channel decode and the first
/// success is promoted back to 3 channels.
fn decode_image(bytes: &[u8]) -> Result<Detection<RgbImage>, ParseError> {
    let primary_err = match image::load_from_memory(bytes) {
        Ok(img) => return Ok(Detection::Detected(img.to_rgb8())),
        Err(e) => e,
    };

    log::warn!("Primary decode failed: {}. Trying single-channel fallback.", primary_err);

    let mut attempted = Vec::new();
    for format in ImageFormat::all().filter(|f| f.reading_enabled()) {
        attempted.push(format!("{:?}", format));
        if let Ok(img) = image::load_from_memory_with_format(bytes, format) {
            let gray = img.to_luma8();
            let promoted = DynamicImage::ImageLuma8(gray).to_rgb8();
            return Ok(Detection::Fallback {
                value: promoted,
                reason: format!(
                    "Failed to decode image as color ({}), decoded as single-channel {:?} instead",
                    primary_err, format
                ),
            });
        }
    }

    Err(ParseError::Undecodable {
        primary: primary_err.to_string(),
        fallback: format!("no decoder accepted the data (tried {})", attempted.join(", ")),
    })
}

/// Target height for a fixed-width resize: `round(width / aspect_ratio)`, at least 1.
pub fn target_height(original_width: u32, original_height: u32, target_width: u32) -> u32 {
    let aspect_ratio = original_width as f64 / original_height as f64;
    ((target_width as f64 / aspect_ratio).round() as u32).max(1)
}

fn resize_to_width(img: &RgbImage, target_width: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    let new_height = target_height(width, height, target_width);

    if (width, height) == (target_width, new_height) {
        return img.clone();
    }

    imageops::resize(img, target_width, new_height, FilterType::Triangle)
}

/// Converts a grayscale image to pure black/white.
///
/// Pixels strictly brighter than `level` become white (255), all others black (0).
pub fn binarize(gray: &GrayImage, level: u8) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel[0] > level { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let err = normalize_image(&[], &NormalizeConfig::default()).unwrap_err();
        assert!(matches!(err, ParseError::EmptyInput));
    }

    #[test]
    fn test_garbage_input_is_fatal() {
        let err = normalize_image(b"definitely not an image", &NormalizeConfig::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::Undecodable { .. }));
    }

    #[test]
    fn test_resizes_to_fixed_width() {
        let img = RgbImage::from_pixel(800, 600, Rgb([255, 255, 255]));
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Png);

        let normalized = normalize_image(&bytes, &NormalizeConfig::default()).unwrap();
        assert!(!normalized.is_fallback());
        let normalized = normalized.value();
        assert_eq!(normalized.width(), 1600);
        assert_eq!(normalized.height(), 1200);
        assert_eq!((normalized.original_width, normalized.original_height), (800, 600));
    }

    #[test]
    fn test_target_height_rounds() {
        // 1600 / (1000 / 333) = 532.8
        assert_eq!(target_height(1000, 333, 1600), 533);
        assert_eq!(target_height(1600, 1000, 1600), 1000);
        assert_eq!(target_height(100_000, 1, 1600), 1);
    }

    #[test]
    fn test_grayscale_input_is_promoted() {
        let img = GrayImage::from_pixel(400, 200, Luma([30]));
        let bytes = encode(DynamicImage::ImageLuma8(img), ImageFormat::Png);

        let normalized = normalize_image(&bytes, &NormalizeConfig::default()).unwrap();
        let normalized = normalized.value();
        assert_eq!(normalized.width(), 1600);
        assert_eq!(normalized.height(), 800);
    }

    #[test]
    fn test_headerless_format_uses_fallback_decoder() {
        // TGA has no magic number, so header sniffing cannot identify it
        let img = RgbImage::from_pixel(160, 100, Rgb([200, 10, 10]));
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Tga);

        let normalized = normalize_image(&bytes, &NormalizeConfig::default()).unwrap();
        assert!(normalized.is_fallback());
        assert_eq!(normalized.value().width(), 1600);
    }

    #[test]
    fn test_binarize_splits_on_level() {
        let mut gray = GrayImage::new(3, 1);
        gray.put_pixel(0, 0, Luma([40]));
        gray.put_pixel(1, 0, Luma([128]));
        gray.put_pixel(2, 0, Luma([250]));

        let result = binarize(&gray, 128);
        assert_eq!(result.get_pixel(0, 0)[0], 0);
        assert_eq!(result.get_pixel(1, 0)[0], 0, "Pixel equal to level should become black");
        assert_eq!(result.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_two_tone_image_keeps_dark_block() {
        let mut img = RgbImage::from_pixel(1600, 1000, Rgb([255, 255, 255]));
        for y in 100..200 {
            for x in 100..300 {
                img.put_pixel(x, y, Rgb([52, 101, 164]));
            }
        }
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Png);

        let normalized = normalize_image(&bytes, &NormalizeConfig::default()).unwrap();
        let pixels = &normalized.value().pixels;
        assert_eq!(pixels.get_pixel(150, 150)[0], 0);
        assert_eq!(pixels.get_pixel(10, 10)[0], 255);
    }
}
