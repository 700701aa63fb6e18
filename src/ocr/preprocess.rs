use image::{GrayImage, imageops};

use crate::layout::BoundingBox;

/// Crops a sub-region using absolute pixel coordinates.
///
/// The origin and size are clamped to the image bounds, so the result may be
/// smaller than requested (or empty).
pub fn crop_area(img: &GrayImage, x: u32, y: u32, width: u32, height: u32) -> GrayImage {
    let (w, h) = img.dimensions();

    let x0 = x.min(w);
    let y0 = y.min(h);
    let rw = width.min(w - x0);
    let rh = height.min(h - y0);

    imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}

/// Crops a block with `padding` extra pixels on every side.
///
/// The padded origin is clamped at 0 and the padded size keeps the full
/// `2 * padding` extension, then everything is clamped to the image.
pub fn crop_padded(img: &GrayImage, bbox: &BoundingBox, padding: u32) -> GrayImage {
    let x = bbox.x.saturating_sub(padding);
    let y = bbox.y.saturating_sub(padding);
    crop_area(img, x, y, bbox.w + padding * 2, bbox.h + padding * 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_crop_area() {
        // 100x200 image
        let img = GrayImage::from_fn(100, 200, |x, y| Luma([(x + y) as u8]));

        let cropped = crop_area(&img, 10, 50, 50, 20);

        assert_eq!(cropped.dimensions(), (50, 20));
        // Top-left pixel should be (10, 50) from original
        assert_eq!(cropped.get_pixel(0, 0)[0], 60);
    }

    #[test]
    fn test_crop_area_clamps() {
        let img = GrayImage::new(100, 100);
        let cropped = crop_area(&img, 90, 90, 50, 50);

        // Should clamp to 10x10 (remaining pixels)
        assert_eq!(cropped.dimensions(), (10, 10));

        let outside = crop_area(&img, 150, 150, 10, 10);
        assert_eq!(outside.dimensions(), (0, 0));
    }

    #[test]
    fn test_crop_padded() {
        let img = GrayImage::new(1600, 1000);
        let bbox = BoundingBox { x: 620, y: 213, w: 150, h: 56 };
        assert_eq!(crop_padded(&img, &bbox, 5).dimensions(), (160, 66));

        // Near the corner the origin clamps at 0 but the size keeps the padding
        let corner = BoundingBox { x: 2, y: 0, w: 50, h: 40 };
        assert_eq!(crop_padded(&img, &corner, 5).dimensions(), (60, 50));
    }
}
