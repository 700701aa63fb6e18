//! Event block segmentation.
//!
//! Non-background pixels inside the schedule area are cleaned up with a
//! closing and an opening pass (3×3 square), and every external contour that
//! is large enough and roughly box-shaped becomes a block candidate.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

use super::{contour_area, points_bounds, BoundingBox, ScheduleArea};
use crate::config::BlockConfig;
use crate::ocr::crop_area;

/// Detects block candidates inside `area`, in full-image coordinates.
///
/// Candidates are returned in contour discovery order (top to bottom, left
/// to right by their first pixel).
pub fn detect_event_blocks(
    image: &GrayImage,
    area: &ScheduleArea,
    config: &BlockConfig,
) -> Vec<BoundingBox> {
    let roi = crop_area(image, area.x0, area.y0, area.width(), area.height());
    let mask = foreground_mask(&roi, config.background_threshold);

    // LInf radius 1 is a 3x3 square structuring element
    let mask = close(&mask, Norm::LInf, 1);
    let mask = open(&mask, Norm::LInf, 1);

    let mut blocks = Vec::new();
    for contour in find_contours::<u32>(&mask) {
        if contour.parent.is_some() || contour.border_type != BorderType::Outer {
            continue;
        }

        let area_px = contour_area(&contour.points);
        if area_px < config.min_area {
            continue;
        }

        let Some(bbox) = points_bounds(&contour.points) else {
            continue;
        };

        let aspect_ratio = bbox.w as f64 / bbox.h as f64;
        if aspect_ratio < config.min_aspect || aspect_ratio > config.max_aspect {
            log::trace!("Rejected {:?}: aspect ratio {:.2}", bbox, aspect_ratio);
            continue;
        }

        blocks.push(BoundingBox {
            x: bbox.x + area.x0,
            y: bbox.y + area.y0,
            w: bbox.w,
            h: bbox.h,
        });
    }

    log::debug!("Detected {} event block candidates", blocks.len());
    blocks
}

/// White (255) where the pixel is at or below `threshold`, black elsewhere.
fn foreground_mask(roi: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = roi.dimensions();
    let mut mask = GrayImage::new(width, height);

    for (x, y, pixel) in roi.enumerate_pixels() {
        let value = if pixel[0] > threshold { 0u8 } else { 255u8 };
        mask.put_pixel(x, y, Luma([value]));
    }

    mask
}
