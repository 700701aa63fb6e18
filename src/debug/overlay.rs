use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use serde::Serialize;
use std::io::Cursor;

use crate::layout::{BoundingBox, DayColumn, ScheduleArea, TimeMark};

pub const COLOR_AREA: Rgb<u8> = Rgb([0, 255, 0]); // Green
pub const COLOR_COLUMN: Rgb<u8> = Rgb([0, 0, 255]); // Blue
pub const COLOR_BLOCK: Rgb<u8> = Rgb([255, 0, 0]); // Red

const AREA_THICKNESS: u32 = 3;
const COLUMN_THICKNESS: u32 = 2;
const BLOCK_THICKNESS: u32 = 2;

/// Diagnostic payload returned when the caller asks for debug output.
#[derive(Clone, Debug, Serialize)]
pub struct DebugOverlay {
    /// Base64-encoded PNG of the annotated normalized image
    pub overlay_image_base64: String,
    pub detected_columns: Vec<DayColumn>,
    pub detected_time_marks: Vec<TimeMark>,
    pub schedule_area: ScheduleArea,
}

impl DebugOverlay {
    /// Decodes the overlay back to PNG bytes.
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.overlay_image_base64)
            .context("Overlay image is not valid base64")
    }
}

/// Renders the overlay and bundles it with the detected geometry.
pub fn build_debug_overlay(
    image: &GrayImage,
    area: &ScheduleArea,
    columns: &[DayColumn],
    marks: &[TimeMark],
    blocks: &[BoundingBox],
) -> Result<DebugOverlay> {
    let annotated = render_overlay(image, area, columns, blocks);
    Ok(DebugOverlay {
        overlay_image_base64: encode_png_base64(&annotated)?,
        detected_columns: columns.to_vec(),
        detected_time_marks: marks.to_vec(),
        schedule_area: *area,
    })
}

/// Draws the area outline, every column boundary and every block outline onto
/// an RGB copy of `image`.
pub fn render_overlay(
    image: &GrayImage,
    area: &ScheduleArea,
    columns: &[DayColumn],
    blocks: &[BoundingBox],
) -> RgbImage {
    let mut img = DynamicImage::ImageLuma8(image.clone()).to_rgb8();

    draw_rect(
        &mut img,
        area.x0,
        area.y0,
        area.width(),
        area.height(),
        COLOR_AREA,
        AREA_THICKNESS,
    );

    // Left edge of every column plus the right edge of the last one
    let boundaries = columns
        .iter()
        .map(|c| c.x_start)
        .chain(columns.last().map(|c| c.x_end));
    for x in boundaries {
        draw_vertical_line(&mut img, x, area.y0, area.height(), COLOR_COLUMN, COLUMN_THICKNESS);
    }

    for b in blocks {
        draw_rect(&mut img, b.x, b.y, b.w, b.h, COLOR_BLOCK, BLOCK_THICKNESS);
    }

    img
}

/// Draws a rectangle outline growing inwards by `thickness` pixels.
pub fn draw_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>, thickness: u32) {
    for inset in 0..thickness {
        let Some(rw) = w.checked_sub(inset * 2).filter(|v| *v > 0) else {
            break;
        };
        let Some(rh) = h.checked_sub(inset * 2).filter(|v| *v > 0) else {
            break;
        };
        let rect = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(rw, rh);
        draw_hollow_rect_mut(img, rect, color);
    }
}

/// Draws a vertical line of `thickness` pixels centred on `x`.
fn draw_vertical_line(img: &mut RgbImage, x: u32, y: u32, h: u32, color: Rgb<u8>, thickness: u32) {
    if h == 0 || thickness == 0 {
        return;
    }
    let left = x as i32 - (thickness / 2) as i32;
    draw_filled_rect_mut(img, Rect::at(left, y as i32).of_size(thickness, h), color);
}

/// Encodes an image as PNG and then base64.
pub fn encode_png_base64(img: &RgbImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .context("Failed to encode overlay as PNG")?;
    Ok(STANDARD.encode(buffer.into_inner()))
}
