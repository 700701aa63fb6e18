//! Schedule area location.
//!
//! Three strategies are tried in order:
//! 1. Canny edges + Hough transform: the outermost grid lines bound the area
//! 2. Largest external edge contour, if it covers enough of the image
//! 3. Static margins (top 10% header, left 12% time axis)

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::edges::canny;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

use super::{contour_area, points_bounds, Detection, ScheduleArea};
use crate::config::AreaConfig;

/// Lines within this many degrees of an axis count as grid lines.
const AXIS_TOLERANCE_DEG: u32 = 10;

/// Finds the rectangle of the normalized image that contains the grid.
///
/// Always produces an area; `Fallback` means both measured strategies failed
/// and the static margins were used.
pub fn locate_schedule_area(image: &GrayImage, config: &AreaConfig) -> Detection<ScheduleArea> {
    let edges = canny(image, config.canny_low, config.canny_high);

    match area_from_grid_lines(&edges, config) {
        Ok(area) => {
            log::debug!("Schedule area from grid lines: {:?}", area);
            return Detection::Detected(area);
        }
        Err(reason) => log::debug!("Grid line strategy failed: {}", reason),
    }

    match area_from_largest_contour(&edges, config) {
        Ok(area) => {
            log::debug!("Schedule area from largest contour: {:?}", area);
            return Detection::Detected(area);
        }
        Err(reason) => log::debug!("Contour strategy failed: {}", reason),
    }

    Detection::Fallback {
        value: static_area(image.width(), image.height(), config),
        reason: "Could not detect schedule area, using default bounds".to_string(),
    }
}

/// Static margin heuristic: exclude the header band on top and the time axis on the left.
pub fn static_area(width: u32, height: u32, config: &AreaConfig) -> ScheduleArea {
    ScheduleArea {
        x0: (width as f64 * config.time_axis_margin) as u32,
        y0: (height as f64 * config.header_margin) as u32,
        x1: width,
        y1: height,
    }
}

fn area_from_grid_lines(edges: &GrayImage, config: &AreaConfig) -> Result<ScheduleArea, String> {
    let options = LineDetectionOptions {
        vote_threshold: config.hough_vote_threshold,
        suppression_radius: config.hough_suppression_radius,
    };
    let lines = detect_lines(edges, options);

    if lines.len() < config.min_grid_lines {
        return Err(format!(
            "found {} lines, need {}",
            lines.len(),
            config.min_grid_lines
        ));
    }

    let (width, height) = edges.dimensions();
    let mut xs: Vec<f64> = Vec::new();
    let mut ys: Vec<f64> = Vec::new();

    for line in &lines {
        let angle = line.angle_in_degrees % 180;
        if angle <= AXIS_TOLERANCE_DEG || angle >= 180 - AXIS_TOLERANCE_DEG {
            xs.push(vertical_intercept(line, height as f64 / 2.0));
        } else if angle.abs_diff(90) <= AXIS_TOLERANCE_DEG {
            ys.push(horizontal_intercept(line, width as f64 / 2.0));
        }
    }

    if xs.len() < 2 || ys.len() < 2 {
        return Err(format!(
            "{} vertical and {} horizontal lines, need 2 of each",
            xs.len(),
            ys.len()
        ));
    }

    let clamp = |v: f64, max: u32| v.round().clamp(0.0, max as f64) as u32;
    let area = ScheduleArea {
        x0: clamp(xs.iter().cloned().fold(f64::INFINITY, f64::min), width),
        x1: clamp(xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max), width),
        y0: clamp(ys.iter().cloned().fold(f64::INFINITY, f64::min), height),
        y1: clamp(ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max), height),
    };

    check_coverage(area, width, height, config)
}

fn area_from_largest_contour(
    edges: &GrayImage,
    config: &AreaConfig,
) -> Result<ScheduleArea, String> {
    let contours = find_contours::<u32>(edges);

    let largest = contours
        .iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .map(|c| (contour_area(&c.points), c))
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c)
        .ok_or_else(|| "no external contours".to_string())?;

    let bbox = points_bounds(&largest.points).ok_or_else(|| "empty contour".to_string())?;
    let area = ScheduleArea {
        x0: bbox.x,
        y0: bbox.y,
        x1: bbox.x + bbox.w,
        y1: bbox.y + bbox.h,
    };

    check_coverage(area, edges.width(), edges.height(), config)
}

fn check_coverage(
    area: ScheduleArea,
    width: u32,
    height: u32,
    config: &AreaConfig,
) -> Result<ScheduleArea, String> {
    let min_w = width as f64 * config.min_width_fraction;
    let min_h = height as f64 * config.min_height_fraction;

    if (area.width() as f64) < min_w || (area.height() as f64) < min_h {
        return Err(format!(
            "candidate {}x{} smaller than required {:.0}x{:.0}",
            area.width(),
            area.height(),
            min_w,
            min_h
        ));
    }
    Ok(area)
}

/// x where a near-vertical line crosses the row `y`.
fn vertical_intercept(line: &PolarLine, y: f64) -> f64 {
    let theta = (line.angle_in_degrees as f64).to_radians();
    (line.r as f64 - y * theta.sin()) / theta.cos()
}

/// y where a near-horizontal line crosses the column `x`.
fn horizontal_intercept(line: &PolarLine, x: f64) -> f64 {
    let theta = (line.angle_in_degrees as f64).to_radians();
    (line.r as f64 - x * theta.cos()) / theta.sin()
}
