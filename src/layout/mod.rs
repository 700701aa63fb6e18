//! Geometric layout inference for grid calendars.
//!
//! This module provides:
//! - Schedule area location (grid lines, largest contour, static margins)
//! - Day column partitioning with header label matching
//! - Time axis label anchoring
//! - Event block segmentation
//!
//! Every stage reports whether it measured its result or fell back to a
//! heuristic, so the pipeline can turn degradations into warnings.

pub mod area;
pub mod blocks;
pub mod columns;
pub mod time_axis;

pub use area::locate_schedule_area;
pub use blocks::detect_event_blocks;
pub use columns::{detect_day_columns, DayColumn, DAY_LABELS};
pub use time_axis::{detect_time_marks, TimeMark};

use serde::Serialize;

/// Outcome of a detection stage.
#[derive(Debug, Clone)]
pub enum Detection<T> {
    /// The stage measured its result from the image.
    Detected(T),
    /// The stage gave up and substituted a heuristic value.
    Fallback { value: T, reason: String },
}

impl<T> Detection<T> {
    pub fn value(&self) -> &T {
        match self {
            Detection::Detected(value) => value,
            Detection::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Detection::Fallback { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Detection<U> {
        match self {
            Detection::Detected(value) => Detection::Detected(f(value)),
            Detection::Fallback { value, reason } => Detection::Fallback {
                value: f(value),
                reason,
            },
        }
    }

    /// Unwraps the value, recording the fallback reason as a warning.
    pub fn into_value(self, warnings: &mut Vec<String>) -> T {
        match self {
            Detection::Detected(value) => value,
            Detection::Fallback { value, reason } => {
                log::warn!("{}", reason);
                warnings.push(reason);
                value
            }
        }
    }
}

/// Rectangle `[x0, x1) × [y0, y1)` of the normalized image containing the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduleArea {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl ScheduleArea {
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }
}

/// Axis-aligned box in normalized image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    pub fn center_x(&self) -> f64 {
        self.x as f64 + self.w as f64 / 2.0
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// Bounding box of a set of contour points, inclusive of the extreme pixels.
pub(crate) fn points_bounds(points: &[imageproc::point::Point<u32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox {
        x: min_x,
        y: min_y,
        w: max_x - min_x + 1,
        h: max_y - min_y + 1,
    })
}

/// Polygon area of a closed contour (shoelace formula).
pub(crate) fn contour_area(points: &[imageproc::point::Point<u32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0f64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    twice_area.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::point::Point;

    #[test]
    fn test_fallback_records_warning() {
        let mut warnings = Vec::new();
        let detected = Detection::Detected(1).into_value(&mut warnings);
        let fallback = Detection::Fallback {
            value: 2,
            reason: "used default".to_string(),
        }
        .into_value(&mut warnings);

        assert_eq!((detected, fallback), (1, 2));
        assert_eq!(warnings, vec!["used default".to_string()]);
    }

    #[test]
    fn test_map_keeps_reason() {
        let mapped = Detection::Fallback {
            value: 2,
            reason: "r".to_string(),
        }
        .map(|v| v * 10);
        assert!(mapped.is_fallback());
        assert_eq!(*mapped.value(), 20);
    }

    #[test]
    fn test_contour_area_and_bounds() {
        let square = [
            Point::new(10u32, 10u32),
            Point::new(20, 10),
            Point::new(20, 20),
            Point::new(10, 20),
        ];
        assert_eq!(contour_area(&square), 100.0);
        assert_eq!(
            points_bounds(&square),
            Some(BoundingBox { x: 10, y: 10, w: 11, h: 11 })
        );
        assert_eq!(points_bounds(&[]), None);
    }
}
