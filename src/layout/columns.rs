//! Day column partitioning.
//!
//! The schedule area is always split into 7 equal columns, Sunday to Saturday
//! from left to right. The header band is read only to confirm labels; it
//! never moves a column boundary.

use image::GrayImage;
use serde::Serialize;

use super::{Detection, ScheduleArea};
use crate::config::AxesConfig;
use crate::ocr::{crop_area, TextRecognizer};

/// Three-letter day codes, indexed by day of week (0 = Sunday).
pub const DAY_LABELS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// One of the 7 vertical partitions of the schedule area.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayColumn {
    #[serde(rename = "dayOfWeek")]
    pub day_of_week: u8,
    pub label: String,
    #[serde(rename = "xStart")]
    pub x_start: u32,
    #[serde(rename = "xEnd")]
    pub x_end: u32,
}

impl DayColumn {
    /// True if `x` lies in `[x_start, x_end)`.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.x_start as f64 && x < self.x_end as f64
    }
}

/// Reads the header band and partitions the area into 7 day columns.
///
/// Returns `Fallback` when no day label could be read from the header; the
/// columns are identical either way.
pub fn detect_day_columns<R: TextRecognizer + ?Sized>(
    image: &GrayImage,
    area: &ScheduleArea,
    config: &AxesConfig,
    recognizer: &R,
) -> Detection<Vec<DayColumn>> {
    let header_height = (area.height() as f64 * config.header_band) as u32;
    let header = crop_area(image, area.x0, area.y0, area.width(), header_height);

    let header_text = match recognizer.recognize(&header) {
        Ok(text) => text,
        Err(e) => {
            return Detection::Fallback {
                value: partition_columns(area),
                reason: format!("Header recognition failed ({}), assuming Sun-Sat columns", e),
            };
        }
    };

    let found = match_day_labels(&header_text);
    log::debug!("Header labels found: {:?}", found);

    let columns = partition_columns(area);
    if found.is_empty() {
        Detection::Fallback {
            value: columns,
            reason: "No day labels found in header, assuming Sun-Sat columns".to_string(),
        }
    } else {
        Detection::Detected(columns)
    }
}

/// Indices of the day labels present in `text` (case-insensitive).
pub fn match_day_labels(text: &str) -> Vec<usize> {
    let upper = text.to_uppercase();
    DAY_LABELS
        .iter()
        .enumerate()
        .filter(|(_, label)| upper.contains(*label))
        .map(|(i, _)| i)
        .collect()
}

/// Splits the area width into 7 contiguous columns labelled Sun..Sat.
///
/// Boundaries use integer arithmetic so the last column ends exactly at `x1`.
pub fn partition_columns(area: &ScheduleArea) -> Vec<DayColumn> {
    let width = area.width();
    (0..7u32)
        .map(|i| DayColumn {
            day_of_week: i as u8,
            label: DAY_LABELS[i as usize].to_string(),
            x_start: area.x0 + i * width / 7,
            x_end: area.x0 + (i + 1) * width / 7,
        })
        .collect()
}
