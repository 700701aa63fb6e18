//! Time axis label anchoring.
//!
//! The left band of the schedule area is recognized as text, and every line
//! that looks like `9AM` / `12 PM` becomes a time mark. The vertical position
//! of a mark is estimated from the line's index among all recognized lines,
//! not measured from the pixels.

use anyhow::Result;
use image::GrayImage;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{Detection, ScheduleArea};
use crate::config::AxesConfig;
use crate::ocr::{crop_area, TextRecognizer};
use crate::schedule::ClockTime;

/// A recognized time label anchored to an approximate y position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimeMark {
    pub y: u32,
    pub time: ClockTime,
}

/// Hour followed by AM/PM, e.g. `9AM`, `12 pm`
const TIME_LABEL_PATTERN: &str = r"(?i)(\d{1,2})\s*(AM|PM)";

/// Reads the time axis band and returns marks sorted by y.
///
/// Returns `Fallback` with no marks when nothing usable was read; callers then
/// use the linear default window.
pub fn detect_time_marks<R: TextRecognizer + ?Sized>(
    image: &GrayImage,
    area: &ScheduleArea,
    config: &AxesConfig,
    recognizer: &R,
) -> Detection<Vec<TimeMark>> {
    let band_width = (area.width() as f64 * config.time_axis_band) as u32;
    let band = crop_area(image, area.x0, area.y0, band_width, area.height());

    let text = match recognizer.recognize(&band) {
        Ok(text) => text,
        Err(e) => {
            return Detection::Fallback {
                value: Vec::new(),
                reason: format!(
                    "Time axis recognition failed ({}), assuming {:02}:00 + {}h window",
                    e, config.fallback_start_hour, config.fallback_span_hours
                ),
            };
        }
    };

    let marks = match marks_from_text(&text, area) {
        Ok(marks) => marks,
        Err(e) => {
            return Detection::Fallback {
                value: Vec::new(),
                reason: format!("Time axis labels could not be parsed: {}", e),
            };
        }
    };
    log::debug!("Time marks: {:?}", marks);

    if marks.is_empty() {
        Detection::Fallback {
            value: marks,
            reason: format!(
                "No time labels found on time axis, assuming {:02}:00 + {}h window",
                config.fallback_start_hour, config.fallback_span_hours
            ),
        }
    } else {
        Detection::Detected(marks)
    }
}

/// Converts recognized axis text into marks.
///
/// Line `i` of `n` is placed at `y0 + (i / n) * height`. When two lines land on
/// the same y, the later one wins.
pub fn marks_from_text(text: &str, area: &ScheduleArea) -> Result<Vec<TimeMark>> {
    let regex = Regex::new(TIME_LABEL_PATTERN)?;
    let lines: Vec<&str> = text.split('\n').collect();
    let total = lines.len() as u64;
    let mut by_y: BTreeMap<u32, ClockTime> = BTreeMap::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some(time) = parse_time_label(&regex, line) else {
            continue;
        };
        let y = area.y0 + (idx as u64 * area.height() as u64 / total) as u32;
        by_y.insert(y, time);
    }

    Ok(by_y.into_iter().map(|(y, time)| TimeMark { y, time }).collect())
}

/// Parses the first `<hour><AM|PM>` label in a line into a 24-hour time.
///
/// 12 AM is midnight, 12 PM is noon. Hours outside 1-12 are rejected.
pub fn parse_time_label(regex: &Regex, line: &str) -> Option<ClockTime> {
    let caps = regex.captures(line)?;
    let hour: u32 = caps[1].parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }

    let pm = caps[2].eq_ignore_ascii_case("PM");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    ClockTime::from_hm(hour, 0)
}
