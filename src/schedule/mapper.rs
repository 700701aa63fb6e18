//! Maps block geometry onto the day/time grid.

use anyhow::Result;

use super::{parse_course_info, score_confidence, ClockTime, ScheduleBlock};
use crate::config::AxesConfig;
use crate::layout::{BoundingBox, DayColumn, ScheduleArea, TimeMark};

/// Day index of the first column whose `[xStart, xEnd)` contains the block's
/// horizontal centre; Sunday (0) when none does.
pub fn assign_day(bbox: &BoundingBox, columns: &[DayColumn]) -> u8 {
    let center = bbox.center_x();
    columns
        .iter()
        .find(|c| c.contains(center))
        .map(|c| c.day_of_week)
        .unwrap_or(0)
}

/// Converts a y coordinate to a clock time snapped to 5 minutes.
///
/// Without marks, the area height spans a fixed linear window. With marks,
/// the nearest mark's time is reused as is (ties go to the upper mark).
pub fn y_to_time(y: u32, marks: &[TimeMark], area: &ScheduleArea, config: &AxesConfig) -> ClockTime {
    let raw = match marks.iter().min_by_key(|m| m.y.abs_diff(y)) {
        Some(mark) => mark.time,
        None => {
            let height = area.height() as u64;
            let span = config.fallback_span_hours as u64 * 60;
            let offset = if height == 0 {
                0
            } else {
                y.saturating_sub(area.y0) as u64 * span / height
            };
            ClockTime::from_minutes(config.fallback_start_hour * 60 + offset as u32)
        }
    };
    raw.snap_to_5min()
}

/// Builds the output block for a recognized region.
pub fn map_block(
    bbox: BoundingBox,
    text: &str,
    columns: &[DayColumn],
    marks: &[TimeMark],
    area: &ScheduleArea,
    config: &AxesConfig,
) -> Result<ScheduleBlock> {
    let day_of_week = assign_day(&bbox, columns);
    let start_time = y_to_time(bbox.y, marks, area, config);
    let end_time = y_to_time(bbox.bottom(), marks, area, config);
    let info = parse_course_info(text)?;

    // Day and time always resolve to something, so both count as detected
    let confidence = score_confidence(true, true, text);

    Ok(ScheduleBlock {
        bbox,
        text: text.trim().to_string(),
        day_of_week,
        start_time,
        end_time,
        class_title: info.title,
        class_code_guess: info.code,
        location_guess: info.location,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::columns::partition_columns;
    use crate::schedule::Confidence;

    fn area() -> ScheduleArea {
        ScheduleArea { x0: 192, y0: 100, x1: 1600, y1: 1000 }
    }

    fn t(h: u32, m: u32) -> ClockTime {
        ClockTime::from_hm(h, m).unwrap()
    }

    #[test]
    fn test_assign_day_by_center() {
        let columns = partition_columns(&area());
        let bbox = BoundingBox { x: 620, y: 213, w: 150, h: 56 };
        assert_eq!(assign_day(&bbox, &columns), 2);

        let first = BoundingBox { x: 200, y: 213, w: 20, h: 20 };
        assert_eq!(assign_day(&first, &columns), 0);

        let last = BoundingBox { x: 1500, y: 213, w: 80, h: 20 };
        assert_eq!(assign_day(&last, &columns), 6);
    }

    #[test]
    fn test_assign_day_outside_columns_defaults_to_sunday() {
        let columns = partition_columns(&area());
        let bbox = BoundingBox { x: 10, y: 10, w: 20, h: 20 };
        assert_eq!(assign_day(&bbox, &columns), 0);
        assert_eq!(assign_day(&bbox, &[]), 0);
    }

    #[test]
    fn test_fallback_window() {
        let config = AxesConfig::default();
        assert_eq!(y_to_time(100, &[], &area(), &config), t(6, 0));
        // 113px of 900 over 16h = 120.5 min
        assert_eq!(y_to_time(213, &[], &area(), &config), t(8, 0));
        assert_eq!(y_to_time(269, &[], &area(), &config), t(9, 0));
        assert_eq!(y_to_time(1000, &[], &area(), &config), t(22, 0));
    }

    #[test]
    fn test_fallback_times_are_snapped() {
        let config = AxesConfig::default();
        for y in 100..1000 {
            let time = y_to_time(y, &[], &area(), &config);
            assert_eq!(time.minute() % 5, 0);
        }
    }

    #[test]
    fn test_nearest_mark_is_reused() {
        let config = AxesConfig::default();
        let marks = vec![
            TimeMark { y: 100, time: t(8, 0) },
            TimeMark { y: 300, time: t(9, 0) },
        ];
        assert_eq!(y_to_time(150, &marks, &area(), &config), t(8, 0));
        assert_eq!(y_to_time(260, &marks, &area(), &config), t(9, 0));
        // Equidistant: the upper mark wins
        assert_eq!(y_to_time(200, &marks, &area(), &config), t(8, 0));
    }

    #[test]
    fn test_map_block() {
        let columns = partition_columns(&area());
        let bbox = BoundingBox { x: 620, y: 213, w: 150, h: 56 };
        let block = map_block(
            bbox,
            "CS 101 Intro to Programming\nRoom 204\n",
            &columns,
            &[],
            &area(),
            &AxesConfig::default(),
        )
        .unwrap();

        assert_eq!(block.day_of_week, 2);
        assert_eq!(block.start_time, t(8, 0));
        assert_eq!(block.end_time, t(9, 0));
        assert_eq!(block.text, "CS 101 Intro to Programming\nRoom 204");
        assert_eq!(block.class_title, "Intro to Programming");
        assert_eq!(block.confidence, Confidence::High);
    }
}
