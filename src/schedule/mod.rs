//! Schedule semantics: turning detected boxes into dated, titled classes.

pub mod confidence;
pub mod course;
pub mod mapper;
pub mod time;

pub use confidence::{score_confidence, Confidence};
pub use course::{parse_course_info, CourseInfo};
pub use mapper::{assign_day, map_block, y_to_time};
pub use time::ClockTime;

use serde::Serialize;

use crate::layout::BoundingBox;

/// One class occurrence extracted from the grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBlock {
    pub bbox: BoundingBox,
    pub text: String,
    /// 0 = Sunday … 6 = Saturday
    pub day_of_week: u8,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub class_title: String,
    pub class_code_guess: Option<String>,
    pub location_guess: Option<String>,
    pub confidence: Confidence,
}

impl ScheduleBlock {
    /// Ordering key of the final block list.
    pub fn sort_key(&self) -> (u8, ClockTime) {
        (self.day_of_week, self.start_time)
    }
}
