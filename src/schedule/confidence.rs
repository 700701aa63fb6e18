use serde::Serialize;

/// Coarse quality tier of an extracted block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Confidence {
    #[serde(rename = "HI")]
    High,
    #[serde(rename = "MED")]
    Medium,
    #[serde(rename = "LO")]
    Low,
}

/// Text longer than this many characters can score `High`.
const HIGH_TEXT_LENGTH: usize = 5;

/// Scores a block from its detection flags and recognized text.
///
/// Length is counted in characters after trimming.
pub fn score_confidence(has_day: bool, has_time: bool, text: &str) -> Confidence {
    let length = text.trim().chars().count();
    if !has_day || !has_time || length == 0 {
        return Confidence::Low;
    }
    if length > HIGH_TEXT_LENGTH {
        Confidence::High
    } else {
        Confidence::Medium
    }
}
