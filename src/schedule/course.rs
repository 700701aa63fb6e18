//! Course metadata guessed from block text.

use anyhow::Result;
use regex::Regex;

/// 2-6 uppercase letters, optional separator, 2-3 digits (`CS 101`, `MATH-221`)
const COURSE_CODE_PATTERN: &str = r"\b([A-Z]{2,6}[\s-]?\d{2,3})\b";

/// Location patterns in priority order
const LOCATION_PATTERNS: &[&str] = &[
    // Keyword followed by the rest of the line (`Room 204`, `Hall B-12`)
    r"(?i)\b(Room|Hall|Building|CAS|ENG|SCI|MATH|HUM)\s+([A-Z0-9 \t-]+)",
    // Bare building code (`ENG 1010`)
    r"\b([A-Z]{2,4}\s+\d{3,4})\b",
];

const UNTITLED: &str = "Untitled Class";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourseInfo {
    pub title: String,
    pub code: Option<String>,
    pub location: Option<String>,
}

/// Extracts title, course code and location from newline-delimited block text.
///
/// The title is the first non-empty line with any course code removed; if
/// removing the code leaves nothing, the whole line is the title.
pub fn parse_course_info(text: &str) -> Result<CourseInfo> {
    let code_regex = Regex::new(COURSE_CODE_PATTERN)?;

    let title = match text.lines().map(str::trim).find(|l| !l.is_empty()) {
        Some(first) => {
            let stripped = code_regex.replace_all(first, "");
            let stripped = stripped.trim();
            if stripped.is_empty() {
                first.to_string()
            } else {
                stripped.to_string()
            }
        }
        None => UNTITLED.to_string(),
    };

    let code = code_regex.captures(text).map(|c| c[1].to_string());

    let mut location = None;
    for pattern in LOCATION_PATTERNS {
        let regex = Regex::new(pattern)?;
        if let Some(m) = regex.find(text) {
            location = Some(m.as_str().trim().to_string());
            break;
        }
    }

    Ok(CourseInfo { title, code, location })
}
