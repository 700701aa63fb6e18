//! Outward-facing result validation.
//!
//! Everything that leaves the process goes through [`finalize`], which drops
//! blocks or debug payloads that break the output contract and records a
//! warning for each one.

use crate::debug::DebugOverlay;
use crate::pipeline::{ParseResult, MODE};
use crate::schedule::ScheduleBlock;

impl ParseResult {
    /// Fixed-shape payload for requests that could not be parsed at all.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            mode: MODE.to_string(),
            blocks: Vec::new(),
            debug: None,
            warnings: vec![message.into()],
        }
    }
}

/// Validates a parse result before it is serialized.
pub fn finalize(mut result: ParseResult) -> ParseResult {
    let mut warnings = Vec::new();

    result.blocks.retain(|block| match validate_block(block) {
        Ok(()) => true,
        Err(problem) => {
            let warning = format!("Dropped block at {:?}: {}", block.bbox, problem);
            log::warn!("{}", warning);
            warnings.push(warning);
            false
        }
    });

    if let Some(debug) = &result.debug {
        if let Err(problem) = validate_debug(debug) {
            let warning = format!("Dropped debug info: {}", problem);
            log::warn!("{}", warning);
            warnings.push(warning);
            result.debug = None;
        }
    }

    result.warnings.extend(warnings);
    result
}

fn validate_block(block: &ScheduleBlock) -> Result<(), String> {
    if block.day_of_week > 6 {
        return Err(format!("dayOfWeek {} out of range", block.day_of_week));
    }
    for time in [block.start_time, block.end_time] {
        if time.minute() % 5 != 0 {
            return Err(format!("time {} is not on a 5 minute boundary", time));
        }
    }
    if block.bbox.w == 0 || block.bbox.h == 0 {
        return Err("empty bounding box".to_string());
    }
    if block.class_title.trim().is_empty() {
        return Err("empty class title".to_string());
    }
    Ok(())
}

fn validate_debug(debug: &DebugOverlay) -> Result<(), String> {
    if debug.detected_columns.len() != 7 {
        return Err(format!("expected 7 columns, got {}", debug.detected_columns.len()));
    }
    if debug.overlay_image_base64.is_empty() {
        return Err("overlay image is empty".to_string());
    }
    Ok(())
}
