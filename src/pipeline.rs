//! End-to-end grid schedule parsing.
//!
//! Stages run strictly in sequence over request-local buffers:
//! normalize → locate area → detect blocks → columns → time axis →
//! per-block recognition and mapping → sort → optional debug overlay.
//! Only empty or undecodable input aborts; everything else degrades into
//! warnings.

use serde::Serialize;

use crate::config::ParserConfig;
use crate::debug::{build_debug_overlay, DebugOverlay};
use crate::error::ParseError;
use crate::imaging::normalize_image;
use crate::layout::{detect_day_columns, detect_event_blocks, detect_time_marks, locate_schedule_area};
use crate::ocr::{crop_padded, TextRecognizer};
use crate::schedule::{map_block, ScheduleBlock};

pub const MODE: &str = "grid_schedule";

/// Result payload of one parse.
#[derive(Clone, Debug, Serialize)]
pub struct ParseResult {
    pub mode: String,
    pub blocks: Vec<ScheduleBlock>,
    pub debug: Option<DebugOverlay>,
    pub warnings: Vec<String>,
}

/// Grid schedule parser bound to a configuration and a text recognizer.
pub struct GridScheduleParser<R: TextRecognizer> {
    config: ParserConfig,
    recognizer: R,
}

impl<R: TextRecognizer> GridScheduleParser<R> {
    pub fn new(config: ParserConfig, recognizer: R) -> Self {
        Self { config, recognizer }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses raw image bytes. `debug` adds the annotated overlay to the result.
    pub fn parse(&self, bytes: &[u8], debug: bool) -> Result<ParseResult, ParseError> {
        parse_grid_schedule(bytes, debug, &self.config, &self.recognizer)
    }
}

/// Runs the full pipeline with an explicit configuration and recognizer.
pub fn parse_grid_schedule<R: TextRecognizer + ?Sized>(
    bytes: &[u8],
    debug: bool,
    config: &ParserConfig,
    recognizer: &R,
) -> Result<ParseResult, ParseError> {
    let mut warnings = Vec::new();

    let normalized = normalize_image(bytes, &config.normalize)?.into_value(&mut warnings);
    let image = &normalized.pixels;

    let area = locate_schedule_area(image, &config.area).into_value(&mut warnings);
    log::debug!("Schedule area: {:?}", area);

    let candidates = detect_event_blocks(image, &area, &config.blocks);
    if candidates.is_empty() {
        let reason = "No event blocks detected".to_string();
        log::warn!("{}", reason);
        warnings.push(reason);
    }

    let columns = detect_day_columns(image, &area, &config.axes, recognizer).into_value(&mut warnings);
    let marks = detect_time_marks(image, &area, &config.axes, recognizer).into_value(&mut warnings);

    let mut blocks = Vec::with_capacity(candidates.len());
    for bbox in &candidates {
        let region = crop_padded(image, bbox, config.blocks.ocr_padding);
        let text = match recognizer.recognize(&region) {
            Ok(text) => text,
            Err(e) => {
                log::debug!("Skipping block {:?}: recognition failed: {}", bbox, e);
                continue;
            }
        };
        if text.trim().is_empty() {
            log::debug!("Skipping block {:?}: no text", bbox);
            continue;
        }

        match map_block(*bbox, &text, &columns, &marks, &area, &config.axes) {
            Ok(block) => blocks.push(block),
            Err(e) => log::debug!("Skipping block {:?}: {}", bbox, e),
        }
    }

    blocks.sort_by_key(ScheduleBlock::sort_key);

    let debug = if debug {
        match build_debug_overlay(image, &area, &columns, &marks, &candidates) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                let reason = format!("Debug overlay could not be rendered: {:#}", e);
                log::warn!("{}", reason);
                warnings.push(reason);
                None
            }
        }
    } else {
        None
    };

    log::info!(
        "Parsed {} blocks from {} candidates ({} warnings)",
        blocks.len(),
        candidates.len(),
        warnings.len()
    );

    Ok(ParseResult {
        mode: MODE.to_string(),
        blocks,
        debug,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{ClockTime, Confidence};
    use anyhow::anyhow;
    use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    const BLOCK_COLOR: Rgb<u8> = Rgb([52, 101, 164]);

    fn png(img: RgbImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn fill(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, BLOCK_COLOR);
            }
        }
    }

    fn blank() -> RgbImage {
        RgbImage::from_pixel(1600, 1000, Rgb([255, 255, 255]))
    }

    /// Returns `text` for block-sized regions and nothing for the axis bands.
    fn block_reader(text: &'static str) -> impl Fn(&GrayImage) -> anyhow::Result<String> {
        move |region: &GrayImage| -> anyhow::Result<String> {
            if region.width() < 400 && region.height() < 200 {
                Ok(text.to_string())
            } else {
                Ok(String::new())
            }
        }
    }

    fn t(h: u32, m: u32) -> ClockTime {
        ClockTime::from_hm(h, m).unwrap()
    }

    #[test]
    fn test_single_block_in_tuesday_column() {
        // Centred in column 2 (x 594..795), 113..169px below the fallback area top
        let mut img = blank();
        fill(&mut img, 620, 213, 770, 269);

        let reader = block_reader("CS 101 Intro to Programming\nRoom 204");
        let result = parse_grid_schedule(&png(img), false, &ParserConfig::default(), &reader).unwrap();

        assert_eq!(result.mode, "grid_schedule");
        assert_eq!(result.blocks.len(), 1);
        let block = &result.blocks[0];
        assert_eq!(block.day_of_week, 2);
        assert_eq!(block.start_time, t(8, 0));
        assert_eq!(block.end_time, t(9, 0));
        assert_eq!(block.class_title, "Intro to Programming");
        assert_eq!(block.class_code_guess.as_deref(), Some("CS 101"));
        assert_eq!(block.location_guess.as_deref(), Some("Room 204"));
        assert_eq!(block.confidence, Confidence::High);
        assert!(result.debug.is_none());
    }

    #[test]
    fn test_fallbacks_are_reported_as_warnings() {
        let mut img = blank();
        fill(&mut img, 620, 213, 770, 269);

        let reader = block_reader("Lab");
        let result = parse_grid_schedule(&png(img), false, &ParserConfig::default(), &reader).unwrap();

        assert_eq!(result.blocks[0].confidence, Confidence::Medium);
        let warnings = result.warnings.join("\n");
        assert!(warnings.contains("Could not detect schedule area"), "{}", warnings);
        assert!(warnings.contains("No day labels found"), "{}", warnings);
        assert!(warnings.contains("No time labels found"), "{}", warnings);
    }

    #[test]
    fn test_no_blocks_is_not_an_error() {
        let reader = block_reader("unused");
        let result = parse_grid_schedule(&png(blank()), true, &ParserConfig::default(), &reader).unwrap();

        assert!(result.blocks.is_empty());
        assert!(result.warnings.iter().any(|w| w == "No event blocks detected"));
        // Debug output still describes the grid
        let debug = result.debug.unwrap();
        assert_eq!(debug.detected_columns.len(), 7);
    }

    #[test]
    fn test_debug_overlay_only_when_requested() {
        let mut img = blank();
        fill(&mut img, 620, 213, 770, 269);
        let bytes = png(img);
        let reader = block_reader("CS 101 Intro to Programming");

        let with_debug = parse_grid_schedule(&bytes, true, &ParserConfig::default(), &reader).unwrap();
        let debug = with_debug.debug.as_ref().unwrap();
        assert_eq!(debug.detected_columns.len(), 7);
        assert!(!debug.overlay_image_base64.is_empty());
        assert_eq!(debug.schedule_area.x0, 192);

        let without = parse_grid_schedule(&bytes, false, &ParserConfig::default(), &reader).unwrap();
        assert!(without.debug.is_none());
        let json = serde_json::to_value(&without).unwrap();
        assert!(json["debug"].is_null());
    }

    #[test]
    fn test_blocks_sorted_by_day_then_time() {
        let mut img = blank();
        // Thursday 08:00
        fill(&mut img, 1020, 213, 1170, 269);
        // Monday 10:00
        fill(&mut img, 420, 325, 570, 400);
        // Monday 08:00
        fill(&mut img, 420, 213, 570, 269);

        let reader = block_reader("HIST 110 World History");
        let result = parse_grid_schedule(&png(img), false, &ParserConfig::default(), &reader).unwrap();

        let keys: Vec<(u8, ClockTime)> = result.blocks.iter().map(ScheduleBlock::sort_key).collect();
        assert_eq!(keys, vec![(1, t(8, 0)), (1, t(10, 0)), (4, t(8, 0))]);
    }

    #[test]
    fn test_failed_or_empty_recognition_skips_block() {
        let mut img = blank();
        fill(&mut img, 620, 213, 770, 269);
        let bytes = png(img);

        let failing = |_: &GrayImage| -> anyhow::Result<String> { Err(anyhow!("engine timed out")) };
        let result = parse_grid_schedule(&bytes, false, &ParserConfig::default(), &failing).unwrap();
        assert!(result.blocks.is_empty());
        assert!(!result.warnings.iter().any(|w| w == "No event blocks detected"));

        let silent = block_reader("   \n");
        let result = parse_grid_schedule(&bytes, false, &ParserConfig::default(), &silent).unwrap();
        assert!(result.blocks.is_empty());
    }

    #[test]
    fn test_empty_input_fails() {
        let reader = block_reader("unused");
        let err = parse_grid_schedule(&[], false, &ParserConfig::default(), &reader).unwrap_err();
        assert!(matches!(err, ParseError::EmptyInput));
    }

    #[test]
    fn test_garbage_input_fails() {
        let reader = block_reader("unused");
        let err = parse_grid_schedule(b"not an image", false, &ParserConfig::default(), &reader).unwrap_err();
        assert!(matches!(err, ParseError::Undecodable { .. }));
    }

    #[test]
    fn test_identical_input_identical_output() {
        let mut img = blank();
        fill(&mut img, 620, 213, 770, 269);
        fill(&mut img, 1220, 500, 1370, 600);
        let bytes = png(img);

        let parser = GridScheduleParser::new(
            ParserConfig::default(),
            block_reader("CS 101 Intro to Programming\nRoom 204"),
        );
        let first = serde_json::to_string(&parser.parse(&bytes, true).unwrap()).unwrap();
        let second = serde_json::to_string(&parser.parse(&bytes, true).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
